//! 文档扫描器
//!
//! 每次扫描对当前文档执行三遍处理：
//!
//! - **属性遍**：带有 `data-txr-key` 的元素在未解析或应用语言过期时，用解析结果替换
//!   元素文本。
//! - **过期遍**：文本遍标记过的元素在应用语言过期时，只改写记录在标记表中的文本节点，
//!   兄弟元素和其它文本保持不变。
//! - **文本遍**：深度优先遍历，跳过已解析元素的子树和不渲染的容器；叶子文本去掉
//!   首尾空白后若恰好是当前语言表中的键，则替换为对应值并标记其父元素。
//!
//! 标记属性和文本节点标记表保证重复扫描是幂等的，并在切换语言后识别过期的翻译。

use markup5ever_rcdom::{Handle, NodeData};

use crate::client::table::TranslationTable;

use super::document::Document;
use super::markers::{TextMarker, TextMarkers};
use super::node::{
    find_elements_with_any_attr, get_node_attr, get_node_name, set_element_text, set_node_attr,
    set_text_node,
};

/// 扫描器读写的属性
pub mod attrs {
    /// 输入：翻译键
    pub const KEY: &str = "data-txr-key";
    /// 输出：已解析标记
    pub const RESOLVED: &str = "data-txr-resolved";
    /// 输出：来源键（文本遍元素记录第一个匹配的键）
    pub const SOURCE: &str = "data-txr-source";
    /// 输出：应用的语言
    pub const LANG: &str = "data-txr-lang";
}

/// 文本遍跳过的不渲染容器
pub const SKIP_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// 一次扫描的结果
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScanReport {
    pub attribute_updates: usize,
    pub text_updates: usize,
}

impl ScanReport {
    pub fn total(&self) -> usize {
        self.attribute_updates + self.text_updates
    }
}

/// 扫描所需的只读上下文
pub struct Scanner<'a> {
    table: &'a TranslationTable,
    language: &'a str,
    fallback_language: &'a str,
}

impl<'a> Scanner<'a> {
    pub fn new(table: &'a TranslationTable, language: &'a str, fallback_language: &'a str) -> Self {
        Self {
            table,
            language,
            fallback_language,
        }
    }

    pub fn scan(&self, document: &Document) -> ScanReport {
        let root = document.root();
        let mut markers = document.text_markers().borrow_mut();
        let pruned = markers.prune();
        if pruned > 0 {
            tracing::trace!("清理 {} 个已释放的文本节点标记", pruned);
        }

        let mut report = ScanReport {
            attribute_updates: self.attribute_pass(root),
            ..ScanReport::default()
        };
        report.text_updates += self.stale_pass(root, &mut markers);
        self.text_pass(root, &mut markers, &mut report.text_updates);

        tracing::debug!(
            "扫描完成 ({}): 属性 {} 处，文本 {} 处",
            self.language,
            report.attribute_updates,
            report.text_updates
        );
        report
    }

    fn attribute_pass(&self, root: &Handle) -> usize {
        let mut updates = 0;

        for element in find_elements_with_any_attr(root, &[attrs::KEY]) {
            let Some(key) = get_node_attr(&element, attrs::KEY).filter(|key| !key.is_empty())
            else {
                continue;
            };

            if is_resolved(&element) && self.is_current(&element) {
                continue;
            }

            let value = self
                .table
                .resolve(&key, self.language, self.fallback_language);
            set_element_text(&element, &value);
            set_node_attr(&element, attrs::RESOLVED, Some("true"));
            set_node_attr(&element, attrs::SOURCE, Some(&key));
            set_node_attr(&element, attrs::LANG, Some(self.language));
            updates += 1;
        }

        updates
    }

    /// 重新解析语言已过期的文本遍元素
    fn stale_pass(&self, root: &Handle, markers: &mut TextMarkers) -> usize {
        let mut updates = 0;

        for element in find_elements_with_any_attr(root, &[attrs::SOURCE]) {
            if get_node_attr(&element, attrs::KEY).is_some()
                || !is_resolved(&element)
                || self.is_current(&element)
            {
                continue;
            }

            let texts: Vec<Handle> = element
                .children
                .borrow()
                .iter()
                .filter(|child| matches!(child.data, NodeData::Text { .. }))
                .cloned()
                .collect();

            let mut rewritten = 0;
            for text in &texts {
                let Some(marker) = markers.get(text).cloned() else {
                    continue;
                };
                let value = self
                    .table
                    .resolve(&marker.key, self.language, self.fallback_language);
                set_text_node(text, &marker.render(&value));
                rewritten += 1;
            }

            // 标记表里没有记录（例如文档来自别处的序列化结果）时，
            // 只有唯一的文本子节点才能安全地按来源键改写
            if rewritten == 0 {
                let only_text = element.children.borrow().len() == 1 && texts.len() == 1;
                let source =
                    get_node_attr(&element, attrs::SOURCE).filter(|key| !key.is_empty());
                match (only_text, source) {
                    (true, Some(key)) => {
                        let text = &texts[0];
                        let marker = TextMarker::from_original(&node_text(text), &key);
                        let value =
                            self.table
                                .resolve(&key, self.language, self.fallback_language);
                        set_text_node(text, &marker.render(&value));
                        markers.record(text, marker);
                        rewritten = 1;
                    }
                    _ => {
                        tracing::debug!(
                            "无法定位过期文本节点，保留原内容: {:?}",
                            get_node_name(&element)
                        );
                        continue;
                    }
                }
            }

            set_node_attr(&element, attrs::LANG, Some(self.language));
            updates += rewritten;
        }

        updates
    }

    fn text_pass(&self, node: &Handle, markers: &mut TextMarkers, updates: &mut usize) {
        if let Some(name) = get_node_name(node) {
            if SKIP_ELEMENTS.contains(&name) || is_resolved(node) {
                return;
            }
        }

        for child in node.children.borrow().iter() {
            match &child.data {
                NodeData::Text { contents } => {
                    // 只处理元素下的文本，标记写在父元素上
                    if get_node_name(node).is_none() {
                        continue;
                    }

                    let original = contents.borrow().to_string();
                    let key = original.trim();
                    if key.is_empty() {
                        continue;
                    }

                    if let Some(value) = self.table.get(self.language, key) {
                        let marker = TextMarker::from_original(&original, key);
                        set_text_node(child, &marker.render(value));
                        self.mark_text_resolved(node, key);
                        markers.record(child, marker);
                        *updates += 1;
                    }
                }
                NodeData::Element { .. } => self.text_pass(child, markers, updates),
                _ => {}
            }
        }
    }

    /// 同一元素下有多个键时保留第一个作为来源键
    fn mark_text_resolved(&self, node: &Handle, key: &str) {
        set_node_attr(node, attrs::RESOLVED, Some("true"));
        if get_node_attr(node, attrs::SOURCE).is_none() {
            set_node_attr(node, attrs::SOURCE, Some(key));
        }
        set_node_attr(node, attrs::LANG, Some(self.language));
    }

    fn is_current(&self, node: &Handle) -> bool {
        get_node_attr(node, attrs::LANG).as_deref() == Some(self.language)
    }
}

fn is_resolved(node: &Handle) -> bool {
    get_node_attr(node, attrs::RESOLVED).as_deref() == Some("true")
}

fn node_text(node: &Handle) -> String {
    match &node.data {
        NodeData::Text { contents } => contents.borrow().to_string(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::document::Document;
    use crate::dom::node::text_content;
    use crate::network::payload::{LanguageBlock, ResourceItem, ResponseData};

    fn table() -> TranslationTable {
        let block = |code: &str, pairs: &[(&str, &str)]| LanguageBlock {
            code: code.to_string(),
            resources: pairs
                .iter()
                .map(|(key, value)| ResourceItem {
                    key: key.to_string(),
                    value: value.to_string(),
                })
                .collect(),
        };

        let mut table = TranslationTable::new();
        table.merge(&ResponseData {
            tenant_id: None,
            languages: vec![
                block(
                    "en",
                    &[
                        ("app.welcome", "Welcome!"),
                        ("app.title", "Title"),
                        ("only.en", "English only"),
                    ],
                ),
                block("tr", &[("app.welcome", "Hoş geldiniz!"), ("app.title", "Başlık")]),
            ],
        });
        table
    }

    fn element(doc: &Document, attr: &str) -> Handle {
        find_elements_with_any_attr(doc.root(), &[attr])
            .into_iter()
            .next()
            .unwrap()
    }

    #[test]
    fn test_attribute_pass_resolves_and_marks() {
        let table = table();
        let doc = Document::parse(r#"<h1 data-txr-key="app.title">placeholder</h1>"#);

        let report = Scanner::new(&table, "en", "en").scan(&doc);
        assert_eq!(report.attribute_updates, 1);

        let h1 = element(&doc, attrs::KEY);
        assert_eq!(text_content(&h1), "Title");
        assert_eq!(get_node_attr(&h1, attrs::RESOLVED).as_deref(), Some("true"));
        assert_eq!(get_node_attr(&h1, attrs::SOURCE).as_deref(), Some("app.title"));
        assert_eq!(get_node_attr(&h1, attrs::LANG).as_deref(), Some("en"));
    }

    #[test]
    fn test_attribute_pass_uses_fallback_and_identity() {
        let table = table();
        let doc = Document::parse(
            r#"<p data-txr-key="only.en">a</p><p data-txr-key="nope.missing">b</p>"#,
        );

        Scanner::new(&table, "tr", "en").scan(&doc);
        let html = doc.to_html();
        assert!(html.contains(">English only</p>"));
        assert!(html.contains(">nope.missing</p>"));
    }

    #[test]
    fn test_text_pass_matches_exact_trimmed_keys() {
        let table = table();
        let doc = Document::parse(
            "<div><p>  app.welcome \n</p><p>app.welcome please</p><span>only.en</span></div>",
        );

        let report = Scanner::new(&table, "en", "en").scan(&doc);
        assert_eq!(report.text_updates, 2);

        let html = doc.to_html();
        assert!(html.contains(
            "<p data-txr-resolved=\"true\" data-txr-source=\"app.welcome\" data-txr-lang=\"en\">  Welcome! \n</p>"
        ));
        assert!(html.contains("<p>app.welcome please</p>"));
        assert!(html.contains(">English only</span>"));
    }

    #[test]
    fn test_text_pass_only_uses_current_language_table() {
        let table = table();
        let doc = Document::parse("<p>only.en</p>");

        let report = Scanner::new(&table, "tr", "en").scan(&doc);
        assert_eq!(report.text_updates, 0);
        assert!(doc.to_html().contains("<p>only.en</p>"));
    }

    #[test]
    fn test_text_pass_skips_non_rendering_containers() {
        let table = table();
        let doc = Document::parse(
            "<head><style>app.title</style></head><body><script>app.title</script><noscript>app.title</noscript><template>app.title</template></body>",
        );

        let report = Scanner::new(&table, "en", "en").scan(&doc);
        assert_eq!(report.total(), 0);
        assert!(!doc.to_html().contains("Title"));
    }

    #[test]
    fn test_scan_is_idempotent() {
        let table = table();
        let doc = Document::parse(
            r#"<h1 data-txr-key="app.title">x</h1><p>app.welcome</p><p>untouched</p>"#,
        );
        let scanner = Scanner::new(&table, "en", "en");

        let first = scanner.scan(&doc);
        assert_eq!(first.total(), 2);
        let once = doc.to_html();

        let second = scanner.scan(&doc);
        assert_eq!(second.total(), 0);
        assert_eq!(doc.to_html(), once);
    }

    #[test]
    fn test_value_that_is_also_a_key_is_not_translated_twice() {
        let mut table = TranslationTable::new();
        table.merge(&ResponseData {
            tenant_id: None,
            languages: vec![LanguageBlock {
                code: "en".to_string(),
                resources: vec![
                    ResourceItem {
                        key: "a".to_string(),
                        value: "b".to_string(),
                    },
                    ResourceItem {
                        key: "b".to_string(),
                        value: "c".to_string(),
                    },
                ],
            }],
        });

        let doc = Document::parse("<p>a</p>");
        let scanner = Scanner::new(&table, "en", "en");
        scanner.scan(&doc);
        scanner.scan(&doc);
        assert!(doc.to_html().contains(">b</p>"));
    }

    #[test]
    fn test_language_switch_re_resolves_stale_elements() {
        let table = table();
        let doc = Document::parse(r#"<h1 data-txr-key="app.title">x</h1><p>app.welcome</p>"#);

        Scanner::new(&table, "en", "en").scan(&doc);
        let report = Scanner::new(&table, "tr", "en").scan(&doc);
        assert_eq!(report.attribute_updates, 1);
        assert_eq!(report.text_updates, 1);

        let html = doc.to_html();
        assert!(html.contains(">Başlık</h1>"));
        assert!(html.contains(">Hoş geldiniz!</p>"));
        assert!(!html.contains(r#"data-txr-lang="en""#));
    }

    #[test]
    fn test_language_switch_keeps_siblings_and_every_key() {
        let table = table();
        let doc = Document::parse(
            "<p>app.welcome <b>keep me</b></p><div>app.title<br>app.welcome</div>",
        );

        let first = Scanner::new(&table, "en", "en").scan(&doc);
        assert_eq!(first.text_updates, 3);
        let html = doc.to_html();
        assert!(html.contains(">Welcome! <b>keep me</b></p>"));
        assert!(html.contains(
            r#"<div data-txr-resolved="true" data-txr-source="app.title" data-txr-lang="en">Title<br>Welcome!</div>"#
        ));

        let second = Scanner::new(&table, "tr", "en").scan(&doc);
        assert_eq!(second.attribute_updates, 0);
        assert_eq!(second.text_updates, 3);
        let html = doc.to_html();
        assert!(html.contains(">Hoş geldiniz! <b>keep me</b></p>"));
        assert!(html.contains(">Başlık<br>Hoş geldiniz!</div>"));

        // 切回后内容与首次扫描一致，再扫描无改动
        Scanner::new(&table, "en", "en").scan(&doc);
        let back = doc.to_html();
        assert!(back.contains(">Welcome! <b>keep me</b></p>"));
        assert!(back.contains(">Title<br>Welcome!</div>"));
        assert_eq!(Scanner::new(&table, "en", "en").scan(&doc).total(), 0);
        assert_eq!(doc.to_html(), back);
    }

    #[test]
    fn test_stale_element_without_markers() {
        let table = table();
        // 从序列化结果重新解析，标记表为空
        let doc = Document::parse(concat!(
            r#"<p data-txr-resolved="true" data-txr-source="app.title" data-txr-lang="en">Title</p>"#,
            r#"<div data-txr-resolved="true" data-txr-source="app.title" data-txr-lang="en">Title<br>Welcome!</div>"#,
        ));

        let report = Scanner::new(&table, "tr", "en").scan(&doc);
        assert_eq!(report.text_updates, 1);

        let html = doc.to_html();
        assert!(html.contains(r#"data-txr-lang="tr">Başlık</p>"#));
        // 多个子节点时无法确定哪个文本对应来源键，保持原样
        assert!(html.contains(r#"data-txr-lang="en">Title<br>Welcome!</div>"#));
    }
}
