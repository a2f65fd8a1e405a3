//! HTML 文档
//!
//! 对 `markup5ever_rcdom` 树的轻量封装。克隆共享同一棵树和文本节点标记表，因此宿主
//! 保留的副本能看到扫描器写入的改动。

use std::cell::RefCell;
use std::rc::Rc;

use encoding_rs::Encoding;
use html5ever::parse_document;
use html5ever::serialize::{serialize, SerializeOpts};
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, RcDom, SerializableHandle};

use super::markers::TextMarkers;

#[derive(Clone)]
pub struct Document {
    root: Handle,
    text_markers: Rc<RefCell<TextMarkers>>,
}

impl Document {
    /// 解析 HTML 字符串
    pub fn parse(html: &str) -> Self {
        let dom = parse_document(RcDom::default(), Default::default()).one(html);
        Self::from_dom(dom)
    }

    /// 按声明的字符集解码后解析
    pub fn from_bytes(data: &[u8], document_encoding: &str) -> Self {
        let html = match Encoding::for_label(document_encoding.as_bytes()) {
            Some(encoding) => encoding.decode(data).0.into_owned(),
            None => String::from_utf8_lossy(data).into_owned(),
        };
        Self::parse(&html)
    }

    pub fn from_dom(dom: RcDom) -> Self {
        Self {
            root: dom.document,
            text_markers: Rc::default(),
        }
    }

    /// 文档根节点
    pub fn root(&self) -> &Handle {
        &self.root
    }

    /// 文本遍替换过的文本节点
    pub fn text_markers(&self) -> &RefCell<TextMarkers> {
        &self.text_markers
    }

    /// 序列化为 HTML
    pub fn to_html(&self) -> String {
        let mut buf: Vec<u8> = Vec::new();
        let serializable: SerializableHandle = self.root.clone().into();

        if let Err(e) = serialize(&mut buf, &serializable, SerializeOpts::default()) {
            tracing::error!("无法序列化文档: {}", e);
        }

        String::from_utf8_lossy(&buf).into_owned()
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("text_markers", &self.text_markers.borrow().len())
            .finish_non_exhaustive()
    }
}
