//! 基础DOM操作

use std::cell::RefCell;
use std::rc::Rc;

use html5ever::interface::{Attribute, QualName};
use html5ever::tendril::{format_tendril, StrTendril};
use html5ever::{namespace_url, ns, LocalName};
use markup5ever_rcdom::{Handle, Node, NodeData};

/// 获取节点属性值
pub fn get_node_attr(node: &Handle, attr_name: &str) -> Option<String> {
    match &node.data {
        NodeData::Element { attrs, .. } => {
            for attr in attrs.borrow().iter() {
                if &*attr.name.local == attr_name {
                    return Some(attr.value.to_string());
                }
            }
            None
        }
        _ => None,
    }
}

/// 获取节点名称
pub fn get_node_name(node: &Handle) -> Option<&'_ str> {
    match &node.data {
        NodeData::Element { name, .. } => Some(name.local.as_ref()),
        _ => None,
    }
}

pub fn is_element(node: &Handle) -> bool {
    matches!(node.data, NodeData::Element { .. })
}

/// 设置节点属性；`None` 删除属性
pub fn set_node_attr(node: &Handle, attr_name: &str, attr_value: Option<&str>) {
    if let NodeData::Element { attrs, .. } = &node.data {
        let attrs_mut = &mut attrs.borrow_mut();
        let mut i = 0;
        let mut found_existing_attr: bool = false;

        while i < attrs_mut.len() {
            if &attrs_mut[i].name.local == attr_name {
                found_existing_attr = true;

                if let Some(attr_value) = attr_value {
                    if &*attrs_mut[i].value != attr_value {
                        attrs_mut[i].value.clear();
                        attrs_mut[i].value.push_slice(attr_value);
                    }
                } else {
                    // Remove attr completely if attr_value is not defined
                    attrs_mut.remove(i);
                    continue;
                }
            }

            i += 1;
        }

        if !found_existing_attr {
            if let Some(attr_value) = attr_value {
                attrs_mut.push(Attribute {
                    name: QualName::new(None, ns!(), LocalName::from(attr_name)),
                    value: format_tendril!("{}", attr_value),
                });
            }
        }
    };
}

/// 查找所有带有任一指定属性的元素（文档顺序）
pub fn find_elements_with_any_attr(node: &Handle, attr_names: &[&str]) -> Vec<Handle> {
    let mut found = Vec::new();
    collect_elements_with_any_attr(node, attr_names, &mut found);
    found
}

fn collect_elements_with_any_attr(node: &Handle, attr_names: &[&str], found: &mut Vec<Handle>) {
    if let NodeData::Element { attrs, .. } = &node.data {
        let matched = attrs
            .borrow()
            .iter()
            .any(|attr| attr_names.contains(&&*attr.name.local));
        if matched {
            found.push(node.clone());
        }
    }

    for child in node.children.borrow().iter() {
        collect_elements_with_any_attr(child, attr_names, found);
    }
}

/// 拼接节点下所有文本
pub fn text_content(node: &Handle) -> String {
    let mut text = String::new();
    push_text(node, &mut text);
    text
}

fn push_text(node: &Handle, text: &mut String) {
    if let NodeData::Text { contents } = &node.data {
        text.push_str(&contents.borrow());
    }
    for child in node.children.borrow().iter() {
        push_text(child, text);
    }
}

/// 用单个文本节点替换元素的全部子节点，返回是否有改动
pub fn set_element_text(node: &Handle, text: &str) -> bool {
    if !is_element(node) {
        return false;
    }

    {
        let children = node.children.borrow();
        if let [only] = children.as_slice() {
            if let NodeData::Text { contents } = &only.data {
                if &**contents.borrow() == text {
                    return false;
                }
            }
        }
    }

    let text_node = Node::new(NodeData::Text {
        contents: RefCell::new(StrTendril::from_slice(text)),
    });
    text_node.parent.set(Some(Rc::downgrade(node)));

    let mut children = node.children.borrow_mut();
    for child in children.iter() {
        child.parent.set(None);
    }
    children.clear();
    children.push(text_node);
    true
}

/// 替换文本节点内容
pub fn set_text_node(node: &Handle, text: &str) -> bool {
    match &node.data {
        NodeData::Text { contents } => {
            let mut contents = contents.borrow_mut();
            if &**contents == text {
                return false;
            }
            contents.clear();
            contents.push_slice(text);
            true
        }
        _ => false,
    }
}
