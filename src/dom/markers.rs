//! 文本节点标记
//!
//! 文本节点没有属性可写，文本遍替换过的节点按节点身份记录在这张表里：来源键以及
//! 原文本的首尾空白。切换语言时据此逐个改写文本节点，不动元素的其它子节点。

use std::collections::HashMap;
use std::rc::{Rc, Weak};

use markup5ever_rcdom::{Handle, Node};

/// 一个被替换过的文本节点
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextMarker {
    pub key: String,
    pub leading: String,
    pub trailing: String,
}

impl TextMarker {
    /// 从原文本中取出首尾空白
    pub fn from_original(original: &str, key: &str) -> Self {
        let start = original.len() - original.trim_start().len();
        let end = original.trim_end().len().max(start);
        Self {
            key: key.to_string(),
            leading: original[..start].to_string(),
            trailing: original[end..].to_string(),
        }
    }

    /// 带回原来的首尾空白
    pub fn render(&self, value: &str) -> String {
        format!("{}{}{}", self.leading, value, self.trailing)
    }
}

struct Entry {
    // 弱引用保证节点存活期间地址不被复用
    node: Weak<Node>,
    marker: TextMarker,
}

/// 以节点身份为键的标记表
#[derive(Default)]
pub struct TextMarkers {
    entries: HashMap<usize, Entry>,
}

impl TextMarkers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, node: &Handle, marker: TextMarker) {
        self.entries.insert(
            node_id(node),
            Entry {
                node: Rc::downgrade(node),
                marker,
            },
        );
    }

    pub fn get(&self, node: &Handle) -> Option<&TextMarker> {
        let entry = self.entries.get(&node_id(node))?;
        let alive = entry.node.upgrade()?;
        Rc::ptr_eq(&alive, node).then_some(&entry.marker)
    }

    /// 丢弃已被释放的节点，返回丢弃数量
    pub fn prune(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.node.strong_count() > 0);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn node_id(node: &Handle) -> usize {
    Rc::as_ptr(node) as usize
}
