//! HTML 文档模型与扫描
//!
//! 基于 `html5ever` + `markup5ever_rcdom` 的文档树，以及就地改写翻译键的扫描器。

pub mod document;
pub mod markers;
pub mod node;
pub mod scanner;

pub use document::Document;
pub use markers::{TextMarker, TextMarkers};
pub use scanner::{attrs, ScanReport, Scanner, SKIP_ELEMENTS};
