//! HTML serialization of the document tree, and a tolerant reader for the
//! HTML the editor itself produces.

mod reader;
mod writer;

pub use reader::parse_html;
pub use writer::{HtmlWriter, render_html};
