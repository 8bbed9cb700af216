//! Message rendering: markdown to ratatui lines, code blocks highlighted.

mod highlight;
mod markdown;

pub use highlight::{Highlighter, DEFAULT_THEME};
pub use markdown::{line_text, CodeBlock, MarkdownRenderer, RenderStyle, RenderedMarkdown};
