//! Markdown to styled terminal lines.
//!
//! Every call parses the whole source again with pulldown-cmark, so a
//! half-streamed message (open code fence, dangling `**`) stays renderable.

use super::highlight::Highlighter;
use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use std::ops::Range;

/// Render style configuration.
#[derive(Debug, Clone)]
pub struct RenderStyle {
    pub heading_color: Color,
    pub bullet_color: Color,
    pub quote_color: Color,
    pub inline_code_color: Color,
    pub link_color: Color,
    pub frame_color: Color,
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self {
            heading_color: Color::Cyan,
            bullet_color: Color::Yellow,
            quote_color: Color::DarkGray,
            inline_code_color: Color::Magenta,
            link_color: Color::Blue,
            frame_color: Color::DarkGray,
        }
    }
}

/// A fenced code block, kept verbatim for copying.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    pub language: String,
    pub code: String,
}

/// Output of one render pass.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RenderedMarkdown {
    pub lines: Vec<Line<'static>>,
    pub code_blocks: Vec<CodeBlock>,
}

/// Markdown renderer with syntax-highlighted code blocks.
pub struct MarkdownRenderer {
    style: RenderStyle,
    highlighter: Highlighter,
}

impl MarkdownRenderer {
    /// Create a new renderer.
    pub fn new() -> Self {
        Self {
            style: RenderStyle::default(),
            highlighter: Highlighter::new(),
        }
    }

    /// Create with custom style and highlighter.
    pub fn with_style(style: RenderStyle, highlighter: Highlighter) -> Self {
        Self { style, highlighter }
    }

    /// Render markdown content.
    pub fn render(&self, content: &str) -> RenderedMarkdown {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_TASKLISTS);

        let mut builder = LineBuilder::new(&self.style, &self.highlighter);
        for (event, range) in Parser::new_ext(content, options).into_offset_iter() {
            builder.process_event(event, range, content);
        }
        builder.finish()
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Plain text of a rendered line.
pub fn line_text(line: &Line<'_>) -> String {
    line.spans.iter().map(|span| span.content.as_ref()).collect()
}

/// Whether the fenced block in `source` has its closing fence yet.
fn fence_closed(source: &str) -> bool {
    let mut lines = source.trim_end().lines().map(str::trim_start);
    let fence_char = match lines.next().and_then(|first| first.chars().next()) {
        Some(c @ ('`' | '~')) => c,
        _ => return true,
    };
    let closing: String = std::iter::repeat(fence_char).take(3).collect();
    match lines.last() {
        Some(last) => last.starts_with(&closing),
        None => false,
    }
}

struct ListContext {
    /// Next number for ordered lists.
    next: Option<u64>,
}

#[derive(Default)]
struct TableContext {
    rows: Vec<Vec<String>>,
    row: Vec<String>,
    cell: String,
    has_header: bool,
}

struct CodeContext {
    language: String,
    code: String,
    closed: bool,
}

struct LineBuilder<'a> {
    style: &'a RenderStyle,
    highlighter: &'a Highlighter,
    out: RenderedMarkdown,
    spans: Vec<Span<'static>>,
    inline_styles: Vec<Style>,
    lists: Vec<ListContext>,
    /// Marker for the first line of the current list item.
    pending_marker: Option<Span<'static>>,
    quote_depth: usize,
    code: Option<CodeContext>,
    table: Option<TableContext>,
}

impl<'a> LineBuilder<'a> {
    fn new(style: &'a RenderStyle, highlighter: &'a Highlighter) -> Self {
        Self {
            style,
            highlighter,
            out: RenderedMarkdown::default(),
            spans: Vec::new(),
            inline_styles: Vec::new(),
            lists: Vec::new(),
            pending_marker: None,
            quote_depth: 0,
            code: None,
            table: None,
        }
    }

    fn process_event(&mut self, event: Event<'_>, range: Range<usize>, source: &str) {
        match event {
            Event::Start(tag) => self.start_tag(tag, range, source),
            Event::End(tag) => self.end_tag(tag),
            Event::Text(text) => self.push_text(&text),
            Event::Code(code) => {
                let style = self
                    .current_style()
                    .fg(self.style.inline_code_color);
                self.push_span(code.to_string(), style);
            }
            Event::Html(html) | Event::InlineHtml(html) => self.push_text(&html),
            Event::SoftBreak | Event::HardBreak => self.flush_line(),
            Event::Rule => {
                self.start_block();
                let rule = Span::styled("─".repeat(40), Style::default().fg(self.style.quote_color));
                self.emit_line(vec![rule]);
            }
            Event::TaskListMarker(checked) => {
                let marker = if checked { "[x] " } else { "[ ] " };
                self.push_span(marker.to_string(), Style::default().fg(self.style.bullet_color));
            }
            Event::FootnoteReference(name) => {
                self.push_span(format!("[^{}]", name), self.current_style());
            }
            _ => {}
        }
    }

    fn start_tag(&mut self, tag: Tag<'_>, range: Range<usize>, source: &str) {
        match tag {
            Tag::Paragraph => self.start_block(),
            Tag::Heading { .. } => {
                self.start_block();
                self.inline_styles.push(
                    Style::default()
                        .fg(self.style.heading_color)
                        .add_modifier(Modifier::BOLD),
                );
            }
            Tag::BlockQuote(_) => {
                self.start_block();
                self.quote_depth += 1;
            }
            Tag::CodeBlock(kind) => {
                self.start_block();
                let (language, closed) = match kind {
                    CodeBlockKind::Fenced(info) => (
                        info.split_whitespace().next().unwrap_or("").to_string(),
                        fence_closed(source.get(range).unwrap_or("")),
                    ),
                    CodeBlockKind::Indented => (String::new(), true),
                };
                self.code = Some(CodeContext {
                    language,
                    code: String::new(),
                    closed,
                });
            }
            Tag::List(start) => {
                self.start_block();
                self.lists.push(ListContext { next: start });
            }
            Tag::Item => {
                self.flush_line();
                let depth = self.lists.len().saturating_sub(1);
                let marker = match self.lists.last_mut().and_then(|list| list.next.as_mut()) {
                    Some(n) => {
                        let marker = format!("{}{}. ", "  ".repeat(depth), n);
                        *n += 1;
                        marker
                    }
                    None => format!("{}• ", "  ".repeat(depth)),
                };
                self.pending_marker =
                    Some(Span::styled(marker, Style::default().fg(self.style.bullet_color)));
            }
            Tag::Emphasis => {
                let style = self.current_style().add_modifier(Modifier::ITALIC);
                self.inline_styles.push(style);
            }
            Tag::Strong => {
                let style = self.current_style().add_modifier(Modifier::BOLD);
                self.inline_styles.push(style);
            }
            Tag::Strikethrough => {
                let style = self.current_style().add_modifier(Modifier::CROSSED_OUT);
                self.inline_styles.push(style);
            }
            Tag::Link { .. } => {
                let style = self
                    .current_style()
                    .fg(self.style.link_color)
                    .add_modifier(Modifier::UNDERLINED);
                self.inline_styles.push(style);
            }
            Tag::Table(_) => {
                self.start_block();
                self.table = Some(TableContext::default());
            }
            Tag::TableHead => {
                if let Some(table) = self.table.as_mut() {
                    table.has_header = true;
                }
            }
            _ => {}
        }
    }

    fn end_tag(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => self.flush_line(),
            TagEnd::Heading(_) => {
                self.flush_line();
                self.inline_styles.pop();
            }
            TagEnd::BlockQuote(_) => {
                self.flush_line();
                self.quote_depth = self.quote_depth.saturating_sub(1);
            }
            TagEnd::CodeBlock => self.finish_code_block(),
            TagEnd::List(_) => {
                self.flush_line();
                self.lists.pop();
            }
            TagEnd::Item => {
                self.flush_line();
                self.pending_marker = None;
            }
            TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough | TagEnd::Link => {
                self.inline_styles.pop();
            }
            TagEnd::TableCell => {
                if let Some(table) = self.table.as_mut() {
                    let cell = std::mem::take(&mut table.cell);
                    table.row.push(cell.trim().to_string());
                }
            }
            TagEnd::TableHead | TagEnd::TableRow => {
                if let Some(table) = self.table.as_mut() {
                    if !table.row.is_empty() {
                        let row = std::mem::take(&mut table.row);
                        table.rows.push(row);
                    }
                }
            }
            TagEnd::Table => self.finish_table(),
            _ => {}
        }
    }

    fn current_style(&self) -> Style {
        self.inline_styles.last().copied().unwrap_or_default()
    }

    fn push_text(&mut self, text: &str) {
        if let Some(code) = self.code.as_mut() {
            code.code.push_str(text);
            return;
        }
        if let Some(table) = self.table.as_mut() {
            table.cell.push_str(text);
            return;
        }

        let style = self.current_style();
        let mut parts = text.split('\n').peekable();
        while let Some(part) = parts.next() {
            if !part.is_empty() {
                self.spans.push(Span::styled(part.to_string(), style));
            }
            if parts.peek().is_some() {
                self.flush_line();
            }
        }
    }

    fn push_span(&mut self, text: String, style: Style) {
        match self.table.as_mut() {
            Some(table) => table.cell.push_str(&text),
            None => self.spans.push(Span::styled(text, style)),
        }
    }

    /// Blank line between top-level blocks.
    fn start_block(&mut self) {
        self.flush_line();
        if self.lists.is_empty() && self.quote_depth == 0 && !self.out.lines.is_empty() {
            self.out.lines.push(Line::default());
        }
    }

    fn flush_line(&mut self) {
        if self.spans.is_empty() {
            return;
        }
        let spans = std::mem::take(&mut self.spans);
        self.emit_line(spans);
    }

    /// Push a line behind the quote bars and list indent it belongs to.
    fn emit_line(&mut self, body: Vec<Span<'static>>) {
        let mut spans = Vec::with_capacity(body.len() + 2);
        if self.quote_depth > 0 {
            spans.push(Span::styled(
                "│ ".repeat(self.quote_depth),
                Style::default().fg(self.style.quote_color),
            ));
        }
        match self.pending_marker.take() {
            Some(marker) => spans.push(marker),
            None if !self.lists.is_empty() => spans.push(Span::raw("  ".repeat(self.lists.len()))),
            None => {}
        }
        spans.extend(body);
        self.out.lines.push(Line::from(spans));
    }

    fn finish_code_block(&mut self) {
        let Some(CodeContext {
            language,
            mut code,
            closed,
        }) = self.code.take()
        else {
            return;
        };
        if !code.is_empty() && !code.ends_with('\n') {
            code.push('\n');
        }

        let frame = Style::default().fg(self.style.frame_color);
        let number = self.out.code_blocks.len() + 1;
        let label = if language.is_empty() {
            "code"
        } else {
            language.as_str()
        };

        self.emit_line(vec![Span::styled(format!("┌── {} [{}]", label, number), frame)]);
        for spans in self.highlighter.highlight(&language, &code) {
            let mut line = vec![Span::styled("│ ", frame)];
            line.extend(spans);
            self.emit_line(line);
        }
        // Streaming messages often end inside a fence.
        if closed {
            self.emit_line(vec![Span::styled("└──", frame)]);
        }

        self.out.code_blocks.push(CodeBlock { language, code });
    }

    fn finish_table(&mut self) {
        let Some(table) = self.table.take() else {
            return;
        };
        let columns = table.rows.iter().map(Vec::len).max().unwrap_or(0);
        let widths: Vec<usize> = (0..columns)
            .map(|col| {
                table
                    .rows
                    .iter()
                    .filter_map(|row| row.get(col))
                    .map(|cell| cell.chars().count())
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let frame = Style::default().fg(self.style.frame_color);
        for (index, row) in table.rows.iter().enumerate() {
            let header = table.has_header && index == 0;
            let cell_style = if header {
                Style::default().add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };

            let mut spans = Vec::new();
            for (col, width) in widths.iter().enumerate() {
                if col > 0 {
                    spans.push(Span::styled(" │ ", frame));
                }
                let cell = row.get(col).map(String::as_str).unwrap_or("");
                let text = if col + 1 == columns {
                    cell.to_string()
                } else {
                    format!("{:<width$}", cell, width = *width)
                };
                spans.push(Span::styled(text, cell_style));
            }
            self.emit_line(spans);

            if header {
                let rule = widths
                    .iter()
                    .map(|w| "─".repeat(*w))
                    .collect::<Vec<_>>()
                    .join("─┼─");
                self.emit_line(vec![Span::styled(rule, frame)]);
            }
        }
    }

    fn finish(mut self) -> RenderedMarkdown {
        if self.code.is_some() {
            self.finish_code_block();
        }
        self.flush_line();
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(rendered: &RenderedMarkdown) -> Vec<String> {
        rendered.lines.iter().map(line_text).collect()
    }

    // =========================================================================
    // Block Elements
    // =========================================================================

    #[test]
    fn test_paragraphs_keep_breaks() {
        let renderer = MarkdownRenderer::new();
        let rendered = renderer.render("first\nsecond\n\nthird");
        assert_eq!(texts(&rendered), vec!["first", "second", "", "third"]);
        assert!(rendered.code_blocks.is_empty());
    }

    #[test]
    fn test_headings_are_bold() {
        let renderer = MarkdownRenderer::new();
        let rendered = renderer.render("# Title\n### Sub");
        assert_eq!(texts(&rendered), vec!["Title", "", "Sub"]);
        let style = rendered.lines[0].spans[0].style;
        assert!(style.add_modifier.contains(Modifier::BOLD));
        assert_eq!(style.fg, Some(Color::Cyan));
    }

    #[test]
    fn test_hash_without_space_is_text() {
        let renderer = MarkdownRenderer::new();
        let rendered = renderer.render("#hashtag");
        assert_eq!(texts(&rendered), vec!["#hashtag"]);
    }

    #[test]
    fn test_lists_quotes_and_rules() {
        let renderer = MarkdownRenderer::new();
        let rendered =
            renderer.render("- one\n- two\n\n12. twelve\n13. thirteen\n\n> quoted\n\n---");
        assert_eq!(
            texts(&rendered),
            vec![
                "• one".to_string(),
                "• two".to_string(),
                String::new(),
                "12. twelve".to_string(),
                "13. thirteen".to_string(),
                String::new(),
                "│ quoted".to_string(),
                String::new(),
                "─".repeat(40),
            ]
        );
    }

    #[test]
    fn test_nested_list_indented() {
        let renderer = MarkdownRenderer::new();
        let rendered = renderer.render("- outer\n  - inner");
        assert_eq!(texts(&rendered), vec!["• outer", "  • inner"]);
    }

    #[test]
    fn test_table_columns_aligned() {
        let renderer = MarkdownRenderer::new();
        let rendered = renderer.render("| a | b |\n|---|---|\n| 1 | 22 |");
        assert_eq!(texts(&rendered), vec!["a │ b", "──┼───", "1 │ 22"]);
        assert!(rendered.lines[0].spans[0]
            .style
            .add_modifier
            .contains(Modifier::BOLD));
    }

    // =========================================================================
    // Code Blocks
    // =========================================================================

    #[test]
    fn test_code_block_framed_and_collected() {
        let renderer = MarkdownRenderer::new();
        let rendered = renderer.render("Look:\n```rust\nfn main() {}\n```\ndone");
        assert_eq!(
            texts(&rendered),
            vec!["Look:", "", "┌── rust [1]", "│ fn main() {}", "└──", "", "done"]
        );
        assert_eq!(
            rendered.code_blocks,
            vec![CodeBlock {
                language: "rust".to_string(),
                code: "fn main() {}\n".to_string(),
            }]
        );
    }

    #[test]
    fn test_code_blocks_numbered_in_order() {
        let renderer = MarkdownRenderer::new();
        let rendered = renderer.render("```\na\n```\n```py\nb\n```");
        assert_eq!(rendered.code_blocks.len(), 2);
        let lines = texts(&rendered);
        assert!(lines.contains(&"┌── code [1]".to_string()));
        assert!(lines.contains(&"┌── py [2]".to_string()));
    }

    #[test]
    fn test_unclosed_fence_still_renders() {
        let renderer = MarkdownRenderer::new();
        let rendered = renderer.render("```bash\necho hi");
        assert_eq!(rendered.code_blocks.len(), 1);
        assert_eq!(rendered.code_blocks[0].code, "echo hi\n");
        let lines = texts(&rendered);
        assert_eq!(lines.last().unwrap(), "│ echo hi");
    }

    #[test]
    fn test_markdown_inside_code_untouched() {
        let renderer = MarkdownRenderer::new();
        let rendered = renderer.render("```\n# not a heading\n2 * 3 *\n```");
        assert_eq!(rendered.code_blocks[0].code, "# not a heading\n2 * 3 *\n");
    }

    #[test]
    fn test_code_in_list_item_drops_list_indent() {
        let renderer = MarkdownRenderer::new();
        let rendered = renderer.render("1. first\n   ```rust\n   let x = 1;\n   ```");
        assert_eq!(rendered.code_blocks.len(), 1);
        assert_eq!(rendered.code_blocks[0].language, "rust");
        assert_eq!(rendered.code_blocks[0].code, "let x = 1;\n");
        assert_eq!(line_text(&rendered.lines[0]), "1. first");
    }

    #[test]
    fn test_fence_closed_detection() {
        assert!(fence_closed("```rust\nlet a = 1;\n```\n"));
        assert!(fence_closed("~~~\nx\n~~~~"));
        assert!(!fence_closed("```rust\nlet a = 1;"));
        assert!(!fence_closed("```"));
        assert!(!fence_closed("~~~\n```"));
    }

    // =========================================================================
    // Inline Elements
    // =========================================================================

    #[test]
    fn test_inline_code_bold_italic() {
        let renderer = MarkdownRenderer::new();
        let rendered = renderer.render("use `cargo` **now** or *later*");
        let spans = &rendered.lines[0].spans;
        assert_eq!(line_text(&rendered.lines[0]), "use cargo now or later");

        let code = spans.iter().find(|s| s.content == "cargo").unwrap();
        assert_eq!(code.style.fg, Some(Color::Magenta));
        let bold = spans.iter().find(|s| s.content == "now").unwrap();
        assert!(bold.style.add_modifier.contains(Modifier::BOLD));
        let italic = spans.iter().find(|s| s.content == "later").unwrap();
        assert!(italic.style.add_modifier.contains(Modifier::ITALIC));
    }

    #[test]
    fn test_lone_asterisks_kept() {
        let renderer = MarkdownRenderer::new();
        let rendered = renderer.render("2 * 3 * 4 = 24");
        assert_eq!(texts(&rendered), vec!["2 * 3 * 4 = 24"]);
    }

    #[test]
    fn test_lone_underscore_kept() {
        let renderer = MarkdownRenderer::new();
        let rendered = renderer.render("prefix _ suffix and snake_case_name");
        assert_eq!(texts(&rendered), vec!["prefix _ suffix and snake_case_name"]);
    }

    #[test]
    fn test_links_show_text_only() {
        let renderer = MarkdownRenderer::new();
        let rendered = renderer.render("see [docs](https://example.com) please");
        assert_eq!(line_text(&rendered.lines[0]), "see docs please");
        let link = rendered.lines[0]
            .spans
            .iter()
            .find(|s| s.content == "docs")
            .unwrap();
        assert_eq!(link.style.fg, Some(Color::Blue));
    }

    #[test]
    fn test_unmatched_bracket_kept() {
        let renderer = MarkdownRenderer::new();
        let rendered = renderer.render("array[0] and [x");
        assert_eq!(line_text(&rendered.lines[0]), "array[0] and [x");
    }

    #[test]
    fn test_dangling_bold_while_streaming() {
        let renderer = MarkdownRenderer::new();
        let rendered = renderer.render("almost **there");
        assert_eq!(texts(&rendered), vec!["almost **there"]);
    }

    #[test]
    fn test_render_is_deterministic() {
        let renderer = MarkdownRenderer::new();
        let source = "# A\n```rust\nlet a = 1;\n```\n- b";
        assert_eq!(renderer.render(source), renderer.render(source));
    }
}
