//! Syntax highlighting for fenced code blocks.

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Span;
use syntect::easy::HighlightLines;
use syntect::highlighting::{FontStyle, ThemeSet};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;

/// Theme used when the configured one is missing.
pub const DEFAULT_THEME: &str = "base16-ocean.dark";

/// Wraps syntect's syntax and theme sets.
pub struct Highlighter {
    syntax_set: SyntaxSet,
    theme_set: ThemeSet,
    theme_name: String,
}

impl Highlighter {
    pub fn new() -> Self {
        Self::with_theme(DEFAULT_THEME)
    }

    /// Use a named syntect theme, falling back to [`DEFAULT_THEME`].
    pub fn with_theme(theme_name: &str) -> Self {
        let theme_set = ThemeSet::load_defaults();
        let theme_name = if theme_set.themes.contains_key(theme_name) {
            theme_name.to_string()
        } else {
            tracing::warn!(theme = theme_name, "Unknown highlight theme, using default");
            DEFAULT_THEME.to_string()
        };
        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme_set,
            theme_name,
        }
    }

    /// Resolve a fence language tag. Untagged blocks are sniffed from their
    /// first line, then rendered as plain text.
    fn find_syntax(&self, lang: &str, code: &str) -> &SyntaxReference {
        let by_tag = if lang.is_empty() {
            None
        } else {
            self.syntax_set
                .find_syntax_by_token(lang)
                .or_else(|| self.syntax_set.find_syntax_by_extension(lang))
        };
        by_tag
            .or_else(|| {
                code.lines()
                    .next()
                    .and_then(|first| self.syntax_set.find_syntax_by_first_line(first))
            })
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text())
    }

    /// Highlight `code`, one span list per source line.
    pub fn highlight(&self, lang: &str, code: &str) -> Vec<Vec<Span<'static>>> {
        let syntax = self.find_syntax(lang, code);
        let theme = match self.theme_set.themes.get(&self.theme_name) {
            Some(theme) => theme,
            None => return plain_lines(code),
        };
        let mut highlighter = HighlightLines::new(syntax, theme);

        let mut lines = Vec::new();
        for line in LinesWithEndings::from(code) {
            match highlighter.highlight_line(line, &self.syntax_set) {
                Ok(ranges) => lines.push(
                    ranges
                        .into_iter()
                        .map(|(style, text)| {
                            Span::styled(text.trim_end_matches('\n').to_string(), to_style(style))
                        })
                        .collect(),
                ),
                Err(e) => {
                    tracing::debug!(error = %e, "Highlighting failed, using plain text");
                    lines.push(vec![Span::raw(line.trim_end_matches('\n').to_string())]);
                }
            }
        }
        lines
    }
}

impl Default for Highlighter {
    fn default() -> Self {
        Self::new()
    }
}

fn plain_lines(code: &str) -> Vec<Vec<Span<'static>>> {
    code.lines()
        .map(|line| vec![Span::raw(line.to_string())])
        .collect()
}

fn to_style(style: syntect::highlighting::Style) -> Style {
    let fg = style.foreground;
    let mut out = Style::default().fg(Color::Rgb(fg.r, fg.g, fg.b));
    if style.font_style.contains(FontStyle::BOLD) {
        out = out.add_modifier(Modifier::BOLD);
    }
    if style.font_style.contains(FontStyle::ITALIC) {
        out = out.add_modifier(Modifier::ITALIC);
    }
    if style.font_style.contains(FontStyle::UNDERLINE) {
        out = out.add_modifier(Modifier::UNDERLINED);
    }
    out
}
