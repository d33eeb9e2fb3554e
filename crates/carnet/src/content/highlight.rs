use std::sync::OnceLock;
use syntect::{
    Error,
    easy::HighlightLines,
    highlighting::{Theme, ThemeSet},
    html::{IncludeBackground, styled_line_to_highlighted_html},
    parsing::SyntaxSet,
    util::LinesWithEndings,
};

/// Every code block on the site is highlighted with this one theme.
const THEME: &str = "base16-ocean.dark";

static SYNTAX_SET: OnceLock<SyntaxSet> = OnceLock::new();
static THEME_SET: OnceLock<ThemeSet> = OnceLock::new();

fn get_syntax_set() -> &'static SyntaxSet {
    SYNTAX_SET.get_or_init(SyntaxSet::load_defaults_newlines)
}

fn get_theme() -> &'static Theme {
    let themes = &THEME_SET.get_or_init(ThemeSet::load_defaults).themes;
    themes
        .get(THEME)
        .or_else(|| themes.values().next())
        .expect("syntect ships with a non-empty default theme set")
}

fn opening_html(language: Option<&str>) -> String {
    match language {
        Some(lang) => format!("<pre data-language=\"{lang}\"><code data-language=\"{lang}\">"),
        None => "<pre><code>".to_string(),
    }
}

/// One fenced code block, keyed by the language given on its fence.
pub struct CodeBlock {
    language: String,
}

impl CodeBlock {
    /// Returns the block plus the opening HTML for its `<pre><code>` shell.
    pub fn new(fence: &str) -> (Self, String) {
        let language = fence
            .split([',', ' '])
            .next()
            .unwrap_or("")
            .to_string();
        let opening = opening_html(if language.is_empty() {
            None
        } else {
            Some(&language)
        });

        (Self { language }, opening)
    }

    pub fn highlight(&self, content: &str) -> Result<String, Error> {
        let ss = get_syntax_set();

        let syntax = ss
            .find_syntax_by_token(&self.language)
            .or_else(|| ss.find_syntax_by_name(&self.language))
            .or_else(|| ss.find_syntax_by_extension(&self.language))
            .or_else(|| ss.find_syntax_by_first_line(content))
            .unwrap_or_else(|| ss.find_syntax_plain_text());

        let mut highlighter = HighlightLines::new(syntax, get_theme());

        let mut highlighted = String::new();
        for line in LinesWithEndings::from(content) {
            let regions = highlighter.highlight_line(line, ss)?;
            let html = styled_line_to_highlighted_html(&regions, IncludeBackground::No)?;
            highlighted.push_str(&html);
        }

        Ok(highlighted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fence_language_is_first_token() {
        let (block, opening) = CodeBlock::new("rust,no_run");
        assert_eq!(block.language, "rust");
        assert_eq!(
            opening,
            "<pre data-language=\"rust\"><code data-language=\"rust\">"
        );
    }

    #[test]
    fn empty_fence_has_no_language_attribute() {
        let (_, opening) = CodeBlock::new("");
        assert_eq!(opening, "<pre><code>");
    }

    #[test]
    fn unknown_language_falls_back_to_plain_text() {
        let (block, _) = CodeBlock::new("definitely-not-a-language");
        let html = block.highlight("plain words\n").unwrap();
        assert!(html.contains("plain words"));
    }

    #[test]
    fn highlighting_escapes_html_in_code() {
        let (block, _) = CodeBlock::new("html");
        let html = block.highlight("<script>alert(1)</script>\n").unwrap();
        // Tokens land in separate spans, so check the escapes rather than a
        // contiguous escaped tag.
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;"));
        assert!(html.contains("&gt;"));
    }
}
