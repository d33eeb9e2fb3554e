//! Markdown rendering for article bodies.
//!
//! One pass over the pulldown-cmark event stream splits off the YAML front
//! matter, routes fenced code blocks through the syntect stage, auto-links
//! bare URLs in plain text and leaves raw embedded HTML untouched. A second
//! pass gives headings stable, slugified ids.
use pulldown_cmark::{CodeBlockKind, Event, LinkType, Options, Parser, Tag, TagEnd};
use rustc_hash::FxHashMap;

use super::highlight::CodeBlock;

/// A rendered markdown document: the raw front matter text and the body HTML.
pub struct RenderedDocument {
    pub front_matter: String,
    pub html: String,
}

/// Renders one markdown document.
///
/// The only fallible stage is syntax highlighting; callers isolate that
/// failure per post.
pub fn render_document(content: &str) -> Result<RenderedDocument, syntect::Error> {
    let mut options = Options::empty();
    options.insert(
        Options::ENABLE_YAML_STYLE_METADATA_BLOCKS
            | Options::ENABLE_HEADING_ATTRIBUTES
            | Options::ENABLE_TABLES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS,
    );

    let mut front_matter = String::new();
    let mut in_frontmatter = false;
    let mut in_indented_code = false;
    // Depth of link/image nesting; text inside either must not be autolinked.
    let mut no_autolink_depth = 0usize;
    let mut code_block: Option<CodeBlock> = None;
    let mut code_block_content = String::new();
    let mut events = Vec::new();

    for (event, _) in Parser::new_ext(content, options).into_offset_iter() {
        match event {
            Event::Start(Tag::MetadataBlock(_)) => in_frontmatter = true,
            Event::End(TagEnd::MetadataBlock(_)) => in_frontmatter = false,
            Event::Text(ref text) => {
                if in_frontmatter {
                    front_matter.push_str(text);
                } else if code_block.is_some() {
                    code_block_content.push_str(text);
                } else if no_autolink_depth == 0
                    && !in_indented_code
                    && (text.contains("http://") || text.contains("https://"))
                {
                    autolink_text(text, &mut events);
                } else {
                    events.push(event);
                }
            }
            Event::Start(Tag::CodeBlock(ref kind)) => match kind {
                CodeBlockKind::Fenced(fence) => {
                    let (block, begin) = CodeBlock::new(fence);
                    code_block = Some(block);
                    events.push(Event::Html(begin.into()));
                }
                CodeBlockKind::Indented => {
                    in_indented_code = true;
                    events.push(event);
                }
            },
            Event::End(TagEnd::CodeBlock) => {
                if let Some(block) = code_block.take() {
                    let html = block.highlight(&code_block_content)?;
                    code_block_content.clear();
                    events.push(Event::Html(html.into()));
                    events.push(Event::Html("</code></pre>\n".into()));
                } else {
                    in_indented_code = false;
                    events.push(event);
                }
            }
            Event::Start(Tag::Link { .. }) | Event::Start(Tag::Image { .. }) => {
                no_autolink_depth += 1;
                events.push(event);
            }
            Event::End(TagEnd::Link) | Event::End(TagEnd::Image) => {
                no_autolink_depth = no_autolink_depth.saturating_sub(1);
                events.push(event);
            }
            _ => events.push(event),
        }
    }

    let events = assign_heading_ids(events);

    let mut html = String::new();
    pulldown_cmark::html::push_html(&mut html, events.into_iter());

    Ok(RenderedDocument { front_matter, html })
}

/// Splits a text event around bare `http(s)://` URLs, emitting link events
/// for each one.
fn autolink_text<'a>(text: &str, events: &mut Vec<Event<'a>>) {
    let mut rest = text;

    while let Some((before, url, after)) = split_first_url(rest) {
        if !before.is_empty() {
            events.push(Event::Text(before.to_string().into()));
        }
        events.push(Event::Start(Tag::Link {
            link_type: LinkType::Autolink,
            dest_url: url.to_string().into(),
            title: "".into(),
            id: "".into(),
        }));
        events.push(Event::Text(url.to_string().into()));
        events.push(Event::End(TagEnd::Link));
        rest = after;
    }

    if !rest.is_empty() {
        events.push(Event::Text(rest.to_string().into()));
    }
}

fn split_first_url(text: &str) -> Option<(&str, &str, &str)> {
    let mut search_from = 0;

    while let Some(found) = text[search_from..].find("http") {
        let start = search_from + found;
        let candidate = &text[start..];

        let scheme_len = if candidate.starts_with("https://") {
            Some("https://".len())
        } else if candidate.starts_with("http://") {
            Some("http://".len())
        } else {
            None
        };

        let boundary_ok = start == 0
            || text[..start]
                .chars()
                .next_back()
                .is_some_and(|c| !c.is_alphanumeric());

        if let Some(scheme_len) = scheme_len
            && boundary_ok
        {
            let end = candidate
                .find(|c: char| c.is_whitespace() || c == '<' || c == '>')
                .unwrap_or(candidate.len());
            let url = candidate[..end].trim_end_matches(['.', ',', ';', ':', '!', '?', ')', '"', '\'']);

            // A bare scheme with nothing after it is not a link.
            if url.len() > scheme_len {
                return Some((&text[..start], url, &text[start + url.len()..]));
            }
        }

        search_from = start + "http".len();
    }

    None
}

fn assign_heading_ids(events: Vec<Event<'_>>) -> Vec<Event<'_>> {
    let mut seen: FxHashMap<String, usize> = FxHashMap::default();
    let mut out = Vec::with_capacity(events.len());

    let mut i = 0;
    while i < events.len() {
        if let Event::Start(Tag::Heading {
            level, id, classes, ..
        }) = &events[i]
        {
            let end = events[i + 1..]
                .iter()
                .position(|event| matches!(event, Event::End(TagEnd::Heading(_))))
                .map(|offset| i + 1 + offset);
            let text = end
                .map(|end| collect_text(&events[i + 1..end]))
                .unwrap_or_default();

            let heading_id = match id {
                Some(id) => id.to_string(),
                None => unique_slug(&text, &mut seen),
            };
            let class_attr = if classes.is_empty() {
                String::new()
            } else {
                let classes: Vec<&str> = classes.iter().map(|class| class.as_ref()).collect();
                format!(" class=\"{}\"", classes.join(" "))
            };

            out.push(Event::Html(
                format!("<{} id=\"{}\"{}>", level, heading_id, class_attr).into(),
            ));
        } else {
            out.push(events[i].clone());
        }
        i += 1;
    }

    out
}

fn collect_text(events: &[Event]) -> String {
    let mut text = String::new();
    for event in events {
        match event {
            Event::Text(chunk) | Event::Code(chunk) => text += chunk,
            _ => continue,
        }
    }
    text
}

fn unique_slug(text: &str, seen: &mut FxHashMap<String, usize>) -> String {
    let base = slug::slugify(text);
    let base = if base.is_empty() {
        "section".to_string()
    } else {
        base
    };

    let count = seen.entry(base.clone()).or_insert(0);
    *count += 1;
    if *count == 1 {
        base
    } else {
        format!("{}-{}", base, *count - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(content: &str) -> RenderedDocument {
        render_document(content).unwrap()
    }

    #[test]
    fn splits_front_matter_from_body() {
        let doc = render("---\ntitle: Hello\ndate: 2024-01-01\n---\n\nBody text.");
        assert!(doc.front_matter.contains("title: Hello"));
        assert!(doc.html.contains("<p>Body text.</p>"));
        assert!(!doc.html.contains("title: Hello"));
    }

    #[test]
    fn raw_html_passes_through() {
        let doc = render("Before\n\n<div class=\"aside\">kept as-is</div>\n\nAfter");
        assert!(doc.html.contains("<div class=\"aside\">kept as-is</div>"));
    }

    #[test]
    fn bare_urls_become_links() {
        let doc = render("See https://example.com/docs. Or not.");
        assert!(
            doc.html
                .contains("<a href=\"https://example.com/docs\">https://example.com/docs</a>")
        );
        // The trailing period stays outside the link.
        assert!(doc.html.contains("</a>. Or not."));
    }

    #[test]
    fn urls_inside_explicit_links_are_left_alone() {
        let doc = render("[link](https://example.com) and text https://other.example");
        assert_eq!(doc.html.matches("<a ").count(), 2);
        assert!(doc.html.contains("href=\"https://example.com\""));
        assert!(doc.html.contains("href=\"https://other.example\""));
    }

    #[test]
    fn urls_in_code_are_not_linked() {
        let doc = render("Inline `https://example.com` code.\n\n```\nhttps://example.com\n```\n");
        assert!(!doc.html.contains("<a "));
    }

    #[test]
    fn fenced_code_blocks_are_highlighted() {
        let doc = render("```rust\nfn main() {}\n```\n");
        assert!(doc.html.contains("<pre data-language=\"rust\""));
        // syntect output: spans with inline styles instead of raw text.
        assert!(doc.html.contains("<span style="));
        assert!(doc.html.contains("</code></pre>"));
    }

    #[test]
    fn headings_get_deduplicated_slug_ids() {
        let doc = render("# Setup\n\n## Setup\n\n## Notes & Caveats\n");
        assert!(doc.html.contains("<h1 id=\"setup\">"));
        assert!(doc.html.contains("<h2 id=\"setup-1\">"));
        assert!(doc.html.contains("<h2 id=\"notes-caveats\">"));
    }

    #[test]
    fn explicit_heading_ids_win() {
        let doc = render("# Setup {#custom}\n");
        assert!(doc.html.contains("<h1 id=\"custom\">"));
    }
}
