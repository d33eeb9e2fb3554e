use maud::{DOCTYPE, Markup, html};

use crate::GENERATOR;

/// Everything the shared shell needs beyond the page body.
pub(super) struct PageChrome<'a> {
    pub title: &'a str,
    /// Href of the stylesheet to link.
    pub stylesheet: &'a str,
    /// Absolute canonical URL, when a base URL is known.
    pub canonical: Option<String>,
}

/// Wraps a page body in the site shell shared by every generated page.
pub(super) fn layout(chrome: &PageChrome, body: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                meta name="generator" content=(GENERATOR);
                title { (chrome.title) }
                @if let Some(canonical) = &chrome.canonical {
                    link rel="canonical" href=(canonical);
                }
                link rel="icon" href="/favicon.svg" type="image/svg+xml";
                link rel="stylesheet" href=(chrome.stylesheet);
            }
            body {
                header.site-header {
                    nav {
                        a.brand href="/" { "~/carnet" }
                        ul.site-nav {
                            li { a href="/#experience" { "Experience" } }
                            li { a href="/#projects" { "Projects" } }
                            li { a href="/posts/" { "Posts" } }
                            li { a href="/#contact" { "Contact" } }
                        }
                    }
                }
                main {
                    (body)
                }
                footer.site-footer {
                    p { "Generated by " (GENERATOR) }
                }
            }
        }
    }
}
