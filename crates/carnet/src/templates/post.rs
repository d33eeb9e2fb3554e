use maud::{Markup, PreEscaped, html};

use crate::content::Post;
use crate::templates::layout::{PageChrome, layout};
use crate::templates::{MonthStyle, format_date};

/// Renders the detail page for one post.
///
/// `base_url` enables the canonical link; the dev server passes `None` since
/// it has no stable public address.
pub fn post_page(post: &Post, stylesheet: &str, base_url: Option<&str>) -> Markup {
    let canonical =
        base_url.map(|base| format!("{}/posts/{}/", base.trim_end_matches('/'), post.slug));

    let body = html! {
        article.post {
            a.back-link href="/posts/" { "← All posts" }
            header {
                h1 { (post.title) }
                p.post-meta {
                    time { (format_date(post.date, MonthStyle::Long)) }
                    @if !post.tags.is_empty() {
                        span.tags {
                            @for tag in &post.tags {
                                span.tag { (tag) }
                            }
                        }
                    }
                }
            }
            div.prose {
                (PreEscaped(&post.body_html))
            }
        }
    };

    layout(
        &PageChrome {
            title: &post.title,
            stylesheet,
            canonical,
        },
        body,
    )
}
