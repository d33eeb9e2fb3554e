use maud::{Markup, html};

use crate::content::PostSummary;
use crate::templates::layout::{PageChrome, layout};
use crate::templates::{MonthStyle, format_date_str};

/// Renders the archive page listing every post, newest first.
pub fn archive_page(posts: &[PostSummary], stylesheet: &str) -> Markup {
    let body = html! {
        section.archive {
            h1 { "Posts" }
            ul.post-list {
                @for post in posts {
                    li.post-card {
                        a href=(format!("/posts/{}/", post.slug)) {
                            h2 { (post.title) }
                        }
                        p.post-meta {
                            time { (format_date_str(post.date.as_deref(), MonthStyle::Short)) }
                        }
                        @if !post.excerpt.is_empty() {
                            p.excerpt { (post.excerpt) }
                        }
                    }
                }
            }
        }
    };

    layout(
        &PageChrome {
            title: "Posts",
            stylesheet,
            canonical: None,
        },
        body,
    )
}
