//! Page templates.
//!
//! Hand-built markup for the two article pages, kept close to the rest of
//! the site's utility-class styling so the generated pages blend in.
use chrono::NaiveDate;

mod archive;
mod layout;
mod post;

pub use archive::archive_page;
pub use post::post_page;

/// Month rendering for [`format_date`].
#[derive(Debug, Clone, Copy)]
pub enum MonthStyle {
    Long,
    Short,
}

/// Formats a post date for display. Undated posts render as "Undated".
pub fn format_date(date: Option<NaiveDate>, month: MonthStyle) -> String {
    match date {
        Some(date) => match month {
            MonthStyle::Long => date.format("%B %-d, %Y").to_string(),
            MonthStyle::Short => date.format("%b %-d, %Y").to_string(),
        },
        None => "Undated".to_string(),
    }
}

/// Same as [`format_date`], for consumers that only hold the ISO string of a
/// [`PostSummary`](crate::content::PostSummary). Anything unparsable renders
/// as "Undated".
pub fn format_date_str(date: Option<&str>, month: MonthStyle) -> String {
    format_date(
        date.and_then(|value| NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()),
        month,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::PostSummary;

    fn summary(slug: &str, title: &str, date: Option<&str>) -> PostSummary {
        PostSummary {
            slug: slug.to_string(),
            title: title.to_string(),
            date: date.map(String::from),
            tags: vec!["rust".to_string()],
            excerpt: "teaser".to_string(),
        }
    }

    #[test]
    fn date_formatting() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 5);
        assert_eq!(format_date(date, MonthStyle::Long), "January 5, 2024");
        assert_eq!(format_date(date, MonthStyle::Short), "Jan 5, 2024");
        assert_eq!(format_date(None, MonthStyle::Long), "Undated");
        assert_eq!(format_date_str(Some("bogus"), MonthStyle::Short), "Undated");
        assert_eq!(
            format_date_str(Some("2024-01-05"), MonthStyle::Short),
            "Jan 5, 2024"
        );
    }

    #[test]
    fn archive_page_lists_every_summary() {
        let html = archive_page(
            &[
                summary("first", "First Post", Some("2024-01-01")),
                summary("second", "Second Post", None),
            ],
            "/style.css",
        )
        .into_string();

        assert!(html.contains("href=\"/posts/first/\""));
        assert!(html.contains("First Post"));
        assert!(html.contains("href=\"/posts/second/\""));
        assert!(html.contains("Undated"));
        assert!(html.contains("href=\"/style.css\""));
    }

    #[test]
    fn archive_page_renders_with_zero_posts() {
        let html = archive_page(&[], "/style.css").into_string();
        assert!(html.contains("<!DOCTYPE html>"));
        assert!(!html.contains("post-card"));
    }

    #[test]
    fn post_page_includes_body_and_canonical() {
        let post = crate::content::Post {
            slug: "hello".to_string(),
            title: "Hello".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 2, 1),
            tags: vec!["rust".to_string()],
            excerpt: String::new(),
            body_html: "<p>rendered body</p>".to_string(),
            sort_key: 0,
        };

        let html = post_page(&post, "/assets/site.css", Some("https://example.com/"))
            .into_string();
        assert!(html.contains("<p>rendered body</p>"));
        assert!(html.contains("February 1, 2024"));
        assert!(html.contains("href=\"/assets/site.css\""));
        assert!(html.contains("rel=\"canonical\" href=\"https://example.com/posts/hello/\""));

        let without_base = post_page(&post, "/style.css", None).into_string();
        assert!(!without_base.contains("canonical"));
    }
}
