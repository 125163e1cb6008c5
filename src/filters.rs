//! Presentation helpers for rendering pages.
//!
//! Pure functions over plain values; call them from whatever renders your
//! HTML.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

static MEDIA_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"<figure[\S\s]+?</figure>|",
        r"<object[\S\s]+?</object>|",
        r"<video[\S\s]+?</video>|",
        r"<audio[\S\s]+?</audio>|",
        r"<iframe[\S\s]+?</iframe>|",
        r"<(?:img|embed)[^>]+>",
    ))
    .unwrap_or_else(|e| panic!("media tag pattern: {e}"))
});

/// How long ago `date` was, relative to `today`.
///
/// ```rust
/// use chrono::NaiveDate;
/// use warden::filters::days_since;
///
/// let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
/// assert_eq!(days_since(NaiveDate::from_ymd_opt(2024, 3, 9).unwrap(), today), "yesterday");
/// assert_eq!(days_since(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(), today), "9 days ago");
/// ```
///
/// Future dates are printed in full, e.g. `March 12, 2024`.
pub fn days_since(date: NaiveDate, today: NaiveDate) -> String {
    match (today - date).num_days() {
        n if n > 1 => format!("{n} days ago"),
        1 => "yesterday".to_owned(),
        0 => "today".to_owned(),
        _ => date.format("%B %d, %Y").to_string(),
    }
}

/// Shortens a URL for display: drops the scheme and one trailing slash, then
/// truncates to `letter_count` characters, the last being `…`.
pub fn humanize_url(url: &str, letter_count: usize) -> String {
    let url = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url);
    let url = url.strip_suffix('/').unwrap_or(url);

    if url.chars().count() <= letter_count {
        return url.to_owned();
    }
    let mut short: String = url.chars().take(letter_count.saturating_sub(1)).collect();
    short.push('…');
    short
}

/// The first embedded media element in an HTML fragment: a `figure`,
/// `object`, `video`, `audio` or `iframe` element, or an `img` / `embed` tag.
pub fn first_media(html: &str) -> Option<&str> {
    MEDIA_TAG.find(html).map(|m| m.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn days_since_buckets() {
        let today = date(2024, 3, 10);
        assert_eq!(days_since(today, today), "today");
        assert_eq!(days_since(date(2024, 3, 9), today), "yesterday");
        assert_eq!(days_since(date(2024, 2, 29), today), "10 days ago");
        assert_eq!(days_since(date(2024, 3, 12), today), "March 12, 2024");
    }

    #[test]
    fn humanize_strips_scheme_and_slash() {
        assert_eq!(humanize_url("https://example.org/", 40), "example.org");
        assert_eq!(humanize_url("http://example.org/a/", 40), "example.org/a");
        assert_eq!(humanize_url("ftp://example.org", 40), "ftp://example.org");
    }

    #[test]
    fn humanize_truncates_on_characters() {
        assert_eq!(humanize_url("https://example.org/articles/", 10), "example.o…");
        assert_eq!(humanize_url("https://ünïcödé.example", 5), "ünïc…");
        assert_eq!(humanize_url("https://example.org", 11), "example.org");
    }

    #[test]
    fn first_media_finds_earliest_tag() {
        let html = r#"<p>intro</p><img src="a.png" alt=""><video src="b.mp4"></video>"#;
        assert_eq!(first_media(html), Some(r#"<img src="a.png" alt="">"#));

        let html = "<p>x</p><iframe src=\"v\">\n</iframe><img src=\"a\">";
        assert_eq!(first_media(html), Some("<iframe src=\"v\">\n</iframe>"));

        assert_eq!(first_media("<p>no media</p>"), None);
    }
}
