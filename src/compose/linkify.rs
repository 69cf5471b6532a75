//! Bare-URL → anchor rewriting.

use std::sync::LazyLock;

use regex::Regex;

static ANCHOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<a\b[^>]*>.*?</a>").expect("anchor regex is valid")
});
static BARE_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\b(?:https?://|www\.)[^\s<>"']+"#).expect("bare url regex is valid")
});

const TRAILING: &[char] = &['.', ',', ';', ':', '!', '?'];

/// Wrap every bare URL in `text` in a new-tab anchor. Text inside existing
/// `<a>` elements is left untouched.
pub fn linkify(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for anchor in ANCHOR_RE.find_iter(text) {
        out.push_str(&linkify_plain(&text[last..anchor.start()]));
        out.push_str(anchor.as_str());
        last = anchor.end();
    }
    out.push_str(&linkify_plain(&text[last..]));
    out
}

fn linkify_plain(text: &str) -> String {
    BARE_URL_RE
        .replace_all(text, |caps: &regex::Captures| {
            let raw = &caps[0];
            let (url, tail) = split_trailing(raw);
            let href = if url.to_ascii_lowercase().starts_with("www.") {
                format!("https://{url}")
            } else {
                url.to_string()
            };
            format!(r#"<a href="{href}" target="_blank" rel="noopener noreferrer">{url}</a>{tail}"#)
        })
        .into_owned()
}

/// Split sentence punctuation (and an unbalanced closing paren) off the end.
fn split_trailing(raw: &str) -> (&str, &str) {
    let mut end = raw.len();
    loop {
        let head = &raw[..end];
        match head.chars().last() {
            Some(c) if TRAILING.contains(&c) => end -= c.len_utf8(),
            Some(')') if !head.contains('(') => end -= 1,
            _ => break,
        }
    }
    raw.split_at(end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_url_becomes_new_tab_anchor() {
        assert_eq!(
            linkify("See https://www.castotravel.com/about-us/ for more."),
            r#"See <a href="https://www.castotravel.com/about-us/" target="_blank" rel="noopener noreferrer">https://www.castotravel.com/about-us/</a> for more."#
        );
    }

    #[test]
    fn trailing_punctuation_stays_outside() {
        let out = linkify("Visit https://castotravel.ph.");
        assert!(out.ends_with("</a>."));
        assert!(out.contains(r#"href="https://castotravel.ph""#));
    }

    #[test]
    fn www_host_gets_https_href() {
        let out = linkify("(www.castotravel.com)");
        assert!(out.contains(r#"href="https://www.castotravel.com""#));
        assert!(out.ends_with("</a>)"));
    }

    #[test]
    fn existing_anchor_untouched() {
        let input = r#"<a href="https://a.test/">https://a.test/</a> and https://b.test/"#;
        let out = linkify(input);
        assert!(out.starts_with(r#"<a href="https://a.test/">https://a.test/</a> and "#));
        assert_eq!(out.matches("<a ").count(), 2);
    }

    #[test]
    fn text_without_urls_unchanged() {
        assert_eq!(linkify("no links here"), "no links here");
    }
}
