//! HTML extraction over `scraper` documents.
//!
//! All functions are synchronous and take a parsed [`Html`]; callers parse
//! only after the response body has been read so no `Html` value is held
//! across an await.

use scraper::{ElementRef, Html, Selector};

const HEADINGS: &str = "h1, h2, h3, h4, h5, h6";
const CONTAINERS: &str = "section, article, div, li, td, blockquote";
const MIN_CONTAINER_CHARS: usize = 20;
const MAX_SECTION_CHARS: usize = 800;
const MAX_READABLE_CHARS: usize = 2_000;
pub const MAX_SECTIONS: usize = 3;

fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

/// Visible text of an element with whitespace collapsed.
pub fn element_text(element: &ElementRef) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn page_title(document: &Html) -> String {
    selector("title")
        .and_then(|sel| document.select(&sel).next().map(|el| element_text(&el)))
        .unwrap_or_default()
}

/// Up to [`MAX_SECTIONS`] text blocks mentioning `query` (case-insensitive):
/// matching headings with their next sibling, then paragraphs, then larger
/// containers.
pub fn sections_matching(document: &Html, query: &str) -> Vec<String> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }
    let mut out: Vec<String> = Vec::new();
    let mut push = |text: String| {
        let text = truncate_chars(&text, MAX_SECTION_CHARS);
        if !text.is_empty() && !out.iter().any(|existing| existing.contains(&text)) {
            out.push(text);
        }
    };

    if let Some(sel) = selector(HEADINGS) {
        for heading in document.select(&sel) {
            let text = element_text(&heading);
            if text.to_lowercase().contains(&needle) {
                let following = next_elements(&heading).next().map(|el| element_text(&el));
                match following {
                    Some(next) if !next.is_empty() => push(format!("{text}\n{next}")),
                    _ => push(text),
                }
            }
        }
    }
    if let Some(sel) = selector("p") {
        for para in document.select(&sel) {
            let text = element_text(&para);
            if text.to_lowercase().contains(&needle) {
                push(text);
            }
        }
    }
    if let Some(sel) = selector(CONTAINERS) {
        for el in document.select(&sel) {
            let text = element_text(&el);
            if text.chars().count() > MIN_CONTAINER_CHARS && text.to_lowercase().contains(&needle) {
                push(text);
            }
        }
    }

    out.truncate(MAX_SECTIONS);
    out
}

/// The block anchored on a heading (or bold label) naming `name`: the
/// heading plus up to three following sibling elements.
pub fn person_block(document: &Html, name: &str) -> Option<String> {
    let needle = name.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }
    let sel = selector("h1, h2, h3, h4, h5, h6, strong, b")?;
    let anchor = document
        .select(&sel)
        .find(|el| element_text(el).to_lowercase().contains(&needle))?;

    let mut parts = vec![element_text(&anchor)];
    parts.extend(
        next_elements(&anchor)
            .take(3)
            .map(|el| element_text(&el))
            .filter(|t| !t.is_empty()),
    );
    Some(truncate_chars(&parts.join("\n"), MAX_SECTION_CHARS))
}

/// Readable body text: `article`/`main` first, then paragraph-level blocks.
pub fn readable_text(document: &Html) -> String {
    for css in ["article", "main", "[role=main]"] {
        if let Some(sel) = selector(css) {
            let parts: Vec<String> = document
                .select(&sel)
                .map(|el| element_text(&el))
                .filter(|t| !t.is_empty())
                .collect();
            if !parts.is_empty() {
                return truncate_chars(&parts.join("\n\n"), MAX_READABLE_CHARS);
            }
        }
    }

    let Some(sel) = selector("p, h1, h2, h3, li") else {
        return String::new();
    };
    let mut blocks: Vec<String> = document
        .select(&sel)
        .map(|el| element_text(&el))
        .filter(|t| t.chars().count() > MIN_CONTAINER_CHARS)
        .collect();
    blocks.dedup();
    truncate_chars(&blocks.join("\n\n"), MAX_READABLE_CHARS)
}

fn next_elements<'a>(element: &ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    element.next_siblings().filter_map(ElementRef::wrap)
}

/// Char-boundary-safe prefix of at most `max` chars.
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].trim_end().to_string(),
        None => s.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ABOUT: &str = r#"<html><head><title>About Us | Casto Travel</title></head><body>
        <nav>Home About Contact</nav>
        <h2>Our Story</h2><p>Founded in Silicon Valley in 1980.</p>
        <h3>Maryles Casto</h3>
        <p>Founder and Chairman.</p>
        <p>Started the company after flying with Philippine Airlines.</p>
        <p>Still mentors the team.</p>
        <p>Unrelated closing paragraph.</p>
        <h3>Marc Casto</h3><p>President and CEO.</p>
    </body></html>"#;

    #[test]
    fn title_is_extracted() {
        let doc = Html::parse_document(ABOUT);
        assert_eq!(page_title(&doc), "About Us | Casto Travel");
    }

    #[test]
    fn heading_match_includes_next_sibling() {
        let doc = Html::parse_document(ABOUT);
        let sections = sections_matching(&doc, "our story");
        assert_eq!(sections[0], "Our Story\nFounded in Silicon Valley in 1980.");
    }

    #[test]
    fn sections_are_capped_at_three() {
        let doc = Html::parse_document(ABOUT);
        assert!(sections_matching(&doc, "e").len() <= MAX_SECTIONS);
    }

    #[test]
    fn no_match_is_empty() {
        let doc = Html::parse_document(ABOUT);
        assert!(sections_matching(&doc, "submarine").is_empty());
    }

    #[test]
    fn person_block_takes_heading_and_three_siblings() {
        let doc = Html::parse_document(ABOUT);
        let block = person_block(&doc, "Maryles Casto").unwrap();
        assert!(block.starts_with("Maryles Casto\nFounder and Chairman."));
        assert!(block.contains("Still mentors the team."));
        assert!(!block.contains("Unrelated closing paragraph."));
    }

    #[test]
    fn person_block_missing_name() {
        let doc = Html::parse_document(ABOUT);
        assert!(person_block(&doc, "Elaine Randrup").is_none());
    }

    #[test]
    fn readable_text_prefers_main() {
        let doc = Html::parse_document("<body><nav>menu</nav><main><p>Main body text here.</p></main></body>");
        assert_eq!(readable_text(&doc), "Main body text here.");
    }

    #[test]
    fn truncate_is_char_safe() {
        assert_eq!(truncate_chars("héllo wörld", 4), "héll");
        assert_eq!(truncate_chars("short", 10), "short");
    }
}
