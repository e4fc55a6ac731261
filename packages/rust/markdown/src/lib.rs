//! HTML and Markdown to plain-text normalization.
//!
//! Every indexed document is stored as whitespace-normalized plain text. HTML
//! pages are reduced to the text of their main content region; Markdown files
//! are rendered to HTML with `pulldown-cmark` first and then take the same path.
//!
//! None of these functions fail: malformed markup degrades to partial or empty text.

use std::sync::LazyLock;

use pulldown_cmark::{Options, Parser, html};
use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};
use tracing::trace;

/// Content regions tried in priority order before falling back to the whole document.
const CONTENT_REGIONS: &[&str] = &["main", "article", "#content", "body"];

/// Elements whose text never reaches the index.
const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Elements that get a separator on both sides so neighbouring blocks do not fuse.
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "figcaption",
    "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main",
    "nav", "ol", "p", "pre", "section", "table", "td", "th", "tr", "ul",
];

// ---------------------------------------------------------------------------
// HTML
// ---------------------------------------------------------------------------

/// Extract normalized text from an HTML document or fragment.
///
/// The first of `main`, `article`, `#content`, `body` that yields non-empty
/// text wins; otherwise the text of the whole document is returned.
pub fn html_to_text(html: &str) -> String {
    let doc = Html::parse_document(html);

    for region in CONTENT_REGIONS {
        let Ok(selector) = Selector::parse(region) else {
            continue;
        };
        if let Some(element) = doc.select(&selector).next() {
            let text = element_text(element);
            if !text.is_empty() {
                trace!(region, len = text.len(), "extracted text region");
                return text;
            }
        }
    }

    element_text(doc.root_element())
}

/// Normalized text of a single element subtree.
pub fn element_text(element: ElementRef<'_>) -> String {
    let mut buf = String::new();
    collect_text(element, &mut buf);
    normalize_whitespace(&buf)
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    let name = element.value().name();
    if SKIPPED_ELEMENTS.contains(&name) {
        return;
    }
    let block = BLOCK_ELEMENTS.contains(&name);
    if block {
        out.push('\n');
    }
    for child in element.children() {
        if let Some(child) = ElementRef::wrap(child) {
            collect_text(child, out);
        } else if let Node::Text(text) = child.value() {
            out.push_str(text);
        }
    }
    if block {
        out.push('\n');
    }
}

/// Collapse every whitespace run to a single space and trim both ends.
pub fn normalize_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ---------------------------------------------------------------------------
// Markdown
// ---------------------------------------------------------------------------

/// Render Markdown (GFM tables, strikethrough, task lists) and extract its text.
pub fn markdown_to_text(md: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let mut rendered = String::with_capacity(md.len() * 3 / 2);
    html::push_html(&mut rendered, Parser::new_ext(md, options));

    html_to_text(&rendered)
}

/// Text of the first level-1 ATX heading (`# Title`), if any.
pub fn markdown_title(md: &str) -> Option<String> {
    static H1_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?m)^#\s+(.+)$").expect("valid regex"));

    H1_RE
        .captures(md)
        .map(|c| c[1].trim().trim_end_matches('#').trim().to_string())
        .filter(|t| !t.is_empty())
}

/// ASCII slug: lowercase, non-alphanumeric runs become one `-`, edges trimmed.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;

    for ch in text.chars() {
        let ch = ch.to_ascii_lowercase();
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch);
        } else {
            pending_dash = true;
        }
    }

    slug
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_main_region() {
        let html = r#"<html><body>
            <nav>Home About</nav>
            <main><h1>Layouts</h1><p>Hyvä layouts are XML.</p></main>
            <footer>Copyright</footer>
        </body></html>"#;

        assert_eq!(html_to_text(html), "Layouts Hyvä layouts are XML.");
    }

    #[test]
    fn falls_through_empty_regions() {
        let html = r#"<html><body><main>   </main><div id="content">Checkout flow</div></body></html>"#;
        assert_eq!(html_to_text(html), "Checkout flow");
    }

    #[test]
    fn skips_scripts_and_styles() {
        let html = r#"<body><style>.a{color:red}</style><p>Visible</p>
            <script>var hidden = 1;</script><noscript>nojs</noscript></body>"#;
        assert_eq!(html_to_text(html), "Visible");
    }

    #[test]
    fn block_boundaries_do_not_fuse_words() {
        let html = "<main><p>First</p><p>Second</p><ul><li>a</li><li>b</li></ul></main>";
        assert_eq!(html_to_text(html), "First Second a b");
    }

    #[test]
    fn inline_elements_stay_joined() {
        let html = "<main><p>Alpine<strong>JS</strong> components</p></main>";
        assert_eq!(html_to_text(html), "AlpineJS components");
    }

    #[test]
    fn malformed_html_degrades() {
        assert_eq!(html_to_text("<main><p>Unclosed <b>bold"), "Unclosed bold");
        assert_eq!(html_to_text(""), "");
    }

    #[test]
    fn normalize_collapses_whitespace() {
        assert_eq!(normalize_whitespace("  a\n\n b\t c  "), "a b c");
        assert_eq!(normalize_whitespace(" \n "), "");
    }

    #[test]
    fn markdown_renders_to_text() {
        let md = "# Install\n\nRun `composer require`.\n\n| Key | Value |\n|-----|-------|\n| a | b |\n\n- [x] done\n- ~~old~~ new\n";
        let text = markdown_to_text(md);
        assert!(text.starts_with("Install Run composer require."));
        assert!(text.contains("Key Value a b"));
        assert!(text.contains("done"));
        assert!(text.contains("old new"));
        assert!(!text.contains('|'));
        assert!(!text.contains("~~"));
    }

    #[test]
    fn markdown_title_extraction() {
        assert_eq!(
            markdown_title("intro\n# Checkout Guide\n## Sub"),
            Some("Checkout Guide".to_string())
        );
        assert_eq!(markdown_title("## Only second level"), None);
        assert_eq!(markdown_title("#NoSpace"), None);
    }

    #[test]
    fn slugify_ascii() {
        assert_eq!(slugify("Getting Started!"), "getting-started");
        assert_eq!(slugify("  --Hyvä  Theme 2.0-- "), "hyv-theme-2-0");
        assert_eq!(slugify("???"), "");
    }
}
