//! cache::parser
//!
//! Markup parser collaborator.
//!
//! # Design
//!
//! The page cache never needs a traversable DOM. It needs four things from a
//! fetched document: the title, the head and body markup, and the outer markup
//! of the first element carrying the wrapper attribute. [`MarkerParser`]
//! extracts exactly those with a handful of regexes and a balanced-tag scan.
//! It is not an HTML parser and does not try to be one.

use regex::Regex;

use crate::host::{ContentRegion, ParsedDocument};

/// Turns raw markup into the structural pieces a page needs.
pub trait MarkupParser: Send + Sync {
    /// Parse `raw`. The returned wrapper region has an empty `page`; the
    /// caller stamps its own key on it.
    fn parse(&self, raw: &str) -> ParsedDocument;
}

/// Regex-driven extractor keyed on one wrapper attribute.
#[derive(Debug, Clone)]
pub struct MarkerParser {
    title: Regex,
    head: Regex,
    body: Regex,
    wrapper_open: Regex,
}

impl MarkerParser {
    /// Build a parser that looks for elements carrying `wrapper_attr`.
    ///
    /// # Errors
    ///
    /// Returns an error if a pattern fails to compile. The attribute is
    /// escaped, so this only happens for pathological inputs.
    pub fn new(wrapper_attr: &str) -> Result<Self, regex::Error> {
        let attr = regex::escape(wrapper_attr);
        Ok(Self {
            title: Regex::new(r"(?is)<title[^>]*>(.*?)</title\s*>")?,
            head: Regex::new(r"(?is)<head(?:\s[^>]*)?>(.*?)</head\s*>")?,
            body: Regex::new(r"(?is)<body(?:\s[^>]*)?>(.*)</body\s*>")?,
            wrapper_open: Regex::new(&format!(
                r#"(?is)<([a-z][a-z0-9-]*)(?:\s[^>]*?)?\s{}(?:\s*=\s*(?:"[^"]*"|'[^']*'|[^\s>]+))?(?:\s[^>]*?)?(/?)>"#,
                attr
            ))?,
        })
    }

    fn wrapper(&self, raw: &str) -> Option<ContentRegion> {
        let open = self.wrapper_open.captures(raw)?;
        let whole = open.get(0)?;
        let tag = open.get(1)?.as_str();
        let self_closing = open.get(2).is_some_and(|m| !m.as_str().is_empty());

        let end = if self_closing {
            whole.end()
        } else {
            balanced_end(raw, tag, whole.end()).unwrap_or(raw.len())
        };

        Some(ContentRegion {
            page: String::new(),
            html: raw[whole.start()..end].to_string(),
        })
    }
}

/// Byte offset just past the tag that closes an element opened before `from`.
fn balanced_end(raw: &str, tag: &str, from: usize) -> Option<usize> {
    let pattern = format!(r"(?is)<(/?){}(?:\s[^>]*?)?(/?)>", regex::escape(tag));
    let tags = Regex::new(&pattern).ok()?;

    let mut depth = 1usize;
    for cap in tags.captures_iter(&raw[from..]) {
        let whole = cap.get(0)?;
        let closing = cap.get(1).is_some_and(|m| !m.as_str().is_empty());
        let self_closing = cap.get(2).is_some_and(|m| !m.as_str().is_empty());

        if closing {
            depth -= 1;
            if depth == 0 {
                return Some(from + whole.end());
            }
        } else if !self_closing {
            depth += 1;
        }
    }
    None
}

impl MarkupParser for MarkerParser {
    fn parse(&self, raw: &str) -> ParsedDocument {
        let capture = |re: &Regex| {
            re.captures(raw)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_string())
        };

        ParsedDocument {
            title: capture(&self.title)
                .map(|t| t.trim().to_string())
                .unwrap_or_default(),
            head: capture(&self.head).unwrap_or_default(),
            body: capture(&self.body).unwrap_or_else(|| raw.to_string()),
            wrapper: self.wrapper(raw),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ATTR: &str = "data-softnav-wrapper";

    fn parser() -> MarkerParser {
        MarkerParser::new(ATTR).unwrap()
    }

    const PAGE: &str = r#"<!doctype html>
<html>
<head><meta charset="utf-8"><title> About us </title></head>
<body class="about">
  <nav>menu</nav>
  <main class="page" data-softnav-wrapper data-softnav-transition="fade">
    <div><div>nested</div></div>
  </main>
  <footer>foot</footer>
</body>
</html>"#;

    #[test]
    fn extracts_title_head_and_body() {
        let doc = parser().parse(PAGE);
        assert_eq!(doc.title, "About us");
        assert!(doc.head.contains("<meta charset=\"utf-8\">"));
        assert!(doc.body.contains("<nav>menu</nav>"));
        assert!(!doc.body.contains("<body"));
    }

    #[test]
    fn wrapper_spans_balanced_element() {
        let wrapper = parser().parse(PAGE).wrapper.unwrap();
        assert!(wrapper.html.starts_with("<main class=\"page\" data-softnav-wrapper"));
        assert!(wrapper.html.ends_with("</main>"));
        assert!(wrapper.html.contains("<div><div>nested</div></div>"));
        assert!(!wrapper.html.contains("footer"));
        assert!(wrapper.page.is_empty());
    }

    #[test]
    fn nested_same_tag_is_balanced() {
        let raw = r#"<div data-softnav-wrapper><div>a</div><div>b</div></div><div>after</div>"#;
        let wrapper = parser().parse(raw).wrapper.unwrap();
        assert_eq!(wrapper.html, r#"<div data-softnav-wrapper><div>a</div><div>b</div></div>"#);
    }

    #[test]
    fn attribute_with_value_matches() {
        let raw = r#"<section data-softnav-wrapper="main">x</section>"#;
        assert!(parser().parse(raw).wrapper.is_some());
    }

    #[test]
    fn longer_attribute_name_does_not_match() {
        let raw = r#"<section data-softnav-wrapper-old>x</section>"#;
        assert!(parser().parse(raw).wrapper.is_none());
    }

    #[test]
    fn missing_wrapper_is_none() {
        let doc = parser().parse("<html><body><p>plain</p></body></html>");
        assert!(doc.wrapper.is_none());
        assert_eq!(doc.title, "");
    }

    #[test]
    fn fragment_without_body_uses_whole_input() {
        let raw = r#"<main data-softnav-wrapper>only</main>"#;
        let doc = parser().parse(raw);
        assert_eq!(doc.body, raw);
        assert_eq!(doc.wrapper.unwrap().html, raw);
    }

    #[test]
    fn unclosed_wrapper_runs_to_end() {
        let raw = r#"<main data-softnav-wrapper><p>cut off"#;
        assert_eq!(parser().parse(raw).wrapper.unwrap().html, raw);
    }

    #[test]
    fn custom_attribute() {
        let parser = MarkerParser::new("data-region").unwrap();
        let raw = r#"<div data-region="wrapper">x</div>"#;
        assert!(parser.parse(raw).wrapper.is_some());
    }
}
