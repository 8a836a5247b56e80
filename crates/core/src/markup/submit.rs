//! Rewiring of a form's submit control.
//!
//! The submit control is the first element carrying `role="submit"`, or
//! failing that `id="submit"`. Three element shapes are tried for each
//! attribute, in order:
//!
//! 1. an `input` start tag,
//! 2. any self-closed element (`<x ... />`),
//! 3. any element together with its matching end tag.
//!
//! The located element is replaced by position, so identical copies of it
//! elsewhere in the markup are left alone.

use std::ops::Range;

use regex::Regex;

use super::element::{find_end_tag, parse_element, to_attribute_string, Attributes};

/// Placeholder `href` for rewired controls.
pub const NO_OP_HREF: &str = "javascript:;";

/// Attribute values that mark the submit control.
const SUBMIT_MARKERS: [(&str, &str); 2] = [("role", "submit"), ("id", "submit")];

/// Locate the submit control in `html`.
pub fn locate_submit(html: &str) -> Option<Range<usize>> {
    SUBMIT_MARKERS
        .iter()
        .find_map(|(attr, value)| locate_by_attribute(html, attr, value))
}

/// Locate the first element whose `attr` equals `value`, trying the three
/// shapes described in the module docs.
pub fn locate_by_attribute(html: &str, attr: &str, value: &str) -> Option<Range<usize>> {
    let matcher = AttributeMatcher::new(attr, value);
    matcher
        .input(html)
        .or_else(|| matcher.self_closed(html))
        .or_else(|| matcher.paired(html))
}

/// Replace the submit control in `markup` with an anonymous copy whose
/// `onclick` runs `click_action`.
///
/// `href` becomes [`NO_OP_HREF`], any previous `onclick` is dropped and `id`
/// and `name` are removed so several copies of a form can share a page.
/// Returns `false` and leaves `markup` untouched when no control is found.
pub fn rewrite_submit(markup: &mut String, click_action: &str) -> bool {
    let Some(span) = locate_submit(markup) else {
        return false;
    };

    let element = parse_element(&markup[span.clone()]);
    if element.is_empty() {
        tracing::debug!(
            element = &markup[span.clone()],
            "Submit control could not be parsed"
        );
        return false;
    }

    let mut attributes = Attributes::new();
    for (name, value) in &element.attributes {
        let name = name.to_ascii_lowercase();
        match name.as_str() {
            "href" => {
                attributes.insert(name, NO_OP_HREF.to_string());
            }
            "onclick" | "id" | "name" => {}
            _ => {
                attributes.insert(name, value.clone());
            }
        }
    }
    attributes.insert("onclick".to_string(), click_action.to_string());
    if element.tag_name.eq_ignore_ascii_case("a") {
        attributes.insert("href".to_string(), NO_OP_HREF.to_string());
    }

    let tag = &element.tag_name;
    let attrs = to_attribute_string(&attributes);
    let rebuilt = if element.inner_markup.is_empty() {
        format!("<{tag} {attrs}/>")
    } else {
        format!("<{tag} {attrs}>{}</{tag}>", element.inner_markup)
    };

    markup.replace_range(span, &rebuilt);
    true
}

struct AttributeMatcher {
    input: Regex,
    self_closed: Regex,
    paired_start: Regex,
}

impl AttributeMatcher {
    fn new(attr: &str, value: &str) -> Self {
        let attr = regex::escape(attr);
        let value = regex::escape(value);
        let assign = format!(r#"{attr}\s*=\s*("{value}"|'{value}'|{value})"#);
        let build = |pattern: String| Regex::new(&pattern).expect("escaped pattern is valid");

        Self {
            input: build(format!(r"(?i)<input\s*[^>]*?{assign}.*?>")),
            self_closed: build(format!(r"(?i)<\w+\s*[^>]*?{assign}[^>]*/\s*>")),
            paired_start: build(format!(r"(?i)<(\w+)\s[^>]*?{assign}")),
        }
    }

    fn input(&self, html: &str) -> Option<Range<usize>> {
        self.input.find(html).map(|m| m.range())
    }

    fn self_closed(&self, html: &str) -> Option<Range<usize>> {
        self.self_closed.find(html).map(|m| m.range())
    }

    /// An element through the end tag carrying its full name. Nested
    /// elements of the same name are balanced.
    fn paired(&self, html: &str) -> Option<Range<usize>> {
        let mut from = 0;
        while let Some(caps) = self.paired_start.captures_at(html, from) {
            let whole = caps.get(0)?;
            let tag_name = caps.get(1)?.as_str();

            if let Some(gt) = html[whole.end()..].find('>') {
                let body_start = whole.end() + gt + 1;
                if let Some(end_tag) = find_end_tag(&html[body_start..], tag_name) {
                    return Some(whole.start()..body_start + end_tag.end);
                }
            }

            from = whole.start() + 1;
        }
        None
    }
}
