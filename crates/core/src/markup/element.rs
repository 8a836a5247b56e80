//! Tolerant parser for a single HTML element string.
//!
//! Produces the tag name, the attributes and the raw inner markup of the
//! first element in the input. Anything that does not start with an element
//! (text, comments, closing tags, an unterminated start tag) yields an empty
//! [`ParsedElement`]; callers treat an empty tag name as "not found".

use std::ops::Range;

use indexmap::IndexMap;

/// Elements that never have content.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

/// Attribute map preserving source order. Keys are case-sensitive; a repeated
/// name keeps its first position and its last value.
pub type Attributes = IndexMap<String, String>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedElement {
    pub tag_name: String,
    pub attributes: Attributes,
    pub inner_markup: String,
}

impl ParsedElement {
    /// True when nothing was parsed.
    pub fn is_empty(&self) -> bool {
        self.tag_name.is_empty()
    }

    /// Attribute value by name, ignoring ASCII case.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Parse the first element of `html`. Never fails; see the module docs.
pub fn parse_element(html: &str) -> ParsedElement {
    match Cursor::new(html.trim_start()).element() {
        Some(element) => element,
        None => {
            tracing::trace!(len = html.len(), "Markup is not an element");
            ParsedElement::default()
        }
    }
}

/// Serialize attributes as `key="value"` pairs separated by single spaces.
/// Double quotes inside values become single quotes.
pub fn to_attribute_string(attributes: &Attributes) -> String {
    attributes
        .iter()
        .map(|(key, value)| format!(r#"{key}="{}""#, value.replace('"', "'")))
        .collect::<Vec<_>>()
        .join(" ")
}

struct Cursor<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, s: &str) -> bool {
        if self.rest().starts_with(s) {
            self.pos += s.len();
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        while self.peek().is_some_and(&pred) {
            self.bump();
        }
        &self.src[start..self.pos]
    }

    fn element(mut self) -> Option<ParsedElement> {
        if !self.eat("<") || !self.peek().is_some_and(|c| c.is_ascii_alphabetic()) {
            return None;
        }
        let tag_name = self
            .take_while(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | ':' | '.'))
            .to_string();

        let mut attributes = Attributes::new();
        let self_closing = loop {
            self.skip_whitespace();
            if self.eat("/>") {
                break true;
            }
            if self.eat(">") {
                break false;
            }
            if self.peek().is_none() {
                // Start tag never terminated.
                return None;
            }
            match self.attribute() {
                Some((name, value, closes)) => {
                    attributes.insert(name, value);
                    if closes {
                        break true;
                    }
                }
                None => {
                    // Stray character such as a lone quote or slash.
                    self.bump();
                }
            }
        };

        let inner_markup = if self_closing {
            String::new()
        } else {
            self.inner(&tag_name)
        };

        Some(ParsedElement {
            tag_name,
            attributes,
            inner_markup,
        })
    }

    /// One `name`, `name=value`, `name="value"` or `name='value'` pair.
    ///
    /// The flag is set when an unquoted value ran into `/>`, which closes
    /// the tag.
    fn attribute(&mut self) -> Option<(String, String, bool)> {
        let name = self.take_while(|c| !c.is_whitespace() && !matches!(c, '=' | '>' | '/' | '"' | '\''));
        if name.is_empty() {
            return None;
        }
        let name = name.to_string();

        self.skip_whitespace();
        if !self.eat("=") {
            return Some((name, String::new(), false));
        }
        self.skip_whitespace();

        match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.bump();
                let value = self.take_while(|c| c != quote);
                // Unterminated quotes swallow the rest of the tag.
                self.bump();
                Some((name, decode_entities(value), false))
            }
            _ => {
                let value = self.take_while(|c| !c.is_whitespace() && c != '>');
                match value.strip_suffix('/') {
                    Some(stripped) if self.eat(">") => Some((name, decode_entities(stripped), true)),
                    _ => Some((name, decode_entities(value), false)),
                }
            }
        }
    }

    /// Markup between the start tag and its matching end tag. Without an end
    /// tag, void elements are empty and other elements own the rest.
    fn inner(&self, tag_name: &str) -> String {
        let rest = self.rest();
        match find_end_tag(rest, tag_name) {
            Some(end_tag) => rest[..end_tag.start].to_string(),
            None if is_void(tag_name) => String::new(),
            None => rest.trim_end().to_string(),
        }
    }
}

fn is_void(tag_name: &str) -> bool {
    VOID_ELEMENTS
        .iter()
        .any(|v| v.eq_ignore_ascii_case(tag_name))
}

/// Span of the `</tag_name>` closing an element whose start tag ends right
/// before `haystack`. Nested same-name elements are balanced, so siblings
/// after the element are never included. Matching is ASCII case-insensitive
/// and allows whitespace before the closing `>`.
pub(super) fn find_end_tag(haystack: &str, tag_name: &str) -> Option<Range<usize>> {
    let lowered = haystack.to_ascii_lowercase();
    let name = tag_name.to_ascii_lowercase();
    let mut depth = 1usize;
    let mut pos = 0;

    while let Some(offset) = lowered[pos..].find('<') {
        let start = pos + offset;
        let after = &lowered[start + 1..];
        if let Some(tail) = after.strip_prefix('/').and_then(|t| t.strip_prefix(name.as_str())) {
            let trimmed = tail.trim_start();
            if trimmed.starts_with('>') {
                depth -= 1;
                if depth == 0 {
                    let end = lowered.len() - trimmed.len() + 1;
                    return Some(start..end);
                }
            }
        } else if let Some(tail) = after.strip_prefix(name.as_str()) {
            let is_start_tag = tail.starts_with(|c: char| c.is_whitespace() || c == '>' || c == '/');
            let self_closing = tail.find('>').is_some_and(|gt| tail[..gt].ends_with('/'));
            if is_start_tag && !self_closing {
                depth += 1;
            }
        }
        pos = start + 1;
    }
    None
}

/// Decode the predefined XML entities and numeric character references.
fn decode_entities(value: &str) -> String {
    if !value.contains('&') {
        return value.to_string();
    }

    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let decoded = rest.find(';').and_then(|semi| {
            let entity = &rest[1..semi];
            let c = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                _ => entity
                    .strip_prefix("#x")
                    .or_else(|| entity.strip_prefix("#X"))
                    .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                    .or_else(|| entity.strip_prefix('#').and_then(|dec| dec.parse().ok()))
                    .and_then(char::from_u32),
            };
            c.map(|c| (c, semi))
        });
        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &rest[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}
