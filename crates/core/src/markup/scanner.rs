//! Extraction of native form controls from authored HTML.
//!
//! Controls come back grouped by family, not in raw document order: every
//! `input` first, then every `textarea`, then every `select`, each group in
//! document order. Downstream field validation relies on this grouping.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// `input` elements: self-closed, or explicitly closed with text-only content.
static INPUT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<input\s*[^>]*?/>|<input\s*[^>]*?>[^>]*?</input>").expect("valid regex")
});

/// `textarea` elements, same two shapes as inputs.
static TEXTAREA_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<textarea\s*[^>]*?/>|<textarea\s*[^>]*?>[^>]*?</textarea>")
        .expect("valid regex")
});

/// `select` elements up to their closing tag, options and newlines included.
static SELECT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<select\b[\s\S]*?</select>").expect("valid regex"));

/// Control family, in scan order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlKind {
    Input,
    TextArea,
    Select,
}

impl ControlKind {
    pub const SCAN_ORDER: [ControlKind; 3] =
        [ControlKind::Input, ControlKind::TextArea, ControlKind::Select];

    fn pattern(self) -> &'static Regex {
        match self {
            ControlKind::Input => &INPUT_RE,
            ControlKind::TextArea => &TEXTAREA_RE,
            ControlKind::Select => &SELECT_RE,
        }
    }
}

/// A control found in a markup block, with its byte span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlMatch<'a> {
    pub kind: ControlKind,
    pub span: Range<usize>,
    pub markup: &'a str,
}

/// All controls in `html`, grouped input → textarea → select.
pub fn scan_controls(html: &str) -> Vec<ControlMatch<'_>> {
    ControlKind::SCAN_ORDER
        .into_iter()
        .flat_map(|kind| {
            kind.pattern().find_iter(html).map(move |m| ControlMatch {
                kind,
                span: m.range(),
                markup: m.as_str(),
            })
        })
        .collect()
}

/// Element strings of all controls in `html`, in [`scan_controls`] order.
pub fn extract_controls(html: &str) -> Vec<String> {
    scan_controls(html)
        .into_iter()
        .map(|c| c.markup.to_string())
        .collect()
}
