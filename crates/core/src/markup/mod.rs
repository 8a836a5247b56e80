//! HTML handling for authored form markup: control extraction, element
//! parsing and submit-control rewiring.
//!
//! The markup comes from a template editor and a known set of native form
//! controls. It is not a general-purpose HTML parser.

pub mod element;
pub mod scanner;
pub mod submit;

pub use element::{parse_element, to_attribute_string, Attributes, ParsedElement};
pub use scanner::{extract_controls, scan_controls, ControlKind, ControlMatch};
pub use submit::{locate_submit, rewrite_submit, NO_OP_HREF};
