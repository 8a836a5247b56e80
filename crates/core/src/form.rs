//! Form definitions and the rules that govern them.
//!
//! A form belongs to one site (tenant) and is optionally bound to a channel
//! and a content item. `content_id == 0` marks a reusable form that is not
//! tied to a single content item; only those take part in site-wide
//! ordering when inserted.

use std::cmp::Reverse;

use chrono::Months;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Maximum length of a form title in characters (column is `VARCHAR(200)`).
pub const MAX_TITLE_LENGTH: usize = 200;

/// Maximum length of a form description in characters (column is `VARCHAR(200)`).
pub const MAX_DESCRIPTION_LENGTH: usize = 200;

/// Length of the default submission window for newly created forms.
pub const DEFAULT_WINDOW_MONTHS: u32 = 3;

/// Title of the form seeded when a site has no unbound forms.
pub const DEFAULT_FORM_TITLE: &str = "Default form";

/// Description of the seeded default form.
pub const DEFAULT_FORM_DESCRIPTION: &str = "Default form created by the system";

/// Label used for forms bound to a content item instead of their title.
pub const CONTENT_FORM_LABEL: &str = "Form management";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A form definition as held by the definition cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormDefinition {
    pub id: DbId,
    pub site_id: DbId,
    pub channel_id: DbId,
    pub content_id: DbId,
    pub title: String,
    pub description: String,
    /// Display order ("taxis"). Zero means unordered.
    pub taxis: i32,
    pub is_timeout: bool,
    pub time_to_start: Timestamp,
    pub time_to_end: Timestamp,
    /// Opaque serialized configuration.
    pub settings: String,
    pub total_count: i64,
    pub replied_count: i64,
}

impl FormDefinition {
    /// Whether the form is bound to neither a channel nor a content item.
    pub fn is_unbound(&self) -> bool {
        self.channel_id == 0 && self.content_id == 0
    }
}

/// Input for inserting a new form.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewForm {
    pub site_id: DbId,
    pub channel_id: DbId,
    pub content_id: DbId,
    pub title: String,
    pub description: String,
    pub is_timeout: bool,
    pub time_to_start: Timestamp,
    pub time_to_end: Timestamp,
    pub settings: String,
}

impl NewForm {
    /// An untitled form bound to `(site, channel, content)`.
    pub fn for_content(site_id: DbId, channel_id: DbId, content_id: DbId, now: Timestamp) -> Self {
        let (time_to_start, time_to_end) = default_window(now);
        Self {
            site_id,
            channel_id,
            content_id,
            title: String::new(),
            description: String::new(),
            is_timeout: false,
            time_to_start,
            time_to_end,
            settings: String::new(),
        }
    }

    /// The default unbound form seeded for a site.
    pub fn site_default(site_id: DbId, now: Timestamp) -> Self {
        Self {
            title: DEFAULT_FORM_TITLE.to_string(),
            description: DEFAULT_FORM_DESCRIPTION.to_string(),
            ..Self::for_content(site_id, 0, 0, now)
        }
    }

    /// Whether the insert takes part in site-wide ordering.
    pub fn is_ordered(&self) -> bool {
        self.content_id == 0
    }
}

/// The subset of form settings the core reads. Everything else in the
/// settings blob is ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormSettings {
    pub is_reply: bool,
}

impl FormSettings {
    /// Parse the settings blob, falling back to defaults for empty or
    /// malformed input.
    pub fn parse(raw: &str) -> Self {
        if raw.trim().is_empty() {
            return Self::default();
        }
        serde_json::from_str(raw).unwrap_or_else(|e| {
            tracing::debug!(error = %e, "Unreadable form settings, using defaults");
            Self::default()
        })
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a form title: must be non-empty and within the column limit.
pub fn validate_title(title: &str) -> Result<(), CoreError> {
    if title.trim().is_empty() {
        return Err(CoreError::Validation(
            "Form title must not be empty".to_string(),
        ));
    }
    let len = title.chars().count();
    if len > MAX_TITLE_LENGTH {
        return Err(CoreError::Validation(format!(
            "Form title exceeds maximum length of {MAX_TITLE_LENGTH} characters (got {len})"
        )));
    }
    Ok(())
}

/// Validate a form description: length check only (can be empty).
pub fn validate_description(description: &str) -> Result<(), CoreError> {
    let len = description.chars().count();
    if len > MAX_DESCRIPTION_LENGTH {
        return Err(CoreError::Validation(format!(
            "Form description exceeds maximum length of {MAX_DESCRIPTION_LENGTH} characters (got {len})"
        )));
    }
    Ok(())
}

/// Validate a submission window: the end must not precede the start.
pub fn validate_window(start: Timestamp, end: Timestamp) -> Result<(), CoreError> {
    if end < start {
        return Err(CoreError::Validation(
            "Form window end must not be before its start".to_string(),
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Ordering
// ---------------------------------------------------------------------------

/// Sort key for descending display: a zero taxis counts as the maximum so
/// legacy, unordered forms stay at the front of listings.
pub fn display_key(taxis: i32) -> i32 {
    if taxis == 0 {
        i32::MAX
    } else {
        taxis
    }
}

/// Stable descending sort by [`display_key`].
pub fn sort_for_display(forms: &mut [FormDefinition]) {
    forms.sort_by_key(|f| Reverse(display_key(f.taxis)));
}

/// Forms of one channel, in display order.
pub fn channel_view(forms: &[FormDefinition], channel_id: DbId) -> Vec<FormDefinition> {
    let mut view: Vec<FormDefinition> = forms
        .iter()
        .filter(|f| f.channel_id == channel_id)
        .cloned()
        .collect();
    sort_for_display(&mut view);
    view
}

/// Taxis assigned to a newly inserted ordered form, given the site's current maximum.
pub fn next_taxis(current_max: Option<i32>) -> i32 {
    current_max.unwrap_or(0) + 1
}

/// Default submission window starting at `now`.
pub fn default_window(now: Timestamp) -> (Timestamp, Timestamp) {
    let end = now
        .checked_add_months(Months::new(DEFAULT_WINDOW_MONTHS))
        .unwrap_or(now);
    (now, end)
}

// ---------------------------------------------------------------------------
// Labels
// ---------------------------------------------------------------------------

/// Administration label: `"{title} ({total})"`, highlighted when replies are
/// enabled and some submissions are still unanswered.
pub fn title_label(form: Option<&FormDefinition>) -> String {
    let Some(form) = form else {
        return format!("{CONTENT_FORM_LABEL} (0)");
    };

    let name = if form.content_id > 0 {
        CONTENT_FORM_LABEL
    } else {
        form.title.as_str()
    };
    let text = format!("{name} ({})", form.total_count);

    if FormSettings::parse(&form.settings).is_reply && form.total_count - form.replied_count > 0 {
        format!(r#"<span class="text-danger">{text}</span>"#)
    } else {
        text
    }
}

// ---------------------------------------------------------------------------
// Default fields
// ---------------------------------------------------------------------------

/// Field types understood by the renderer.
pub const FIELD_TYPE_TEXT: &str = "Text";
pub const FIELD_TYPE_TEXT_AREA: &str = "TextArea";
pub const FIELD_TYPE_RADIO: &str = "Radio";

/// A field seeded into the site default form.
#[derive(Debug, Clone, PartialEq)]
pub struct DefaultField {
    pub title: &'static str,
    pub placeholder: &'static str,
    pub field_type: &'static str,
    pub required: bool,
    pub validate_type: Option<&'static str>,
    pub items: &'static [&'static str],
}

impl DefaultField {
    /// Serialized field settings, in the camelCase layout the renderer reads.
    pub fn settings_json(&self) -> String {
        let mut settings = serde_json::json!({
            "isRequired": self.required,
            "isVisibleInList": self.required,
        });
        if let Some(validate) = self.validate_type {
            settings["validateType"] = serde_json::Value::from(validate);
        }
        settings.to_string()
    }
}

/// Fields of the site default form, in display order.
pub fn default_fields() -> Vec<DefaultField> {
    let text = |title, placeholder, validate_type| DefaultField {
        title,
        placeholder,
        field_type: FIELD_TYPE_TEXT,
        required: true,
        validate_type,
        items: &[],
    };

    vec![
        text("Name", "Please enter your name", None),
        text("Mobile", "Please enter your mobile number", Some("Mobile")),
        text("Age", "Please enter your age", Some("Integer")),
        text("City", "Please enter your city", None),
        DefaultField {
            title: "Gender",
            placeholder: "",
            field_type: FIELD_TYPE_RADIO,
            required: true,
            validate_type: None,
            items: &["Male", "Female"],
        },
        DefaultField {
            title: "Message",
            placeholder: "Please enter your message",
            field_type: FIELD_TYPE_TEXT_AREA,
            required: false,
            validate_type: None,
            items: &[],
        },
    ]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
