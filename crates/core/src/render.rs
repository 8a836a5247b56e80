//! Turning a template fragment into the markup embedded for one form.

use serde::Serialize;

use crate::markup::{extract_controls, rewrite_submit};
use crate::types::DbId;

/// Element id of the container a form is rendered into.
pub fn container_id(site_id: DbId, channel_id: DbId, content_id: DbId) -> String {
    format!("stl_form_{site_id}_{channel_id}_{content_id}")
}

/// Click handler wired onto the submit control of the form in `container_id`.
pub fn click_action(container_id: &str) -> String {
    format!("stlFormSubmit('{container_id}')")
}

/// Script returned to the embedding frame after a submission.
pub fn post_message_script(
    site_id: DbId,
    channel_id: DbId,
    content_id: DbId,
    is_success: bool,
) -> String {
    let container_id = container_id(site_id, channel_id, content_id);
    format!(
        "<script>window.parent.postMessage({{containerId: '{container_id}', isSuccess: {is_success}}}, '*');</script>"
    )
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedForm {
    pub container_id: String,
    pub html: String,
    /// Native controls of the fragment, grouped input, textarea, select.
    pub controls: Vec<String>,
    /// Whether a submit control was found and rewired.
    pub submit_rewired: bool,
}

/// Prepare `fragment` for the form bound to `(site, channel, content)`.
///
/// Controls are collected from the fragment as authored. The submit control
/// is then rewired to the container's click action and the result wrapped
/// in the container element.
pub fn prepare(fragment: &str, site_id: DbId, channel_id: DbId, content_id: DbId) -> RenderedForm {
    let container_id = container_id(site_id, channel_id, content_id);
    let controls = extract_controls(fragment);

    let mut markup = fragment.to_string();
    let submit_rewired = rewrite_submit(&mut markup, &click_action(&container_id));
    if !submit_rewired {
        tracing::debug!(%container_id, "Template has no submit control");
    }

    RenderedForm {
        html: format!(r#"<div id="{container_id}">{markup}</div>"#),
        container_id,
        controls,
        submit_rewired,
    }
}
