//! The conversation state machine. One inbound message per call, matched to
//! the sender's session, advanced deterministically.

pub mod engine;
pub mod render;

pub use engine::DialogueEngine;

/// Channel-normalized inbound message. The optional out-of-band fields carry
/// interactive-message selections (list replies, button taps) when the
/// channel supplies them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InboundMessage {
    /// Customer channel identity, `whatsapp:` prefix already stripped.
    pub address: String,
    pub body: String,
    pub list_item_id: Option<String>,
    pub button_payload: Option<String>,
    pub button_text: Option<String>,
}

impl InboundMessage {
    pub fn text(address: impl Into<String>, body: impl Into<String>) -> Self {
        Self { address: address.into(), body: body.into(), ..Self::default() }
    }

    /// The value the option router matches against, resolved in priority
    /// order: list-item id, button payload, button label, free text.
    pub fn selected_option(&self) -> String {
        let raw = self
            .list_item_id
            .as_deref()
            .or(self.button_payload.as_deref())
            .or(self.button_text.as_deref())
            .unwrap_or(&self.body);
        normalize(raw)
    }
}

/// Ordered reply segments. The engine emits a single combined segment today;
/// multi-segment replies are a channel capability, not a core requirement.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reply {
    pub segments: Vec<String>,
}

impl Reply {
    pub fn single(text: impl Into<String>) -> Self {
        Self { segments: vec![text.into()] }
    }
}

pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}
