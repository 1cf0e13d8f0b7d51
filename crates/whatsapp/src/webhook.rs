use serde::Deserialize;

use zafra_core::InboundMessage;

/// Form fields Twilio posts for an inbound WhatsApp message. Everything is
/// optional on the wire; interactive replies carry the `List*`/`Button*`
/// fields alongside (or instead of) free text.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct TwilioWebhook {
    #[serde(rename = "From", default)]
    pub from: String,
    #[serde(rename = "Body", default)]
    pub body: String,
    #[serde(rename = "ListId")]
    pub list_id: Option<String>,
    #[serde(rename = "ListItemId")]
    pub list_item_id: Option<String>,
    #[serde(rename = "ButtonText")]
    pub button_text: Option<String>,
    #[serde(rename = "ButtonPayload")]
    pub button_payload: Option<String>,
}

impl TwilioWebhook {
    /// Channel-normalized message for the dialogue engine. A list selection
    /// only counts when Twilio sent both the list id and the item id.
    pub fn into_inbound(self) -> InboundMessage {
        let list_item_id = match (&self.list_id, self.list_item_id) {
            (Some(_), Some(item)) => Some(item),
            _ => None,
        };
        InboundMessage {
            address: strip_channel_prefix(&self.from).to_string(),
            body: self.body,
            list_item_id,
            button_payload: self.button_payload,
            button_text: self.button_text,
        }
    }
}

fn strip_channel_prefix(from: &str) -> &str {
    from.strip_prefix("whatsapp:").unwrap_or(from)
}
