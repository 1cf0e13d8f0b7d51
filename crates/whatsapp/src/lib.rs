//! Twilio WhatsApp channel adapter.
//!
//! - **Webhook** (`webhook`) - inbound form payload → normalized message
//! - **TwiML** (`twiml`) - reply segments → `<Response>` XML
//! - **Signature** (`signature`) - `X-Twilio-Signature` verification

pub mod signature;
pub mod twiml;
pub mod webhook;

pub use signature::{verify_signature, SignatureRejection};
pub use twiml::message_response;
pub use webhook::TwilioWebhook;
