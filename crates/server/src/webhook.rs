//! Inbound Twilio webhook route.
//!
//! `POST /whatsapp` receives the form-encoded message, optionally verifies
//! the `X-Twilio-Signature` header, runs the dialogue engine under the
//! sender's session lock and answers with TwiML. Malformed payloads still
//! get a 200 apology reply so Twilio delivers something to the customer.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use secrecy::{ExposeSecret, SecretString};
use tracing::{error, warn};

use zafra_core::config::WhatsappConfig;
use zafra_core::dialogue::render;
use zafra_core::{DialogueEngine, Reply, SessionStore};
use zafra_whatsapp::{message_response, verify_signature, TwilioWebhook};

const SIGNATURE_HEADER: &str = "X-Twilio-Signature";

#[derive(Clone)]
pub struct WebhookState {
    sessions: Arc<dyn SessionStore>,
    engine: Arc<DialogueEngine>,
    signature: Option<SignatureSettings>,
}

#[derive(Clone)]
struct SignatureSettings {
    auth_token: SecretString,
    public_url: String,
}

impl WebhookState {
    /// Config validation guarantees the token and public URL are present
    /// whenever `validate_signature` is set, so the `None` arms only cover
    /// a hand-built state.
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        engine: Arc<DialogueEngine>,
        whatsapp: &WhatsappConfig,
    ) -> Self {
        let signature = if whatsapp.validate_signature {
            match (&whatsapp.auth_token, &whatsapp.public_url) {
                (Some(auth_token), Some(public_url)) => Some(SignatureSettings {
                    auth_token: auth_token.clone(),
                    public_url: format!("{}/whatsapp", public_url.trim_end_matches('/')),
                }),
                _ => None,
            }
        } else {
            None
        };
        Self { sessions, engine, signature }
    }
}

pub fn router(state: WebhookState) -> Router {
    Router::new().route("/whatsapp", post(inbound)).with_state(state)
}

async fn inbound(
    State(state): State<WebhookState>,
    headers: HeaderMap,
    body: String,
) -> Response {
    if let Some(settings) = &state.signature {
        if let Err(response) = check_signature(settings, &headers, &body) {
            return response;
        }
    }

    let webhook: TwilioWebhook = match serde_urlencoded::from_str(&body) {
        Ok(webhook) => webhook,
        Err(parse_error) => {
            error!(
                event_name = "webhook.payload_malformed",
                error = %parse_error,
                "webhook form payload did not decode; answering with apology"
            );
            return twiml(&Reply::single(render::apology()));
        }
    };

    let message = webhook.into_inbound();
    let handle = state.sessions.entry(&message.address).await;
    let mut session = handle.lock().await;
    let reply = state.engine.handle(&mut session, &message).await;
    twiml(&reply)
}

fn check_signature(
    settings: &SignatureSettings,
    headers: &HeaderMap,
    body: &str,
) -> Result<(), Response> {
    let Some(header) = headers.get(SIGNATURE_HEADER).and_then(|value| value.to_str().ok())
    else {
        warn!(event_name = "webhook.signature_missing", "request carried no signature header");
        return Err(StatusCode::FORBIDDEN.into_response());
    };

    let params: Vec<(String, String)> = serde_urlencoded::from_str(body).unwrap_or_default();
    verify_signature(settings.auth_token.expose_secret(), &settings.public_url, &params, header)
        .map_err(|rejection| {
            warn!(
                event_name = "webhook.signature_rejected",
                reason = %rejection,
                "request signature rejected"
            );
            StatusCode::FORBIDDEN.into_response()
        })
}

fn twiml(reply: &Reply) -> Response {
    ([(axum::http::header::CONTENT_TYPE, "text/xml")], message_response(reply)).into_response()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use tower::util::ServiceExt;

    use zafra_core::config::WhatsappConfig;
    use zafra_core::memory::{demo_catalog, InMemoryCartStore, InMemoryReservationStore};
    use zafra_core::{CommerceService, DialogueEngine, MemorySessionStore};

    use super::{router, WebhookState};

    fn demo_state(whatsapp: &WhatsappConfig) -> WebhookState {
        let catalog = Arc::new(demo_catalog());
        let commerce = CommerceService::new(
            catalog.clone(),
            Arc::new(InMemoryCartStore::default()),
            Arc::new(InMemoryReservationStore::default()),
        );
        WebhookState::new(
            Arc::new(MemorySessionStore::new()),
            Arc::new(DialogueEngine::new(catalog, commerce)),
            whatsapp,
        )
    }

    fn open_config() -> WhatsappConfig {
        WhatsappConfig { auth_token: None, public_url: None, validate_signature: false }
    }

    fn signing_config() -> WhatsappConfig {
        WhatsappConfig {
            auth_token: Some("test-auth-token".to_string().into()),
            public_url: Some("https://bot.example.com".to_string()),
            validate_signature: true,
        }
    }

    fn form_request(body: &'static str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/whatsapp")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .expect("request builds")
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body reads");
        String::from_utf8(bytes.to_vec()).expect("body is utf-8")
    }

    #[tokio::test]
    async fn greeting_gets_a_twiml_menu() {
        let app = router(demo_state(&open_config()));

        let response = app
            .oneshot(form_request("From=whatsapp%3A%2B5215511112222&Body=hola"))
            .await
            .expect("handler runs");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok()),
            Some("text/xml")
        );
        let body = body_text(response).await;
        assert!(body.starts_with("<?xml"));
        assert!(body.contains("<Response><Message>"));
        assert!(body.contains("Zafra"));
    }

    #[tokio::test]
    async fn conversation_state_survives_across_requests() {
        let app = router(demo_state(&open_config()));

        let first = app
            .clone()
            .oneshot(form_request("From=whatsapp%3A%2B5215511112222&Body=1"))
            .await
            .expect("handler runs");
        assert!(body_text(first).await.contains("Cotizaci"));

        let second = app
            .oneshot(form_request("From=whatsapp%3A%2B5215511112222&Body=ZAF001%202"))
            .await
            .expect("handler runs");
        let body = body_text(second).await;
        assert!(body.contains("Harina de Trigo 44kg"));
    }

    #[tokio::test]
    async fn malformed_payload_still_answers_with_an_apology() {
        let app = router(demo_state(&open_config()));

        let response = app.oneshot(form_request("From=%zz")).await.expect("handler runs");

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_text(response).await;
        assert!(body.contains("Ocurrió un error"));
    }

    #[tokio::test]
    async fn missing_signature_is_forbidden_when_validation_is_on() {
        let app = router(demo_state(&signing_config()));

        let response = app
            .oneshot(form_request("From=whatsapp%3A%2B5215511112222&Body=hola"))
            .await
            .expect("handler runs");

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn wrong_signature_is_forbidden_when_validation_is_on() {
        let app = router(demo_state(&signing_config()));

        let request = Request::builder()
            .method("POST")
            .uri("/whatsapp")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header("X-Twilio-Signature", "AAAAAAAAAAAAAAAAAAAAAAAAAAA=")
            .body(Body::from("From=whatsapp%3A%2B5215511112222&Body=hola"))
            .expect("request builds");

        let response = app.oneshot(request).await.expect("handler runs");
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
