//! Culqi webhook event types.
//!
//! Payloads are arbitrary JSON. Only the event id, the type, and
//! `data.object.metadata.userId` are read; everything else is ignored and
//! any missing piece simply makes the event a no-op.

use serde_json::Value;
use sha2::{Digest, Sha256};

use super::WebhookError;

/// Gateway notification (simplified).
///
/// Fields with an unexpected JSON type are treated as absent.
#[derive(Debug, Clone)]
pub struct GatewayEvent {
    /// Gateway event id, used as the deduplication key when present.
    pub id: Option<String>,

    /// Type of event (e.g. "subscription.charge.succeeded").
    pub event_type: Option<String>,

    pub data: Option<Value>,

    dedup_key: String,
}

/// What the reconciler should do with an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventAction {
    /// Subscription event for a known user id.
    ExtendSubscription { user_id: String },
    /// Anything else; acknowledged without side effects.
    Ignore { reason: &'static str },
}

impl GatewayEvent {
    /// Parses a raw webhook body.
    ///
    /// # Errors
    ///
    /// `ParseError` when the body is not a JSON object.
    pub fn parse(payload: &[u8]) -> Result<Self, WebhookError> {
        let value: Value =
            serde_json::from_slice(payload).map_err(|e| WebhookError::ParseError(e.to_string()))?;
        if !value.is_object() {
            return Err(WebhookError::ParseError("expected a JSON object".to_string()));
        }
        let text = |key: &str| value.get(key).and_then(Value::as_str).map(str::to_string);
        let id = text("id");
        let event_type = text("type");
        let dedup_key = match id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => content_key(payload),
        };
        Ok(Self {
            id,
            event_type,
            data: value.get("data").cloned(),
            dedup_key,
        })
    }

    /// Event id, or a digest of the raw body when the gateway sent none.
    pub fn dedup_key(&self) -> &str {
        &self.dedup_key
    }

    pub fn event_type(&self) -> &str {
        self.event_type.as_deref().unwrap_or("unknown")
    }

    pub fn is_subscription_event(&self) -> bool {
        self.event_type
            .as_deref()
            .is_some_and(|t| t.starts_with("subscription"))
    }

    /// `data.object.metadata.userId`, when it is a non-empty string.
    pub fn metadata_user_id(&self) -> Option<&str> {
        self.data
            .as_ref()?
            .get("object")?
            .get("metadata")?
            .get("userId")?
            .as_str()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn action(&self) -> EventAction {
        if !self.is_subscription_event() {
            return EventAction::Ignore {
                reason: "not a subscription event",
            };
        }
        match self.metadata_user_id() {
            Some(user_id) => EventAction::ExtendSubscription {
                user_id: user_id.to_string(),
            },
            None => EventAction::Ignore {
                reason: "missing metadata.userId",
            },
        }
    }
}

fn content_key(payload: &[u8]) -> String {
    let digest = Sha256::digest(payload);
    let hex: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
    format!("sha256:{}", hex)
}
