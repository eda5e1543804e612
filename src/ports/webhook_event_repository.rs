//! WebhookEventRepository port - deduplication of gateway notifications.
//!
//! The gateway redelivers a notification whenever it does not receive a 2xx
//! in time, so the same event can arrive several times and even concurrently.
//! A delivery first *claims* the event key; only the claimant applies the
//! effect, then marks the claim finished. A claim whose processing failed is
//! released so that the redelivery can try again. A claim left `Processing`
//! past its lease (the claimant crashed) can be taken over by a redelivery.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, Timestamp};

/// Lifecycle of a claimed event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventStatus {
    /// Claimed, effect not applied yet.
    Processing,
    Succeeded,
    Ignored,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Processing => "processing",
            EventStatus::Succeeded => "succeeded",
            EventStatus::Ignored => "ignored",
        }
    }

    pub fn from_storage(raw: &str) -> Option<Self> {
        match raw {
            "processing" => Some(EventStatus::Processing),
            "succeeded" => Some(EventStatus::Succeeded),
            "ignored" => Some(EventStatus::Ignored),
            _ => None,
        }
    }
}

/// Record of a received webhook event.
#[derive(Debug, Clone, PartialEq)]
pub struct WebhookEventRecord {
    /// Gateway event id, or a content digest when the event carried none.
    pub event_key: String,
    pub event_type: String,
    pub status: EventStatus,
    /// Ignore reason, for auditing.
    pub detail: Option<String>,
    pub received_at: Timestamp,
    /// When the current claimant took the event; renewed on takeover.
    pub claimed_at: Timestamp,
    pub payload: serde_json::Value,
}

impl WebhookEventRecord {
    /// A fresh claim.
    pub fn processing(
        event_key: impl Into<String>,
        event_type: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        let now = Timestamp::now();
        Self {
            event_key: event_key.into(),
            event_type: event_type.into(),
            status: EventStatus::Processing,
            detail: None,
            received_at: now,
            claimed_at: now,
            payload,
        }
    }
}

/// Result of attempting to claim an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimResult {
    /// First delivery, or takeover of an expired claim; the caller owns the
    /// event.
    Claimed,
    /// Another delivery already claimed it; carries its status.
    AlreadyClaimed(EventStatus),
}

#[async_trait]
pub trait WebhookEventRepository: Send + Sync {
    async fn find_by_key(&self, event_key: &str) -> Result<Option<WebhookEventRecord>, DomainError>;

    /// Inserts the claim unless the key exists.
    ///
    /// An existing `Processing` claim taken before `stale_before` is handed
    /// over to this delivery instead.
    async fn claim(
        &self,
        record: WebhookEventRecord,
        stale_before: Timestamp,
    ) -> Result<ClaimResult, DomainError>;

    /// Marks a claimed event finished.
    async fn complete(
        &self,
        event_key: &str,
        status: EventStatus,
        detail: Option<String>,
    ) -> Result<(), DomainError>;

    /// Deletes a claim that is still `Processing` so redelivery can retry.
    async fn release(&self, event_key: &str) -> Result<(), DomainError>;

    /// Deletes records received before `timestamp`. Returns the count.
    async fn delete_before(&self, timestamp: Timestamp) -> Result<u64, DomainError>;
}

/// Result of webhook processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookResult {
    /// Effect applied.
    Processed,
    /// Acknowledged without effect.
    Ignored,
    /// Duplicate delivery; nothing done.
    AlreadyProcessed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claim_starts_processing() {
        let record = WebhookEventRecord::processing(
            "evt_1",
            "subscription.created",
            serde_json::json!({"id": "evt_1"}),
        );
        assert_eq!(record.status, EventStatus::Processing);
        assert!(record.detail.is_none());
        assert_eq!(record.claimed_at, record.received_at);
    }

    #[test]
    fn status_storage_round_trips() {
        for s in [EventStatus::Processing, EventStatus::Succeeded, EventStatus::Ignored] {
            assert_eq!(EventStatus::from_storage(s.as_str()), Some(s));
        }
    }
}
