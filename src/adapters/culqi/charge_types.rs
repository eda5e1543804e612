//! Culqi charge API payloads.
//!
//! Only the fields the adapter reads are modelled; everything else in the
//! gateway's JSON is ignored.

use serde::{Deserialize, Serialize};

/// Body of `POST /charges`.
#[derive(Debug, Clone, Serialize)]
pub struct CulqiChargePayload<'a> {
    /// Minor units.
    pub amount: i64,
    pub currency_code: &'a str,
    pub source_id: &'a str,
    pub email: &'a str,
    pub description: &'a str,
}

/// Successful charge response.
#[derive(Debug, Clone, Deserialize)]
pub struct CulqiCharge {
    pub id: String,
    #[serde(default)]
    pub outcome: Option<CulqiOutcome>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CulqiOutcome {
    #[serde(rename = "type", default)]
    pub outcome_type: Option<String>,
    #[serde(default)]
    pub user_message: Option<String>,
}

impl CulqiCharge {
    /// `outcome.type`, empty when absent.
    pub fn outcome_type(&self) -> &str {
        self.outcome
            .as_ref()
            .and_then(|o| o.outcome_type.as_deref())
            .unwrap_or("")
    }
}

/// Error body returned with non-2xx statuses.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CulqiErrorBody {
    #[serde(rename = "type", default)]
    pub error_type: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub decline_code: Option<String>,
    #[serde(default)]
    pub merchant_message: Option<String>,
    #[serde(default)]
    pub user_message: Option<String>,
}

impl CulqiErrorBody {
    /// Most specific code the gateway gave.
    pub fn provider_code(&self) -> Option<&str> {
        self.decline_code
            .as_deref()
            .or(self.code.as_deref())
            .or(self.error_type.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_serializes_with_gateway_field_names() {
        let payload = CulqiChargePayload {
            amount: 1500,
            currency_code: "PEN",
            source_id: "tkn_test_123",
            email: "ana@example.com",
            description: "Monthly subscription - user u1",
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["amount"], 1500);
        assert_eq!(json["currency_code"], "PEN");
        assert_eq!(json["source_id"], "tkn_test_123");
    }

    #[test]
    fn charge_response_reads_outcome_type() {
        let json = r#"{
            "object": "charge",
            "id": "chr_test_abc",
            "amount": 1000,
            "outcome": {"type": "venta_exitosa", "code": "AUT0000", "user_message": "Su compra ha sido exitosa."}
        }"#;
        let charge: CulqiCharge = serde_json::from_str(json).unwrap();
        assert_eq!(charge.id, "chr_test_abc");
        assert_eq!(charge.outcome_type(), "venta_exitosa");
    }

    #[test]
    fn charge_without_outcome_has_empty_type() {
        let charge: CulqiCharge = serde_json::from_str(r#"{"id": "chr_1"}"#).unwrap();
        assert_eq!(charge.outcome_type(), "");
    }

    #[test]
    fn error_body_prefers_decline_code() {
        let json = r#"{
            "object": "error",
            "type": "card_error",
            "code": "card_declined",
            "decline_code": "stolen_card",
            "merchant_message": "La tarjeta fue reportada como robada."
        }"#;
        let body: CulqiErrorBody = serde_json::from_str(json).unwrap();
        assert_eq!(body.provider_code(), Some("stolen_card"));
    }
}
