//! Row types shared by the PostgreSQL adapters.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use sqlx::types::Json;

use crate::domain::access::{AccessGrant, Agent, AgentRole};
use crate::domain::foundation::{
    AgentId, DomainError, ErrorCode, LedgerEntryId, Money, ProductId, Timestamp, UserId,
};
use crate::domain::payment::{LedgerEntry, LedgerStatus, PaymentKind, PaymentTarget, Product};
use crate::domain::subscription::User;

pub(super) fn db_error(context: &str, e: sqlx::Error) -> DomainError {
    DomainError::new(ErrorCode::DatabaseError, format!("{}: {}", context, e))
}

fn corrupt(what: &str, value: impl std::fmt::Display) -> DomainError {
    DomainError::new(ErrorCode::DatabaseError, format!("Invalid {} value: {}", what, value))
}

fn money(what: &str, minor: i64) -> Result<Money, DomainError> {
    Money::from_minor(minor).map_err(|_| corrupt(what, minor))
}

#[derive(Debug, sqlx::FromRow)]
pub(super) struct AgentRow {
    id: String,
    role: String,
    display_name: String,
    access_price_minor: Option<i64>,
    contact_networks: Json<BTreeMap<String, String>>,
}

impl TryFrom<AgentRow> for Agent {
    type Error = DomainError;

    fn try_from(row: AgentRow) -> Result<Self, Self::Error> {
        Ok(Agent {
            id: AgentId::new(row.id).map_err(|e| corrupt("agent id", e))?,
            role: AgentRole::from(row.role),
            display_name: row.display_name,
            access_price: row
                .access_price_minor
                .map(|minor| money("access_price_minor", minor))
                .transpose()?,
            contact_networks: row.contact_networks.0,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(super) struct GrantRow {
    user_id: String,
    agent_id: String,
    payment_id: String,
    granted_at: DateTime<Utc>,
}

impl TryFrom<GrantRow> for AccessGrant {
    type Error = DomainError;

    fn try_from(row: GrantRow) -> Result<Self, Self::Error> {
        Ok(AccessGrant::new(
            UserId::new(row.user_id).map_err(|e| corrupt("grant user_id", e))?,
            AgentId::new(row.agent_id).map_err(|e| corrupt("grant agent_id", e))?,
            LedgerEntryId::from_string(row.payment_id),
            Timestamp::from_datetime(row.granted_at),
        ))
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(super) struct LedgerRow {
    id: String,
    user_id: String,
    target_type: String,
    agent_id: Option<String>,
    product_id: Option<String>,
    kind: String,
    amount_minor: i64,
    currency: String,
    gateway_charge_id: Option<String>,
    status: String,
    decline_reason: Option<String>,
    created_at: DateTime<Utc>,
    settled_at: Option<DateTime<Utc>>,
}

impl TryFrom<LedgerRow> for LedgerEntry {
    type Error = DomainError;

    fn try_from(row: LedgerRow) -> Result<Self, Self::Error> {
        let agent_id = row
            .agent_id
            .map(AgentId::new)
            .transpose()
            .map_err(|e| corrupt("ledger agent_id", e))?;
        let target = match (row.target_type.as_str(), agent_id, row.product_id) {
            ("agent", Some(agent_id), _) => PaymentTarget::Agent { agent_id },
            ("product", Some(owner_agent_id), Some(product_id)) => PaymentTarget::Product {
                product_id: ProductId::new(product_id).map_err(|e| corrupt("ledger product_id", e))?,
                owner_agent_id,
            },
            ("platform", _, _) => PaymentTarget::Platform,
            (other, _, _) => return Err(corrupt("ledger target", other)),
        };

        Ok(LedgerEntry {
            id: LedgerEntryId::from_string(row.id),
            user_id: UserId::new(row.user_id).map_err(|e| corrupt("ledger user_id", e))?,
            target,
            kind: PaymentKind::from_storage(&row.kind).ok_or_else(|| corrupt("kind", &row.kind))?,
            amount: money("amount_minor", row.amount_minor)?,
            currency: row.currency,
            gateway_charge_id: row.gateway_charge_id,
            status: LedgerStatus::from_storage(&row.status)
                .ok_or_else(|| corrupt("status", &row.status))?,
            decline_reason: row.decline_reason,
            created_at: Timestamp::from_datetime(row.created_at),
            settled_at: row.settled_at.map(Timestamp::from_datetime),
        })
    }
}

/// Column values of a ledger target: `(target_type, agent_id, product_id)`.
pub(super) fn target_columns(target: &PaymentTarget) -> (&'static str, Option<&str>, Option<&str>) {
    match target {
        PaymentTarget::Agent { agent_id } => ("agent", Some(agent_id.as_str()), None),
        PaymentTarget::Product {
            product_id,
            owner_agent_id,
        } => ("product", Some(owner_agent_id.as_str()), Some(product_id.as_str())),
        PaymentTarget::Platform => ("platform", None, None),
    }
}

pub(super) const LEDGER_COLUMNS: &str = "id, user_id, target_type, agent_id, product_id, kind, \
     amount_minor, currency, gateway_charge_id, status, decline_reason, created_at, settled_at";

pub(super) const INSERT_LEDGER: &str = r#"
    INSERT INTO ledger_entries (
        id, user_id, target_type, agent_id, product_id, kind, amount_minor, currency,
        gateway_charge_id, status, decline_reason, created_at, settled_at
    ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
"#;

/// Binds a ledger entry to [`INSERT_LEDGER`].
pub(super) fn bind_ledger_insert<'q>(
    entry: &'q LedgerEntry,
) -> sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments> {
    let (target_type, agent_id, product_id) = target_columns(&entry.target);
    sqlx::query(INSERT_LEDGER)
        .bind(entry.id.as_str())
        .bind(entry.user_id.as_str())
        .bind(target_type)
        .bind(agent_id)
        .bind(product_id)
        .bind(entry.kind.as_str())
        .bind(entry.amount.minor_units())
        .bind(&entry.currency)
        .bind(entry.gateway_charge_id.as_deref())
        .bind(entry.status.as_str())
        .bind(entry.decline_reason.as_deref())
        .bind(*entry.created_at.as_datetime())
        .bind(entry.settled_at.map(|t| *t.as_datetime()))
}

#[derive(Debug, sqlx::FromRow)]
pub(super) struct UserRow {
    id: String,
    email: String,
    role: String,
    is_active: bool,
    is_premium: bool,
    premium_expires_at: Option<DateTime<Utc>>,
    saved_card_token: Option<String>,
}

impl TryFrom<UserRow> for User {
    type Error = DomainError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: UserId::new(row.id).map_err(|e| corrupt("user id", e))?,
            email: row.email,
            role: row.role,
            is_active: row.is_active,
            is_premium: row.is_premium,
            premium_expires_at: row.premium_expires_at.map(Timestamp::from_datetime),
            saved_card_token: row.saved_card_token,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(super) struct ProductRow {
    id: String,
    owner_agent_id: String,
    name: String,
    price_minor: i64,
    available: bool,
}

impl TryFrom<ProductRow> for Product {
    type Error = DomainError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        Ok(Product {
            id: ProductId::new(row.id).map_err(|e| corrupt("product id", e))?,
            owner_agent_id: AgentId::new(row.owner_agent_id)
                .map_err(|e| corrupt("product owner_agent_id", e))?,
            name: row.name,
            price: money("price_minor", row.price_minor)?,
            available: row.available,
        })
    }
}
