//! ChargePaymentHandler - Direct charges: subscriptions, products, one-offs.
//!
//! Unlike contact unlocks there is no grant to couple with, so the ledger
//! entry is recorded PENDING before the gateway call and settled afterwards.
//! A charge aimed at an agent requires a GUIDE or ARTISAN agent.

use std::sync::Arc;

use crate::application::charging::{charge_within, ChargeSettings};
use crate::application::handlers::subscription::ExtendSubscriptionHandler;
use crate::domain::foundation::{AgentId, ProductId, Timestamp, UserId};
use crate::domain::payment::{
    AmountPolicy, LedgerEntry, PaymentKind, PaymentTarget, Quote, QuoteRequest, TransactionError,
};
use crate::ports::{
    ChargeRequest, PaymentGateway, ProductCatalog, TransactionLedger, UnlockStore, UserRepository,
};

/// Command to charge a user.
#[derive(Debug, Clone, Default)]
pub struct ChargePaymentCommand {
    pub user_id: String,
    /// Receipt address; the user's stored email when absent.
    pub email: Option<String>,
    /// Raw kind as sent by the client, aliases included.
    pub payment_kind: Option<String>,
    pub source_token: Option<String>,
    pub agent_id: Option<String>,
    pub product_id: Option<String>,
    /// Keep the source token on the user for one-click charges.
    pub save_card: bool,
}

/// Result of an approved charge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChargePaymentResult {
    pub entry: LedgerEntry,
    /// New expiration when the charge was a subscription.
    pub premium_until: Option<Timestamp>,
}

/// Owned inputs of the detached record, charge and settle step.
struct PendingCharge {
    user_id: UserId,
    kind: PaymentKind,
    quote: Quote,
    request_email: String,
    source_token: String,
    save_card: bool,
}

#[derive(Clone)]
pub struct ChargePaymentHandler {
    ledger: Arc<dyn TransactionLedger>,
    users: Arc<dyn UserRepository>,
    agents: Arc<dyn UnlockStore>,
    products: Arc<dyn ProductCatalog>,
    gateway: Arc<dyn PaymentGateway>,
    extend: ExtendSubscriptionHandler,
    policy: AmountPolicy,
    settings: ChargeSettings,
}

impl ChargePaymentHandler {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        ledger: Arc<dyn TransactionLedger>,
        users: Arc<dyn UserRepository>,
        agents: Arc<dyn UnlockStore>,
        products: Arc<dyn ProductCatalog>,
        gateway: Arc<dyn PaymentGateway>,
        extend: ExtendSubscriptionHandler,
        policy: AmountPolicy,
        settings: ChargeSettings,
    ) -> Self {
        Self {
            ledger,
            users,
            agents,
            products,
            gateway,
            extend,
            policy,
            settings,
        }
    }

    /// Validates and prices the charge, then records, charges and settles it.
    ///
    /// Nothing is written until every check passed. From the ledger write on,
    /// the work runs on a spawned task so a dropped request cannot leave the
    /// entry PENDING.
    pub async fn handle(&self, cmd: ChargePaymentCommand) -> Result<ChargePaymentResult, TransactionError> {
        let user_id = UserId::new(cmd.user_id.as_str())?;
        let kind = resolve_kind(cmd.payment_kind.as_deref());
        let agent_id = cmd
            .agent_id
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(AgentId::new)
            .transpose()?;
        let product_id = cmd
            .product_id
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(ProductId::new)
            .transpose()?;

        let user = self
            .users
            .find_by_id(&user_id)
            .await?
            .ok_or_else(|| TransactionError::user_not_found(user_id.clone()))?;

        let provided_token = cmd
            .source_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty());
        let source_token = match (provided_token, kind) {
            (Some(token), _) => token.to_string(),
            (None, PaymentKind::OneClick) => user
                .saved_card_token
                .clone()
                .ok_or_else(|| TransactionError::invalid_input("sourceToken", "no saved card for one-click charge"))?,
            (None, _) => return Err(TransactionError::invalid_input("sourceToken", "cannot be empty")),
        };

        let product = match (kind, product_id.as_ref()) {
            (PaymentKind::Product, Some(id)) => self.products.find_by_id(id).await?,
            _ => None,
        };
        let quote = self.policy.quote(
            kind,
            QuoteRequest {
                user_id: &user_id,
                agent_id: agent_id.as_ref(),
                product_id: product_id.as_ref(),
                product: product.as_ref(),
            },
        )?;

        if let PaymentTarget::Agent { agent_id } = &quote.target {
            self.agents
                .find_agent(agent_id)
                .await?
                .filter(|a| a.is_gated())
                .ok_or_else(|| TransactionError::agent_not_found(agent_id.clone()))?;
        }

        let pending = PendingCharge {
            user_id,
            kind,
            quote,
            request_email: cmd
                .email
                .filter(|e| !e.trim().is_empty())
                .unwrap_or(user.email),
            source_token,
            save_card: cmd.save_card && provided_token.is_some(),
        };
        let this = self.clone();
        tokio::spawn(async move { this.record_and_charge(pending).await })
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Charge task did not finish");
                TransactionError::infrastructure(format!("charge task failed: {e}"))
            })?
    }

    async fn record_and_charge(&self, pending: PendingCharge) -> Result<ChargePaymentResult, TransactionError> {
        let PendingCharge {
            user_id,
            kind,
            quote,
            request_email,
            source_token,
            save_card,
        } = pending;

        let mut entry = LedgerEntry::pending(
            user_id.clone(),
            quote.target,
            kind,
            quote.amount,
            self.settings.currency.clone(),
            Timestamp::now(),
        );
        self.ledger.record(&entry).await?;

        tracing::info!(
            user_id = %user_id,
            ledger_id = %entry.id,
            kind = kind.as_str(),
            amount = %entry.amount,
            "Charging"
        );

        let request = ChargeRequest {
            amount: quote.amount,
            currency: self.settings.currency.clone(),
            source_token: source_token.clone(),
            email: request_email,
            description: quote.description,
        };
        let settlement = charge_within(self.gateway.as_ref(), request, self.settings.gateway_timeout).await;
        settlement.apply_to(&mut entry, Timestamp::now())?;

        if let Err(err) = self.ledger.settle(&entry).await {
            tracing::error!(
                ledger_id = %entry.id,
                charge_id = ?settlement.charge_id(),
                error = %err,
                "Failed to settle ledger entry after gateway call"
            );
            return Err(err.into());
        }

        if let Some(err) = settlement.into_error(&entry) {
            tracing::warn!(user_id = %user_id, ledger_id = %entry.id, error = %err, "Charge declined");
            return Err(err);
        }

        let premium_until = if kind == PaymentKind::Subscription {
            match self.extend.handle(&user_id).await {
                Ok(until) => Some(until),
                Err(err) => {
                    tracing::error!(
                        user_id = %user_id,
                        ledger_id = %entry.id,
                        error = %err,
                        "Approved subscription charge could not extend premium"
                    );
                    return Err(err);
                }
            }
        } else {
            None
        };

        if save_card {
            match self.users.save_card_token(&user_id, &source_token).await {
                Ok(true) => {}
                Ok(false) => tracing::warn!(user_id = %user_id, "User vanished before card could be saved"),
                Err(err) => tracing::warn!(user_id = %user_id, error = %err, "Failed to save card token"),
            }
        }

        tracing::info!(user_id = %user_id, ledger_id = %entry.id, "Charge approved");
        Ok(ChargePaymentResult { entry, premium_until })
    }
}

/// Absent and unrecognized kinds fall back to a one-time charge.
fn resolve_kind(raw: Option<&str>) -> PaymentKind {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => PaymentKind::OneTime,
        Some(raw) => PaymentKind::parse(raw).unwrap_or_else(|| {
            tracing::warn!(payment_kind = raw, "Unknown payment kind, charging as one-time");
            PaymentKind::OneTime
        }),
    }
}
