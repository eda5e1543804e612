//! UnlockContactHandler - Pay to unlock an agent's contact networks.
//!
//! The whole flow runs inside one unlock unit for the (user, agent) pair:
//! the grant check, the gateway call, and the write of the ledger entry plus
//! grant. Concurrent unlocks for the same pair queue on that unit, so the
//! losers observe the winner's grant and never reach the gateway.
//!
//! From the gateway call on, the unit runs on a spawned task. Dropping the
//! request future (timeout, client disconnect) only stops the caller from
//! waiting; the charge is still recorded.

use std::sync::Arc;

use crate::application::charging::{charge_within, ChargeSettings};
use crate::domain::access::AccessGrant;
use crate::domain::foundation::{
    AgentId, DomainError, ErrorCode, LedgerEntryId, Money, Timestamp, UserId,
};
use crate::domain::payment::{LedgerEntry, PaymentKind, PaymentTarget, TransactionError};
use crate::ports::{
    ChargeRequest, PaymentGateway, UnlockOutcome, UnlockStore, UnlockTransaction, UserRepository,
};

/// Command to unlock an agent's contact networks.
#[derive(Debug, Clone)]
pub struct UnlockContactCommand {
    pub agent_id: String,
    pub user_id: String,
    pub payment_source_token: String,
}

/// Result of a successful unlock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnlockContactResult {
    pub ledger_id: LedgerEntryId,
    pub granted: bool,
    pub message: String,
}

/// Everything the detached charge needs, owned.
struct PendingUnlock {
    user_id: UserId,
    agent_id: AgentId,
    email: String,
    price: Money,
    token: String,
}

/// Handler for contact unlocks.
#[derive(Clone)]
pub struct UnlockContactHandler {
    store: Arc<dyn UnlockStore>,
    users: Arc<dyn UserRepository>,
    gateway: Arc<dyn PaymentGateway>,
    settings: ChargeSettings,
}

impl UnlockContactHandler {
    pub fn new(
        store: Arc<dyn UnlockStore>,
        users: Arc<dyn UserRepository>,
        gateway: Arc<dyn PaymentGateway>,
        settings: ChargeSettings,
    ) -> Self {
        Self {
            store,
            users,
            gateway,
            settings,
        }
    }

    pub async fn handle(
        &self,
        cmd: UnlockContactCommand,
    ) -> Result<UnlockContactResult, TransactionError> {
        // 1. Validate input; nothing is touched on failure
        let agent_id = AgentId::new(cmd.agent_id)?;
        let user_id = UserId::new(cmd.user_id)?;
        let token = cmd.payment_source_token.trim();
        if token.is_empty() {
            return Err(TransactionError::invalid_input(
                "payment_source_token",
                "cannot be empty",
            ));
        }

        // 2. Cheap pre-check outside the unit
        self.store
            .find_agent(&agent_id)
            .await?
            .filter(|a| a.is_gated())
            .ok_or_else(|| TransactionError::agent_not_found(agent_id.clone()))?;

        let user = self
            .users
            .find_by_id(&user_id)
            .await?
            .ok_or_else(|| TransactionError::user_not_found(user_id.clone()))?;

        // 3. Open the unit and re-check under it
        let tx = self.store.begin_unlock(&user_id, &agent_id).await?;

        let agent = tx.agent().filter(|a| a.is_gated()).cloned();
        let agent = match agent {
            Some(agent) => agent,
            None => {
                tx.rollback().await?;
                return Err(TransactionError::agent_not_found(agent_id));
            }
        };

        if tx.existing_grant().is_some() {
            tx.rollback().await?;
            tracing::info!(
                user_id = %user_id,
                agent_id = %agent_id,
                "Unlock skipped, grant already exists"
            );
            return Err(TransactionError::already_granted(user_id, agent_id));
        }

        // 4. Charge and commit in a task of their own: once the gateway has
        // been called the outcome must be recorded even if the request is
        // dropped.
        let this = self.clone();
        let unit = PendingUnlock {
            user_id,
            agent_id,
            email: user.email,
            price: agent.price_or(self.settings.default_access_price),
            token: token.to_string(),
        };
        tokio::spawn(async move { this.charge_and_commit(tx, unit).await })
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Unlock task did not finish");
                TransactionError::infrastructure(format!("unlock task failed: {e}"))
            })?
    }

    async fn charge_and_commit(
        &self,
        tx: Box<dyn UnlockTransaction>,
        unit: PendingUnlock,
    ) -> Result<UnlockContactResult, TransactionError> {
        let PendingUnlock {
            user_id,
            agent_id,
            email,
            price,
            token,
        } = unit;
        let now = Timestamp::now();
        let mut entry = LedgerEntry::pending(
            user_id.clone(),
            PaymentTarget::Agent {
                agent_id: agent_id.clone(),
            },
            PaymentKind::OneTime,
            price,
            self.settings.currency.clone(),
            now,
        );

        let request = ChargeRequest {
            amount: price,
            currency: self.settings.currency.clone(),
            source_token: token,
            email,
            description: format!("Contact access agent {}", agent_id),
        };
        let settlement =
            charge_within(self.gateway.as_ref(), request, self.settings.gateway_timeout).await;
        let charge_id = settlement.charge_id().map(str::to_string);

        settlement.apply_to(&mut entry, Timestamp::now())?;

        // 5. Commit ledger entry (+ grant) atomically
        let outcome = if entry.is_approved() {
            let grant = AccessGrant::new(user_id.clone(), agent_id.clone(), entry.id.clone(), now);
            UnlockOutcome::Granted {
                entry: entry.clone(),
                grant,
            }
        } else {
            UnlockOutcome::Rejected {
                entry: entry.clone(),
            }
        };

        if let Err(err) = tx.commit(outcome).await {
            tracing::error!(
                user_id = %user_id,
                agent_id = %agent_id,
                ledger_id = %entry.id,
                charge_id = ?charge_id,
                status = entry.status.as_str(),
                error = %err,
                "Unlock commit failed after gateway call, nothing persisted"
            );
            return Err(commit_error(err, user_id, agent_id));
        }

        if let Some(err) = settlement.into_error(&entry) {
            tracing::warn!(
                user_id = %user_id,
                agent_id = %agent_id,
                ledger_id = %entry.id,
                reason = ?entry.decline_reason,
                "Unlock payment declined"
            );
            return Err(err);
        }

        tracing::info!(
            user_id = %user_id,
            agent_id = %agent_id,
            ledger_id = %entry.id,
            amount = %price,
            "Contact networks unlocked"
        );

        Ok(UnlockContactResult {
            ledger_id: entry.id,
            granted: true,
            message: "Contact networks unlocked".to_string(),
        })
    }
}

fn commit_error(err: DomainError, user_id: UserId, agent_id: AgentId) -> TransactionError {
    match err.code {
        ErrorCode::AlreadyGranted => TransactionError::already_granted(user_id, agent_id),
        _ => err.into(),
    }
}
