//! ListPaymentsHandler - A user's charge history, newest first.

use std::sync::Arc;

use crate::domain::foundation::UserId;
use crate::domain::payment::{LedgerEntry, TransactionError};
use crate::ports::{TransactionLedger, UserRepository};

pub struct ListPaymentsHandler {
    ledger: Arc<dyn TransactionLedger>,
    users: Arc<dyn UserRepository>,
}

impl ListPaymentsHandler {
    pub fn new(ledger: Arc<dyn TransactionLedger>, users: Arc<dyn UserRepository>) -> Self {
        Self { ledger, users }
    }

    pub async fn handle(&self, user_id: &str) -> Result<Vec<LedgerEntry>, TransactionError> {
        let user_id = UserId::new(user_id)?;
        if self.users.find_by_id(&user_id).await?.is_none() {
            return Err(TransactionError::user_not_found(user_id));
        }
        Ok(self.ledger.list_by_user(&user_id).await?)
    }
}
