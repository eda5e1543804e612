//! Payment handlers - direct charges and charge history.

mod charge_payment;
mod list_payments;

pub use charge_payment::{ChargePaymentCommand, ChargePaymentHandler, ChargePaymentResult};
pub use list_payments::ListPaymentsHandler;
