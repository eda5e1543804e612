//! State machine trait for status enums.
//!
//! Ledger entry statuses (and any future lifecycle enum) describe their legal
//! moves here so that a terminal status can never be rewritten.

use super::ValidationError;

/// Trait for status enums that represent state machines.
///
/// ```ignore
/// impl StateMachine for LedgerStatus {
///     fn can_transition_to(&self, target: &Self) -> bool {
///         matches!((self, target), (Pending, Approved) | (Pending, Rejected))
///     }
///
///     fn valid_transitions(&self) -> Vec<Self> {
///         match self {
///             Pending => vec![Approved, Rejected],
///             Approved | Rejected => vec![],
///         }
///     }
/// }
///
/// let settled = entry.status.transition_to(LedgerStatus::Approved)?;
/// ```
pub trait StateMachine: Sized + Copy + PartialEq + std::fmt::Debug {
    /// Returns true if transition from self to target is valid.
    fn can_transition_to(&self, target: &Self) -> bool;

    /// Returns all valid target states from current state.
    fn valid_transitions(&self) -> Vec<Self>;

    /// Performs transition with validation, returning error if invalid.
    fn transition_to(&self, target: Self) -> Result<Self, ValidationError> {
        if self.can_transition_to(&target) {
            Ok(target)
        } else {
            Err(ValidationError::invalid_transition(self, target))
        }
    }

    /// Checks if current state is terminal (no valid outgoing transitions).
    fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::payment::LedgerStatus;

    #[test]
    fn pending_settles_either_way() {
        assert_eq!(
            LedgerStatus::Pending.transition_to(LedgerStatus::Approved),
            Ok(LedgerStatus::Approved)
        );
        assert_eq!(
            LedgerStatus::Pending.transition_to(LedgerStatus::Rejected),
            Ok(LedgerStatus::Rejected)
        );
    }

    #[test]
    fn settled_status_cannot_be_rewritten() {
        for settled in [LedgerStatus::Approved, LedgerStatus::Rejected] {
            for target in [LedgerStatus::Pending, LedgerStatus::Approved, LedgerStatus::Rejected] {
                let err = settled.transition_to(target).unwrap_err();
                assert!(matches!(err, ValidationError::InvalidTransition { .. }));
            }
        }
    }

    #[test]
    fn only_pending_has_exits() {
        assert!(!LedgerStatus::Pending.is_terminal());
        assert!(LedgerStatus::Approved.is_terminal());
        assert!(LedgerStatus::Rejected.is_terminal());
    }
}
