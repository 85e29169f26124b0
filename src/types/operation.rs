//! Replayable operations for the bank ledger
//!
//! An operation is one request against the ledger as read from an
//! operations file. Balance operations address accounts by account number;
//! the pipeline resolves numbers to ids before calling the engine.

use super::account::Amount;
use super::user::UserId;
use serde::{Deserialize, Serialize};

/// Operation kinds understood by the replay pipelines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    /// Register a user
    User,

    /// Open an account for an existing user
    Open,

    /// Credit funds to an account
    Deposit,

    /// Debit funds from an account, requires a sufficient balance
    Withdraw,

    /// Move funds between two accounts atomically
    Transfer,
}

impl OperationKind {
    /// Whether this operation changes a balance
    ///
    /// Balance operations may run concurrently in the concurrent pipeline;
    /// directory operations (`user`, `open`) are ordering barriers.
    pub fn mutates_balance(self) -> bool {
        matches!(
            self,
            OperationKind::Deposit | OperationKind::Withdraw | OperationKind::Transfer
        )
    }
}

/// A single validated operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    User {
        first_name: String,
        last_name: String,
    },
    Open {
        account_number: String,
        user_id: UserId,
        display_name: String,
    },
    Deposit {
        account_number: String,
        amount: Amount,
    },
    Withdraw {
        account_number: String,
        amount: Amount,
    },
    Transfer {
        from: String,
        to: String,
        amount: Amount,
    },
}

impl Operation {
    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::User { .. } => OperationKind::User,
            Operation::Open { .. } => OperationKind::Open,
            Operation::Deposit { .. } => OperationKind::Deposit,
            Operation::Withdraw { .. } => OperationKind::Withdraw,
            Operation::Transfer { .. } => OperationKind::Transfer,
        }
    }

    /// Account numbers this operation reads or writes
    ///
    /// `user` touches no account; `open` touches the account it creates.
    pub fn account_numbers(&self) -> Vec<&str> {
        match self {
            Operation::User { .. } => Vec::new(),
            Operation::Open { account_number, .. }
            | Operation::Deposit { account_number, .. }
            | Operation::Withdraw { account_number, .. } => vec![account_number.as_str()],
            Operation::Transfer { from, to, .. } => vec![from.as_str(), to.as_str()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(OperationKind::User, false)]
    #[case(OperationKind::Open, false)]
    #[case(OperationKind::Deposit, true)]
    #[case(OperationKind::Withdraw, true)]
    #[case(OperationKind::Transfer, true)]
    fn test_mutates_balance(#[case] kind: OperationKind, #[case] expected: bool) {
        assert_eq!(kind.mutates_balance(), expected);
    }

    #[test]
    fn test_kind_matches_variant() {
        let op = Operation::Transfer {
            from: "A".to_string(),
            to: "B".to_string(),
            amount: 5,
        };
        assert_eq!(op.kind(), OperationKind::Transfer);
    }

    #[test]
    fn test_account_numbers_cover_every_touched_account() {
        let user = Operation::User {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
        };
        let open = Operation::Open {
            account_number: "A".to_string(),
            user_id: 1,
            display_name: "Main".to_string(),
        };
        let withdraw = Operation::Withdraw {
            account_number: "B".to_string(),
            amount: 1,
        };
        let transfer = Operation::Transfer {
            from: "A".to_string(),
            to: "B".to_string(),
            amount: 5,
        };

        assert!(user.account_numbers().is_empty());
        assert_eq!(open.account_numbers(), vec!["A"]);
        assert_eq!(withdraw.account_numbers(), vec!["B"]);
        assert_eq!(transfer.account_numbers(), vec!["A", "B"]);
    }
}
