//! Account-related types for the account ledger
//!
//! Accounts are owned entirely by the storage backend. The core never caches
//! balances across requests; these types only describe what the backend holds.

/// Account identifier
pub type AccountId = u32;

/// Balance or transfer amount in minor currency units
///
/// Signed so that a debit below zero can be detected before it is written.
pub type Amount = i64;

/// Snapshot of a single account row
///
/// Produced by storage backends for inspection and reporting. Holding an
/// `Account` does not reserve anything; the value may be stale as soon as it
/// is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Account {
    /// The account ID
    pub id: AccountId,

    /// Current balance in minor units
    pub balance: Amount,
}

impl Account {
    /// Create an account snapshot
    pub fn new(id: AccountId, balance: Amount) -> Self {
        Account { id, balance }
    }
}

/// Check whether crediting `amount` to `balance` stays representable
///
/// Returns the new balance, or `None` when the addition would wrap.
pub fn checked_credit(balance: Amount, amount: Amount) -> Option<Amount> {
    balance.checked_add(amount)
}

/// Check whether debiting `amount` from `balance` leaves a non-negative balance
///
/// Returns the new balance, or `None` when the result would be negative or
/// unrepresentable.
pub fn checked_debit(balance: Amount, amount: Amount) -> Option<Amount> {
    balance.checked_sub(amount).filter(|after| *after >= 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::plain(100, 40, Some(140))]
    #[case::to_max(Amount::MAX - 1, 1, Some(Amount::MAX))]
    #[case::overflow(Amount::MAX, 1, None)]
    #[case::overflow_large(Amount::MAX - 10, 11, None)]
    fn test_checked_credit(#[case] balance: Amount, #[case] amount: Amount, #[case] expected: Option<Amount>) {
        assert_eq!(checked_credit(balance, amount), expected);
    }

    #[rstest]
    #[case::plain(100, 40, Some(60))]
    #[case::to_zero(40, 40, Some(0))]
    #[case::below_zero(40, 41, None)]
    #[case::from_zero(0, 1, None)]
    fn test_checked_debit(#[case] balance: Amount, #[case] amount: Amount, #[case] expected: Option<Amount>) {
        assert_eq!(checked_debit(balance, amount), expected);
    }

    #[test]
    fn test_account_new() {
        let account = Account::new(5, 250);
        assert_eq!(account.id, 5);
        assert_eq!(account.balance, 250);
    }
}
