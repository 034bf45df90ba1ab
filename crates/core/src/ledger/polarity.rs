//! Transaction polarity.
//!
//! A category is either income or expense, and every transaction inherits
//! that polarity when it is written. Polarity is the only thing that decides
//! the sign of a transaction's effect on its account.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::LedgerError;

/// Whether money flows into (income) or out of (expense) an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    /// Increases the account balance.
    Income,
    /// Decreases the account balance.
    Expense,
}

impl Polarity {
    /// Returns the wire/storage name of this polarity.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }

    /// Signed effect of a positive `amount` on an account balance.
    #[must_use]
    pub fn signed(self, amount: Decimal) -> Decimal {
        match self {
            Self::Income => amount,
            Self::Expense => -amount,
        }
    }

    /// The effect that exactly undoes `self.signed(amount)`.
    #[must_use]
    pub fn reversal(self, amount: Decimal) -> Decimal {
        -self.signed(amount)
    }
}

impl fmt::Display for Polarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Polarity {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            other => Err(LedgerError::InvalidArgument(format!(
                "type must be 'income' or 'expense', got '{other}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_signed_effect() {
        assert_eq!(Polarity::Income.signed(dec!(100.00)), dec!(100.00));
        assert_eq!(Polarity::Expense.signed(dec!(30.00)), dec!(-30.00));
    }

    #[test]
    fn test_parse() {
        assert_eq!("income".parse::<Polarity>().unwrap(), Polarity::Income);
        assert_eq!(" expense ".parse::<Polarity>().unwrap(), Polarity::Expense);
        assert!(matches!(
            "transfer".parse::<Polarity>(),
            Err(LedgerError::InvalidArgument(_))
        ));
        assert!("Income".parse::<Polarity>().is_err());
    }

    #[test]
    fn test_serde_uses_lowercase_names() {
        assert_eq!(serde_json::to_string(&Polarity::Expense).unwrap(), "\"expense\"");
        let parsed: Polarity = serde_json::from_str("\"income\"").unwrap();
        assert_eq!(parsed, Polarity::Income);
    }

    fn polarity() -> impl Strategy<Value = Polarity> {
        prop_oneof![Just(Polarity::Income), Just(Polarity::Expense)]
    }

    proptest! {
        #[test]
        fn prop_reversal_cancels_effect(
            polarity in polarity(),
            cents in 1i64..1_000_000_000i64,
        ) {
            let amount = Decimal::new(cents, 2);
            prop_assert_eq!(polarity.signed(amount) + polarity.reversal(amount), Decimal::ZERO);
        }

        #[test]
        fn prop_income_positive_expense_negative(
            polarity in polarity(),
            cents in 1i64..1_000_000_000i64,
        ) {
            let effect = polarity.signed(Decimal::new(cents, 2));
            match polarity {
                Polarity::Income => prop_assert!(effect > Decimal::ZERO),
                Polarity::Expense => prop_assert!(effect < Decimal::ZERO),
            }
        }
    }
}
