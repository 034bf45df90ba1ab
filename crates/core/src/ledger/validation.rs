//! Input validation for ledger operations.
//!
//! Everything here runs before a unit of work is opened, so malformed input
//! never touches storage.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::error::LedgerError;
use super::types::{CreateTransactionInput, NewTransaction, TransactionPatch, UpdateTransactionInput};

/// Maximum fractional digits an amount may carry (`NUMERIC(15,2)`).
pub const MAX_AMOUNT_SCALE: u32 = 2;

/// Largest amount a single transaction may carry (9999999999999.99).
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(2_764_472_319, 232_830, 0, false, 2);

/// Value date wire format.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Checks that `amount` is positive, fits the column, and has at most two decimals.
pub fn validate_amount(amount: Decimal) -> Result<Decimal, LedgerError> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::InvalidArgument(
            "amount must be greater than zero".to_string(),
        ));
    }
    if amount.normalize().scale() > MAX_AMOUNT_SCALE {
        return Err(LedgerError::InvalidArgument(format!(
            "amount must have at most {MAX_AMOUNT_SCALE} decimal places"
        )));
    }
    if amount > MAX_AMOUNT {
        return Err(LedgerError::InvalidArgument(format!(
            "amount must not exceed {MAX_AMOUNT}"
        )));
    }
    Ok(amount)
}

/// Checks a directly-set account balance. Any sign is allowed.
pub fn validate_balance(balance: Decimal) -> Result<Decimal, LedgerError> {
    if balance.normalize().scale() > MAX_AMOUNT_SCALE {
        return Err(LedgerError::InvalidArgument(format!(
            "balance must have at most {MAX_AMOUNT_SCALE} decimal places"
        )));
    }
    if balance.abs() > MAX_AMOUNT {
        return Err(LedgerError::InvalidArgument(format!(
            "balance must be within ±{MAX_AMOUNT}"
        )));
    }
    Ok(balance)
}

/// Parses a `YYYY-MM-DD` value date.
pub fn parse_value_date(raw: &str) -> Result<NaiveDate, LedgerError> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).map_err(|_| {
        LedgerError::InvalidArgument(format!("invalid date '{raw}', expected YYYY-MM-DD"))
    })
}

/// Checks a display name (accounts, categories): 1..=100 characters after trimming.
pub fn validate_name(raw: &str) -> Result<String, LedgerError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(LedgerError::InvalidArgument("name must not be empty".to_string()));
    }
    if name.chars().count() > 100 {
        return Err(LedgerError::InvalidArgument(
            "name must be at most 100 characters".to_string(),
        ));
    }
    Ok(name.to_string())
}

impl CreateTransactionInput {
    /// Validates the input. A missing or blank value date becomes `today`.
    pub fn validate(self, today: NaiveDate) -> Result<NewTransaction, LedgerError> {
        let amount = validate_amount(self.amount)?;
        let value_date = match self.value_date.as_deref().map(str::trim) {
            None | Some("") => today,
            Some(raw) => parse_value_date(raw)?,
        };

        Ok(NewTransaction {
            account_id: self.account_id,
            category_id: self.category_id,
            amount,
            description: self.description,
            value_date,
        })
    }
}

impl UpdateTransactionInput {
    /// Validates every supplied field.
    pub fn validate(self) -> Result<TransactionPatch, LedgerError> {
        let amount = self.amount.map(validate_amount).transpose()?;
        let value_date = self.value_date.as_deref().map(parse_value_date).transpose()?;

        Ok(TransactionPatch {
            account_id: self.account_id,
            category_id: self.category_id,
            amount,
            description: self.description,
            value_date,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fintrack_shared::types::{AccountId, CategoryId};
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn create_input(amount: Decimal, value_date: Option<&str>) -> CreateTransactionInput {
        CreateTransactionInput {
            account_id: AccountId::new(),
            category_id: CategoryId::new(),
            amount,
            description: "Groceries".to_string(),
            value_date: value_date.map(ToString::to_string),
        }
    }

    #[rstest]
    #[case(dec!(0))]
    #[case(dec!(-10.00))]
    #[case(dec!(0.001))]
    #[case(dec!(10000000000000.00))]
    fn test_rejects_bad_amounts(#[case] amount: Decimal) {
        assert!(matches!(
            validate_amount(amount),
            Err(LedgerError::InvalidArgument(_))
        ));
    }

    #[rstest]
    #[case(dec!(0.01))]
    #[case(dec!(100))]
    #[case(dec!(30.50))]
    #[case(dec!(12.300))]
    #[case(dec!(9999999999999.99))]
    fn test_accepts_good_amounts(#[case] amount: Decimal) {
        assert_eq!(validate_amount(amount).unwrap(), amount);
    }

    #[test]
    fn test_parse_value_date() {
        assert_eq!(
            parse_value_date("2024-02-29").unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
        assert!(parse_value_date("2023-02-29").is_err());
        assert!(parse_value_date("29/02/2024").is_err());
    }

    #[test]
    fn test_create_defaults_missing_date_to_today() {
        let validated = create_input(dec!(10), None).validate(today()).unwrap();
        assert_eq!(validated.value_date, today());

        let validated = create_input(dec!(10), Some("  ")).validate(today()).unwrap();
        assert_eq!(validated.value_date, today());
    }

    #[test]
    fn test_create_rejects_malformed_date() {
        let result = create_input(dec!(10), Some("yesterday")).validate(today());
        assert!(matches!(result, Err(LedgerError::InvalidArgument(_))));
    }

    #[test]
    fn test_update_validates_only_supplied_fields() {
        let patch = UpdateTransactionInput {
            description: Some(String::new()),
            ..Default::default()
        }
        .validate()
        .unwrap();
        assert_eq!(patch.description.as_deref(), Some(""));
        assert!(patch.amount.is_none());

        let result = UpdateTransactionInput {
            amount: Some(dec!(0)),
            ..Default::default()
        }
        .validate();
        assert!(matches!(result, Err(LedgerError::InvalidArgument(_))));
    }

    #[test]
    fn test_validate_balance_allows_negative() {
        assert_eq!(validate_balance(dec!(-120.50)).unwrap(), dec!(-120.50));
        assert_eq!(validate_balance(Decimal::ZERO).unwrap(), Decimal::ZERO);
        assert!(validate_balance(dec!(1.005)).is_err());
    }

    #[test]
    fn test_validate_name() {
        assert_eq!(validate_name("  Wallet ").unwrap(), "Wallet");
        assert!(validate_name("   ").is_err());
        assert!(validate_name(&"x".repeat(101)).is_err());
    }
}
