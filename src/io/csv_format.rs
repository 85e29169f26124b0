//! CSV format handling for operation records and account output
//!
//! This module centralizes all CSV format concerns, providing:
//! - CsvRecord structure for deserialization
//! - Conversion from CSV records to domain operations
//! - Account output serialization
//!
//! All functions are pure (no I/O) for easy testing.
//!
//! # Input Columns
//!
//! `type,account,to,amount,user,name`
//!
//! | type       | required columns                 |
//! |------------|----------------------------------|
//! | `user`     | `name` ("First Last")            |
//! | `open`     | `account`, `user` (`name` optional) |
//! | `deposit`  | `account`, `amount`              |
//! | `withdraw` | `account`, `amount`              |
//! | `transfer` | `account` (source), `to`, `amount` |

use crate::types::{Account, Amount, Operation, UserId};
use serde::Deserialize;
use std::io::Write;

/// CSV record structure for deserialization
///
/// Every column except `type` is optional because each operation kind uses
/// a different subset of them. Short rows deserialize with the trailing
/// columns missing.
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
#[serde(default)]
pub struct CsvRecord {
    #[serde(rename = "type")]
    pub op_type: String,
    pub account: Option<String>,
    pub to: Option<String>,
    pub amount: Option<String>,
    pub user: Option<String>,
    pub name: Option<String>,
}

fn non_empty(field: Option<String>) -> Option<String> {
    field
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn required(field: Option<String>, column: &str, op_type: &str) -> Result<String, String> {
    non_empty(field).ok_or_else(|| format!("{} operation requires '{}'", op_type, column))
}

fn parse_amount(field: Option<String>, op_type: &str) -> Result<Amount, String> {
    let raw = required(field, "amount", op_type)?;
    raw.parse::<Amount>()
        .map_err(|_| format!("Invalid amount '{}' for {}", raw, op_type))
}

fn parse_user(field: Option<String>, op_type: &str) -> Result<UserId, String> {
    let raw = required(field, "user", op_type)?;
    raw.parse::<UserId>()
        .map_err(|_| format!("Invalid user id '{}' for {}", raw, op_type))
}

/// Convert a CsvRecord to an Operation
///
/// This function:
/// - Parses the operation type (case-insensitive)
/// - Checks that the columns the operation needs are present
/// - Parses amounts as integers in the smallest currency unit
///
/// Amount sign is not checked here; the engine rejects non-positive
/// amounts with `InvalidAmount`.
///
/// # Returns
///
/// * `Ok(Operation)` - Successfully converted record
/// * `Err(String)` - Error message describing the conversion failure
pub fn convert_csv_record(csv_record: CsvRecord) -> Result<Operation, String> {
    let op_type = csv_record.op_type.trim().to_lowercase();

    match op_type.as_str() {
        "user" => {
            let name = required(csv_record.name, "name", &op_type)?;
            let (first_name, last_name) = match name.split_once(char::is_whitespace) {
                Some((first, last)) => (first.to_string(), last.trim().to_string()),
                None => (name, String::new()),
            };
            Ok(Operation::User {
                first_name,
                last_name,
            })
        }
        "open" => {
            let account_number = required(csv_record.account, "account", &op_type)?;
            let user_id = parse_user(csv_record.user, &op_type)?;
            let display_name =
                non_empty(csv_record.name).unwrap_or_else(|| account_number.clone());
            Ok(Operation::Open {
                account_number,
                user_id,
                display_name,
            })
        }
        "deposit" => Ok(Operation::Deposit {
            account_number: required(csv_record.account, "account", &op_type)?,
            amount: parse_amount(csv_record.amount, &op_type)?,
        }),
        "withdraw" => Ok(Operation::Withdraw {
            account_number: required(csv_record.account, "account", &op_type)?,
            amount: parse_amount(csv_record.amount, &op_type)?,
        }),
        "transfer" => Ok(Operation::Transfer {
            from: required(csv_record.account, "account", &op_type)?,
            to: required(csv_record.to, "to", &op_type)?,
            amount: parse_amount(csv_record.amount, &op_type)?,
        }),
        _ => Err(format!(
            "Invalid operation type: '{}'",
            csv_record.op_type
        )),
    }
}

/// Write account states to CSV format
///
/// Writes accounts with columns: id, account_number, user_id, name, balance.
/// Accounts are sorted by id for deterministic output.
///
/// # Returns
///
/// * `Ok(())` if writing succeeded
/// * `Err(String)` if a write error occurred
pub fn write_accounts_csv(accounts: &[Account], output: &mut dyn Write) -> Result<(), String> {
    use csv::Writer;

    let mut writer = Writer::from_writer(output);

    writer
        .write_record(["id", "account_number", "user_id", "name", "balance"])
        .map_err(|e| format!("Failed to write CSV header: {}", e))?;

    let mut sorted_accounts = accounts.to_vec();
    sorted_accounts.sort_by_key(|account| account.id);

    for account in sorted_accounts {
        writer
            .write_record(&[
                account.id.to_string(),
                account.account_number,
                account.user_id.to_string(),
                account.display_name,
                account.balance.to_string(),
            ])
            .map_err(|e| format!("Failed to write account record: {}", e))?;
    }

    writer
        .flush()
        .map_err(|e| format!("Failed to flush output: {}", e))?;

    Ok(())
}
