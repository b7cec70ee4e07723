use std::path::Path;

use crate::account::Account;
use crate::decode;
use crate::error::{CoffreError, Result};
use crate::models::{TxRow, TxType};

const PARSER: &str = "Caisse d'Epargne (;-separated, UTF-8, Debit/Credit columns)";

/// Decode a Caisse d'Epargne export. Columns are located by header name
/// (`Date operation`, `Libelle operation`, `Debit`, `Credit`); day-first
/// dates, comma decimals. Rows with neither a debit nor a credit are pending
/// operations and are skipped. No balance series is published.
pub fn read_transactions(account: &Account, path: &Path) -> Result<Vec<TxRow>> {
    let text = decode::read_utf8(path)?;
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b';')
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = rdr
        .headers()
        .map_err(|e| CoffreError::decode(path, PARSER, e.to_string()))?
        .clone();
    let col = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
            .ok_or_else(|| CoffreError::decode(path, PARSER, format!("missing column {name:?}")))
    };
    let date_col = col("Date operation")?;
    let label_col = col("Libelle operation")?;
    let debit_col = col("Debit")?;
    let credit_col = col("Credit")?;

    let mut transactions = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        let record = result.map_err(|e| CoffreError::decode(path, PARSER, e.to_string()))?;
        let get = |idx: usize| record.get(idx).unwrap_or("").trim();

        let date = decode::parse_date_dmy(get(date_col)).ok_or_else(|| {
            CoffreError::decode(path, PARSER, format!("bad date on line {}: {:?}", i + 2, get(date_col)))
        })?;
        let amount = decode::parse_fr_amount(get(debit_col))
            .or_else(|| decode::parse_fr_amount(get(credit_col)));
        let Some(amount) = amount else {
            continue;
        };
        transactions.push(TxRow::new(date, get(label_col), amount, &account.currency));
    }
    Ok(transactions)
}

pub fn guess_meta(account: &Account, rows: &mut [TxRow]) {
    if account.kind == "CHQ" {
        for row in rows.iter_mut() {
            row.tx_type = TxType::Expense.as_str().to_string();
        }
    }
}
