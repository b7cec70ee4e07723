use std::path::Path;

use crate::decode;
use crate::error::{CoffreError, Result};
use crate::models::{BalanceRow, TxRow, TxType};

const PARSER: &str = "Revolut (comma-separated, UTF-8, account-statement layout)";

/// Decode a Revolut account statement. The file is a plain comma CSV with a
/// header row; `Completed Date` carries a time-of-day that is truncated to
/// the calendar date. Rows with a non-empty `Balance` cell double as balance
/// snapshots. The raw Revolut `Type` (TOPUP, CARD_PAYMENT, ...) is kept on
/// the row until `guess_meta` maps it. Unlike the French banks, Revolut
/// states the currency per row, so the account is not consulted here.
pub fn read_raw(path: &Path) -> Result<(Vec<BalanceRow>, Vec<TxRow>)> {
    let text = decode::read_utf8(path)?;
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = rdr
        .headers()
        .map_err(|e| CoffreError::decode(path, PARSER, e.to_string()))?
        .clone();
    let col = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| CoffreError::decode(path, PARSER, format!("missing column {name:?}")))
    };
    let type_col = col("Type")?;
    let completed_col = col("Completed Date")?;
    let description_col = col("Description")?;
    let amount_col = col("Amount")?;
    let currency_col = col("Currency")?;
    let balance_col = col("Balance")?;

    let mut balances = Vec::new();
    let mut transactions = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        let record = result.map_err(|e| CoffreError::decode(path, PARSER, e.to_string()))?;
        let get = |idx: usize| record.get(idx).unwrap_or("").trim();

        let date = decode::parse_datetime_as_date(get(completed_col)).ok_or_else(|| {
            CoffreError::decode(
                path,
                PARSER,
                format!("bad completed date on line {}: {:?}", i + 2, get(completed_col)),
            )
        })?;
        let amount = decode::parse_amount(get(amount_col)).ok_or_else(|| {
            CoffreError::decode(path, PARSER, format!("bad amount on line {}: {:?}", i + 2, get(amount_col)))
        })?;
        let currency = get(currency_col).to_string();

        let mut row = TxRow::new(date, get(description_col), amount, currency.clone());
        row.tx_type = get(type_col).to_string();
        transactions.push(row);

        if let Some(balance) = decode::parse_amount(get(balance_col)) {
            balances.push(BalanceRow {
                date,
                amount: balance,
                currency,
            });
        }
    }
    Ok((balances, transactions))
}

/// Map the raw Revolut transaction type onto the canonical set. A top-up
/// makes up the full amount of the account, so it counts as an income here;
/// an opinionated choice. Unmapped raw values pass through and are rejected
/// later by merge validation.
pub fn guess_meta(rows: &mut [TxRow]) {
    for row in rows.iter_mut() {
        let mapped = match row.tx_type.as_str() {
            "TOPUP" => Some(TxType::Income),
            "TRANSFER" => Some(TxType::Transfer),
            "FEE" | "CARD_PAYMENT" | "EXCHANGE" => Some(TxType::Expense),
            _ => None,
        };
        if let Some(t) = mapped {
            row.tx_type = t.as_str().to_string();
        }
    }
}
