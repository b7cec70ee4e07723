use std::collections::BTreeMap;
use std::path::Path;

use crate::account::Account;
use crate::decode;
use crate::error::{CoffreError, Result};
use crate::models::{BalanceRow, TxRow, TxType};

const PARSER: &str = "Boursorama (;-separated, Latin-1, header row)";

/// Decode a Boursorama export. One file bundles every sub-account, so
/// transactions are filtered down to the matching `accountNum` and the
/// balance is the maximum `accountBalance` per sub-account group, dated the
/// day before the export date encoded in the filename.
///
/// Column names changed case over time (`label`/`Label`,
/// `accountbalance`/`accountBalance`) and newer exports insert a `comment`
/// column, so columns are located by name, case-insensitively.
pub fn read_raw(account: &Account, path: &Path) -> Result<(Vec<BalanceRow>, Vec<TxRow>)> {
    let text = decode::read_latin1(path)?;
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
    let date_op = col("dateOp")?;
    let label = col("label")?;
    let amount = col("amount")?;
    let account_num = col("accountNum")?;
    let account_balance = col("accountBalance")?;

    let mut transactions = Vec::new();
    let mut balance_by_num: BTreeMap<String, f64> = BTreeMap::new();

    for (i, result) in rdr.records().enumerate() {
        let record = result.map_err(|e| CoffreError::decode(path, PARSER, e.to_string()))?;
        let get = |idx: usize| record.get(idx).unwrap_or("").trim();

        let num = get(account_num).to_string();
        if let Some(balance) = decode::parse_fr_amount(get(account_balance)) {
            let entry = balance_by_num.entry(num.clone()).or_insert(f64::MIN);
            *entry = entry.max(balance);
        }

        if !account.is_account(&num) {
            continue;
        }
        let date = decode::parse_date_flex(get(date_op)).ok_or_else(|| {
            CoffreError::decode(path, PARSER, format!("bad date on line {}: {:?}", i + 2, get(date_op)))
        })?;
        let value = decode::parse_fr_amount(get(amount)).ok_or_else(|| {
            CoffreError::decode(path, PARSER, format!("bad amount on line {}: {:?}", i + 2, get(amount)))
        })?;
        transactions.push(TxRow::new(date, get(label), value, &account.currency));
    }

    // The export date only exists in the filename; the balance reflects the
    // end of the previous day.
    let filename = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let date = account.operations_date(filename)? - chrono::Duration::days(1);

    let balances = balance_by_num
        .into_iter()
        .filter(|(num, _)| account.is_account(num))
        .map(|(_, amount)| BalanceRow {
            date,
            amount,
            currency: account.currency.clone(),
        })
        .collect();

    Ok((balances, transactions))
}

pub fn guess_meta(account: &Account, rows: &mut [TxRow]) {
    let default = match account.kind.as_str() {
        "LVR" => Some(TxType::Transfer),
        "CHQ" => Some(TxType::Expense),
        _ => None,
    };
    if let Some(t) = default {
        for row in rows.iter_mut() {
            row.tx_type = t.as_str().to_string();
        }
    }
}
