use std::path::Path;

use crate::account::Account;
use crate::decode;
use crate::error::{CoffreError, Result};
use crate::models::TxRow;

const PARSER: &str = "Fortuneo (;-separated, UTF-8, Debit/Credit columns)";

/// Decode a Fortuneo history export:
/// `Date opération;Date valeur;libellé;Débit;Crédit;` — six columns with a
/// trailing empty one. The amount is the Débit when present, the Crédit
/// otherwise. Fortuneo does not publish its encoding; UTF-8 has held so far.
///
/// Fortuneo has no balance series and no institution default type.
pub fn read_transactions(account: &Account, path: &Path) -> Result<Vec<TxRow>> {
    let text = decode::read_utf8(path)?;
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b';')
        .flexible(true)
        .from_reader(text.as_bytes());

    // header row present but the columns are positional
    let mut transactions = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        let record = result.map_err(|e| CoffreError::decode(path, PARSER, e.to_string()))?;
        if record.len() < 5 {
            return Err(CoffreError::decode(
                path,
                PARSER,
                format!("expected 5 fields on line {}, got {}", i + 2, record.len()),
            ));
        }
        let date = decode::parse_date_dmy(&record[0]).ok_or_else(|| {
            CoffreError::decode(path, PARSER, format!("bad date on line {}: {:?}", i + 2, &record[0]))
        })?;
        let amount = decode::parse_fr_amount(&record[3])
            .or_else(|| decode::parse_fr_amount(&record[4]))
            .ok_or_else(|| {
                CoffreError::decode(path, PARSER, format!("no debit or credit on line {}", i + 2))
            })?;
        transactions.push(TxRow::new(date, record[2].trim(), amount, &account.currency));
    }
    Ok(transactions)
}
