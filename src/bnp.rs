use std::path::Path;

use crate::account::Account;
use crate::decode;
use crate::error::{CoffreError, Result};
use crate::models::{BalanceRow, TxRow, TxType};

const PARSER: &str = "BNP (;-separated, Latin-1, day-first dates)";

/// Decode a BNP Paribas export. The balance snapshot lives in the first
/// line (`main;sub;accountNum;DD/MM/YYYY;;amount`); the transaction table
/// follows with `Date;bnpMainCategory;bnpSubCategory;Label;Amount`.
///
/// BNP does not provide currency information explicitly, so rows carry the
/// account's configured currency.
pub fn read_raw(account: &Account, path: &Path) -> Result<(Vec<BalanceRow>, Vec<TxRow>)> {
    let text = decode::read_latin1(path)?;
    let mut lines = text.lines();

    let first = lines
        .next()
        .ok_or_else(|| CoffreError::decode(path, PARSER, "empty file"))?;
    let balance = parse_balance_line(account, path, first)?;

    let rest = lines.collect::<Vec<_>>().join("\n");
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .flexible(true)
        .from_reader(rest.as_bytes());

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
        let amount = decode::parse_fr_amount(&record[4]).ok_or_else(|| {
            CoffreError::decode(path, PARSER, format!("bad amount on line {}: {:?}", i + 2, &record[4]))
        })?;
        transactions.push(TxRow::new(date, record[3].trim(), amount, &account.currency));
    }

    Ok((vec![balance], transactions))
}

/// The first line carries HTML-escaped category labels, which are ignored;
/// only the date and the amount are consumed.
fn parse_balance_line(account: &Account, path: &Path, line: &str) -> Result<BalanceRow> {
    let fields: Vec<&str> = line.split(';').collect();
    if fields.len() < 6 {
        return Err(CoffreError::decode(
            path,
            PARSER,
            format!("expected 6 fields in the balance line, got {}", fields.len()),
        ));
    }
    let date = decode::parse_date_dmy(fields[3]).ok_or_else(|| {
        CoffreError::decode(path, PARSER, format!("bad balance date: {:?}", fields[3]))
    })?;
    let amount = decode::parse_fr_amount(fields[5]).ok_or_else(|| {
        CoffreError::decode(path, PARSER, format!("bad balance amount: {:?}", fields[5]))
    })?;
    Ok(BalanceRow {
        date,
        amount,
        currency: account.currency.clone(),
    })
}

/// Default classification per BNP account type, applied before the
/// autocomplete rules.
pub fn guess_meta(account: &Account, rows: &mut [TxRow]) {
    let default = match account.kind.as_str() {
        "CDI" => Some(TxType::Credit),
        "LVA" | "LDD" => Some(TxType::Transfer),
        "CHQ" => Some(TxType::Expense),
        _ => None,
    };
    if let Some(t) = default {
        for row in rows.iter_mut() {
            row.tx_type = t.as_str().to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn write_export(dir: &Path) -> std::path::PathBuf {
        let path = dir.join("E1851234.csv");
        // Latin-1 bytes, including an accented label in the first line
        let content: &[u8] = b"Cr\xe9dit immobilier;Cr\xe9dit immobilier;****1234;03/07/2019;;-123 456,78\n\
05/06/2019;;; AMORTISSEMENT PRET 1234;67,97\n";
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_read_raw() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_export(dir.path());
        let account = Account::bnp("CDI", "credit-BNP-P15", "****1234").unwrap();

        let (balances, transactions) = read_raw(&account, &path).unwrap();

        assert_eq!(
            balances,
            vec![BalanceRow {
                date: NaiveDate::from_ymd_opt(2019, 7, 3).unwrap(),
                amount: -123456.78,
                currency: "EUR".to_string(),
            }]
        );
        assert_eq!(transactions.len(), 1);
        assert_eq!(
            transactions[0].date,
            NaiveDate::from_ymd_opt(2019, 6, 5).unwrap()
        );
        assert_eq!(transactions[0].label, "AMORTISSEMENT PRET 1234");
        assert_eq!(transactions[0].amount, 67.97);
        assert_eq!(transactions[0].currency, "EUR");
        assert_eq!(transactions[0].tx_type, "");
    }

    #[test]
    fn test_read_raw_bad_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("E0001.csv");
        std::fs::write(&path, "not;a;balance\n").unwrap();
        let account = Account::bnp("CHQ", "x", "****0001").unwrap();
        let err = read_raw(&account, &path).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("E0001.csv"));
        assert!(msg.contains("BNP"));
    }

    #[test]
    fn test_guess_meta_defaults() {
        let date = NaiveDate::from_ymd_opt(2019, 6, 5).unwrap();
        for (kind, expected) in [
            ("CDI", "credit"),
            ("LVA", "transfer"),
            ("LDD", "transfer"),
            ("CHQ", "expense"),
            ("AV1", ""),
        ] {
            let account = Account::bnp(kind, "x", "****0001").unwrap();
            let mut rows = vec![TxRow::new(date, "label", 1.0, "EUR")];
            guess_meta(&account, &mut rows);
            assert_eq!(rows[0].tx_type, expected, "kind {kind}");
        }
    }
}
