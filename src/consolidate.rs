use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::account::AccountParser;
use crate::config::Configuration;
use crate::error::{CoffreError, Result};
use crate::models::{TxRow, TxType};
use crate::pipeline;

// ---------------------------------------------------------------------------
// Row validation
// ---------------------------------------------------------------------------

/// Check a ledger row against the configured vocabulary. Returns a human
/// message for the diagnostic report, or None when the row is valid.
pub fn validate_tx(row: &TxRow, cfg: &Configuration) -> Option<String> {
    if TxType::parse(&row.tx_type).is_none() {
        return Some(format!("Unknown transaction type: {}", row.tx_type));
    }
    if row.tx_type == TxType::Expense.as_str() {
        let category = format!("{}/{}", row.main_category, row.sub_category);
        if !cfg.category_set.contains(&category) {
            return Some(format!("Category '{category}' does not exist."));
        }
    }
    None
}

/// Read a monthly ledger, dropping invalid rows. Diagnostics go to stdout
/// with 1-based line numbers counting the header, and processing continues
/// with the surviving rows.
pub fn read_transactions(
    path: &Path,
    cfg: &Configuration,
    default_currency: &str,
) -> Result<Vec<TxRow>> {
    let rows = pipeline::read_ledger(path, default_currency)?;
    let mut valid = Vec::new();
    let mut errors: Vec<(usize, String)> = Vec::new();
    for (i, row) in rows.into_iter().enumerate() {
        match validate_tx(&row, cfg) {
            None => valid.push(row),
            Some(message) => errors.push((i + 2, message)),
        }
    }
    if !errors.is_empty() {
        println!("{}:", path.display());
        for (line, message) in &errors {
            println!("  - Line {line}: {message}");
        }
    }
    Ok(valid)
}

// ---------------------------------------------------------------------------
// Consolidated transactions (total.csv)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct MergedTx {
    date: NaiveDate,
    account: String,
    label: String,
    amount: f64,
    tx_type: String,
    main_category: String,
    sub_category: String,
}

/// Apply the configured category renames, exact (main, sub) match only.
fn rename_categories(rows: &mut [MergedTx], cfg: &Configuration) {
    for (old, new) in &cfg.categories_to_rename {
        let Some((old_main, old_sub)) = old.split_once('/') else {
            continue;
        };
        let Some((new_main, new_sub)) = new.split_once('/') else {
            continue;
        };
        for row in rows.iter_mut() {
            if row.main_category == old_main && row.sub_category == old_sub {
                row.main_category = new_main.to_string();
                row.sub_category = new_sub.to_string();
            }
        }
    }
}

/// Monthly ledger files live under year-prefixed directories
/// (`{root}/{YYYY-MM}/*.csv`).
fn monthly_ledger_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(root)? {
        let dir = entry?.path();
        if !dir.is_dir() || !is_year_dir(&dir) {
            continue;
        }
        for entry in std::fs::read_dir(&dir)? {
            let file = entry?.path();
            if file.extension().is_some_and(|e| e == "csv") {
                files.push(file);
            }
        }
    }
    files.sort();
    Ok(files)
}

fn is_year_dir(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    let bytes = name.as_bytes();
    bytes.len() >= 3 && bytes.starts_with(b"20") && bytes[2].is_ascii_digit() && bytes[2] != b'0'
}

fn write_total(path: &Path, rows: &[MergedTx]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record([
        "Date",
        "Month",
        "Account",
        "Label",
        "Amount",
        "Type",
        "MainCategory",
        "SubCategory",
    ])?;
    for row in rows {
        wtr.write_record([
            row.date.format("%Y-%m-%d").to_string(),
            row.date.format("%Y-%m").to_string(),
            row.account.clone(),
            row.label.clone(),
            pipeline::fmt_amount(row.amount),
            row.tx_type.clone(),
            row.main_category.clone(),
            row.sub_category.clone(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Consolidated balances (balance.csv)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct BalanceEntry {
    date: NaiveDate,
    account: String,
    account_num: String,
    amount: Option<f64>,
    kind: String,
}

/// Read a balance series tolerating empty amounts (a converted file keeps an
/// empty cell when no rate was available for that date).
fn read_balance_entries(path: &Path) -> Result<Vec<(NaiveDate, Option<f64>)>> {
    let mut rdr = csv::Reader::from_path(path)?;
    let headers = rdr.headers()?.clone();
    let date_col = headers.iter().position(|h| h == "Date").ok_or_else(|| {
        CoffreError::decode(path, "balance history", "missing column \"Date\"")
    })?;
    let amount_col = headers.iter().position(|h| h == "Amount").ok_or_else(|| {
        CoffreError::decode(path, "balance history", "missing column \"Amount\"")
    })?;

    let mut rows = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        let record = result?;
        let date_str = record.get(date_col).unwrap_or("");
        let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|_| {
            CoffreError::decode(path, "balance history", format!("bad date on line {}: {date_str:?}", i + 2))
        })?;
        let amount = record
            .get(amount_col)
            .and_then(|a| a.trim().parse::<f64>().ok());
        rows.push((date, amount));
    }
    Ok(rows)
}

/// Base-currency balance series only (`balance.*.EUR.csv`): native EUR
/// histories and converted foreign ones alike.
fn base_currency_balance_files(root: &Path, base_currency: &str) -> Result<Vec<PathBuf>> {
    let suffix = format!(".{base_currency}.csv");
    let mut files = Vec::new();
    for entry in std::fs::read_dir(root)? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if path.is_file() && name.starts_with("balance.") && name.ends_with(&suffix) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn write_balance_report(path: &Path, rows: &[BalanceEntry]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(["Date", "Account", "AccountId", "Amount", "AccountType"])?;
    for row in rows {
        wtr.write_record([
            row.date.format("%Y-%m-%d").to_string(),
            row.account.clone(),
            row.account_num.clone(),
            row.amount.map(pipeline::fmt_amount).unwrap_or_default(),
            row.kind.clone(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// The merge command
// ---------------------------------------------------------------------------

/// Consolidate every monthly ledger into `total.csv` and every base-currency
/// balance series into `balance.csv`.
pub fn run(cfg: &Configuration) -> Result<()> {
    let parser = AccountParser::new(&cfg.accounts);

    let mut merged: Vec<MergedTx> = Vec::new();
    for path in monthly_ledger_files(&cfg.root_dir)? {
        let account = parser.parse(&path);
        let rows = read_transactions(&path, cfg, &account.currency)?;
        merged.extend(rows.into_iter().map(|row| MergedTx {
            date: row.date,
            account: account.id.clone(),
            label: row.label,
            amount: row.amount,
            tx_type: row.tx_type,
            main_category: row.main_category,
            sub_category: row.sub_category,
        }));
    }
    rename_categories(&mut merged, cfg);
    merged.sort_by(|a, b| {
        (a.date, &a.account, &a.label)
            .cmp(&(b.date, &b.account, &b.label))
            .then(a.amount.total_cmp(&b.amount))
    });
    write_total(&cfg.root_dir.join("total.csv"), &merged)?;

    let mut balances: Vec<BalanceEntry> = Vec::new();
    for path in base_currency_balance_files(&cfg.root_dir, cfg.exchange_rate.base_currency())? {
        let Some(info) = parser.parse_balance(&path) else {
            continue;
        };
        let account = info.account;
        balances.extend(read_balance_entries(&path)?.into_iter().map(|(date, amount)| {
            BalanceEntry {
                date,
                account: account.id.clone(),
                account_num: account.num.clone(),
                amount,
                kind: account.kind.clone(),
            }
        }));
    }
    balances.sort_by(|a, b| (a.date, &a.account).cmp(&(b.date, &b.account)));
    write_balance_report(&cfg.root_dir.join("balance.csv"), &balances)?;

    println!("Merge done");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::Account;
    use crate::config::ExchangeRateConfig;
    use std::collections::{BTreeMap, BTreeSet};

    fn test_cfg(root: &Path) -> Configuration {
        Configuration {
            accounts: Vec::new(),
            category_set: BTreeSet::new(),
            categories_to_rename: BTreeMap::new(),
            autocomplete: Vec::new(),
            download_dir: PathBuf::from("/nonexistent/download"),
            root_dir: root.to_path_buf(),
            exchange_rate: ExchangeRateConfig::default(),
        }
    }

    fn tx(date: &str, tx_type: &str, main: &str, sub: &str) -> TxRow {
        let mut row = TxRow::new(
            NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            "label",
            -1.0,
            "EUR",
        );
        row.tx_type = tx_type.to_string();
        row.main_category = main.to_string();
        row.sub_category = sub.to_string();
        row
    }

    #[test]
    fn test_validate_tx() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = test_cfg(dir.path());
        cfg.category_set.insert("food/restaurant".to_string());

        assert_eq!(validate_tx(&tx("2019-08-01", "expense", "food", "restaurant"), &cfg), None);
        assert_eq!(validate_tx(&tx("2019-08-01", "transfer", "", ""), &cfg), None);
        assert_eq!(
            validate_tx(&tx("2019-08-01", "bad-type", "", ""), &cfg),
            Some("Unknown transaction type: bad-type".to_string())
        );
        assert_eq!(
            validate_tx(&tx("2019-08-01", "", "", ""), &cfg),
            Some("Unknown transaction type: ".to_string())
        );
        assert_eq!(
            validate_tx(&tx("2019-08-01", "expense", "food", "workfood"), &cfg),
            Some("Category 'food/workfood' does not exist.".to_string())
        );
        // only expenses are checked against the category set
        assert_eq!(validate_tx(&tx("2019-08-01", "income", "salary", "x"), &cfg), None);
    }

    #[test]
    fn test_read_transactions_drops_invalid_rows() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = test_cfg(dir.path());
        cfg.category_set.insert("food/restaurant".to_string());
        let path = dir.path().join("2019-08.a.csv");
        std::fs::write(
            &path,
            "Date,Label,Amount,Currency,Type,MainCategory,SubCategory\n\
             2019-08-01,ok,-10.0,EUR,expense,food,restaurant\n\
             2019-08-02,bad-cat,-11.0,EUR,expense,food,unknown\n\
             2019-08-03,bad-type,-12.0,EUR,wat,,\n",
        )
        .unwrap();
        let rows = read_transactions(&path, &cfg, "EUR").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].label, "ok");
    }

    #[test]
    fn test_is_year_dir() {
        assert!(is_year_dir(Path::new("/root/2019-08")));
        assert!(is_year_dir(Path::new("/root/2024-01")));
        assert!(!is_year_dir(Path::new("/root/2009-01")));
        assert!(!is_year_dir(Path::new("/root/archive")));
        assert!(!is_year_dir(Path::new("/root/20")));
    }

    #[test]
    fn test_merge_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = test_cfg(dir.path());
        cfg.accounts = vec![
            Account::bnp("CHQ", "userA-BNP-CHQ", "****0001").unwrap(),
            Account::boursorama("CHQ", "userB-BRS-CHQ", "****0002").unwrap(),
        ];
        cfg.category_set.insert("food/restaurant".to_string());
        cfg.categories_to_rename.insert(
            "MainCategoryToRename/SubCategoryToRename".to_string(),
            "AnotherMainCategory/AnotherSubCategory".to_string(),
        );

        let month_dir = dir.path().join("2019-08");
        std::fs::create_dir(&month_dir).unwrap();
        std::fs::write(
            month_dir.join("2019-08.userA-BNP-CHQ.csv"),
            "Date,Label,Amount,Currency,Type,MainCategory,SubCategory\n\
             2019-08-01,myLabel,-10.0,EUR,expense,food,restaurant\n",
        )
        .unwrap();
        std::fs::write(
            month_dir.join("2019-08.userB-BRS-CHQ.csv"),
            "Date,Label,Amount,Currency,Type,MainCategory,SubCategory\n\
             2019-08-02,myLabel,-11.0,EUR,transfer,MainCategoryToRename,SubCategoryToRename\n",
        )
        .unwrap();

        run(&cfg).unwrap();

        assert_eq!(
            std::fs::read_to_string(dir.path().join("total.csv")).unwrap(),
            "Date,Month,Account,Label,Amount,Type,MainCategory,SubCategory\n\
             2019-08-01,2019-08,userA-BNP-CHQ,myLabel,-10.0,expense,food,restaurant\n\
             2019-08-02,2019-08,userB-BRS-CHQ,myLabel,-11.0,transfer,AnotherMainCategory,AnotherSubCategory\n"
        );
        // no balance files: header-only report
        assert_eq!(
            std::fs::read_to_string(dir.path().join("balance.csv")).unwrap(),
            "Date,Account,AccountId,Amount,AccountType\n"
        );
    }

    #[test]
    fn test_merge_balances_with_account_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = test_cfg(dir.path());
        cfg.accounts = vec![
            Account::bnp("CHQ", "astark-BNP-CHQ", "123").unwrap(),
            Account::bnp("LVA", "astark-BNP-LVA", "456").unwrap(),
        ];
        std::fs::write(
            dir.path().join("balance.astark-BNP-CHQ.EUR.csv"),
            "Date,Amount,Currency\n2018-07-04,100.00,EUR\n2019-07-04,100.00,EUR\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("balance.astark-BNP-LVA.EUR.csv"),
            "Date,Amount,Currency\n2018-07-04,200.00,EUR\n2019-07-04,200.00,EUR\n",
        )
        .unwrap();

        run(&cfg).unwrap();

        assert_eq!(
            std::fs::read_to_string(dir.path().join("balance.csv")).unwrap(),
            "Date,Account,AccountId,Amount,AccountType\n\
             2018-07-04,astark-BNP-CHQ,123,100.0,CHQ\n\
             2018-07-04,astark-BNP-LVA,456,200.0,LVA\n\
             2019-07-04,astark-BNP-CHQ,123,100.0,CHQ\n\
             2019-07-04,astark-BNP-LVA,456,200.0,LVA\n"
        );
    }

    #[test]
    fn test_merge_tolerates_empty_converted_amounts() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = test_cfg(dir.path());
        cfg.accounts =
            vec![Account::revolut("CASH", "user-REV-USD", "abc", "USD", &[]).unwrap()];
        std::fs::write(
            dir.path().join("balance.user-REV-USD.EUR.csv"),
            "Date,Amount,Currency\n2024-01-01,,EUR\n2024-01-05,90.91,EUR\n",
        )
        .unwrap();

        run(&cfg).unwrap();

        assert_eq!(
            std::fs::read_to_string(dir.path().join("balance.csv")).unwrap(),
            "Date,Account,AccountId,Amount,AccountType\n\
             2024-01-01,user-REV-USD,abc,,CASH\n\
             2024-01-05,user-REV-USD,abc,90.91,CASH\n"
        );
    }

    #[test]
    fn test_merge_unknown_ledger_tagged_unknown() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = test_cfg(dir.path());
        let month_dir = dir.path().join("2019-08");
        std::fs::create_dir(&month_dir).unwrap();
        std::fs::write(
            month_dir.join("2019-08.stranger.csv"),
            "Date,Label,Amount,Currency,Type,MainCategory,SubCategory\n\
             2019-08-01,myLabel,-10.0,EUR,transfer,,\n",
        )
        .unwrap();

        run(&cfg).unwrap();

        let total = std::fs::read_to_string(dir.path().join("total.csv")).unwrap();
        assert!(total.contains("2019-08-01,2019-08,unknown,myLabel,-10.0,transfer,,"));
    }
}
