use std::collections::HashMap;
use std::path::Path;

use chrono::NaiveDate;

use crate::account::{Account, Institution, REVOLUT_COMMODITIES};
use crate::config::Configuration;
use crate::error::{CoffreError, Result};
use crate::models::{BalanceRow, Summary, TxRow};
use crate::{bnp, boursorama, caisse_epargne, exchange_rate, fortuneo, revolut};

pub const LEDGER_COLUMNS: [&str; 7] = [
    "Date",
    "Label",
    "Amount",
    "Currency",
    "Type",
    "MainCategory",
    "SubCategory",
];

// ---------------------------------------------------------------------------
// Pipeline dispatch — enum variants instead of runtime type inspection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionPipeline {
    Bnp,
    Boursorama,
    CaisseEpargne,
    Fortuneo,
    Revolut,
    Noop,
}

impl TransactionPipeline {
    pub fn for_account(account: &Account) -> Self {
        match account.institution {
            Institution::Bnp => Self::Bnp,
            Institution::Boursorama => Self::Boursorama,
            Institution::CaisseEpargne => Self::CaisseEpargne,
            Institution::Fortuneo => Self::Fortuneo,
            Institution::Revolut if account.kind == REVOLUT_COMMODITIES => Self::Noop,
            Institution::Revolut => Self::Revolut,
            Institution::Degiro | Institution::October | Institution::Unknown => Self::Noop,
        }
    }

    /// Decode the raw export, classify the rows, and fold them into the
    /// monthly ledgers. Idempotent: replaying the same export leaves the
    /// ledgers unchanged.
    pub fn run(
        &self,
        account: &Account,
        cfg: &Configuration,
        source: &Path,
        summary: &mut Summary,
    ) -> Result<()> {
        if *self == Self::Noop {
            return Ok(());
        }
        let mut rows = self.read_new_transactions(account, source)?;
        summary.add_source(source);

        self.guess_meta(account, cfg, &mut rows);

        for month in months_of(&rows) {
            let dir = cfg.root_dir.join(&month);
            std::fs::create_dir_all(&dir)?;
            let target = dir.join(format!("{month}.{}", account.filename()));
            let month_rows: Vec<TxRow> =
                rows.iter().filter(|r| r.month() == month).cloned().collect();
            append_transactions(&target, &month_rows, account)?;
            summary.add_target(&target);
        }
        Ok(())
    }

    fn read_new_transactions(&self, account: &Account, source: &Path) -> Result<Vec<TxRow>> {
        match self {
            Self::Bnp => Ok(bnp::read_raw(account, source)?.1),
            Self::Boursorama => Ok(boursorama::read_raw(account, source)?.1),
            Self::CaisseEpargne => caisse_epargne::read_transactions(account, source),
            Self::Fortuneo => fortuneo::read_transactions(account, source),
            Self::Revolut => Ok(revolut::read_raw(source)?.1),
            Self::Noop => Ok(Vec::new()),
        }
    }

    /// Institution defaults first, then the ordered autocomplete rules;
    /// the first matching rule wins and overrides the default.
    fn guess_meta(&self, account: &Account, cfg: &Configuration, rows: &mut [TxRow]) {
        match self {
            Self::Bnp => bnp::guess_meta(account, rows),
            Self::Boursorama => boursorama::guess_meta(account, rows),
            Self::CaisseEpargne => caisse_epargne::guess_meta(account, rows),
            Self::Revolut => revolut::guess_meta(rows),
            Self::Fortuneo | Self::Noop => {}
        }
        for row in rows.iter_mut() {
            for completion in &cfg.autocomplete {
                if completion.matches(&row.label) {
                    row.tx_type = completion.tx_type.clone();
                    row.main_category = completion.main_category.clone();
                    row.sub_category = completion.sub_category.clone();
                    break;
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalancePipeline {
    Bnp,
    Boursorama,
    Revolut,
    General,
}

impl BalancePipeline {
    pub fn for_account(account: &Account) -> Self {
        match account.institution {
            Institution::Bnp => Self::Bnp,
            Institution::Boursorama => Self::Boursorama,
            Institution::Revolut if account.kind == REVOLUT_COMMODITIES => Self::General,
            Institution::Revolut => Self::Revolut,
            _ => Self::General,
        }
    }

    /// Fold the export's balance snapshot into the per-account history and,
    /// for foreign-currency accounts, refresh the EUR-converted series.
    pub fn run(
        &self,
        account: &Account,
        cfg: &Configuration,
        source: &Path,
        summary: &mut Summary,
    ) -> Result<()> {
        let new_rows = match self {
            Self::Bnp => bnp::read_raw(account, source)?.0,
            Self::Boursorama => boursorama::read_raw(account, source)?.0,
            Self::Revolut => revolut::read_raw(source)?.0,
            Self::General => return Ok(()),
        };

        let balance_file = cfg.root_dir.join(account.balance_filename());
        let merged = insert_balance(&balance_file, &new_rows, account)?;
        write_balance(&balance_file, &merged)?;
        summary.add_source(source);
        summary.add_target(&balance_file);

        if account.needs_conversion() {
            let target = cfg.root_dir.join(account.converted_balance_filename());
            let converted =
                exchange_rate::convert_rows(&merged, &account.currency, &cfg.exchange_rate_csv_path())?;
            exchange_rate::write_converted(&target, &converted)?;
            summary.add_target(&target);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Ledger files
// ---------------------------------------------------------------------------

/// Calendar months covered by the rows, in first-seen order.
fn months_of(rows: &[TxRow]) -> Vec<String> {
    let mut months = Vec::new();
    for row in rows {
        let month = row.month();
        if !months.contains(&month) {
            months.push(month);
        }
    }
    months
}

/// Render an amount the way the ledgers store it: shortest decimal form,
/// always with a fractional part ("10.0", "-123456.78").
pub(crate) fn fmt_amount(amount: f64) -> String {
    let s = format!("{amount}");
    if s.contains('.') || s.contains('e') {
        s
    } else {
        format!("{s}.0")
    }
}

/// Read an existing monthly ledger. Backward compatibility: files written
/// before the Currency column existed are backfilled with the account
/// currency, and missing classification columns default to empty.
pub fn read_ledger(path: &Path, default_currency: &str) -> Result<Vec<TxRow>> {
    let mut rdr = csv::Reader::from_path(path)?;
    let headers = rdr.headers()?.clone();
    let col = |name: &str| headers.iter().position(|h| h == name);
    let date_col = col("Date").ok_or_else(|| {
        CoffreError::decode(path, "ledger", "missing column \"Date\"")
    })?;
    let label_col = col("Label").ok_or_else(|| {
        CoffreError::decode(path, "ledger", "missing column \"Label\"")
    })?;
    let amount_col = col("Amount").ok_or_else(|| {
        CoffreError::decode(path, "ledger", "missing column \"Amount\"")
    })?;
    let currency_col = col("Currency");
    let type_col = col("Type");
    let main_col = col("MainCategory");
    let sub_col = col("SubCategory");

    let mut rows = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        let record = result?;
        let get = |idx: Option<usize>| idx.and_then(|c| record.get(c)).unwrap_or("");
        let date_str = get(Some(date_col));
        let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|_| {
            CoffreError::decode(path, "ledger", format!("bad date on line {}: {date_str:?}", i + 2))
        })?;
        let amount_str = get(Some(amount_col));
        let amount: f64 = amount_str.parse().map_err(|_| {
            CoffreError::decode(path, "ledger", format!("bad amount on line {}: {amount_str:?}", i + 2))
        })?;
        let currency = match get(currency_col) {
            "" => default_currency.to_string(),
            c => c.to_string(),
        };
        rows.push(TxRow {
            date,
            label: get(Some(label_col)).to_string(),
            amount,
            currency,
            tx_type: get(type_col).to_string(),
            main_category: get(main_col).to_string(),
            sub_category: get(sub_col).to_string(),
        });
    }
    Ok(rows)
}

fn write_ledger(path: &Path, rows: &[TxRow]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(LEDGER_COLUMNS)?;
    for row in rows {
        wtr.write_record([
            row.date.format("%Y-%m-%d").to_string(),
            row.label.clone(),
            fmt_amount(row.amount),
            row.currency.clone(),
            row.tx_type.clone(),
            row.main_category.clone(),
            row.sub_category.clone(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Keep one row per (Date, Label, Amount); the later occurrence wins, so a
/// replayed export refreshes metadata instead of duplicating rows.
fn dedup_keep_last(rows: Vec<TxRow>) -> Vec<TxRow> {
    let mut index: HashMap<(NaiveDate, String, u64), usize> = HashMap::new();
    let mut out: Vec<TxRow> = Vec::new();
    for row in rows {
        let key = row.dedup_key();
        match index.get(&key) {
            Some(&i) => out[i] = row,
            None => {
                index.insert(key, out.len());
                out.push(row);
            }
        }
    }
    out
}

/// Append-merge new rows into a monthly ledger: load, concatenate,
/// deduplicate keeping the newest, sort by (Date, Label), rewrite.
pub fn append_transactions(csv: &Path, new_rows: &[TxRow], account: &Account) -> Result<()> {
    let mut rows = if csv.exists() {
        read_ledger(csv, &account.currency)?
    } else {
        Vec::new()
    };
    rows.extend_from_slice(new_rows);
    let mut merged = dedup_keep_last(rows);
    merged.sort_by(|a, b| (a.date, &a.label).cmp(&(b.date, &b.label)));
    write_ledger(csv, &merged)
}

// ---------------------------------------------------------------------------
// Balance files
// ---------------------------------------------------------------------------

/// Read a balance history (`Date,Amount[,Currency]`), backfilling the
/// currency column on legacy files.
pub fn read_balance_history(path: &Path, default_currency: &str) -> Result<Vec<BalanceRow>> {
    let mut rdr = csv::Reader::from_path(path)?;
    let headers = rdr.headers()?.clone();
    let col = |name: &str| headers.iter().position(|h| h == name);
    let date_col = col("Date").ok_or_else(|| {
        CoffreError::decode(path, "balance history", "missing column \"Date\"")
    })?;
    let amount_col = col("Amount").ok_or_else(|| {
        CoffreError::decode(path, "balance history", "missing column \"Amount\"")
    })?;
    let currency_col = col("Currency");

    let mut rows = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        let record = result?;
        let date_str = record.get(date_col).unwrap_or("");
        let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|_| {
            CoffreError::decode(path, "balance history", format!("bad date on line {}: {date_str:?}", i + 2))
        })?;
        let amount_str = record.get(amount_col).unwrap_or("");
        let amount: f64 = amount_str.parse().map_err(|_| {
            CoffreError::decode(path, "balance history", format!("bad amount on line {}: {amount_str:?}", i + 2))
        })?;
        let currency = match currency_col.and_then(|c| record.get(c)).unwrap_or("") {
            "" => default_currency.to_string(),
            c => c.to_string(),
        };
        rows.push(BalanceRow {
            date,
            amount,
            currency,
        });
    }
    Ok(rows)
}

/// Insert-merge new snapshots into a balance history: one balance per day,
/// the later snapshot wins, sorted by date. Returns the merged history so
/// the caller can feed it to currency conversion without re-reading.
pub fn insert_balance(csv: &Path, new_rows: &[BalanceRow], account: &Account) -> Result<Vec<BalanceRow>> {
    let mut rows = if csv.exists() {
        read_balance_history(csv, &account.currency)?
    } else {
        Vec::new()
    };
    rows.extend_from_slice(new_rows);

    let mut index: HashMap<NaiveDate, usize> = HashMap::new();
    let mut merged: Vec<BalanceRow> = Vec::new();
    for row in rows {
        match index.get(&row.date) {
            Some(&i) => merged[i] = row,
            None => {
                index.insert(row.date, merged.len());
                merged.push(row);
            }
        }
    }
    merged.sort_by_key(|r| r.date);
    Ok(merged)
}

pub fn write_balance(csv: &Path, rows: &[BalanceRow]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(csv)?;
    wtr.write_record(["Date", "Amount", "Currency"])?;
    for row in rows {
        wtr.write_record([
            row.date.format("%Y-%m-%d").to_string(),
            format!("{:.2}", row.amount),
            row.currency.clone(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExchangeRateConfig;
    use std::collections::{BTreeMap, BTreeSet};
    use std::path::PathBuf;

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

    fn tx(date: &str, label: &str, amount: f64) -> TxRow {
        TxRow::new(
            NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            label,
            amount,
            "EUR",
        )
    }

    #[test]
    fn test_dispatch_per_institution() {
        let bnp = Account::bnp("CHQ", "a", "****0001").unwrap();
        assert_eq!(TransactionPipeline::for_account(&bnp), TransactionPipeline::Bnp);
        assert_eq!(BalancePipeline::for_account(&bnp), BalancePipeline::Bnp);

        let brs = Account::boursorama("CHQ", "b", "0002").unwrap();
        assert_eq!(
            TransactionPipeline::for_account(&brs),
            TransactionPipeline::Boursorama
        );

        let ftn = Account::fortuneo("CHQ", "c", "12345").unwrap();
        assert_eq!(
            TransactionPipeline::for_account(&ftn),
            TransactionPipeline::Fortuneo
        );
        assert_eq!(BalancePipeline::for_account(&ftn), BalancePipeline::General);

        let cep = Account::caisse_epargne("CHQ", "d", "5678").unwrap();
        assert_eq!(
            TransactionPipeline::for_account(&cep),
            TransactionPipeline::CaisseEpargne
        );
        assert_eq!(BalancePipeline::for_account(&cep), BalancePipeline::General);

        let rev = Account::revolut("CASH", "e", "abc", "USD", &[]).unwrap();
        assert_eq!(
            TransactionPipeline::for_account(&rev),
            TransactionPipeline::Revolut
        );
        assert_eq!(BalancePipeline::for_account(&rev), BalancePipeline::Revolut);

        let gold = Account::revolut(REVOLUT_COMMODITIES, "f", "abc", "USD", &[]).unwrap();
        assert_eq!(TransactionPipeline::for_account(&gold), TransactionPipeline::Noop);
        assert_eq!(BalancePipeline::for_account(&gold), BalancePipeline::General);

        let unknown = Account::unknown();
        assert_eq!(
            TransactionPipeline::for_account(&unknown),
            TransactionPipeline::Noop
        );
        assert_eq!(BalancePipeline::for_account(&unknown), BalancePipeline::General);
    }

    #[test]
    fn test_append_transactions_new_file() {
        let dir = tempfile::tempdir().unwrap();
        let csv = dir.path().join("my.csv");
        let account = Account::bnp("CHQ", "xxx", "****1234").unwrap();
        append_transactions(&csv, &[tx("2019-08-01", "myLabel", 10.0)], &account).unwrap();
        assert_eq!(
            std::fs::read_to_string(&csv).unwrap(),
            "Date,Label,Amount,Currency,Type,MainCategory,SubCategory\n\
             2019-08-01,myLabel,10.0,EUR,,,\n"
        );
    }

    #[test]
    fn test_append_transactions_keeps_new_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let csv = dir.path().join("my.csv");
        std::fs::write(
            &csv,
            "Date,Label,Amount,Currency,Type,MainCategory,SubCategory\n\
             2019-08-01,myLabel,10.0,EUR,expense,food,restaurant\n",
        )
        .unwrap();
        let account = Account::bnp("CHQ", "xxx", "****1234").unwrap();
        let mut new_row = tx("2019-08-01", "myLabel", 10.0);
        new_row.tx_type = "transfer".to_string();
        append_transactions(&csv, &[new_row], &account).unwrap();
        assert_eq!(
            std::fs::read_to_string(&csv).unwrap(),
            "Date,Label,Amount,Currency,Type,MainCategory,SubCategory\n\
             2019-08-01,myLabel,10.0,EUR,transfer,,\n"
        );
    }

    #[test]
    fn test_append_transactions_currency_backfill() {
        let dir = tempfile::tempdir().unwrap();
        let csv = dir.path().join("my.csv");
        // legacy ledger without the Currency column
        std::fs::write(
            &csv,
            "Date,Label,Amount,Type,MainCategory,SubCategory\n\
             2019-08-01,myLabel,10.0,myType,main,sub\n",
        )
        .unwrap();
        let account = Account::bnp("CHQ", "xxx", "****1234").unwrap();
        append_transactions(&csv, &[tx("2019-08-02", "other", 5.0)], &account).unwrap();
        assert_eq!(
            std::fs::read_to_string(&csv).unwrap(),
            "Date,Label,Amount,Currency,Type,MainCategory,SubCategory\n\
             2019-08-01,myLabel,10.0,EUR,myType,main,sub\n\
             2019-08-02,other,5.0,EUR,,,\n"
        );
    }

    #[test]
    fn test_append_transactions_near_duplicates_kept() {
        // third-party payment sites (PayPal) do not provide distinguishable
        // labels; only a full key match is a duplicate
        let dir = tempfile::tempdir().unwrap();
        let csv = dir.path().join("my.csv");
        let account = Account::bnp("CHQ", "xxx", "****1234").unwrap();
        append_transactions(
            &csv,
            &[
                tx("2019-08-01", "myLabel", 10.0),
                tx("2019-08-01", "myLabel", 11.0),
            ],
            &account,
        )
        .unwrap();
        assert_eq!(
            std::fs::read_to_string(&csv).unwrap(),
            "Date,Label,Amount,Currency,Type,MainCategory,SubCategory\n\
             2019-08-01,myLabel,10.0,EUR,,,\n\
             2019-08-01,myLabel,11.0,EUR,,,\n"
        );
    }

    #[test]
    fn test_append_transactions_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let csv = dir.path().join("my.csv");
        let account = Account::bnp("CHQ", "xxx", "****1234").unwrap();
        let rows = vec![tx("2019-08-01", "a", 1.0), tx("2019-08-02", "b", -2.5)];
        append_transactions(&csv, &rows, &account).unwrap();
        let first = std::fs::read_to_string(&csv).unwrap();
        append_transactions(&csv, &rows, &account).unwrap();
        assert_eq!(std::fs::read_to_string(&csv).unwrap(), first);
    }

    #[test]
    fn test_append_transactions_sorted_by_date_label() {
        let dir = tempfile::tempdir().unwrap();
        let csv = dir.path().join("my.csv");
        let account = Account::bnp("CHQ", "xxx", "****1234").unwrap();
        append_transactions(
            &csv,
            &[
                tx("2019-08-02", "bbb", 1.0),
                tx("2019-08-01", "zzz", 2.0),
                tx("2019-08-01", "aaa", 3.0),
            ],
            &account,
        )
        .unwrap();
        let content = std::fs::read_to_string(&csv).unwrap();
        let labels: Vec<&str> = content
            .lines()
            .skip(1)
            .map(|l| l.split(',').nth(1).unwrap())
            .collect();
        assert_eq!(labels, vec!["aaa", "zzz", "bbb"]);
    }

    #[test]
    fn test_insert_balance_dedup_and_sort() {
        let dir = tempfile::tempdir().unwrap();
        let csv = dir.path().join("balance.xxx.EUR.csv");
        std::fs::write(
            &csv,
            "Date,Amount\n2019-08-29,300.0\n2019-09-01,200.0\n",
        )
        .unwrap();
        let account = Account::boursorama("LVR", "xxx", "001234").unwrap();
        let new = vec![
            BalanceRow {
                date: NaiveDate::from_ymd_opt(2019, 9, 3).unwrap(),
                amount: 1000.0,
                currency: "EUR".to_string(),
            },
            // replaces the existing snapshot on the same day
            BalanceRow {
                date: NaiveDate::from_ymd_opt(2019, 9, 1).unwrap(),
                amount: 250.0,
                currency: "EUR".to_string(),
            },
        ];
        let merged = insert_balance(&csv, &new, &account).unwrap();
        write_balance(&csv, &merged).unwrap();
        assert_eq!(
            std::fs::read_to_string(&csv).unwrap(),
            "Date,Amount,Currency\n\
             2019-08-29,300.00,EUR\n\
             2019-09-01,250.00,EUR\n\
             2019-09-03,1000.00,EUR\n"
        );
    }

    #[test]
    fn test_transaction_pipeline_run_partitions_by_month() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = test_cfg(dir.path());
        let download = dir.path().join("download");
        std::fs::create_dir(&download).unwrap();
        let source = download.join("E1851234.csv");
        std::fs::write(
            &source,
            b"Credit immobilier;Credit immobilier;****1234;03/07/2019;;-123 456,78\n\
05/06/2019;;; AMORTISSEMENT PRET 1234;67,97\n\
05/07/2019;;; AMORTISSEMENT PRET 1234;67,97\n",
        )
        .unwrap();
        let account = Account::bnp("CDI", "credit-BNP-P15", "****1234").unwrap();
        let mut summary = Summary::new(&download, "copy");

        TransactionPipeline::for_account(&account)
            .run(&account, &cfg, &source, &mut summary)
            .unwrap();

        let june = dir.path().join("2019-06/2019-06.credit-BNP-P15.csv");
        let july = dir.path().join("2019-07/2019-07.credit-BNP-P15.csv");
        assert_eq!(
            std::fs::read_to_string(&june).unwrap(),
            "Date,Label,Amount,Currency,Type,MainCategory,SubCategory\n\
             2019-06-05,AMORTISSEMENT PRET 1234,67.97,EUR,credit,,\n"
        );
        assert!(july.exists());
        assert!(summary.has_source(&source));
        assert!(summary.has_target(&june));
        assert!(summary.has_target(&july));
    }

    #[test]
    fn test_balance_pipeline_run() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = test_cfg(dir.path());
        let source = dir.path().join("E1851234.csv");
        std::fs::write(
            &source,
            b"Credit immobilier;Credit immobilier;****1234;03/07/2019;;-123 456,78\n\
05/06/2019;;; AMORTISSEMENT PRET 1234;67,97\n",
        )
        .unwrap();
        let account = Account::bnp("CDI", "credit-BNP-P15", "****1234").unwrap();
        let mut summary = Summary::new(dir.path(), "copy");

        BalancePipeline::for_account(&account)
            .run(&account, &cfg, &source, &mut summary)
            .unwrap();

        let balance_file = dir.path().join("balance.credit-BNP-P15.EUR.csv");
        assert_eq!(
            std::fs::read_to_string(&balance_file).unwrap(),
            "Date,Amount,Currency\n2019-07-03,-123456.78,EUR\n"
        );
        assert!(summary.has_target(&balance_file));
    }

    #[test]
    fn test_guess_meta_autocomplete_overrides_default() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = test_cfg(dir.path());
        cfg.autocomplete.push(crate::models::TxCompletion {
            regex: regex::Regex::new(r".*PRET.*").unwrap(),
            tx_type: "credit".to_string(),
            main_category: "housing".to_string(),
            sub_category: "loan".to_string(),
        });
        let account = Account::bnp("CHQ", "x", "****0001").unwrap();
        let mut rows = vec![
            tx("2019-08-01", "AMORTISSEMENT PRET 1234", -10.0),
            tx("2019-08-02", "CARTE FNAC", -20.0),
        ];
        TransactionPipeline::Bnp.guess_meta(&account, &cfg, &mut rows);
        assert_eq!(rows[0].tx_type, "credit");
        assert_eq!(rows[0].main_category, "housing");
        assert_eq!(rows[0].sub_category, "loan");
        // default from the CHQ account type, no rule matched
        assert_eq!(rows[1].tx_type, "expense");
        assert_eq!(rows[1].main_category, "");
    }

    #[test]
    fn test_fmt_amount() {
        assert_eq!(fmt_amount(10.0), "10.0");
        assert_eq!(fmt_amount(-11.0), "-11.0");
        assert_eq!(fmt_amount(67.97), "67.97");
        assert_eq!(fmt_amount(-123456.78), "-123456.78");
        assert_eq!(fmt_amount(0.0), "0.0");
    }
}
