use std::path::Path;

use chrono::NaiveDate;
use regex::Regex;

use crate::account::{Account, BASE_CURRENCY};
use crate::config::Configuration;
use crate::decode;
use crate::error::{CoffreError, Result};
use crate::models::{BalanceRow, Summary};
use crate::pipeline;

const PARSER: &str = "Banque de France Webstat (;-separated, 6 metadata lines)";

// ---------------------------------------------------------------------------
// Rate table import
// ---------------------------------------------------------------------------

/// Import a Banque de France daily rate export into the canonical
/// `exchange-rate.csv` (one `Date` column plus one column per watched
/// currency, each cell = units of that currency per euro).
///
/// The first six lines are descriptive metadata, not data:
///
/// ```text
/// Titre :;Dollar australien (AUD);Lev bulgare (BGN);...
/// Code série :;EXR.D.AUD.EUR.SP00.A;EXR.D.BGN.EUR.SP00.A;...
/// Unité :;Dollar Australien (AUD);Lev Nouveau (BGN);...
/// Magnitude :;Unités (0);Unités (0);...
/// Méthode d'observation :;Fin de période (E);...
/// Source :;BCE (Banque Centrale Européenne) (4F0);...
/// ```
///
/// Column names are the parenthesized codes in the *Unité* line. The output
/// is sorted ascending and padded with empty-rate rows up to `today`, so the
/// downstream forward-fill has a row to land on for recent dates.
pub fn import_webstat(
    cfg: &Configuration,
    source: &Path,
    summary: &mut Summary,
    today: NaiveDate,
) -> Result<()> {
    let text = decode::read_utf8(source)?;
    let lines: Vec<&str> = text.lines().collect();
    if lines.len() < 7 {
        return Err(CoffreError::decode(
            source,
            PARSER,
            format!("expected 6 metadata lines plus data, got {} lines", lines.len()),
        ));
    }

    let code_re = Regex::new(r"\((\w+)\)")?;
    let names: Vec<String> = lines[2]
        .split(';')
        .map(|cell| {
            code_re
                .captures(cell)
                .map(|c| c[1].to_string())
                .unwrap_or_else(|| "Date".to_string())
        })
        .collect();

    let watched = &cfg.exchange_rate.watched_currencies;
    let mut columns = Vec::with_capacity(watched.len());
    for currency in watched {
        let idx = names.iter().position(|n| n == currency).ok_or_else(|| {
            CoffreError::decode(source, PARSER, format!("currency {currency:?} not in the export"))
        })?;
        columns.push(idx);
    }

    let mut rows: Vec<(NaiveDate, Vec<Option<f64>>)> = Vec::new();
    for (i, line) in lines[6..].iter().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let cells: Vec<&str> = line.split(';').collect();
        let date = decode::parse_date_dmy(cells[0]).ok_or_else(|| {
            CoffreError::decode(source, PARSER, format!("bad date on line {}: {:?}", i + 7, cells[0]))
        })?;
        let values = columns
            .iter()
            .map(|&c| {
                let cell = cells.get(c).copied().unwrap_or("").trim();
                if cell == "-" {
                    None
                } else {
                    decode::parse_fr_amount(cell)
                }
            })
            .collect();
        rows.push((date, values));
    }
    rows.sort_by_key(|r| r.0);

    // pad forward to today; non-trading days get empty rates
    if let Some(mut last) = rows.last().map(|r| r.0) {
        while last < today {
            last = last + chrono::Duration::days(1);
            rows.push((last, vec![None; watched.len()]));
        }
    }

    let target = cfg.exchange_rate_csv_path();
    let mut wtr = csv::Writer::from_path(&target)?;
    let mut header = vec!["Date".to_string()];
    header.extend(watched.iter().cloned());
    wtr.write_record(&header)?;
    for (date, values) in &rows {
        let mut record = vec![date.format("%Y-%m-%d").to_string()];
        record.extend(
            values
                .iter()
                .map(|v| v.map(pipeline::fmt_amount).unwrap_or_default()),
        );
        wtr.write_record(&record)?;
    }
    wtr.flush()?;

    summary.add_source(source);
    summary.add_target(&target);
    Ok(())
}

// ---------------------------------------------------------------------------
// Rate table lookup
// ---------------------------------------------------------------------------

/// The canonical rate table, loaded for conversion.
pub struct RateTable {
    currencies: Vec<String>,
    rows: Vec<(NaiveDate, Vec<Option<f64>>)>,
}

impl RateTable {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CoffreError::Other(format!(
                "exchange-rate table not found at {}; drop a Webstat export into \
                 the download directory and run `move` first",
                path.display()
            )));
        }
        let mut rdr = csv::Reader::from_path(path)?;
        let headers = rdr.headers()?.clone();
        let currencies: Vec<String> = headers.iter().skip(1).map(|h| h.to_string()).collect();

        let mut rows = Vec::new();
        for (i, result) in rdr.records().enumerate() {
            let record = result?;
            let date_str = record.get(0).unwrap_or("");
            let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|_| {
                CoffreError::decode(path, "exchange-rate table", format!("bad date on line {}: {date_str:?}", i + 2))
            })?;
            let values = (1..headers.len())
                .map(|c| decode::parse_amount(record.get(c).unwrap_or("")))
                .collect();
            rows.push((date, values));
        }
        rows.sort_by_key(|r| r.0);
        Ok(Self { currencies, rows })
    }

    pub fn has_currency(&self, currency: &str) -> bool {
        currency == BASE_CURRENCY || self.currencies.iter().any(|c| c == currency)
    }

    /// Propagate the last known rate forward across missing dates
    /// (non-trading days and the padded tail).
    pub fn forward_fill(&mut self) {
        for col in 0..self.currencies.len() {
            let mut last: Option<f64> = None;
            for row in self.rows.iter_mut() {
                match row.1[col] {
                    Some(v) => last = Some(v),
                    None => row.1[col] = last,
                }
            }
        }
    }

    /// Rate for a currency on an exact date. Dates outside the table (before
    /// the first rate or after the padded tail) have no rate at all.
    pub fn rate_on(&self, date: NaiveDate, currency: &str) -> Option<f64> {
        if currency == BASE_CURRENCY {
            return Some(1.0);
        }
        let col = self.currencies.iter().position(|c| c == currency)?;
        let idx = self.rows.binary_search_by_key(&date, |r| r.0).ok()?;
        self.rows[idx].1[col]
    }
}

// ---------------------------------------------------------------------------
// Balance conversion
// ---------------------------------------------------------------------------

/// A balance converted to the base currency; the amount is undefined when no
/// rate was available even after forward-fill.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertedRow {
    pub date: NaiveDate,
    pub amount: Option<f64>,
}

/// Convert a native-currency balance history to EUR:
/// `amount_eur = amount_native / rate`, the rate being foreign currency per
/// euro (e.g. 100 USD / 1.0956 = 91.27 EUR).
pub fn convert_rows(
    rows: &[BalanceRow],
    currency: &str,
    rate_csv: &Path,
) -> Result<Vec<ConvertedRow>> {
    let mut table = RateTable::load(rate_csv)?;
    if !table.has_currency(currency) {
        return Err(CoffreError::Other(format!(
            "currency {currency:?} is not in the exchange-rate table; add it to \
             watched-currencies and re-import the rates"
        )));
    }
    table.forward_fill();
    Ok(rows
        .iter()
        .map(|row| ConvertedRow {
            date: row.date,
            amount: table.rate_on(row.date, currency).map(|rate| row.amount / rate),
        })
        .collect())
}

pub fn write_converted(path: &Path, rows: &[ConvertedRow]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(["Date", "Amount", "Currency"])?;
    for row in rows {
        wtr.write_record([
            row.date.format("%Y-%m-%d").to_string(),
            row.amount.map(|a| format!("{a:.2}")).unwrap_or_default(),
            BASE_CURRENCY.to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Convert one account's native balance file and write the EUR series next
/// to it (the `convert` command path; `move` converts inline after a balance
/// update).
pub fn convert_balance(
    account: &Account,
    cfg: &Configuration,
    balance_csv: &Path,
    summary: &mut Summary,
) -> Result<()> {
    let rows = pipeline::read_balance_history(balance_csv, &account.currency)?;
    let converted = convert_rows(&rows, &account.currency, &cfg.exchange_rate_csv_path())?;
    let target = cfg.root_dir.join(account.converted_balance_filename());
    write_converted(&target, &converted)?;
    summary.add_source(balance_csv);
    summary.add_target(&target);
    Ok(())
}
