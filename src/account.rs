use std::fmt;
use std::path::Path;

use chrono::NaiveDate;
use regex::Regex;

use crate::error::{CoffreError, Result};

/// Revolut sub-account type whose statements are matched but never
/// integrated (commodities positions are not cash movements).
pub const REVOLUT_COMMODITIES: &str = "GLD";

pub const BASE_CURRENCY: &str = "EUR";

// ---------------------------------------------------------------------------
// Institutions
// ---------------------------------------------------------------------------

/// Closed set of supported institutions. Pipeline dispatch matches on this
/// tag instead of runtime type inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Institution {
    Bnp,
    Boursorama,
    CaisseEpargne,
    Degiro,
    Fortuneo,
    October,
    Revolut,
    Unknown,
}

// ---------------------------------------------------------------------------
// Account
// ---------------------------------------------------------------------------

/// A configured financial account: institution tag, symbolic id (used as the
/// filename key), matching key `num` (often an account-number suffix), its
/// currency and the compiled filename patterns.
#[derive(Clone)]
pub struct Account {
    pub institution: Institution,
    /// Institution-specific short code, e.g. CHQ (Compte de Cheque),
    /// LVA (Livret A), LDD (Livret de Developpement Durable), CDI (Credit
    /// Immobilier), GLD (Gold).
    pub kind: String,
    pub id: String,
    pub num: String,
    pub currency: String,
    patterns: Vec<Regex>,
}

fn last4(num: &str) -> &str {
    let n = num.len();
    if n > 4 {
        &num[n - 4..]
    } else {
        num
    }
}

fn compile(patterns: &[String]) -> Result<Vec<Regex>> {
    patterns.iter().map(|p| Ok(Regex::new(p)?)).collect()
}

impl Account {
    fn build(
        institution: Institution,
        kind: &str,
        id: &str,
        num: &str,
        currency: &str,
        patterns: Vec<String>,
    ) -> Result<Self> {
        Ok(Self {
            institution,
            kind: kind.to_string(),
            id: id.to_string(),
            num: num.to_string(),
            currency: currency.to_string(),
            patterns: compile(&patterns)?,
        })
    }

    /// BNP Paribas: `E{digits}{account-suffix}.csv`, e.g. "E1851234.csv".
    pub fn bnp(kind: &str, id: &str, num: &str) -> Result<Self> {
        let pattern = format!("E\\d{{0,3}}{}\\.csv", regex::escape(last4(num)));
        Self::build(Institution::Bnp, kind, id, num, BASE_CURRENCY, vec![pattern])
    }

    /// Boursorama: `export-operations-DD-MM-YYYY_....csv`. The export's
    /// reference date only exists in the filename, captured as `date`.
    pub fn boursorama(kind: &str, id: &str, num: &str) -> Result<Self> {
        Self::build(
            Institution::Boursorama,
            kind,
            id,
            num,
            BASE_CURRENCY,
            vec![r"export-operations-(?P<date>\d{2}-\d{2}-\d{4})_.+\.csv".to_string()],
        )
    }

    /// Caisse d'Epargne: `{account}_{startDate}_{endDate}.csv` where dates
    /// are DDMMYYYY and `num` may be a suffix of the embedded account number.
    pub fn caisse_epargne(kind: &str, id: &str, num: &str) -> Result<Self> {
        let pattern = format!(r"\d*{}_\d{{8}}_\d{{8}}\.csv", regex::escape(num));
        Self::build(Institution::CaisseEpargne, kind, id, num, BASE_CURRENCY, vec![pattern])
    }

    pub fn degiro(kind: &str, id: &str, num: &str) -> Result<Self> {
        Self::build(
            Institution::Degiro,
            kind,
            id,
            num,
            BASE_CURRENCY,
            vec![r"Portfolio\.csv".to_string()],
        )
    }

    /// Fortuneo: `HistoriqueOperations_{account}_du_DD_MM_YYYY_au_DD_MM_YYYY.csv`.
    pub fn fortuneo(kind: &str, id: &str, num: &str) -> Result<Self> {
        Self::build(
            Institution::Fortuneo,
            kind,
            id,
            num,
            BASE_CURRENCY,
            vec![
                r"HistoriqueOperations_(\d+)_du_\d{2}_\d{2}_\d{4}_au_\d{2}_\d{2}_\d{4}\.csv"
                    .to_string(),
            ],
        )
    }

    /// October: `remboursements-{account}.xlsx` (full id required).
    pub fn october(kind: &str, id: &str, num: &str) -> Result<Self> {
        let pattern = format!(r"remboursements-{}\.xlsx", regex::escape(num));
        Self::build(Institution::October, kind, id, num, BASE_CURRENCY, vec![pattern])
    }

    /// Revolut changed its statement naming over time, so the fixed pattern
    /// set has two entries; users may add more via `expressions`.
    pub fn revolut(
        kind: &str,
        id: &str,
        num: &str,
        currency: &str,
        extra_patterns: &[String],
    ) -> Result<Self> {
        let mut patterns = vec![
            r"Revolut-(.*)-Statement-(.*)\.csv".to_string(),
            format!(
                r"account-statement_(\d{{4}}-\d{{2}}-\d{{2}})_(\d{{4}}-\d{{2}}-\d{{2}})_undefined-undefined_{}\.csv",
                regex::escape(num)
            ),
        ];
        patterns.extend_from_slice(extra_patterns);
        Self::build(Institution::Revolut, kind, id, num, currency, patterns)
    }

    /// An account from an unsupported company: matches only what the user
    /// configured, routes to the noop pipelines.
    pub fn general(kind: &str, id: &str, num: &str, currency: &str, patterns: Vec<String>) -> Result<Self> {
        Self::build(Institution::Unknown, kind, id, num, currency, patterns)
    }

    /// Sentinel returned by reverse lookups on unrecognized ledger files.
    pub fn unknown() -> Self {
        Self {
            institution: Institution::Unknown,
            kind: "unknown".to_string(),
            id: "unknown".to_string(),
            num: "unknown".to_string(),
            currency: BASE_CURRENCY.to_string(),
            patterns: Vec::new(),
        }
    }

    /// True if any pattern matches the file's base name, anchored at start.
    pub fn matches(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        self.patterns
            .iter()
            .any(|p| p.find(name).is_some_and(|m| m.start() == 0))
    }

    /// True if `full_num` designates this account. Exports that bundle
    /// several sub-accounts carry full account numbers; `num` is a suffix.
    pub fn is_account(&self, full_num: &str) -> bool {
        full_num.ends_with(&self.num)
    }

    /// Part of the account number, masked for display.
    pub fn altered_num(&self) -> String {
        format!("****{}", last4(&self.num))
    }

    pub fn filename(&self) -> String {
        format!("{}.csv", self.id)
    }

    pub fn balance_filename(&self) -> String {
        format!("balance.{}.{}.csv", self.id, self.currency)
    }

    /// The balance series standardized to the base currency; needed because
    /// assets may be held in multiple currencies.
    pub fn converted_balance_filename(&self) -> String {
        format!("balance.{}.{}.csv", self.id, BASE_CURRENCY)
    }

    pub fn needs_conversion(&self) -> bool {
        self.currency != BASE_CURRENCY
    }

    /// Extract the export's reference date encoded in a matched filename
    /// (Boursorama only: `date` capture group, day-first).
    pub fn operations_date(&self, filename: &str) -> Result<NaiveDate> {
        for p in &self.patterns {
            if let Some(caps) = p.captures(filename) {
                if let Some(d) = caps.name("date") {
                    if let Ok(date) = NaiveDate::parse_from_str(d.as_str(), "%d-%m-%Y") {
                        return Ok(date);
                    }
                }
            }
        }
        Err(CoffreError::Other(format!(
            "failed to find date from the filename: {filename}"
        )))
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("institution", &self.institution)
            .field("kind", &self.kind)
            .field("id", &self.id)
            .field("num", &self.altered_num())
            .field("currency", &self.currency)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Reverse lookup: ledger filename -> account
// ---------------------------------------------------------------------------

/// A balance file mapped back to its owning account. `is_original` is true
/// for the native-currency series, false for the EUR-converted one.
#[derive(Debug)]
pub struct BalanceFile {
    pub account: Account,
    pub is_original: bool,
}

pub struct AccountParser<'a> {
    accounts: &'a [Account],
}

impl<'a> AccountParser<'a> {
    pub fn new(accounts: &'a [Account]) -> Self {
        Self { accounts }
    }

    fn by_id(&self, id: &str) -> Option<&Account> {
        self.accounts.iter().find(|a| a.id == id)
    }

    /// Map a monthly ledger filename (`{month}.{id}.csv`) back to its
    /// account. Unrecognized files return the unknown sentinel.
    pub fn parse(&self, path: &Path) -> Account {
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
        let parts: Vec<&str> = name.split('.').collect();
        if parts.len() == 3 {
            if let Some(account) = self.by_id(parts[1]) {
                return account.clone();
            }
        }
        Account::unknown()
    }

    /// Map a balance filename (`balance.{id}.{currency}.csv`) back to its
    /// account. Returns None when the name is not a balance series.
    pub fn parse_balance(&self, path: &Path) -> Option<BalanceFile> {
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
        let parts: Vec<&str> = name.split('.').collect();
        if parts.len() != 4 || parts[0] != "balance" || parts[3] != "csv" {
            return None;
        }
        let currency = parts[2];
        match self.by_id(parts[1]) {
            Some(account) => Some(BalanceFile {
                is_original: currency == account.currency,
                account: account.clone(),
            }),
            None => Some(BalanceFile {
                account: Account::unknown(),
                is_original: false,
            }),
        }
    }
}
