use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use regex::Regex;
use serde::Deserialize;

use crate::account::{Account, Institution, BASE_CURRENCY};
use crate::error::{CoffreError, Result};
use crate::models::TxCompletion;

pub const CONFIG_FILENAME: &str = "finance-tools.yml";

// ---------------------------------------------------------------------------
// Raw YAML shape
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RawConfig {
    accounts: BTreeMap<String, RawAccount>,
    #[serde(default)]
    categories: Option<Vec<String>>,
    #[serde(default)]
    categories_to_rename: Option<BTreeMap<String, String>>,
    #[serde(rename = "auto-complete", default)]
    auto_complete: Option<Vec<RawCompletion>>,
    #[serde(rename = "exchange-rate", default)]
    exchange_rate: Option<RawExchangeRate>,
    #[serde(rename = "download-dir")]
    download_dir: String,
}

/// One account entry. Unknown keys (e.g. a free-form `label`) are tolerated.
#[derive(Debug, Deserialize)]
struct RawAccount {
    company: String,
    #[serde(rename = "type")]
    kind: String,
    id: String,
    #[serde(default)]
    currency: Option<String>,
    #[serde(default)]
    expr: Option<String>,
    #[serde(default)]
    expressions: Option<Vec<String>>,
}

/// An auto-complete rule, e.g. `expr: '.*FLUNCH.*'` / `type: expense` /
/// `cat: food/restaurant`.
#[derive(Debug, Deserialize)]
struct RawCompletion {
    expr: String,
    #[serde(rename = "type")]
    tx_type: String,
    cat: String,
}

#[derive(Debug, Deserialize)]
struct RawExchangeRate {
    #[serde(rename = "watched-currencies")]
    watched_currencies: Vec<String>,
}

// ---------------------------------------------------------------------------
// Typed configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct ExchangeRateConfig {
    pub watched_currencies: Vec<String>,
}

impl ExchangeRateConfig {
    /// The base currency is not configurable, it can only be euro for now.
    pub fn base_currency(&self) -> &'static str {
        BASE_CURRENCY
    }
}

/// Type-safe representation of the user configuration. Built once per run,
/// read-only afterwards.
#[derive(Debug)]
pub struct Configuration {
    pub accounts: Vec<Account>,
    pub category_set: BTreeSet<String>,
    pub categories_to_rename: BTreeMap<String, String>,
    pub autocomplete: Vec<TxCompletion>,
    pub download_dir: PathBuf,
    pub root_dir: PathBuf,
    pub exchange_rate: ExchangeRateConfig,
}

impl Configuration {
    /// Configured categories matching `filter`, sorted, without duplicates.
    pub fn categories<F>(&self, filter: F) -> Vec<String>
    where
        F: Fn(&str) -> bool,
    {
        self.category_set
            .iter()
            .filter(|c| filter(c))
            .cloned()
            .collect()
    }

    pub fn exchange_rate_csv_path(&self) -> PathBuf {
        self.root_dir.join("exchange-rate.csv")
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Load `finance-tools.yml` from the finance root. The `DOWNLOAD_DIR`
/// environment variable overrides the configured download directory.
pub fn load(root_dir: &Path) -> Result<Configuration> {
    let path = root_dir.join(CONFIG_FILENAME);
    let text = std::fs::read_to_string(&path)
        .map_err(|e| CoffreError::Config(format!("cannot read {}: {e}", path.display())))?;
    let raw: RawConfig = serde_yaml::from_str(&text)?;
    let download_override = std::env::var("DOWNLOAD_DIR").ok().map(|d| expand_user(&d));
    from_raw(raw, root_dir, download_override)
}

fn from_raw(
    raw: RawConfig,
    root_dir: &Path,
    download_override: Option<PathBuf>,
) -> Result<Configuration> {
    let accounts = build_accounts(raw.accounts)?;
    validate_caisse_epargne_nums(&accounts)?;

    let mut autocomplete = Vec::new();
    for rule in raw.auto_complete.unwrap_or_default() {
        autocomplete.push(build_completion(rule)?);
    }

    let categories_to_rename = raw.categories_to_rename.unwrap_or_default();
    for (old, new) in &categories_to_rename {
        if !old.contains('/') || !new.contains('/') {
            return Err(CoffreError::Config(format!(
                "categories_to_rename entries must be 'main/sub': {old:?} -> {new:?}"
            )));
        }
    }

    let download_dir =
        download_override.unwrap_or_else(|| expand_user(&raw.download_dir));

    Ok(Configuration {
        accounts,
        category_set: raw.categories.unwrap_or_default().into_iter().collect(),
        categories_to_rename,
        autocomplete,
        download_dir,
        root_dir: root_dir.to_path_buf(),
        exchange_rate: ExchangeRateConfig {
            watched_currencies: raw
                .exchange_rate
                .map(|e| e.watched_currencies)
                .unwrap_or_default(),
        },
    })
}

fn build_completion(raw: RawCompletion) -> Result<TxCompletion> {
    let (main, sub) = raw.cat.split_once('/').ok_or_else(|| {
        CoffreError::Config(format!(
            "auto-complete category must be 'main/sub', got: {:?}",
            raw.cat
        ))
    })?;
    Ok(TxCompletion {
        regex: Regex::new(&raw.expr)?,
        tx_type: raw.tx_type,
        main_category: main.to_string(),
        sub_category: sub.to_string(),
    })
}

fn build_accounts(raw: BTreeMap<String, RawAccount>) -> Result<Vec<Account>> {
    let mut accounts = Vec::new();
    for (symbolic_id, fields) in raw {
        let currency = fields.currency.as_deref().unwrap_or(BASE_CURRENCY);
        let account = match fields.company.as_str() {
            "BNP" => {
                warn_fixed_convention("BNP Paribas", &fields);
                Account::bnp(&fields.kind, &symbolic_id, &fields.id)?
            }
            "Boursorama" => {
                warn_fixed_convention("Boursorama", &fields);
                Account::boursorama(&fields.kind, &symbolic_id, &fields.id)?
            }
            "Caisse d'Epargne" => {
                warn_fixed_convention("Caisse d'Epargne", &fields);
                Account::caisse_epargne(&fields.kind, &symbolic_id, &fields.id)?
            }
            "Degiro" => Account::degiro(&fields.kind, &symbolic_id, &fields.id)?,
            "Fortuneo" => {
                warn_fixed_convention("Fortuneo", &fields);
                Account::fortuneo(&fields.kind, &symbolic_id, &fields.id)?
            }
            "October" => {
                warn_fixed_convention("October", &fields);
                // full id required by data lookup
                Account::october(&fields.kind, &symbolic_id, &fields.id)?
            }
            "Revolut" => {
                warn_fixed_convention("Revolut", &fields);
                let extra = fields.expressions.clone().unwrap_or_default();
                Account::revolut(&fields.kind, &symbolic_id, &fields.id, currency, &extra)?
            }
            _ => {
                let patterns = fields.expr.clone().into_iter().collect();
                Account::general(&fields.kind, &symbolic_id, &fields.id, currency, patterns)?
            }
        };
        accounts.push(account);
    }
    accounts.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(accounts)
}

/// Institutions with a fixed naming convention ignore a user-supplied
/// pattern; the user is told on stdout.
fn warn_fixed_convention(company: &str, fields: &RawAccount) {
    if let Some(expr) = &fields.expr {
        println!(
            "{company} has its own naming convention for downloaded files, \
             you cannot overwrite it: expr={expr:?}"
        );
    }
}

/// Account numbers are matched as filename suffixes for Caisse d'Epargne, so
/// two accounts sharing a suffix would route files ambiguously.
fn validate_caisse_epargne_nums(accounts: &[Account]) -> Result<()> {
    let mut by_num: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for account in accounts
        .iter()
        .filter(|a| a.institution == Institution::CaisseEpargne)
    {
        by_num
            .entry(account.num.as_str())
            .or_default()
            .push(account.id.as_str());
    }
    let details: Vec<String> = by_num
        .iter()
        .filter(|(_, ids)| ids.len() > 1)
        .map(|(num, ids)| format!("  - Account ID suffix '{}' is used by: {}", num, ids.join(", ")))
        .collect();
    if details.is_empty() {
        Ok(())
    } else {
        Err(CoffreError::Config(format!(
            "Duplicate Caisse d'Epargne account ID suffixes found. \
             This would cause ambiguous file matching.\n{}",
            details.join("\n")
        )))
    }
}

pub(crate) fn expand_user(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest.trim_start_matches('/'));
        }
    }
    PathBuf::from(path)
}
