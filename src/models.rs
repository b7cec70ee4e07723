use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use regex::Regex;

// ---------------------------------------------------------------------------
// Transaction types
// ---------------------------------------------------------------------------

/// Classification of a canonical transaction row.
///
/// Tax is deliberately distinct from expense: paying tax is an obligation
/// rather than a purchase, and some income taxes never appear in the ledgers
/// at all because they are deducted at the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxType {
    Credit,
    Income,
    Expense,
    Transfer,
    Tax,
}

impl TxType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Credit => "credit",
            Self::Income => "income",
            Self::Expense => "expense",
            Self::Transfer => "transfer",
            Self::Tax => "tax",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "credit" => Some(Self::Credit),
            "income" => Some(Self::Income),
            "expense" => Some(Self::Expense),
            "transfer" => Some(Self::Transfer),
            "tax" => Some(Self::Tax),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Canonical rows
// ---------------------------------------------------------------------------

/// Canonical transaction row shared by every institution decoder. The column
/// order of the persisted ledgers follows the field order here:
/// Date,Label,Amount,Currency,Type,MainCategory,SubCategory.
#[derive(Debug, Clone, PartialEq)]
pub struct TxRow {
    pub date: NaiveDate,
    pub label: String,
    pub amount: f64,
    pub currency: String,
    /// Empty until classified; unmapped institution codes may pass through
    /// and are rejected later by merge validation.
    pub tx_type: String,
    pub main_category: String,
    pub sub_category: String,
}

impl TxRow {
    pub fn new(date: NaiveDate, label: impl Into<String>, amount: f64, currency: impl Into<String>) -> Self {
        Self {
            date,
            label: label.into(),
            amount,
            currency: currency.into(),
            tx_type: String::new(),
            main_category: String::new(),
            sub_category: String::new(),
        }
    }

    /// Dedup identity: two rows with the same key are the same transaction.
    pub fn dedup_key(&self) -> (NaiveDate, String, u64) {
        (self.date, self.label.clone(), self.amount.to_bits())
    }

    /// Calendar month the row belongs to, e.g. "2019-06".
    pub fn month(&self) -> String {
        self.date.format("%Y-%m").to_string()
    }
}

/// Canonical balance snapshot. One row per account per day.
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceRow {
    pub date: NaiveDate,
    pub amount: f64,
    pub currency: String,
}

// ---------------------------------------------------------------------------
// Autocomplete rules
// ---------------------------------------------------------------------------

/// A label-matching rule that assigns type and category to a transaction.
/// Rules are evaluated in configured order, first match wins.
#[derive(Debug, Clone)]
pub struct TxCompletion {
    pub regex: Regex,
    pub tx_type: String,
    pub main_category: String,
    pub sub_category: String,
}

impl TxCompletion {
    /// The pattern is anchored at the start of the label, like the filename
    /// patterns on accounts.
    pub fn matches(&self, label: &str) -> bool {
        self.regex.find(label).is_some_and(|m| m.start() == 0)
    }
}

// ---------------------------------------------------------------------------
// Run summary
// ---------------------------------------------------------------------------

/// Accumulates every source consumed and target written during a run, then
/// renders once as the final report. Partial failures are visible through
/// omission from this report.
#[derive(Debug)]
pub struct Summary {
    source_dir: PathBuf,
    action: &'static str,
    sources: BTreeSet<PathBuf>,
    targets: BTreeSet<PathBuf>,
}

impl Summary {
    pub fn new(source_dir: &Path, action: &'static str) -> Self {
        Self {
            source_dir: source_dir.to_path_buf(),
            action,
            sources: BTreeSet::new(),
            targets: BTreeSet::new(),
        }
    }

    pub fn add_source(&mut self, source: &Path) {
        self.sources.insert(source.to_path_buf());
    }

    pub fn add_target(&mut self, target: &Path) {
        self.targets.insert(target.to_path_buf());
    }

    #[cfg(test)]
    pub fn has_source(&self, source: &Path) -> bool {
        self.sources.contains(source)
    }

    #[cfg(test)]
    pub fn has_target(&self, target: &Path) -> bool {
        self.targets.contains(target)
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.sources.is_empty() {
            return write!(
                f,
                "$$$ Summary $$$\n\
                 ---------------\n\
                 No CSV found in \"{}\".\n\
                 ---------------\n\
                 Finished.",
                self.source_dir.display()
            );
        }
        writeln!(f, "$$$ Summary $$$")?;
        writeln!(f, "---------------")?;
        writeln!(f, "{} files done (action: {}).", self.sources.len(), self.action)?;
        writeln!(f, "---------------")?;
        writeln!(f, "Sources:")?;
        for s in &self.sources {
            writeln!(f, "- {}", s.display())?;
        }
        writeln!(f, "Targets:")?;
        for t in &self.targets {
            writeln!(f, "- {}", t.display())?;
        }
        write!(f, "Finished.")
    }
}
