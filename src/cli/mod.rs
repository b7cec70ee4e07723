pub mod categories;
pub mod convert;
pub mod merge;
pub mod move_files;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

#[derive(Parser)]
#[command(
    name = "coffre",
    about = "Bank-export ingestion and monthly ledger CLI for personal finances."
)]
pub struct Cli {
    /// Folder where the configuration file is stored (default: $HOME/finances).
    #[arg(long = "finance-root", global = true, value_name = "FOLDER")]
    pub finance_root: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print configured categories, or those starting with the given prefix.
    #[command(alias = "cat")]
    Categories { prefix: Option<String> },
    /// Integrate downloaded export files into the finance root.
    Move,
    /// Convert foreign-currency balance histories to EUR.
    Convert,
    /// Merge monthly ledgers and balances into total.csv and balance.csv.
    Merge,
    /// Run convert, then merge.
    ConvertAndMerge,
    /// Generate shell completions.
    Completions { shell: Shell },
}

/// Resolve the finance root: explicit flag first, then the FINANCE_ROOT
/// environment variable, then $HOME/finances.
pub fn resolve_finance_root(flag: Option<&str>) -> PathBuf {
    if let Some(root) = flag {
        return crate::config::expand_user(root);
    }
    if let Ok(env) = std::env::var("FINANCE_ROOT") {
        if !env.is_empty() {
            return crate::config::expand_user(&env);
        }
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("finances")
}
