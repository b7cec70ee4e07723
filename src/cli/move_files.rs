use std::path::PathBuf;

use regex::Regex;

use crate::config::Configuration;
use crate::error::Result;
use crate::exchange_rate;
use crate::models::Summary;
use crate::pipeline::{BalancePipeline, TransactionPipeline};

/// Scan the download directory, match every file against every configured
/// account and run the matching pipelines. A decode failure aborts that
/// file's integration, is reported, and the scan continues; the final
/// summary shows what actually went through.
pub fn run(cfg: &Configuration) -> Result<()> {
    let mut summary = Summary::new(&cfg.download_dir, "copy");
    let webstat = Regex::new(r"Webstat_Export_.+\.csv")?;

    let mut paths: Vec<PathBuf> = Vec::new();
    for entry in std::fs::read_dir(&cfg.download_dir)? {
        let path = entry?.path();
        if path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();

    for path in &paths {
        for account in &cfg.accounts {
            if !account.matches(path) {
                continue;
            }
            let transactions = TransactionPipeline::for_account(account);
            if let Err(e) = transactions.run(account, cfg, path, &mut summary) {
                println!("{e}");
                continue;
            }
            let balances = BalancePipeline::for_account(account);
            if let Err(e) = balances.run(account, cfg, path, &mut summary) {
                println!("{e}");
            }
        }

        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
        if webstat.find(name).is_some_and(|m| m.start() == 0) {
            let today = chrono::Local::now().date_naive();
            if let Err(e) = exchange_rate::import_webstat(cfg, path, &mut summary, today) {
                println!("{e}");
            }
        }
    }

    println!("{summary}");
    Ok(())
}
