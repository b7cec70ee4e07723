use std::path::PathBuf;

use crate::account::AccountParser;
use crate::config::Configuration;
use crate::error::Result;
use crate::exchange_rate;
use crate::models::Summary;

/// Re-run currency conversion for every native-currency balance history
/// whose account is not held in the base currency.
pub fn run(cfg: &Configuration) -> Result<()> {
    let mut summary = Summary::new(&cfg.download_dir, "convert");
    let parser = AccountParser::new(&cfg.accounts);

    let mut paths: Vec<PathBuf> = Vec::new();
    for entry in std::fs::read_dir(&cfg.root_dir)? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if path.is_file() && name.starts_with("balance.") && name.ends_with(".csv") {
            paths.push(path);
        }
    }
    paths.sort();

    for path in &paths {
        let Some(info) = parser.parse_balance(path) else {
            continue;
        };
        if info.is_original && info.account.needs_conversion() {
            exchange_rate::convert_balance(&info.account, cfg, path, &mut summary)?;
        }
    }

    println!("{summary}");
    Ok(())
}
