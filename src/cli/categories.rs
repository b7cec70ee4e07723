use crate::config::Configuration;
use crate::error::Result;

pub fn run(cfg: &Configuration, prefix: &str) -> Result<()> {
    for category in cfg.categories(|c| c.starts_with(prefix)) {
        println!("{category}");
    }
    Ok(())
}
