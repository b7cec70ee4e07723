use crate::config::Configuration;
use crate::consolidate;
use crate::error::Result;

pub fn run(cfg: &Configuration) -> Result<()> {
    consolidate::run(cfg)
}
