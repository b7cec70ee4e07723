mod account;
mod bnp;
mod boursorama;
mod caisse_epargne;
mod cli;
mod config;
mod consolidate;
mod decode;
mod error;
mod exchange_rate;
mod fortuneo;
mod models;
mod pipeline;
mod revolut;

use clap::{CommandFactory, Parser};

use cli::{Cli, Commands};

fn main() {
    let args = Cli::parse();

    if let Commands::Completions { shell } = &args.command {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        clap_complete::generate(*shell, &mut cmd, name, &mut std::io::stdout());
        return;
    }

    let root = cli::resolve_finance_root(args.finance_root.as_deref());
    let result = config::load(&root).and_then(|cfg| match args.command {
        Commands::Categories { prefix } => cli::categories::run(&cfg, prefix.as_deref().unwrap_or("")),
        Commands::Move => cli::move_files::run(&cfg),
        Commands::Convert => cli::convert::run(&cfg),
        Commands::Merge => cli::merge::run(&cfg),
        Commands::ConvertAndMerge => {
            cli::convert::run(&cfg).and_then(|_| cli::merge::run(&cfg))
        }
        Commands::Completions { .. } => unreachable!(),
    });

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
