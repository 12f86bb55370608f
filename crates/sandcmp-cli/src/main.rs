//! sandcmp CLI: the `sandcmp` command.

mod cli;
mod commands;
mod support;

use clap::Parser;
use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    support::init_logging(cli.verbose);
    let config = cli.config;

    match cli.command {
        Commands::Compare {
            reference,
            reference_form,
            candidate,
            candidate_form,
            ops_table,
            release,
            regex,
            compiler,
            decompiler,
            json,
        } => commands::compare::run(commands::compare::Args {
            config,
            reference,
            reference_form,
            candidate,
            candidate_form,
            ops_table,
            release,
            regex,
            compiler,
            decompiler,
            json,
        }),

        Commands::Normalize {
            input,
            form,
            ops_table,
            release,
            compiler,
            decompiler,
            out,
        } => commands::normalize::run(commands::normalize::Args {
            config,
            input,
            form,
            ops_table,
            release,
            compiler,
            decompiler,
            out,
        }),
    }
}
