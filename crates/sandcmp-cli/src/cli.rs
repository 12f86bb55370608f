use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "sandcmp",
    about = "sandcmp: check that a decompiled sandbox profile matches its original",
    version
)]
pub struct Cli {
    /// Path to a TOML config file (default: ./sandcmp.toml when present)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Enable debug logging on stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compare a candidate profile graph against a reference graph
    Compare {
        /// Reference (original) policy
        #[arg(short = 'o', long, visible_alias = "original")]
        reference: String,

        /// Reference form: json or source
        #[arg(long, default_value = "json")]
        reference_form: String,

        /// Candidate (decompiled) policy
        #[arg(short = 'd', long, visible_alias = "decompiled")]
        candidate: String,

        /// Candidate form: json, source, or binary
        #[arg(long, default_value = "json")]
        candidate_form: String,

        /// Operations table for a binary candidate
        #[arg(long)]
        ops_table: Option<String>,

        /// Release/OS identifier for a binary candidate
        #[arg(long)]
        release: Option<String>,

        /// Compare regular expressions as automata instead of as strings
        #[arg(short = 'r', long)]
        regex: bool,

        /// Compiler command line; the source path is appended (give it last)
        #[arg(long, num_args = 1.., allow_hyphen_values = true, value_name = "ARGV")]
        compiler: Option<Vec<String>>,

        /// Decompiler command line; binary, ops table and release are appended (give it last)
        #[arg(long, num_args = 1.., allow_hyphen_values = true, value_name = "ARGV")]
        decompiler: Option<Vec<String>>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Load a policy in any form and emit its canonical graph JSON
    Normalize {
        /// Policy to load
        input: String,

        /// Input form: json, source, or binary
        #[arg(long, default_value = "json")]
        form: String,

        /// Operations table for a binary input
        #[arg(long)]
        ops_table: Option<String>,

        /// Release/OS identifier for a binary input
        #[arg(long)]
        release: Option<String>,

        /// Compiler command line; the source path is appended (give it last)
        #[arg(long, num_args = 1.., allow_hyphen_values = true, value_name = "ARGV")]
        compiler: Option<Vec<String>>,

        /// Decompiler command line; binary, ops table and release are appended (give it last)
        #[arg(long, num_args = 1.., allow_hyphen_values = true, value_name = "ARGV")]
        decompiler: Option<Vec<String>>,

        /// Write the graph here instead of stdout
        #[arg(long)]
        out: Option<String>,
    },
}
