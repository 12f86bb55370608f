use sandcmp_kernel::{NodeEquivalence, OperationGraph};
use sandcmp_store::{
    ConfigOverrides, GraphForm, GraphLoader, InputError, PolicyInput, RunConfig,
};
use std::path::{Path, PathBuf};

/// Exit status when policies differ.
pub const EXIT_DISCREPANCY: i32 = 1;
/// Exit status for invalid input or unloadable policies.
pub const EXIT_ERROR: i32 = 2;

pub fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

pub fn exit_input_error(command: &str, err: InputError) -> ! {
    eprintln!("error: {err}");
    eprintln!("hint: see `sandcmp {command} --help`");
    std::process::exit(EXIT_ERROR);
}

pub fn parse_form_or_exit(command: &str, form: &str) -> GraphForm {
    form.parse().unwrap_or_else(|e| {
        eprintln!("error: {e}");
        eprintln!("hint: see `sandcmp {command} --help`");
        std::process::exit(EXIT_ERROR);
    })
}

pub fn load_config_or_exit(
    command: &str,
    config: Option<&str>,
    overrides: ConfigOverrides,
) -> RunConfig {
    RunConfig::load(config.map(Path::new))
        .and_then(|config| config.with_overrides(overrides))
        .unwrap_or_else(|e| exit_input_error(command, e.into()))
}

pub fn equivalence_or_exit(command: &str, config: &RunConfig) -> Box<dyn NodeEquivalence> {
    config
        .equivalence()
        .unwrap_or_else(|e| exit_input_error(command, e.into()))
}

pub fn policy_input_or_exit(
    command: &str,
    path: String,
    form: GraphForm,
    ops_table: Option<String>,
    release: Option<String>,
) -> PolicyInput {
    PolicyInput::new(path, form, ops_table.map(PathBuf::from), release)
        .unwrap_or_else(|e| exit_input_error(command, e))
}

pub fn load_graph_or_exit(loader: &GraphLoader, input: &PolicyInput) -> OperationGraph {
    loader.load(input).unwrap_or_else(|e| {
        eprintln!("error: failed to load {} policy: {e}", input.form());
        std::process::exit(EXIT_ERROR);
    })
}
