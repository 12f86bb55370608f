use crate::support::{
    EXIT_ERROR, load_config_or_exit, load_graph_or_exit, parse_form_or_exit, policy_input_or_exit,
};
use sandcmp_store::{ConfigOverrides, write_graph, write_graph_to_path};

const COMMAND: &str = "normalize";

pub struct Args {
    pub config: Option<String>,
    pub input: String,
    pub form: String,
    pub ops_table: Option<String>,
    pub release: Option<String>,
    pub compiler: Option<Vec<String>>,
    pub decompiler: Option<Vec<String>>,
    pub out: Option<String>,
}

pub fn run(args: Args) {
    log::debug!("normalize {} ({} form)", args.input, args.form);
    let config = load_config_or_exit(
        COMMAND,
        args.config.as_deref(),
        ConfigOverrides {
            node_equality: None,
            compiler: args.compiler,
            decompiler: args.decompiler,
        },
    );
    let form = parse_form_or_exit(COMMAND, &args.form);
    let input = policy_input_or_exit(COMMAND, args.input, form, args.ops_table, args.release);
    let graph = load_graph_or_exit(&config.loader(), &input);

    match args.out {
        Some(out) => {
            write_graph_to_path(&out, &graph).unwrap_or_else(|err| {
                eprintln!("error: {err}");
                std::process::exit(EXIT_ERROR);
            });
            eprintln!(
                "wrote {} operations / {} paths to {out}",
                graph.operation_count(),
                graph.path_count()
            );
        }
        None => {
            let stdout = std::io::stdout();
            write_graph(&mut stdout.lock(), &graph).unwrap_or_else(|err| {
                eprintln!("error: failed to write graph: {err}");
                std::process::exit(EXIT_ERROR);
            });
        }
    }
}
