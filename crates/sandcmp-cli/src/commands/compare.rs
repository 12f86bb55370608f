use crate::support::{
    EXIT_DISCREPANCY, EXIT_ERROR, equivalence_or_exit, load_config_or_exit, load_graph_or_exit,
    parse_form_or_exit, policy_input_or_exit,
};
use sandcmp_kernel::{
    ComparisonReport, NodeEqualityMode, OperationGraph, REPORT_KIND, REPORT_SCHEMA, compare_graphs,
};
use sandcmp_store::{ConfigOverrides, PolicyInput};
use serde_json::{Value, json};

const COMMAND: &str = "compare";

type Side<'a> = (&'a PolicyInput, &'a OperationGraph);

pub struct Args {
    pub config: Option<String>,
    pub reference: String,
    pub reference_form: String,
    pub candidate: String,
    pub candidate_form: String,
    pub ops_table: Option<String>,
    pub release: Option<String>,
    pub regex: bool,
    pub compiler: Option<Vec<String>>,
    pub decompiler: Option<Vec<String>>,
    pub json: bool,
}

pub fn run(args: Args) {
    log::debug!("compare {} against {}", args.candidate, args.reference);
    let config = load_config_or_exit(
        COMMAND,
        args.config.as_deref(),
        ConfigOverrides {
            node_equality: args.regex.then_some(NodeEqualityMode::RegexAutomaton),
            compiler: args.compiler,
            decompiler: args.decompiler,
        },
    );
    let reference_form = parse_form_or_exit(COMMAND, &args.reference_form);
    let candidate_form = parse_form_or_exit(COMMAND, &args.candidate_form);

    // Every input check happens before anything is loaded.
    let equivalence = equivalence_or_exit(COMMAND, &config);
    let reference_input =
        policy_input_or_exit(COMMAND, args.reference, reference_form, None, None);
    let candidate_input = policy_input_or_exit(
        COMMAND,
        args.candidate,
        candidate_form,
        args.ops_table,
        args.release,
    );

    let loader = config.loader();
    let reference = load_graph_or_exit(&loader, &reference_input);
    let candidate = load_graph_or_exit(&loader, &candidate_input);

    let report = compare_graphs(&reference, &candidate, equivalence.as_ref());

    if args.json {
        let payload = json_payload(
            &report,
            config.node_equality,
            (&reference_input, &reference),
            (&candidate_input, &candidate),
        );
        let rendered = serde_json::to_string_pretty(&payload).unwrap_or_else(|err| {
            eprintln!("error: failed to render comparison payload: {err}");
            std::process::exit(EXIT_ERROR);
        });
        println!("{rendered}");
    } else {
        print!("{}", report.render_text());
    }

    if report.has_discrepancy() {
        std::process::exit(EXIT_DISCREPANCY);
    }
}

fn side_payload((input, graph): Side<'_>) -> Value {
    json!({
        "path": input.path().display().to_string(),
        "form": input.form().to_string(),
        "operationCount": graph.operation_count(),
        "pathCount": graph.path_count(),
    })
}

fn json_payload(
    report: &ComparisonReport,
    mode: NodeEqualityMode,
    reference: Side<'_>,
    candidate: Side<'_>,
) -> Value {
    json!({
        "schema": REPORT_SCHEMA,
        "reportKind": REPORT_KIND,
        "result": report.result(),
        "equivalent": report.is_equivalent(),
        "referenceDigest": reference.1.fingerprint(),
        "candidateDigest": candidate.1.fingerprint(),
        "nodeEquality": mode,
        "reference": side_payload(reference),
        "candidate": side_payload(candidate),
        "missingOperations": report.missing_operations,
        "spuriousOperations": report.spurious_operations,
        "operations": report.operations,
        "metrics": report.metrics,
    })
}
