use clap::Parser;
use nagare::prelude::*;
use nagare::storage::save_run;
use nagare::workflow::EditorWorkflow;
use std::fs;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// Compile and run a workflow saved by the visual editor
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the editor workflow JSON file
    workflow_path: String,

    /// Optional path to a JSON object of initial inputs, keyed by source name
    #[arg(short, long)]
    inputs: Option<String>,

    /// Prefix the echo completion service puts in front of every prompt
    #[arg(long, default_value = "")]
    echo_prefix: String,

    /// Reject direct source-to-sink connections
    #[arg(long)]
    strict: bool,

    /// Print the compiled plan before running it
    #[arg(long)]
    show_plan: bool,

    /// Directory to save the workflow and run result into (bincode)
    #[arg(long)]
    save_dir: Option<String>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("nagare=info,warn")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let total_start = Instant::now();

    // --- 1. Loading and conversion ---
    let workflow_json = fs::read_to_string(&cli.workflow_path).unwrap_or_else(|e| {
        exit_with_error(&format!(
            "Failed to read workflow file '{}': {}",
            &cli.workflow_path, e
        ))
    });
    let editor_doc = EditorWorkflow::from_json(&workflow_json)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to parse workflow JSON: {}", e)));
    let mut workflow = editor_doc
        .into_workflow()
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to convert workflow: {}", e)));
    if cli.strict {
        workflow = workflow.with_rules(ConnectionRules::strict());
    }

    let inputs = match &cli.inputs {
        Some(path) => RunInputs::from_file(path).unwrap_or_else(|e| {
            exit_with_error(&format!("Failed to load inputs from '{}': {}", path, e))
        }),
        None => RunInputs::new(),
    };

    // --- 2. Compilation ---
    let compile_start = Instant::now();
    let compiler = Compiler::builder()
        .with_completion_service(Arc::new(EchoService::new(cli.echo_prefix.clone())))
        .build();
    let plan = compiler
        .compile(&workflow)
        .unwrap_or_else(|e| exit_with_error(&format!("Compilation failed: {}", e)));
    let compile_duration = compile_start.elapsed();

    println!(
        "Compiled '{}': {} step(s) in {:?}",
        workflow.name,
        plan.len(),
        compile_duration
    );
    if cli.show_plan {
        print!("{}", plan);
    }

    // --- 3. Run ---
    let result = Runtime::new().run(&plan, &inputs.to_map()).await;
    println!();
    print!("{}", TraceFormatter::format_run(&result));

    // --- 4. Persistence ---
    if let Some(dir) = &cli.save_dir {
        let store = FileStore::open(dir)
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to open '{}': {}", dir, e)));
        save_workflow(&store, "workflow", &workflow)
            .and_then(|_| save_run(&store, "last-run", &result))
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to save state: {}", e)));
        println!("Saved workflow and run result to '{}'", dir);
    }

    println!("\nTotal: {:?}", total_start.elapsed());
    if !result.is_success() {
        std::process::exit(2);
    }
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
