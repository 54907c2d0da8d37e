use clap::Parser;
use nagare::workflow::{EditorConnection, EditorNode, EditorWorkflow};
use rand::Rng;
use rand::seq::IndexedRandom;
use serde_json::{Map, json};
use std::fs;

/// Single-inbound kinds with the editor data they need.
const UNARY_KINDS: [&str; 6] = ["uppercase", "lowercase", "trim", "sort", "split", "filter"];

/// A CLI tool to generate random layered workflows for the Nagare runtime
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// The path to write the generated workflow JSON to
    #[arg(short, long, default_value = "generated_workflow.json")]
    output: String,

    /// Number of transform layers between the inputs and the output
    #[arg(long, default_value_t = 4)]
    layers: usize,

    /// Maximum number of nodes per layer
    #[arg(long, default_value_t = 5)]
    width: usize,

    /// Number of input nodes
    #[arg(long, default_value_t = 2)]
    inputs: usize,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    if cli.width == 0 || cli.inputs == 0 {
        eprintln!("Error: --width and --inputs must be at least 1");
        std::process::exit(1);
    }

    let mut rng = rand::rng();
    let mut nodes = Vec::new();
    let mut connections = Vec::new();

    let mut previous: Vec<String> = (0..cli.inputs)
        .map(|i| {
            let id = format!("input-{}", i);
            nodes.push(node(
                &id,
                "input",
                json!({ "name": id, "defaultValue": sample_text(&mut rng) }),
            ));
            id
        })
        .collect();

    for layer in 0..cli.layers {
        let count = rng.random_range(1..=cli.width);
        let mut current = Vec::with_capacity(count);
        for i in 0..count {
            let id = format!("l{}-n{}", layer, i);
            if previous.len() > 1 && rng.random_bool(0.3) {
                nodes.push(node(&id, "merge", json!({ "mergeType": "concat" })));
                let fan_in = rng.random_range(2..=previous.len().min(3));
                for from in previous.choose_multiple(&mut rng, fan_in) {
                    connect(from, &id, &mut connections);
                }
            } else {
                let kind = UNARY_KINDS.choose(&mut rng).copied().unwrap_or("trim");
                nodes.push(node(&id, kind, unary_data(kind)));
                if let Some(from) = previous.choose(&mut rng) {
                    connect(from, &id, &mut connections);
                }
            }
            current.push(id);
        }
        previous = current;
    }

    nodes.push(node("output", "output", json!({ "outputFormat": "text" })));
    for from in &previous {
        connect(from, "output", &mut connections);
    }

    let workflow = EditorWorkflow {
        name: format!("generated-{}x{}", cli.layers, cli.width),
        description: "Randomly generated layered workflow".to_string(),
        version: Some("1.0".to_string()),
        nodes,
        connections,
    };

    fs::write(&cli.output, workflow.to_json_pretty()?)?;
    println!(
        "Generated {} node(s) and {} connection(s) into '{}'",
        workflow.nodes.len(),
        workflow.connections.len(),
        cli.output
    );
    Ok(())
}

fn connect(from: &str, to: &str, connections: &mut Vec<EditorConnection>) {
    connections.push(EditorConnection {
        id: format!("conn-{}", connections.len() + 1),
        from: from.to_string(),
        to: to.to_string(),
    });
}

fn node(id: &str, kind: &str, data: serde_json::Value) -> EditorNode {
    let data = match data {
        serde_json::Value::Object(map) => map,
        _ => Map::new(),
    };
    EditorNode {
        id: id.to_string(),
        kind: kind.to_string(),
        role: None,
        data,
    }
}

fn unary_data(kind: &str) -> serde_json::Value {
    match kind {
        "sort" => json!({ "sortType": "length", "sortOrder": "desc" }),
        "split" => json!({ "splitType": "whitespace" }),
        "filter" => json!({ "condition": "min-length", "value": 3 }),
        _ => json!({}),
    }
}

fn sample_text(rng: &mut impl Rng) -> String {
    const WORDS: [&str; 8] = [
        "alpha", "river", "stone", "Cloud", "ember", "  lantern ", "quartz", "moss",
    ];
    let len = rng.random_range(3..=8);
    (0..len)
        .filter_map(|_| WORDS.choose(rng).copied())
        .collect::<Vec<_>>()
        .join(" ")
}
