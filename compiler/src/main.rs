use clap::Parser;

use symeig::id::IdAllocator;
use symeig::lowering::RecordingBuilder;
use symeig::node::{DeviceData, Node};
use symeig::{IrError, SymEig};

#[derive(Debug, Clone, clap::ValueEnum)]
enum EmitStage {
    Node,
    Shapes,
    Json,
    Lowered,
}

#[derive(Parser, Debug)]
#[command(
    name = "symeig",
    version,
    about = "Derive, describe, and lower an aten::symeig node for a given input shape"
)]
struct Cli {
    /// Input shape, e.g. `f32[4,5,5]`
    shape: String,

    /// Materialize the eigenvector matrix instead of an empty placeholder
    #[arg(long)]
    eigenvectors: bool,

    /// Read the lower triangle of the input instead of the upper
    #[arg(long)]
    lower: bool,

    /// Output stage
    #[arg(long, value_enum, default_value_t = EmitStage::Node)]
    emit: EmitStage,

    /// Print progress to stderr
    #[arg(long)]
    verbose: bool,
}

fn fail(err: &IrError) -> ! {
    eprintln!("symeig: {}", err.to_diagnostic());
    std::process::exit(1);
}

fn main() {
    let cli = Cli::parse();

    if cli.verbose {
        eprintln!("symeig: shape        = {}", cli.shape);
        eprintln!("symeig: eigenvectors = {}", cli.eigenvectors);
        eprintln!("symeig: lower        = {}", cli.lower);
        eprintln!("symeig: emit         = {:?}", cli.emit);
    }

    // ── Parse input shape ──
    let shape = match symeig::parser::parse_shape(&cli.shape).into_result() {
        Ok(s) => s,
        Err(diags) => {
            for diag in &diags {
                eprintln!("symeig: {}", diag);
            }
            std::process::exit(1);
        }
    };

    // ── Build nodes ──
    let mut ids = IdAllocator::new();
    let input_id = ids.alloc_node();
    let input_node = DeviceData::new(shape);
    let node = match SymEig::new(input_node.output(input_id), cli.eigenvectors, cli.lower) {
        Ok(n) => n,
        Err(e) => fail(&e),
    };
    let node_id = ids.alloc_node();

    if cli.verbose {
        eprintln!("symeig: {} = {}", input_id, input_node.describe());
        eprintln!("symeig: {} = {}", node_id, node.describe());
    }

    match cli.emit {
        EmitStage::Node => println!("{}", node),
        EmitStage::Shapes => {
            println!("w: {}", node.eigenvalues_shape());
            println!("v: {}", node.eigenvectors_shape());
        }
        EmitStage::Json => match serde_json::to_string_pretty(&node.report()) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("symeig: error: {}", e);
                std::process::exit(1);
            }
        },
        EmitStage::Lowered => {
            let mut builder = RecordingBuilder::new();
            let inputs = match input_node.lower(&mut builder, &[]) {
                Ok(h) => h,
                Err(e) => fail(&e),
            };
            let outputs = match node.lower(&mut builder, &inputs) {
                Ok(h) => h,
                Err(e) => fail(&e),
            };
            if cli.verbose {
                eprintln!(
                    "symeig: lowered to {} instructions",
                    builder.instructions().len()
                );
            }
            print!("{}", builder);
            let results: Vec<String> = outputs.iter().map(|h| h.to_string()).collect();
            println!("results: {}", results.join(", "));
        }
    }
}
