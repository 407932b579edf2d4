//! Strata CLI - Re-editable Image Layer Chains
//!
//! A demonstration CLI for the Strata library.

use anyhow::{anyhow, bail, Context, Result};
use std::path::PathBuf;
use strata::prelude::*;

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage(&args[0]);
        return;
    }

    let result = match args[1].as_str() {
        "list" => {
            list_operations();
            Ok(())
        }
        "info" => match args.get(2) {
            Some(id) => operation_info(id),
            None => Err(anyhow!("Please specify an operation type")),
        },
        "process" => process_image(&args[2..]),
        "help" | "--help" | "-h" => {
            print_usage(&args[0]);
            Ok(())
        }
        other => {
            print_usage(&args[0]);
            Err(anyhow!("Unknown command: {}", other))
        }
    };

    if let Err(error) = result {
        eprintln!("❌ {:#}", error);
        std::process::exit(1);
    }
}

fn print_usage(program: &str) {
    println!("🎨 Strata - Re-editable Image Layer Chains v{}", strata::VERSION);
    println!();
    println!("Usage: {} <command> [options]", program);
    println!();
    println!("Commands:");
    println!("  list                          List all operation types");
    println!("  info <type>                   Show details about an operation type");
    println!("  process <in> <out> [options]  Run a layer chain over an image");
    println!("  help                          Show this help message");
    println!();
    println!("Process options:");
    println!("  --op <json>        Append a layer, e.g. '{{\"type\":\"box_blur\",\"kernelSize\":5}}'");
    println!("  --rotate <deg>     Rotate the input first (90, 180 or 270)");
    println!("  --mirror <axis>    Mirror the input first (vertical or horizontal)");
    println!("  --config <file>    Load executor settings and defaults from TOML");
    println!();
    println!("Set RUST_LOG=debug to trace cache and executor activity.");
}

fn list_operations() {
    let registry = OperationRegistry::with_builtins();
    println!("Available operations ({} total):", registry.len());
    println!();

    for category in [Category::Color, Category::Convolution, Category::Geometric] {
        println!("  📁 {}", category);
        for metadata in registry.by_category(category) {
            println!("      • {} - {}", metadata.id, metadata.description);
        }
        println!();
    }
}

fn operation_info(id: &str) -> Result<()> {
    let registry = OperationRegistry::with_builtins();
    let metadata = registry
        .get_metadata(id)
        .ok_or_else(|| anyhow!("Operation not found: {} (use 'list' to see available types)", id))?;

    println!("Operation: {}", metadata.name);
    println!("Type: {}", metadata.id);
    println!("Category: {}", metadata.category);
    println!();
    println!("Description:");
    println!("  {}", metadata.description);

    if !metadata.parameters.is_empty() {
        println!();
        println!("Parameters:");
        for parameter in &metadata.parameters {
            println!("  • {}", parameter);
        }
    }
    Ok(())
}

/// Options of the `process` command.
#[derive(Default)]
struct ProcessOptions {
    input: PathBuf,
    output: PathBuf,
    requests: Vec<OperationRequest>,
    rotate: Option<RotationAngle>,
    mirror: Option<MirrorAxis>,
    config: Option<PathBuf>,
}

fn parse_process_args(args: &[String]) -> Result<ProcessOptions> {
    let (input, output) = match args {
        [input, output, ..] => (input, output),
        _ => bail!("Please specify input and output paths"),
    };
    let mut options = ProcessOptions {
        input: PathBuf::from(input),
        output: PathBuf::from(output),
        ..ProcessOptions::default()
    };

    let mut rest = args[2..].iter();
    while let Some(flag) = rest.next() {
        let mut value = || rest.next().ok_or_else(|| anyhow!("Missing value for {}", flag));
        match flag.as_str() {
            "--op" => {
                let json = value()?;
                let request = serde_json::from_str(json)
                    .with_context(|| format!("Invalid operation request: {}", json))?;
                options.requests.push(request);
            }
            "--rotate" => {
                let degrees = value()?;
                let angle = degrees
                    .parse::<u32>()
                    .ok()
                    .and_then(RotationAngle::from_degrees)
                    .ok_or_else(|| anyhow!("Rotation must be 90, 180 or 270, got {}", degrees))?;
                options.rotate = Some(angle);
            }
            "--mirror" => {
                options.mirror = Some(match value()?.as_str() {
                    "vertical" => MirrorAxis::Vertical,
                    "horizontal" => MirrorAxis::Horizontal,
                    other => bail!("Mirror axis must be vertical or horizontal, got {}", other),
                });
            }
            "--config" => options.config = Some(PathBuf::from(value()?)),
            other => bail!("Unknown option: {}", other),
        }
    }

    Ok(options)
}

fn process_image(args: &[String]) -> Result<()> {
    let options = parse_process_args(args)?;

    let config = match &options.config {
        Some(path) => StrataConfig::load(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => StrataConfig::default(),
    };
    let registry = OperationRegistry::with_builtins().with_defaults(config.defaults);
    let executor = std::sync::Arc::new(TiledExecutor::with_config(config.executor));

    let image = image::open(&options.input)
        .with_context(|| format!("Failed to open {}", options.input.display()))?;
    let mut chain = LayerChain::new(PixelBuffer::from_dynamic_image(&image)).with_executor(executor);

    if let Some(angle) = options.rotate {
        chain.rotate(angle);
    }
    if let Some(axis) = options.mirror {
        chain.mirror(axis);
    }
    for request in &options.requests {
        let layer = registry
            .create_layer(request)
            .with_context(|| format!("Cannot create layer '{}'", request.kind))?;
        println!("   • {}", layer);
        chain.append(layer);
    }

    println!("⚙️  Processing {} -> {}", options.input.display(), options.output.display());
    let output = chain.execute()?;

    let stats = chain.executor().stats();
    println!(
        "✅ Complete: {} layer(s), {} tiled run(s) over {} band(s) in {:?}",
        chain.len(),
        stats.runs,
        stats.bands,
        stats.total_duration
    );

    output
        .as_ref()
        .clone()
        .into_rgba_image()
        .save(&options.output)
        .with_context(|| format!("Failed to save {}", options.output.display()))?;
    println!("🎉 Image saved to: {}", options.output.display());
    Ok(())
}
