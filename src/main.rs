use std::io::Write;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use ld_blocks::{
    build_blocks, build_input, load_spec, BlockDefinition, EventSink, GeneratorConfig,
    RuntimeConfig, DEFAULT_BASE_URL, DEFAULT_PATH_PREFIX,
};
use reqwest::blocking::Client;
use serde_json::Value;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ld-blocks", version, about = "LaunchDarkly API blocks from the OpenAPI spec")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct SpecArgs {
    /// Path to the LaunchDarkly OpenAPI JSON document
    #[arg(long)]
    spec: PathBuf,

    /// Path prefix ignored when naming blocks
    #[arg(long, default_value = DEFAULT_PATH_PREFIX)]
    path_prefix: String,
}

#[derive(Subcommand)]
enum Command {
    /// Write one TypeScript module per operation plus an index
    Generate {
        #[command(flatten)]
        spec: SpecArgs,

        /// Output directory
        #[arg(long)]
        out: PathBuf,

        /// Base URL generated blocks use when no secret overrides it
        #[arg(long, env = "LAUNCHDARKLY_BASE_URL", default_value = DEFAULT_BASE_URL)]
        base_url: String,
    },
    /// List the blocks the spec produces
    List {
        #[command(flatten)]
        spec: SpecArgs,

        /// Print full block definitions as JSON
        #[arg(long)]
        json: bool,
    },
    /// Call the API through one block
    Invoke {
        #[command(flatten)]
        spec: SpecArgs,

        /// Block name, e.g. updateProjectsFlags
        block: String,

        /// Input field (key=value, value parsed as JSON when possible)
        #[arg(long = "field", short = 'f')]
        fields: Vec<String>,

        /// Input as a JSON object; --field entries override its keys
        #[arg(long)]
        json: Option<String>,

        #[arg(long, env = "LAUNCHDARKLY_API_KEY", hide_env_values = true)]
        api_key: String,

        #[arg(long, env = "LAUNCHDARKLY_BASE_URL", default_value = DEFAULT_BASE_URL)]
        base_url: String,
    },
}

/// Prints each emitted result as pretty JSON.
struct StdoutSink;

impl EventSink for StdoutSink {
    fn emit(&mut self, event: Value) {
        let text = serde_json::to_string_pretty(&event).unwrap_or_else(|_| event.to_string());
        let mut out = std::io::stdout().lock();
        if let Err(err) = writeln!(out, "{text}") {
            warn!(error = %err, "failed to write result to stdout");
        }
    }
}

fn load_blocks(args: &SpecArgs) -> Result<Vec<BlockDefinition>> {
    let spec = load_spec(&args.spec)?;
    Ok(build_blocks(&spec, &args.path_prefix))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Generate {
            spec,
            out,
            base_url,
        } => {
            let config = GeneratorConfig::new(&spec.spec, &out)
                .path_prefix(spec.path_prefix)
                .default_base_url(base_url);
            let (blocks, _) = ld_blocks::run(&config)
                .with_context(|| format!("generate blocks into {}", out.display()))?;
            info!(count = blocks.len(), "done");
        }
        Command::List { spec, json } => {
            let blocks = load_blocks(&spec)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&blocks)?);
            } else {
                for block in &blocks {
                    println!(
                        "{}\t{}\t{} {}",
                        block.name, block.category, block.method, block.path
                    );
                }
            }
        }
        Command::Invoke {
            spec,
            block,
            fields,
            json,
            api_key,
            base_url,
        } => {
            let blocks = load_blocks(&spec)?;
            let Some(definition) = blocks.iter().find(|b| b.name == block) else {
                bail!("unknown block '{block}' (run `ld-blocks list` to see available blocks)");
            };
            let input = build_input(json.as_deref(), &fields)?;
            let runtime = RuntimeConfig::new(api_key).base_url(base_url);

            definition
                .invoke(&Client::new(), &runtime, &input, &mut StdoutSink)
                .with_context(|| format!("invoke {block}"))?;
        }
    }

    Ok(())
}
