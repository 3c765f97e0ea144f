//! labtree binary: describe a lab-automation problem, grow the equipment
//! dependency tree interactively, and export a URS document.
//!
//! `labtree "automate a cell culture lab"` runs the initial analysis and
//! drops into the prompt; `labtree --demo` works offline against a scripted
//! oracle and a prebuilt screening-lab tree.

mod demo;
mod render;
mod repl;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use labtree::{EngineConfig, ExpansionEngine, ExpansionOracle, OpenAiOracle};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "labtree")]
#[command(about = "labtree — grow a lab-automation equipment tree with an LLM")]
struct Args {
    /// Problem description; when given, the initial analysis runs before the
    /// prompt appears
    #[arg(trailing_var_arg = true, value_name = "PROBLEM")]
    problem: Vec<String>,

    /// Model for the OpenAI-compatible oracle
    #[arg(long, env = "LABTREE_MODEL", default_value = "gpt-4o-mini")]
    model: String,

    /// Recursion ceiling for automatic expansion
    #[arg(long, value_name = "N")]
    max_depth: Option<usize>,

    /// Delay between automatic expansion steps, in milliseconds
    #[arg(long, value_name = "MS")]
    delay_ms: Option<u64>,

    /// Offline mode: scripted oracle plus a prebuilt demo tree, no API key
    #[arg(long)]
    demo: bool,

    /// Log engine activity to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "labtree=debug,cli=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Config before arg parsing, so `env = "LABTREE_MODEL"` sees file values.
    config::load_and_apply("labtree", None).ok();
    let args = Args::parse();
    init_logging(args.verbose);

    let mut config = EngineConfig::from_env();
    if let Some(depth) = args.max_depth {
        config.max_depth = depth;
    }
    if let Some(ms) = args.delay_ms {
        config.step_delay = Duration::from_millis(ms);
    }

    let oracle: Arc<dyn ExpansionOracle> = if args.demo {
        Arc::new(demo::demo_oracle())
    } else {
        Arc::new(OpenAiOracle::new(&args.model))
    };
    let engine = Arc::new(ExpansionEngine::new(oracle, config));
    if args.demo {
        engine.load_tree(demo::demo_tree());
    }

    let problem = if args.problem.is_empty() {
        None
    } else {
        Some(args.problem.join(" "))
    };
    repl::run(engine, problem).await
}
