use anyhow::{Context, Result};
use clap::Parser;
use qbc::{compile, CompileOptions, OptLevel};
use std::fs;
use std::path::PathBuf;
use tracing::Level;

/// Compile a JSON IR module to quantum bytecode.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Input IR module (.json)
    input: PathBuf,

    /// Output bytecode file (defaults to the input with a .qbc extension)
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Optimization level
    #[arg(short = 'O', long = "opt-level", value_enum, default_value_t = OptLevel::Normal)]
    opt_level: OptLevel,

    /// Fixed module identifier, for reproducible output
    #[arg(long)]
    module_id: Option<String>,

    /// Print optimization metrics to stderr
    #[arg(long)]
    metrics: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn log_level(&self) -> Level {
        match self.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        }
    }

    fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| self.input.with_extension("qbc"))
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.log_level())
        .with_writer(std::io::stderr)
        .init();

    let json = fs::read_to_string(&cli.input)
        .with_context(|| format!("failed to read {}", cli.input.display()))?;
    let module = serde_json::from_str(&json)
        .with_context(|| format!("failed to parse IR module {}", cli.input.display()))?;

    let options = CompileOptions {
        level: cli.opt_level,
        module_id: cli.module_id.clone(),
    };
    let output = compile(module, &options).context("compilation failed")?;

    if cli.metrics {
        eprintln!("{}", output.metrics);
    }

    let output_path = cli.output_path();
    fs::write(&output_path, &output.bytecode)
        .with_context(|| format!("failed to write {}", output_path.display()))?;
    eprintln!(
        "qbc: wrote {} ({} bytes)",
        output_path.display(),
        output.bytecode.len()
    );
    Ok(())
}
