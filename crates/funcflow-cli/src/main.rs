use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "funcflow")]
#[command(about = "funcflow - lower functional if/while operations into a basic-block CFG")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lower every function of a JSON module
    Lower {
        input: PathBuf,

        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// JSON file with lowering options
        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(short, long)]
        verbose: bool,
    },

    /// Print a JSON module as text
    Print { input: PathBuf },

    /// Check the block-parameter invariants of every function
    Verify {
        input: PathBuf,

        #[arg(short, long)]
        verbose: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let verbose = match &cli.command {
        Commands::Lower { verbose, .. } | Commands::Verify { verbose, .. } => *verbose,
        Commands::Print { .. } => false,
    };
    init_logging(verbose);

    match cli.command {
        Commands::Lower {
            input,
            output,
            format,
            config,
            verbose,
        } => cmd_lower(input, output, format, config, verbose),
        Commands::Print { input } => cmd_print(input),
        Commands::Verify { input, verbose } => cmd_verify(input, verbose),
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
}

fn read_module(path: &Path) -> Result<funcflow_core::Module> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let module: funcflow_core::Module = serde_json::from_str(&content)
        .with_context(|| format!("{} is not a valid JSON module", path.display()))?;
    log::debug!(
        "loaded module '{}' with {} function(s)",
        module.name,
        module.functions.len()
    );
    Ok(module)
}

fn read_config(path: Option<&Path>) -> Result<funcflow_transform::LoweringConfig> {
    match path {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Invalid lowering config in {}", path.display()))
        }
        None => Ok(Default::default()),
    }
}

fn cmd_lower(
    input: PathBuf,
    output: Option<PathBuf>,
    format: OutputFormat,
    config: Option<PathBuf>,
    verbose: bool,
) -> Result<()> {
    use colored::*;
    use funcflow_core::{format::format_module, PassManager};
    use funcflow_transform::FunctionalControlFlowToCfg;
    use std::time::Instant;

    if verbose {
        eprintln!("{}", " funcflow lowering".bright_blue().bold());
        eprintln!("{}", "=".repeat(50).bright_blue());
        eprintln!(" Input: {}", input.display());
        if let Some(ref out) = output {
            eprintln!(" Output: {}", out.display());
        }
        eprintln!();
    }

    let start = Instant::now();
    let config = read_config(config.as_deref())?;
    let mut module = read_module(&input)?;

    let mut manager = PassManager::new();
    manager.enable_statistics();
    manager.register_pass(FunctionalControlFlowToCfg::with_config(config));
    let outcome = manager.run_all(&mut module);

    for diagnostic in manager.diagnostics().diagnostics() {
        eprintln!("{}", diagnostic.to_string().bright_red());
    }

    if let Err(err) = outcome {
        eprintln!("{}", " LOWERING FAILED".bright_red().bold());
        return Err(err);
    }

    if verbose {
        if let Some(report) = manager
            .get_pass_mut::<FunctionalControlFlowToCfg>()
            .and_then(|p| p.take_report())
        {
            for outcome in &report.outcomes {
                if let Ok(stats) = &outcome.result {
                    eprintln!(
                        "   @{}: {} if(s), {} loop(s)",
                        outcome.function, stats.ifs, stats.loops
                    );
                }
            }
        }
    }

    let rendered = match format {
        OutputFormat::Text => format_module(&module),
        OutputFormat::Json => serde_json::to_string_pretty(&module)?,
    };

    if let Some(output_path) = output {
        std::fs::write(&output_path, &rendered)
            .with_context(|| format!("Failed to write {}", output_path.display()))?;
        if verbose {
            eprintln!(
                "\n {} Lowering successful!",
                "SUCCESS:".bright_green().bold()
            );
            eprintln!("   Time: {:.3}s", start.elapsed().as_secs_f64());
            eprintln!("   Output: {}", output_path.display());
        }
    } else {
        print!("{}", rendered);
    }

    Ok(())
}

fn cmd_print(input: PathBuf) -> Result<()> {
    let module = read_module(&input)?;
    print!("{}", funcflow_core::format::format_module(&module));
    Ok(())
}

fn cmd_verify(input: PathBuf, verbose: bool) -> Result<()> {
    use colored::*;
    use funcflow_core::verifier::verify_function;

    if verbose {
        println!("{}", " Verifying module".bright_cyan().bold());
        println!("{}", "=".repeat(50).bright_cyan());
        println!(" Input: {}", input.display());
        println!();
    }

    let module = read_module(&input)?;
    let mut errors = Vec::new();

    for function in module.functions.values() {
        match verify_function(function) {
            Ok(()) => {
                if verbose {
                    println!(
                        "   @{}: {} block(s), {} instruction(s)",
                        function.name(),
                        function.body.blocks.len(),
                        function.body.instruction_count()
                    );
                }
                if function.has_structured_ops() {
                    println!(
                        "{} @{} still contains functional control flow",
                        "note:".yellow(),
                        function.name()
                    );
                }
            }
            Err(e) => errors.push(e),
        }
    }

    if errors.is_empty() {
        println!("{}", " VALID".bright_green().bold());
        Ok(())
    } else {
        println!("{}", " INVALID".bright_red().bold());
        for e in &errors {
            println!("{}", e);
        }
        Err(anyhow::anyhow!("Verification failed"))
    }
}
