use std::process::ExitCode;

use clap::Parser;
use log::debug;

use toolbelt::load_config;
use toolbelt::logger;
use toolbelt::router::Router;
use toolbelt::tree;

#[derive(Parser, Debug)]
#[command(name = "toolbelt", about = "Personal developer command router")]
struct Cli {
    /// Path to config file (auto-detected if not specified)
    #[arg(short, long)]
    config: Option<String>,

    /// Log file path (enables file logging in addition to stderr)
    #[arg(long)]
    log_file: Option<String>,

    /// Command path followed by its parameters, eg `git save "message"`
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    input: Vec<String>,
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let log_file = cli
        .log_file
        .as_deref()
        .map(std::fs::File::create)
        .transpose()?;
    logger::init(log_file)?;

    let config = load_config(cli.config.as_deref())?;
    debug!("Resolved config: {config:?}");

    let router = Router::new(tree::build(config))?;
    router.run(&cli.input)?;
    Ok(())
}
