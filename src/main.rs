use clap::Parser;
use pathcov::args::Cli;
use pathcov::config::Config;
use pathcov::{run, setup_logging};
use tracing::error;

fn main() -> Result<(), String> {
    let cli = Cli::parse();

    let color = !cli.logging.no_color;
    setup_logging(&cli.logging.log_level, color, cli.logging.quiet);

    let base = match &cli.config_file {
        Some(path) => {
            let text = std::fs::read_to_string(path).map_err(|e| format!("failed to read {}: {e}", path.display()))?;
            Config::from_toml_str(&text).map_err(|e| e.to_string())?
        }
        None => Config::default(),
    };

    let config = base.merge_cli(&cli.config);

    run(&config).map_err(|e| {
        error!("{e}");
        e.to_string()
    })
}
