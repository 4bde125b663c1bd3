use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use ef_cli::commands::{input, layout, scales, tree};
use ef_cli::{Cli, Commands, Config};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let Some(command) = &cli.command else {
        // No subcommand, show help
        use clap::CommandFactory;
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let config =
        Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    let mut stdout = std::io::stdout().lock();
    match command {
        Commands::Tree {
            input: source,
            align,
            json,
        } => {
            let sessions = input::read_sessions(source.input.as_deref())?;
            let alignment = config.alignment(align.align_event.as_deref(), align.align_index)?;
            tree::run(&mut stdout, &sessions, &alignment, *json)?;
        }
        Commands::Scales {
            input: source,
            align,
            size,
            json,
        } => {
            let sessions = input::read_sessions(source.input.as_deref())?;
            let alignment = config.alignment(align.align_event.as_deref(), align.align_index)?;
            let dimensions = config.dimensions(size.width, size.height);
            scales::run(&mut stdout, &sessions, &alignment, dimensions, *json)?;
        }
        Commands::Layout {
            input: source,
            align,
            size,
            x_axis,
        } => {
            let sessions = input::read_sessions(source.input.as_deref())?;
            let alignment = config.alignment(align.align_event.as_deref(), align.align_index)?;
            let dimensions = config.dimensions(size.width, size.height);
            layout::run(
                &mut stdout,
                &sessions,
                &alignment,
                dimensions,
                x_axis.unwrap_or(config.x_axis),
            )?;
        }
    }

    Ok(())
}
