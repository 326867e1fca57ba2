//! nvsettings - NVIDIA attribute control tool
//!
//! A command-line front end for querying and assigning NV-CONTROL, X
//! extension, NVML and Vulkan attributes.

use clap::Parser;
use nvsettings::cli::args::{generate_completions, Cli, Commands};
use nvsettings::commands::{run_assign, run_color, run_list, run_query, run_valid, run_watch};
use nvsettings::config::ConfigBuilder;
use nvsettings::error::{AppError, CtrlError, NvmlError};
use nvsettings::CtrlSystem;

fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .init();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Set log level based on verbose flag
    if cli.verbose {
        log::set_max_level(log::LevelFilter::Debug);
    }

    // Run the appropriate command
    let result = run(&cli);

    if let Err(e) = result {
        log::error!("{}", e);
        print_error(&e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), AppError> {
    if let Commands::Completions { shell } = &cli.command {
        generate_completions(*shell);
        return Ok(());
    }

    let config = ConfigBuilder::new()
        .with_file(cli.config.as_deref())?
        .with_verbose(cli.verbose.then_some(true))
        .with_dry_run(cli.dry_run.then_some(true))
        .with_display(cli.display.clone())
        .build()?;

    if config.general.verbose {
        log::set_max_level(log::LevelFilter::Debug);
    }
    let dry_run = config.general.dry_run;

    let mut system = CtrlSystem::open(&config)?;

    match &cli.command {
        Commands::List => run_list(&system, cli.format),

        Commands::Query(args) => run_query(&system, args, cli.format),

        Commands::Assign(args) => run_assign(&system, args, cli.format, dry_run),

        Commands::Valid(args) => run_valid(&system, args, cli.format),

        Commands::Color(args) => run_color(&mut system, args, cli.format, dry_run),

        Commands::Watch(args) => run_watch(&system, args, cli.format),

        Commands::Completions { .. } => Ok(()),
    }
}

fn print_error(err: &AppError) {
    eprintln!("Error: {}", err);

    // Print helpful hints for common errors
    match err {
        AppError::Display(_) => {
            eprintln!();
            eprintln!("Hint: Make sure an X server is running and DISPLAY is set,");
            eprintln!("      or pass the display with --display.");
        }
        AppError::Ctrl(CtrlError::MissingExtension) => {
            eprintln!();
            eprintln!("Hint: The backend for this attribute is not available.");
            eprintln!("      Run 'nvsettings list' to see the backends on each target.");
        }
        AppError::Nvml(NvmlError::InsufficientPermissions(_)) => {
            eprintln!();
            eprintln!("Hint: Try running with sudo or as root.");
        }
        AppError::TargetNotFound(_) => {
            eprintln!();
            eprintln!("Hint: Run 'nvsettings list' to see the available targets.");
        }
        _ => {}
    }
}
