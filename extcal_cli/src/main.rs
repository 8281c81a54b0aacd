mod calibrate;
mod cli;
mod error_fmt;
mod logging;

use clap::Parser;

use crate::calibrate::{CalibrateOpts, build_manager, run_calibrate, run_list, run_self_check};
use crate::cli::{Cli, Commands, JSON_MODE};
use crate::error_fmt::{already_reported, exit_code_for_error, format_error_json, humanize};

fn main() {
    let cli = Cli::parse();
    let _ = color_eyre::install();
    let _ = JSON_MODE.set(cli.json);

    if let Err(e) = run(cli) {
        tracing::error!(error = %e, "extcal failed");
        if JSON_MODE.get().copied().unwrap_or(false) {
            eprintln!("{}", format_error_json(&e));
        } else if !already_reported(&e) {
            eprintln!("{}", humanize(&e));
        }
        std::process::exit(exit_code_for_error(&e));
    }
}

fn run(cli: Cli) -> eyre::Result<()> {
    let cfg = extcal_config::load_config_file(&cli.config)?;
    logging::init_tracing(cli.json, cli.log_level.as_deref(), &cfg.logging)?;
    tracing::debug!(config = %cli.config.display(), "configuration loaded");

    let manager = build_manager(&cfg);
    match cli.cmd {
        Commands::Calibrate {
            simulate_counts,
            replay,
            serial,
            output_dir,
            export_csv,
        } => {
            let opts = CalibrateOpts {
                simulate_counts,
                replay,
                serial,
                output_dir,
                export_csv,
            };
            run_calibrate(&cfg, manager, opts)?;
        }
        Commands::List => run_list(manager)?,
        Commands::SelfCheck => run_self_check(&cfg, manager)?,
    }
    Ok(())
}
