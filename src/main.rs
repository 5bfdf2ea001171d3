use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

mod actions;
mod clock;
mod controller;
mod domain;
mod filter;
mod form;
mod inputter;
mod loader;
mod logging;
mod model;
mod stats;
mod ui;

use controller::Controller;
use domain::{AppConfig, AppError};
use filter::{DateRange, FilterMode};
use model::{Model, Status};
use ui::TableUI;

/// A terminal attendance sheet with live search and class/status filters.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// CSV file with attendance records
    file: String,

    /// Event poll timeout in milliseconds (at most 1000 so the clock keeps ticking)
    #[arg(long, default_value_t = 250)]
    poll_ms: u64,

    /// How the search box and the class/status selects combine
    #[arg(long, value_enum, default_value_t = FilterMode::Composed)]
    filter_mode: FilterMode,

    /// Only show records dated on or after this day (YYYY-MM-DD)
    #[arg(long, value_parser = clock::parse_iso_date)]
    from: Option<String>,

    /// Only show records dated on or before this day (YYYY-MM-DD)
    #[arg(long, value_parser = clock::parse_iso_date)]
    to: Option<String>,

    /// Directory for log files (default ~/.rollbook/logs)
    #[arg(long)]
    log_dir: Option<String>,
}

fn expand(path: &str) -> Result<PathBuf, AppError> {
    shellexpand::full(path)
        .map(|p| PathBuf::from(p.into_owned()))
        .map_err(|e| AppError::LoadingFailed(e.to_string()))
}

fn main() -> ExitCode {
    match run(Args::parse()) {
        Err(e) => {
            error!("Exiting with error: {e:?}");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
    }
}

fn run(args: Args) -> Result<(), AppError> {
    let log_dir = args.log_dir.as_deref().map(expand).transpose()?;
    let cfg = AppConfig::default()
        .with_event_poll_time(args.poll_ms)
        .with_filter_mode(args.filter_mode)
        .with_date_range(DateRange {
            from: args.from.unwrap_or_default(),
            to: args.to.unwrap_or_default(),
        })
        .with_log_dir(log_dir);
    let _guard = logging::initialize(cfg.log_dir.clone())?;
    info!("Starting {} with {:?}", domain::APP_NAME, cfg);

    let table = loader::load(expand(&args.file)?)?;

    let mut terminal = ratatui::init();
    let result = event_loop(&cfg, table, &mut terminal);
    ratatui::restore();

    info!("Bye");
    result
}

fn event_loop(
    cfg: &AppConfig,
    table: loader::RecordTable,
    terminal: &mut ratatui::DefaultTerminal,
) -> Result<(), AppError> {
    let size = terminal.size()?;
    let mut model = Model::init(cfg, table, size.width as usize, size.height as usize);
    let mut ui = TableUI::new(cfg);
    let controller = Controller::new(cfg);

    while model.status != Status::Quitting {
        // Render the current view
        terminal.draw(|f| ui.draw(&model, f))?;

        // Handle events and map to a Message
        let message = controller.handle_event(&model)?;
        model.update(message);
    }
    Ok(())
}
