use bc_app::{
    AppError, AppResult, JsonFileSource, RunOutcome, RunProgressEvent, RunRequest, RunStage,
    load_config, read_history, run_bloomcast_with_progress,
};
use bc_results::{BloomDateLogEntry, render_legacy};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::Level;

#[derive(Parser)]
#[command(name = "bloomcast")]
#[command(about = "Ensemble forecast of the Strait of Georgia spring diatom bloom", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect forcing data, run the ensemble and log the forecast
    Run {
        /// Path to the bloomcast YAML file
        config_path: PathBuf,
        /// Forecast as if today were this date (YYYY-MM-DD)
        #[arg(long)]
        as_of: Option<NaiveDate>,
        /// JSON file of raw observation records
        #[arg(long)]
        observations: Option<PathBuf>,
        /// Log at debug level
        #[arg(long)]
        debug: bool,
    },
    /// Show the bloom date evolution log
    History {
        /// Path to the bloomcast YAML file
        config_path: PathBuf,
    },
    /// Validate a configuration file
    Validate {
        /// Path to the bloomcast YAML file
        config_path: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            config_path,
            as_of,
            observations,
            debug,
        } => cmd_run(&config_path, as_of, observations.as_deref(), debug),
        Commands::History { config_path } => {
            init_tracing(false);
            cmd_history(&config_path)
        }
        Commands::Validate { config_path } => {
            init_tracing(false);
            cmd_validate(&config_path)
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            if let Some(entry) = err.last_known_good() {
                eprintln!("Last known good forecast:");
                print_entry(entry);
            }
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(debug: bool) {
    let level = if debug { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();
}

fn cmd_validate(config_path: &Path) -> AppResult<()> {
    println!("Validating configuration: {}", config_path.display());
    let config = load_config(config_path)?;
    println!(
        "✓ Configuration is valid: members {} to {}, {} at a time",
        config.ensemble.start_year, config.ensemble.end_year, config.ensemble.max_concurrent_jobs
    );
    Ok(())
}

fn cmd_history(config_path: &Path) -> AppResult<()> {
    let config = load_config(config_path)?;
    let entries = read_history(&config)?;
    if entries.is_empty() {
        println!("No forecasts logged in {}", config.logging.bloom_date_log.display());
    } else {
        print!("{}", render_legacy(&entries));
    }
    Ok(())
}

fn cmd_run(
    config_path: &Path,
    as_of: Option<NaiveDate>,
    observations: Option<&Path>,
    debug: bool,
) -> AppResult<()> {
    // Debug logging may be switched on in the file as well as on the command line.
    let config = load_config(config_path);
    let file_debug = config.as_ref().is_ok_and(|c| c.logging.debug);
    init_tracing(debug || file_debug);
    let config = config?;

    let as_of = as_of.unwrap_or_else(|| chrono::Local::now().date_naive());
    let source = observations.map(JsonFileSource::new);
    if config.get_forcing_data && source.is_none() {
        return Err(AppError::Configuration(
            "get_forcing_data is set; pass --observations".to_string(),
        ));
    }

    let mut request = RunRequest::new(config_path, as_of);
    if let Some(source) = &source {
        request = request.with_source(source);
    }

    let outcome = run_bloomcast_with_progress(
        &request,
        Some(&mut |event| render_cli_progress(&event)),
    )?;
    clear_progress_line();

    println!("✓ {outcome}");
    match &outcome {
        RunOutcome::Forecast {
            entry,
            patches,
            failures,
            ..
        } => {
            print_entry(entry);
            if !patches.is_empty() {
                println!("  Patched forcing days: {}", patches.len());
            }
            for failure in failures {
                println!("  Member {} failed: {}", failure.member, failure.reason);
            }
        }
        RunOutcome::Unchanged {
            last_known_good: Some(entry),
            ..
        } => print_entry(entry),
        RunOutcome::Unchanged { .. } => {}
        RunOutcome::ForcingOnly { patches, .. } => {
            println!("  Patched forcing days: {}", patches.len());
        }
    }
    Ok(())
}

fn print_entry(entry: &BloomDateLogEntry) {
    println!("  Data through: {}", entry.cutoff);
    println!("  Median:       {}", entry.median);
    println!("  Early bound:  {}", entry.early);
    println!("  Late bound:   {}", entry.late);
    if let (Some(earliest), Some(latest)) = (&entry.earliest, &entry.latest) {
        println!("  Earliest:     {earliest}");
        println!("  Latest:       {latest}");
    }
    println!(
        "  Members:      {} succeeded, {} failed",
        entry.members_succeeded, entry.members_failed
    );
}

fn clear_progress_line() {
    print!("\r{}\r", " ".repeat(120));
    let _ = io::stdout().flush();
}

fn render_cli_progress(event: &RunProgressEvent) {
    let mut line = format!(
        "\r{}  elapsed={:.1}s",
        event.stage.label(),
        event.elapsed_wall_s
    );
    if let Some(e) = &event.ensemble {
        line.push_str(&format!(
            "  members={}/{}  failed={}",
            e.members_done, e.members_total, e.members_failed
        ));
    }
    if let RunStage::MemberFinished { member, succeeded } = &event.stage {
        let status = if *succeeded { "ok" } else { "failed" };
        line.push_str(&format!("  last={member} {status}"));
    }
    if let Some(msg) = &event.message {
        line.push_str(&format!("  {}", msg));
    }
    print!("{line}");
    let _ = io::stdout().flush();
}
