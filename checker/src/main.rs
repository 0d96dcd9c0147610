use clap::Parser;
use httpd_limits::{
    check::{evaluate, CheckInputs},
    collector::{ProcSampler, ProcessSampler},
    config::Config,
    error::{CheckError, EXIT_UNKNOWN},
    history::{HistoricalRecord, HistoryStore, SqliteHistory, UseMax, SECONDS_PER_DAY},
    httpd,
    memory::{MemorySnapshot, MEMINFO_PATH},
    profile::{self, ProfileTable},
    report::Report,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Check that httpd fits in memory with every allowed process running.
#[derive(Parser, Debug)]
#[command(name = "check-httpd-limits", version, about)]
struct Args {
    /// httpd executable (skips the search path lookup)
    #[arg(long)]
    exe: Option<PathBuf>,

    /// httpd config file (instead of the one reported by `httpd -V`)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Percent of free swap the projection may use and still be OK
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
    swap_tolerance: Option<u8>,

    /// Report each httpd process and log progress
    #[arg(long)]
    verbose: bool,

    /// Log debug details
    #[arg(long)]
    debug: bool,

    /// Save this run's averages to the history store
    #[arg(long)]
    save: bool,

    /// Days of history to keep and to consider
    #[arg(long)]
    retain_days: Option<u32>,

    /// Project with the largest historical record by this column
    #[arg(long, value_enum)]
    use_max: Option<UseMax>,

    /// History database path
    #[arg(long)]
    history_db: Option<PathBuf>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Settings file for the checker itself
    #[arg(long)]
    settings: Option<PathBuf>,
}

fn init_logging(args: &Args) {
    let level = if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_settings(path: Option<&Path>) -> Config {
    let path = path.map(Path::to_path_buf).unwrap_or_else(Config::config_path);
    if path.exists() {
        Config::load(&path).unwrap_or_else(|e| {
            warn!("Failed to load settings from {}: {}, using defaults", path.display(), e);
            Config::default()
        })
    } else {
        info!("No settings file at {}, using defaults", path.display());
        Config::default()
    }
}

fn run(args: &Args, settings: &Config) -> Result<Report, CheckError> {
    let exe = httpd::locate_exe(args.exe.as_deref(), &settings.general.exe_search_paths)?;
    let build = httpd::query(&exe)?;
    let config_file = args.config.clone().unwrap_or(build.config_file);
    let config_text = fs::read_to_string(&config_file)
        .map_err(|e| CheckError::unavailable("httpd config", &config_file, e))?;

    let resolution = profile::resolve(&ProfileTable::builtin(), build.version, &build.mpm, &config_text)?;
    let memory = MemorySnapshot::read(Path::new(MEMINFO_PATH))?;
    let samples = ProcSampler::new().sample(&exe)?;

    let use_max = args.use_max.or(settings.history.use_max);
    let retain_days = args.retain_days.unwrap_or(settings.history.retain_days);
    let mut store = if args.save || use_max.is_some() {
        let path = args.history_db.as_ref().unwrap_or(&settings.history.db_path);
        Some(SqliteHistory::open(path)?)
    } else {
        None
    };

    let now = SqliteHistory::now();
    let history = match (&store, use_max) {
        (Some(store), Some(by)) => store.max_since(now - i64::from(retain_days) * SECONDS_PER_DAY, by)?,
        _ => None,
    };

    let report = evaluate(CheckInputs {
        exe,
        config_file,
        resolution,
        memory,
        samples,
        history,
        swap_tolerance_pct: args.swap_tolerance.unwrap_or(settings.general.swap_tolerance),
    });

    if args.save {
        if let Some(store) = store.as_mut() {
            store.save(&HistoricalRecord::from_sizes(now, &report.sizes), retain_days)?;
        }
    }

    Ok(report)
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() { ExitCode::from(EXIT_UNKNOWN) } else { ExitCode::SUCCESS };
        }
    };
    init_logging(&args);
    let settings = load_settings(args.settings.as_deref());

    match run(&args, &settings) {
        Ok(report) => {
            if args.json {
                match report.to_json() {
                    Ok(json) => println!("{}", json),
                    Err(e) => {
                        eprintln!("check-httpd-limits: {}", e);
                        return ExitCode::from(EXIT_UNKNOWN);
                    }
                }
            } else {
                print!("{}", report.render(args.verbose));
            }
            ExitCode::from(report.verdict.severity.exit_code())
        }
        Err(e) => {
            eprintln!("check-httpd-limits: {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}
