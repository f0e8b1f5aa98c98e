use chrono::{DateTime, FixedOffset, Utc};
use clap::{Parser, Subcommand};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use site_factor::config::{get_config_path, load_config, HostConfig, StaticHost};
use site_factor::job::{load_snapshot, save_snapshot};
use site_factor::output::{self, ScoredJob};
use site_factor::scoring::{compute_factor_at, validate_params};
use site_factor::{JobView, SiteFactorHost, SiteFactorPlugin, XFactor};

const EXIT_SUCCESS: i32 = 0;
const EXIT_CONFIG: i32 = 4;
const EXIT_INPUT: i32 = 5;

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate the site factor parameter line and print the effective values
    Check,
    /// Compute factors for every job in a snapshot without changing it
    Show {
        /// Job snapshot file (YAML, or JSON by .json extension)
        snapshot: PathBuf,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Apply the factor to one job, whatever its state
    Set {
        snapshot: PathBuf,
        job_id: u32,
        /// Write the updated snapshot back to disk
        #[arg(short, long)]
        write: bool,
    },
    /// Recompute factors for all pending jobs in a snapshot
    Update {
        snapshot: PathBuf,
        /// Write the updated snapshot back to disk
        #[arg(short, long)]
        write: bool,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

#[derive(Parser, Debug)]
#[command(name = "site-factor")]
#[command(about = "xfactor site factor for pending batch jobs", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to host config file (defaults to ~/.config/site-factor/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Parameter line overriding the configured one,
    /// e.g. "xfactor_min_time=5,xfactor_max=100,xfactor_weight=2"
    #[arg(short, long, global = true)]
    params: Option<String>,

    /// Evaluate at this RFC 3339 instant instead of the current time
    #[arg(long, global = true)]
    now: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = site_factor::logging::init(cli.verbose, std::io::stderr().is_terminal()) {
        eprintln!("{}", e);
    }

    // An explicit --config must exist; the default path is optional.
    let host_config = match cli.config.map(PathBuf::from) {
        Some(path) => load_config(Some(path)),
        None if get_config_path().exists() => load_config(None),
        None => Ok(HostConfig::default()),
    };
    let host_config = match host_config {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    let now = match cli.now.as_deref().map(DateTime::<FixedOffset>::parse_from_rfc3339).transpose() {
        Ok(now) => now.map(|t| t.with_timezone(&Utc)),
        Err(e) => {
            eprintln!("Invalid --now value: {}", e);
            std::process::exit(EXIT_INPUT);
        }
    };

    let host = StaticHost::new(host_config)
        .with_params(cli.params)
        .with_now(now);

    let code = match cli.command {
        Commands::Check => run_check(&host),
        Commands::Show { snapshot, json } => run_show(host, &snapshot, json),
        Commands::Set {
            snapshot,
            job_id,
            write,
        } => run_set(host, &snapshot, job_id, write),
        Commands::Update {
            snapshot,
            write,
            json,
        } => run_update(host, &snapshot, write, json),
    };

    std::process::exit(code);
}

fn run_check(host: &StaticHost) -> i32 {
    let raw = host.site_factor_params();
    match validate_params(raw.as_deref(), host.nice_offset()) {
        Ok(params) => {
            println!("xfactor_min_time={}", params.min_time());
            println!("xfactor_max={}", params.max());
            println!("xfactor_weight={}", params.weight());
            EXIT_SUCCESS
        }
        Err(errors) => {
            eprintln!("Site factor parameter errors:");
            for error in errors {
                eprintln!("  - {}", error);
            }
            EXIT_CONFIG
        }
    }
}

fn start_plugin(host: StaticHost) -> XFactor<StaticHost> {
    let mut plugin = XFactor::new(host);
    plugin.init();
    plugin
}

fn load_or_exit(path: &Path) -> site_factor::JobSnapshot {
    match load_snapshot(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Snapshot error: {:#}", e);
            std::process::exit(EXIT_INPUT);
        }
    }
}

fn save_or_exit(path: &Path, snapshot: &site_factor::JobSnapshot) {
    if let Err(e) = save_snapshot(path, snapshot) {
        eprintln!("Snapshot error: {:#}", e);
        std::process::exit(EXIT_INPUT);
    }
    eprintln!("Saved {}", path.display());
}

fn print_jobs(rows: &[ScoredJob], now: DateTime<Utc>, json: bool) -> i32 {
    if json {
        match output::format_json(rows) {
            Ok(s) => println!("{}", s),
            Err(e) => {
                eprintln!("Failed to serialize output: {}", e);
                return EXIT_INPUT;
            }
        }
    } else {
        println!(
            "{}",
            output::format_factor_table(rows, now, output::should_use_colors())
        );
    }
    EXIT_SUCCESS
}

fn run_show(host: StaticHost, path: &Path, json: bool) -> i32 {
    let snapshot = load_or_exit(path);
    let plugin = start_plugin(host);
    let host = plugin.host();
    let now = host.now();
    let flags = host.debug_flags();

    // Site factor column shows what a set would write; nothing is stored.
    let rows: Vec<_> = snapshot
        .jobs
        .iter()
        .map(|job| {
            let factor = compute_factor_at(job, plugin.params(), now, flags);
            ScoredJob::preview(job, plugin.params(), factor)
        })
        .collect();

    print_jobs(&rows, now, json)
}

fn run_set(host: StaticHost, path: &Path, job_id: u32, write: bool) -> i32 {
    let mut snapshot = load_or_exit(path);
    let plugin = start_plugin(host);

    let Some(job) = snapshot.find_mut(job_id) else {
        eprintln!("Job {} not found in {}", job_id, path.display());
        return EXIT_INPUT;
    };
    plugin.set(job);

    let row = ScoredJob::applied(job, plugin.params());
    println!(
        "{}",
        output::format_job_detail(&row, plugin.host().now(), output::should_use_colors())
    );

    if write {
        save_or_exit(path, &snapshot);
    }
    EXIT_SUCCESS
}

fn run_update(host: StaticHost, path: &Path, write: bool, json: bool) -> i32 {
    let mut snapshot = load_or_exit(path);
    let plugin = start_plugin(host);

    let updated = plugin.update(snapshot.jobs.iter_mut());
    tracing::info!(
        updated,
        total = snapshot.jobs.len(),
        "recomputed site factors for pending jobs"
    );

    let rows: Vec<_> = snapshot
        .jobs
        .iter()
        .map(|job| {
            if job.is_pending() {
                ScoredJob::applied(job, plugin.params())
            } else {
                ScoredJob::untouched(job, plugin.params())
            }
        })
        .collect();
    let code = print_jobs(&rows, plugin.host().now(), json);

    if write {
        save_or_exit(path, &snapshot);
    }
    code
}
