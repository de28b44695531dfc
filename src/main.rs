//! Activity Tracker CLI
//!
//! Records keystrokes and clicks per application into CSV session files.

use activity_tracker::{
    collector::{self, check_permission, Collector, CollectorConfig},
    config::{Config, ConfigWatch},
    identity::SystemAppIdentity,
    session::{Recorder, SessionStore, TrackingMode},
    DATA_NOTICE, VERSION,
};
use clap::{Parser, Subcommand};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "activity-tracker")]
#[command(version = VERSION)]
#[command(about = "Record keystrokes and clicks per application", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start recording a new session
    Start {
        /// Input sources to capture (keyboard, mouse, or all); defaults to the config file
        #[arg(long)]
        sources: Option<String>,

        /// Tag every event as "Global" instead of the foreground app
        #[arg(long)]
        global: bool,

        /// Seconds between automatic saves (overrides the config file)
        #[arg(long)]
        autosave_interval: Option<u64>,
    },

    /// Stop recording in a running tracker (the session is saved)
    Pause,

    /// Resume recording in a running tracker with a new session
    Resume,

    /// Set how events are tagged: "app" or "global"
    Mode {
        mode: TrackingMode,
    },

    /// Show recorded totals and configuration
    Status,

    /// Open the session folder in the file manager
    Open,

    /// Display what the tracker records
    Notice,

    /// Show configuration
    Config,
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Start {
            sources,
            global,
            autosave_interval,
        } => {
            cmd_start(sources.as_deref(), global, autosave_interval);
        }
        Commands::Pause => {
            cmd_set_paused(true);
        }
        Commands::Resume => {
            cmd_set_paused(false);
        }
        Commands::Mode { mode } => {
            cmd_mode(mode);
        }
        Commands::Status => {
            cmd_status();
        }
        Commands::Open => {
            cmd_open();
        }
        Commands::Notice => {
            println!("{DATA_NOTICE}");
        }
        Commands::Config => {
            cmd_config();
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn cmd_start(sources: Option<&str>, global: bool, autosave_interval: Option<u64>) {
    println!("Activity Tracker v{VERSION}");
    println!();

    let config = Config::load().unwrap_or_else(|e| {
        eprintln!("Warning: Could not load config ({e}); using defaults");
        Config::default()
    });

    let source_config = config.sources_or(sources);
    if !source_config.any_enabled() {
        eprintln!("Error: At least one source must be enabled (keyboard or mouse)");
        std::process::exit(1);
    }

    // Without permission the hooks deliver nothing, but sessions still work
    if !check_permission() {
        eprintln!("Warning: Input Monitoring permission not granted; no input will be captured.");
        eprintln!("Grant it in System Settings > Privacy & Security > Input Monitoring,");
        eprintln!("then restart the tracker.");
        eprintln!();
    }

    if let Err(e) = config.ensure_directories() {
        eprintln!("Warning: Could not create data directory: {e}");
    }

    let interval = autosave_interval
        .map(Duration::from_secs)
        .unwrap_or(config.autosave_interval);
    let mode = if global {
        TrackingMode::Global
    } else {
        config.mode
    };

    println!("  Keyboard: {}", enabled(source_config.keyboard));
    println!("  Mouse: {}", enabled(source_config.mouse));
    println!("  Mode: {mode}");
    println!("  Autosave every: {}s", interval.as_secs());
    println!("  Data folder: {}", config.data_path.display());
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let recorder = Arc::new(Recorder::new(
        SessionStore::new(&config.data_path),
        interval,
    ));
    recorder.set_mode(mode);

    // Subscribe once; the hooks live until the process exits
    let mut collector = Collector::new(CollectorConfig {
        capture_keyboard: source_config.keyboard,
        capture_mouse: source_config.mouse,
    });
    if let Err(e) = collector.start() {
        tracing::warn!("Could not start input capture: {e}");
    }
    collector::pump::spawn(
        collector.receiver().clone(),
        recorder.clone(),
        Arc::new(SystemAppIdentity::new()),
    );

    let running = Arc::new(AtomicBool::new(true));
    ctrlc_handler(running.clone());

    let mut watch = ConfigWatch::new(&config);
    if config.paused {
        println!("Recording is currently paused.");
        println!("Run `activity-tracker resume` to start a session.");
        println!();
    } else {
        recorder.start();
    }

    let mut last_config_check = Instant::now();
    let mut last_status = Instant::now();

    while running.load(Ordering::SeqCst) {
        thread::sleep(Duration::from_millis(100));

        // Pick up `pause`, `resume` and `mode` issued from another process
        if last_config_check.elapsed() >= Duration::from_secs(1) {
            if let Ok(cfg) = Config::load() {
                let changes = watch.update(&cfg);
                match changes.paused {
                    Some(true) => {
                        let count = recorder.stop();
                        println!("Paused. Saved {count} events.");
                    }
                    Some(false) => {
                        let id = recorder.start();
                        println!("Resumed. Session {id}");
                    }
                    None => {}
                }
                if let Some(mode) = changes.mode {
                    recorder.set_mode(mode);
                    println!("Switched to {mode} mode");
                }
            }
            last_config_check = Instant::now();
        }

        if recorder.is_tracking() && last_status.elapsed() >= interval {
            println!("{}", recorder.stats().summary());
            last_status = Instant::now();
        }
    }

    println!();
    let count = recorder.stop();
    match recorder.session_path() {
        Some(path) if count > 0 => println!("Saved {count} events to {}", path.display()),
        _ => println!("No events recorded in this session."),
    }
    collector.stop();

    println!("{}", recorder.store().archive_stats().summary());
}

fn cmd_set_paused(paused: bool) {
    let mut config = Config::load().unwrap_or_default();
    config.paused = paused;
    if let Err(e) = config.save() {
        eprintln!("Error saving config: {e}");
        std::process::exit(1);
    }
    if paused {
        println!("Recording paused. Use 'activity-tracker resume' to continue.");
    } else {
        println!("Recording resumed.");
    }
}

fn cmd_mode(mode: TrackingMode) {
    let mut config = Config::load().unwrap_or_default();
    config.mode = mode;
    if let Err(e) = config.save() {
        eprintln!("Error saving config: {e}");
        std::process::exit(1);
    }
    println!("Tracking mode set to {mode}.");
}

fn cmd_status() {
    let config = Config::load().unwrap_or_default();
    let store = SessionStore::new(&config.data_path);

    println!("Activity Tracker Status");
    println!("=======================");
    println!();

    println!(
        "Input Monitoring Permission: {}",
        if check_permission() {
            "Granted ✓"
        } else {
            "Not Granted ✗"
        }
    );
    println!();

    println!("Configuration:");
    println!("  Keyboard capture: {}", enabled(config.sources.keyboard));
    println!("  Mouse capture: {}", enabled(config.sources.mouse));
    println!("  Mode: {}", config.mode);
    println!("  Autosave every: {}s", config.autosave_interval.as_secs());
    println!("  Paused: {}", config.paused);
    println!("  Data folder: {}", config.data_path.display());
    println!();

    if store.count_sessions() == 0 {
        println!("No sessions recorded yet.");
    } else {
        println!("{}", store.archive_stats().summary());
    }
}

fn cmd_open() {
    let config = Config::load().unwrap_or_default();
    if let Err(e) = config.ensure_directories() {
        eprintln!("Could not create data folder: {e}");
        std::process::exit(1);
    }

    match opener::open(&config.data_path) {
        Ok(()) => println!("Opened folder: {}", config.data_path.display()),
        Err(e) => {
            eprintln!("Could not open folder: {e}");
            std::process::exit(1);
        }
    }
}

fn cmd_config() {
    let config = Config::load().unwrap_or_default();

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!(
        "{}",
        serde_json::to_string_pretty(&config).unwrap_or_else(|_| "Error".to_string())
    );
}

fn enabled(on: bool) -> &'static str {
    if on {
        "enabled"
    } else {
        "disabled"
    }
}

/// Set up Ctrl+C handler.
fn ctrlc_handler(running: Arc<AtomicBool>) {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .expect("Error setting Ctrl+C handler");
}
