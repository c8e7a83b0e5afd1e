//! CLI for driving an iOS app through its embedded automation server.
//!
//! Each command talks directly to the device server over HTTP. Settings come
//! from `~/.touchmap/config.json` and can be overridden per invocation.
//!
//! # Usage
//!
//! ```bash
//! # Touch a button by accessibility label
//! touchmap touch "button marked:'Login'"
//!
//! # Type into a text field
//! touchmap set-text "textField placeholder:'Email'" ada@example.com
//!
//! # Turn the device, then swipe relative to the screen
//! touchmap rotate left
//! touchmap --orientation 90 swipe up
//!
//! # Assertions exit non-zero when they fail
//! touchmap assert contains-text "Welcome"
//!
//! # Run a JSONL script in one session and keep an action log
//! touchmap run checkout.jsonl --log checkout.log.jsonl
//!
//! # Turn an action log into a shell script
//! touchmap convert checkout.log.jsonl > checkout.sh
//!
//! # Launch the simulator with an app and wait for its server
//! touchmap start-simulator build/Demo.app --sdk 6.1 --wait 60000
//! ```

mod converter;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use touchmap_core::action::{ActionLog, ActionResult, ActionType};
use touchmap_core::client::DeviceClient;
use touchmap_core::config::{config_path, TouchmapConfig};
use touchmap_core::driver::wait_for_device;
use touchmap_core::element::UIElement;
use touchmap_core::executor::{ActionExecutor, ExecutionResult, DEFAULT_POLL_INTERVAL};
use touchmap_core::gestures::{Gestures, PinchDirection};
use touchmap_core::orientation::{Orientation, RotationDirection};
use touchmap_core::protocol::ScrollDirection;
use touchmap_core::simulator::{DeviceFamily, SimulatorLauncher};

/// Drive an iOS app through its embedded automation server.
#[derive(Parser)]
#[command(name = "touchmap")]
#[command(about = "Touch, query and assert against an iOS app over HTTP")]
#[command(version)]
struct Cli {
    /// Device server address (host:port)
    #[arg(short, long, env = "TOUCHMAP_ENDPOINT")]
    endpoint: Option<String>,

    /// Directory to search for recordings (repeatable, replaces the configured list)
    #[arg(short = 'r', long = "recordings-dir", env = "TOUCHMAP_RECORDINGS_DIR", value_delimiter = ',')]
    recordings_dirs: Vec<PathBuf>,

    /// OS version recordings were captured on
    #[arg(long, env = "TOUCHMAP_OS")]
    os: Option<String>,

    /// Device family recordings were captured on
    #[arg(long, env = "TOUCHMAP_DEVICE")]
    device: Option<String>,

    /// Current device orientation in degrees
    #[arg(long, default_value_t = 0, env = "TOUCHMAP_ORIENTATION", allow_negative_numbers = true)]
    orientation: i32,

    /// Do not capture a screenshot when an action fails
    #[arg(long)]
    no_screenshot_on_failure: bool,

    /// Config file to use instead of ~/.touchmap/config.json
    #[arg(long, env = "TOUCHMAP_CONFIG")]
    config: Option<PathBuf>,

    /// Write logs to touchmap.log in this directory instead of stderr
    #[arg(long, env = "TOUCHMAP_LOG_DIR")]
    log_dir: Option<PathBuf>,

    /// Output format: text or json
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,

    /// Suppress non-essential output
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Touch the first element matching a query
    Touch {
        query: String,
    },

    /// Touch a screen position
    TouchPosition {
        x: f64,
        y: f64,
    },

    /// Swipe in a screen direction: up, down, left, right
    Swipe {
        direction: Orientation,
    },

    /// Turn the device a quarter turn: left or right
    Rotate {
        direction: RotationDirection,
    },

    /// Turn the device to an orientation in degrees
    RotateTo {
        #[arg(allow_negative_numbers = true)]
        degrees: i32,
        /// Direction to turn in: left or right
        #[arg(default_value = "left")]
        direction: RotationDirection,
    },

    /// Pinch in or out, on an element or at the screen centre
    Pinch {
        direction: PinchDirection,
        query: Option<String>,
    },

    /// Scroll matching scroll views: up, down, left, right
    Scroll {
        query: String,
        direction: ScrollDirection,
    },

    /// Replace the text of matching text inputs
    SetText {
        query: String,
        value: String,
    },

    /// Query visible elements
    Query {
        query: String,
        /// One line per element
        #[arg(long)]
        pretty: bool,
    },

    /// Query elements including hidden ones
    QueryAll {
        query: String,
        #[arg(long)]
        pretty: bool,
    },

    /// Check what is on screen
    Assert {
        #[command(subcommand)]
        check: AssertCommand,
    },

    /// Capture a screenshot (outputs base64-encoded PNG)
    Screenshot {
        /// Save as ios-screenshot-N.png in this directory instead
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },

    /// Wait until the device server answers
    WaitForDevice {
        /// Timeout in milliseconds
        #[arg(short = 'o', long, default_value = "30000", env = "TOUCHMAP_TIMEOUT")]
        timeout: u64,
    },

    /// List available recordings
    Recordings,

    /// Run a JSONL script of actions in one session
    Run {
        script: PathBuf,
        /// Append an action log (JSONL) here
        #[arg(long)]
        log: Option<PathBuf>,
        /// Continue after a failed action
        #[arg(long)]
        keep_going: bool,
    },

    /// Convert a JSONL action log to a shell script
    Convert {
        /// Path to the JSONL log file (reads from stdin if omitted)
        log: Option<PathBuf>,
    },

    /// Launch the simulator with an app bundle
    StartSimulator {
        /// Path to the .app bundle or its binary
        app_path: PathBuf,
        #[arg(long, default_value = "6.1", env = "TOUCHMAP_SDK")]
        sdk: String,
        /// Simulated device family: iphone or ipad
        #[arg(long = "simulate-device")]
        simulate_device: Option<DeviceFamily>,
        /// Fail instead of launching the simulator binary when waxsim is missing
        #[arg(long)]
        no_direct_launch: bool,
        /// Wait up to this many milliseconds for the device server
        #[arg(long)]
        wait: Option<u64>,
    },

    /// Quit the simulator
    StopSimulator,

    /// Show or create the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },
}

#[derive(Subcommand)]
enum AssertCommand {
    /// A view is marked with LABEL
    Contains { label: String },
    /// A view shows exactly TEXT
    ContainsText { text: String },
    /// QUERY matches at least one element
    ContainsQuery { query: String },
    /// No view is marked with LABEL
    NotContains { label: String },
    /// A web view body contains TEXT
    WebviewText { text: String },
    /// A web view has a node matching SELECTOR
    WebviewElement { selector: String },
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the effective configuration
    Show,
    /// Write the default configuration
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the configuration file path
    Path,
}

fn init_logging(log_dir: Option<&Path>) {
    match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir).ok();
            let file_appender = tracing_appender::rolling::never(dir, "touchmap.log");
            tracing_subscriber::fmt()
                .with_env_filter(
                    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
                )
                .with_writer(file_appender)
                .with_ansi(false)
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(
                    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
                )
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.log_dir.as_deref());

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            e.exit_code()
        }
    }
}

#[derive(Debug)]
enum CliError {
    Connection(String),
    ActionFailed(String),
    Protocol(String),
}

impl CliError {
    fn exit_code(&self) -> ExitCode {
        match self {
            CliError::Connection(_) => ExitCode::from(2),
            CliError::ActionFailed(_) => ExitCode::from(1),
            CliError::Protocol(_) => ExitCode::from(3),
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Connection(msg) => write!(f, "Connection error: {}", msg),
            CliError::ActionFailed(msg) => write!(f, "Action failed: {}", msg),
            CliError::Protocol(msg) => write!(f, "Protocol error: {}", msg),
        }
    }
}

/// Loads the configuration and applies command-line overrides.
fn effective_config(cli: &Cli) -> TouchmapConfig {
    let mut config = match cli.config {
        Some(ref path) => TouchmapConfig::load_from(path),
        None => TouchmapConfig::load(),
    };
    if let Some(ref endpoint) = cli.endpoint {
        config.endpoint = endpoint.clone();
    }
    if !cli.recordings_dirs.is_empty() {
        config.recordings_dirs = cli.recordings_dirs.clone();
    }
    if let Some(ref os) = cli.os {
        config.os = os.clone();
    }
    if let Some(ref device) = cli.device {
        config.device = device.clone();
    }
    if cli.no_screenshot_on_failure {
        config.capture_screenshot_on_failure = false;
    }
    config
}

fn build_executor(cli: &Cli, config: &TouchmapConfig) -> Result<ActionExecutor, CliError> {
    let client = DeviceClient::with_timeout(&config.endpoint, config.request_timeout())
        .map_err(|e| CliError::Connection(format!("Failed to create client for '{}': {}", config.endpoint, e)))?;
    let gestures = Gestures::new(Arc::new(client), config.recording_store())
        .with_recording_options(config.recording_options())
        .with_orientation(cli.orientation);

    let mut executor = ActionExecutor::new(gestures);
    executor.set_capture_screenshots(config.capture_screenshot_on_failure);
    if config.capture_screenshot_on_failure {
        executor.set_screenshot_dir(Some(config.screenshot_dir()));
    }
    Ok(executor)
}

fn print_json(value: &serde_json::Value) -> Result<(), CliError> {
    let text = serde_json::to_string_pretty(value).map_err(|e| CliError::Protocol(e.to_string()))?;
    println!("{}", text);
    Ok(())
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = effective_config(&cli);

    // Commands that don't talk to the device server
    match cli.command {
        Command::Convert { ref log } => {
            let script = match log {
                Some(path) => converter::LogConverter::convert_file(path)
                    .map_err(|e| CliError::ActionFailed(format!("Failed to convert log: {}", e)))?,
                None => converter::LogConverter::convert_stdin()
                    .map_err(|e| CliError::ActionFailed(format!("Failed to convert from stdin: {}", e)))?,
            };
            print!("{}", script);
            return Ok(());
        }
        Command::Recordings => return list_recordings(&cli, &config),
        Command::Config { ref action } => return config_command(&cli, &config, action),
        Command::StartSimulator { ref app_path, ref sdk, simulate_device, no_direct_launch, wait } => {
            return start_simulator(&cli, &config, app_path, sdk, simulate_device, no_direct_launch, wait).await;
        }
        Command::StopSimulator => {
            let mut launcher = SimulatorLauncher::new(config.simulator.clone());
            launcher
                .stop()
                .map_err(|e| CliError::ActionFailed(format!("Failed to stop simulator: {}", e)))?;
            if !cli.quiet {
                eprintln!("Simulator stopped");
            }
            return Ok(());
        }
        _ => {}
    }

    let mut executor = build_executor(&cli, &config)?;

    match cli.command {
        Command::Run { ref script, ref log, keep_going } => {
            run_script(&cli, &config, &mut executor, script, log.as_deref(), keep_going).await
        }
        Command::WaitForDevice { timeout } => {
            let driver = executor.gestures().driver().clone();
            let version = wait_for_device(driver.as_ref(), Duration::from_millis(timeout), DEFAULT_POLL_INTERVAL)
                .await
                .map_err(|e| CliError::Connection(e.to_string()))?;
            if cli.format == OutputFormat::Json {
                print_json(&serde_json::json!({ "success": true, "version": version }))
            } else {
                if !cli.quiet {
                    eprintln!("Device server at {} is available", config.endpoint);
                }
                Ok(())
            }
        }
        Command::Screenshot { dir: Some(ref dir) } => {
            let path = executor
                .gestures()
                .capture_screenshot(dir)
                .await
                .map_err(|e| CliError::ActionFailed(e.to_string()))?;
            println!("{}", path.display());
            Ok(())
        }
        Command::Query { ref query, pretty } => {
            execute_action(&cli, &mut executor, ActionType::Query { query: query.clone() }, pretty).await
        }
        Command::QueryAll { ref query, pretty } => {
            execute_action(&cli, &mut executor, ActionType::QueryAll { query: query.clone() }, pretty).await
        }
        _ => match device_action(&cli.command) {
            Some(action) => execute_action(&cli, &mut executor, action, false).await,
            None => Err(CliError::Protocol("command cannot be executed against the device".to_string())),
        },
    }
}

/// Maps a single-action command to its [`ActionType`].
fn device_action(command: &Command) -> Option<ActionType> {
    let action = match command {
        Command::Touch { query } => ActionType::Touch { query: query.clone() },
        Command::TouchPosition { x, y } => ActionType::TouchPosition { x: *x, y: *y },
        Command::Swipe { direction } => ActionType::Swipe { direction: *direction },
        Command::Rotate { direction } => ActionType::Rotate { direction: *direction },
        Command::RotateTo { degrees, direction } => ActionType::RotateTo {
            degrees: *degrees,
            direction: *direction,
        },
        Command::Pinch { direction, query } => ActionType::Pinch {
            direction: *direction,
            query: query.clone(),
        },
        Command::Scroll { query, direction } => ActionType::Scroll {
            query: query.clone(),
            direction: *direction,
        },
        Command::SetText { query, value } => ActionType::SetText {
            query: query.clone(),
            value: value.clone(),
        },
        Command::Assert { check } => match check {
            AssertCommand::Contains { label } => ActionType::ScreenShouldContain { label: label.clone() },
            AssertCommand::ContainsText { text } => ActionType::ScreenShouldContainText { text: text.clone() },
            AssertCommand::ContainsQuery { query } => ActionType::ScreenShouldContainQuery { query: query.clone() },
            AssertCommand::NotContains { label } => ActionType::ScreenShouldNotContain { label: label.clone() },
            AssertCommand::WebviewText { text } => ActionType::WebviewShouldContainText { text: text.clone() },
            AssertCommand::WebviewElement { selector } => {
                ActionType::WebviewShouldContainElement { selector: selector.clone() }
            }
        },
        Command::Screenshot { dir: None } => ActionType::Screenshot,
        _ => return None,
    };
    Some(action)
}

async fn execute_action(
    cli: &Cli,
    executor: &mut ActionExecutor,
    action: ActionType,
    pretty: bool,
) -> Result<(), CliError> {
    let is_screenshot_action = matches!(action, ActionType::Screenshot);
    let is_query_action = matches!(action, ActionType::Query { .. } | ActionType::QueryAll { .. });
    let action_label = action.name();
    let start = Instant::now();
    let result = executor.execute(action).await;
    let elapsed = start.elapsed();
    let orientation = executor.gestures().current_orientation();

    if cli.format == OutputFormat::Json {
        let output = serde_json::json!({
            "success": result.success,
            "message": result.message,
            "screenshot": result.screenshot,
            "data": result.data.as_ref().and_then(|d| serde_json::from_str::<serde_json::Value>(d).ok()),
            "orientation": orientation,
        });
        print_json(&output)?;
        if !result.success {
            return Err(CliError::ActionFailed(result.message));
        }
        return Ok(());
    }

    if !result.success {
        return Err(CliError::ActionFailed(result.message));
    }
    if is_screenshot_action {
        if let Some(ref ss) = result.screenshot {
            println!("{}", ss);
        }
    }
    if is_query_action {
        print_query_results(&result, pretty)?;
    }
    if !cli.quiet {
        let now = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S%.3fZ");
        eprintln!("|{}|{}|{}|{}ms|", now, action_label, result.message, elapsed.as_millis());
    }
    Ok(())
}

fn print_query_results(result: &ExecutionResult, pretty: bool) -> Result<(), CliError> {
    let data = result.data.as_deref().unwrap_or("[]");
    if !pretty {
        println!("{}", data);
        return Ok(());
    }
    let values: Vec<serde_json::Value> = serde_json::from_str(data)
        .map_err(|e| CliError::Protocol(format!("Failed to parse results: {}", e)))?;
    for value in &values {
        match UIElement::from_value(value) {
            Some(element) => println!("{}", element.format_pretty()),
            None => println!("{}", value),
        }
    }
    Ok(())
}

/// Reads a script: one JSON [`ActionType`] per line, blank lines and `#`
/// comments ignored.
fn parse_script(path: &Path) -> Result<Vec<ActionType>, CliError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| CliError::ActionFailed(format!("Failed to read script {}: {}", path.display(), e)))?;
    content
        .lines()
        .enumerate()
        .map(|(n, line)| (n + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .map(|(n, line)| {
            serde_json::from_str(line)
                .map_err(|e| CliError::Protocol(format!("{}:{}: invalid action: {}", path.display(), n, e)))
        })
        .collect()
}

async fn run_script(
    cli: &Cli,
    config: &TouchmapConfig,
    executor: &mut ActionExecutor,
    script: &Path,
    log_path: Option<&Path>,
    keep_going: bool,
) -> Result<(), CliError> {
    let actions = parse_script(script)?;
    let mut log_file = match log_path {
        Some(path) => Some(
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| CliError::ActionFailed(format!("Failed to open log {}: {}", path.display(), e)))?,
        ),
        None => None,
    };
    let mut launcher = SimulatorLauncher::new(config.simulator.clone());
    let mut failures = Vec::new();

    info!(script = %script.display(), steps = actions.len(), "running script");
    for (index, action) in actions.into_iter().enumerate() {
        let step = index + 1;
        let name = action.name();
        let start = Instant::now();
        let result = if action.is_simulator_action() {
            simulator_step(&mut launcher, &action)
        } else {
            executor.execute(action.clone()).await
        };
        let duration_ms = start.elapsed().as_millis() as u64;

        if let Some(ref mut file) = log_file {
            let entry = ActionLog::new(
                action,
                if result.success {
                    ActionResult::Success
                } else {
                    ActionResult::Failure(result.message.clone())
                },
                result.screenshot.clone().map(Arc::new),
                Some(duration_ms),
            );
            let line = serde_json::to_string(&entry).map_err(|e| CliError::Protocol(e.to_string()))?;
            writeln!(file, "{}", line).map_err(|e| CliError::ActionFailed(format!("Failed to write log: {}", e)))?;
        }

        if cli.format == OutputFormat::Json {
            println!(
                "{}",
                serde_json::json!({
                    "step": step,
                    "action": name,
                    "success": result.success,
                    "message": result.message,
                    "duration_ms": duration_ms,
                })
            );
        } else if !cli.quiet || !result.success {
            let status = if result.success { "ok" } else { "FAILED" };
            eprintln!("|{}|{}|{}|{}|{}ms|", step, name, status, result.message, duration_ms);
        }

        if !result.success {
            failures.push(format!("step {} ({}): {}", step, name, result.message));
            if !keep_going {
                break;
            }
        }
    }

    if failures.is_empty() {
        Ok(())
    } else {
        Err(CliError::ActionFailed(failures.join("; ")))
    }
}

fn simulator_step(launcher: &mut SimulatorLauncher, action: &ActionType) -> ExecutionResult {
    match action {
        ActionType::StartSimulator { app_path, sdk } => match launcher.start(app_path, sdk) {
            Ok(pid) => ExecutionResult::success(format!("Simulator started (pid {})", pid)),
            Err(e) => ExecutionResult::failure(e.to_string()),
        },
        ActionType::StopSimulator => match launcher.stop() {
            Ok(()) => ExecutionResult::success("Simulator stopped"),
            Err(e) => ExecutionResult::failure(e.to_string()),
        },
        _ => ExecutionResult::failure("not a simulator action"),
    }
}

async fn start_simulator(
    cli: &Cli,
    config: &TouchmapConfig,
    app_path: &Path,
    sdk: &str,
    simulate_device: Option<DeviceFamily>,
    no_direct_launch: bool,
    wait: Option<u64>,
) -> Result<(), CliError> {
    let mut sim_config = config.simulator.clone();
    if let Some(device) = simulate_device {
        sim_config.device = device;
    }
    if no_direct_launch {
        sim_config.allow_direct_launch = false;
    }

    let mut launcher = SimulatorLauncher::new(sim_config);
    let pid = launcher
        .start(app_path, sdk)
        .map_err(|e| CliError::ActionFailed(format!("Failed to start simulator: {}", e)))?;
    if !cli.quiet {
        eprintln!("Simulator started (pid {})", pid);
    }

    if let Some(timeout) = wait {
        let client = DeviceClient::with_timeout(&config.endpoint, config.request_timeout())
            .map_err(|e| CliError::Connection(e.to_string()))?;
        if let Err(e) = wait_for_device(&client, Duration::from_millis(timeout), DEFAULT_POLL_INTERVAL).await {
            warn!(error = %e, "device server did not come up");
            return Err(CliError::Connection(e.to_string()));
        }
        if !cli.quiet {
            eprintln!("Device server at {} is available", config.endpoint);
        }
    }
    Ok(())
}

fn list_recordings(cli: &Cli, config: &TouchmapConfig) -> Result<(), CliError> {
    let names = config.recording_store().list();

    if cli.format == OutputFormat::Json {
        return print_json(&serde_json::json!({
            "dirs": config.recordings_dirs,
            "recordings": names,
        }));
    }
    if names.is_empty() {
        if !cli.quiet {
            eprintln!("No recordings found");
        }
    } else {
        for name in names {
            println!("{}", name);
        }
    }
    Ok(())
}

fn config_command(cli: &Cli, config: &TouchmapConfig, action: &ConfigCommand) -> Result<(), CliError> {
    let path = cli.config.clone().unwrap_or_else(config_path);
    match action {
        ConfigCommand::Show => {
            let value = serde_json::to_value(config).map_err(|e| CliError::Protocol(e.to_string()))?;
            print_json(&value)
        }
        ConfigCommand::Path => {
            println!("{}", path.display());
            Ok(())
        }
        ConfigCommand::Init { force } => {
            if path.exists() && !force {
                return Err(CliError::ActionFailed(format!(
                    "{} already exists (use --force to overwrite)",
                    path.display()
                )));
            }
            TouchmapConfig::default()
                .save_to(&path)
                .map_err(|e| CliError::ActionFailed(format!("Failed to write {}: {}", path.display(), e)))?;
            if !cli.quiet {
                eprintln!("Wrote {}", path.display());
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_overrides_apply_on_top_of_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        TouchmapConfig { os: "ios6".to_string(), ..Default::default() }
            .save_to(&path)
            .unwrap();

        let cli = Cli::parse_from([
            "touchmap",
            "--config",
            path.to_str().unwrap(),
            "--endpoint",
            "10.0.0.7:37265",
            "-r",
            "a,b",
            "swipe",
            "up",
        ]);
        let config = effective_config(&cli);
        assert_eq!(config.endpoint, "10.0.0.7:37265");
        assert_eq!(config.os, "ios6");
        assert_eq!(config.recordings_dirs, vec![PathBuf::from("a"), PathBuf::from("b")]);
    }

    #[test]
    fn test_device_action_mapping() {
        let cli = Cli::parse_from(["touchmap", "assert", "contains-text", "Hi"]);
        assert_eq!(
            device_action(&cli.command),
            Some(ActionType::ScreenShouldContainText { text: "Hi".to_string() })
        );

        let cli = Cli::parse_from(["touchmap", "rotate-to", "-90", "right"]);
        assert_eq!(
            device_action(&cli.command),
            Some(ActionType::RotateTo { degrees: -90, direction: RotationDirection::Right })
        );

        let cli = Cli::parse_from(["touchmap", "recordings"]);
        assert!(device_action(&cli.command).is_none());
    }

    #[test]
    fn test_parse_script_skips_comments() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("script.jsonl");
        std::fs::write(
            &path,
            "# login\n{\"type\":\"Touch\",\"query\":\"button\"}\n\n{\"type\":\"Rotate\",\"direction\":\"left\"}\n",
        )
        .unwrap();

        let actions = parse_script(&path).unwrap();
        assert_eq!(actions.len(), 2);
        assert_eq!(actions[1], ActionType::Rotate { direction: RotationDirection::Left });
    }

    #[test]
    fn test_parse_script_reports_line_number() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("script.jsonl");
        std::fs::write(&path, "{\"type\":\"Screenshot\"}\n{\"type\":\"Nope\"}\n").unwrap();

        match parse_script(&path) {
            Err(CliError::Protocol(msg)) => assert!(msg.contains(":2:"), "{msg}"),
            other => panic!("expected protocol error, got {other:?}"),
        }
    }
}
