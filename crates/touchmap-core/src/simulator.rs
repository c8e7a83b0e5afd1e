//! Launching and quitting the iOS Simulator.
//!
//! The simulator is started either through the `waxsim` helper tool, which
//! installs and launches an app bundle for a given SDK and device family, or
//! by invoking the simulator binary directly with `-SimulateApplication`.
//! The direct path cannot pick an SDK, so it is only taken when the helper is
//! missing and [`SimulatorConfig::allow_direct_launch`] permits it.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use touchmap_core::simulator::{SimulatorConfig, SimulatorLauncher};
//!
//! let mut launcher = SimulatorLauncher::new(SimulatorConfig::default());
//! launcher.start(Path::new("build/Demo.app"), "6.1").unwrap();
//! // ... run tests ...
//! launcher.stop().unwrap();
//! ```

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Child, Command};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Name of the helper tool looked up on the search path.
pub const HELPER_TOOL: &str = "waxsim";

/// Application name used to quit the simulator.
pub const SIMULATOR_APP_NAME: &str = "iPhone Simulator";

/// Where Xcode installs the simulator binary.
pub const DEFAULT_SIMULATOR_PATH: &str = "/Applications/Xcode.app/Contents/Developer/Platforms/iPhoneSimulator.platform/Developer/Applications/iPhone Simulator.app/Contents/MacOS/iPhone Simulator";

/// Errors that can occur when launching or stopping the simulator.
#[derive(Error, Debug)]
pub enum SimulatorError {
    /// Neither the helper tool nor a usable simulator binary was found.
    #[error("Simulator not found: {0}")]
    SimulatorNotFound(String),

    /// The app bundle or its binary does not exist.
    #[error("App not found at path: {0}")]
    AppNotFound(PathBuf),

    /// The simulator process could not be spawned.
    #[error("Failed to launch simulator: {0}")]
    LaunchFailed(String),

    /// The quit command exited unsuccessfully.
    #[error("Command execution failed: {0}")]
    CommandFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Simulated hardware family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceFamily {
    #[default]
    Iphone,
    Ipad,
}

impl DeviceFamily {
    /// Value of the helper tool's `-f` flag.
    pub fn helper_arg(self) -> &'static str {
        match self {
            DeviceFamily::Iphone => "iphone",
            DeviceFamily::Ipad => "ipad",
        }
    }

    /// Value of the simulator's `-SimulateDevice` flag.
    pub fn simulate_device_arg(self) -> &'static str {
        match self {
            DeviceFamily::Iphone => "iPhone",
            DeviceFamily::Ipad => "iPad",
        }
    }
}

impl fmt::Display for DeviceFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.helper_arg())
    }
}

impl FromStr for DeviceFamily {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "iphone" => Ok(DeviceFamily::Iphone),
            "ipad" => Ok(DeviceFamily::Ipad),
            other => Err(format!("unknown device family '{other}', expected iphone or ipad")),
        }
    }
}

/// Launcher settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Helper tool name (looked up on the search path) or path.
    pub helper_tool: String,
    /// Simulator binary used when launching directly.
    pub simulator_path: PathBuf,
    /// Fall back to launching the simulator binary when the helper is missing.
    pub allow_direct_launch: bool,
    pub device: DeviceFamily,
    /// Command that asks the running simulator to quit.
    pub quit_command: Vec<String>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            helper_tool: HELPER_TOOL.to_string(),
            simulator_path: PathBuf::from(DEFAULT_SIMULATOR_PATH),
            allow_direct_launch: true,
            device: DeviceFamily::default(),
            quit_command: vec![
                "osascript".to_string(),
                "-e".to_string(),
                format!("tell application \"{SIMULATOR_APP_NAME}\" to quit"),
            ],
        }
    }
}

/// An app bundle and the executable inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppBundle {
    pub bundle: PathBuf,
    pub binary: PathBuf,
}

fn expand_home(path: &Path) -> PathBuf {
    PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).as_ref())
}

fn has_app_extension(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("app")
}

impl AppBundle {
    /// Derives bundle and binary from either `Foo.app` or `Foo.app/Foo`.
    ///
    /// # Errors
    ///
    /// - [`SimulatorError::AppNotFound`] if the path is not inside an `.app`
    ///   bundle or either the bundle or its binary is missing
    pub fn from_path(path: &Path) -> Result<Self, SimulatorError> {
        let path = expand_home(path);
        let path = path.as_path();

        let (bundle, binary) = if has_app_extension(path) {
            let name = path
                .file_stem()
                .ok_or_else(|| SimulatorError::AppNotFound(path.to_path_buf()))?;
            (path.to_path_buf(), path.join(name))
        } else {
            match path.parent() {
                Some(parent) if has_app_extension(parent) => (parent.to_path_buf(), path.to_path_buf()),
                _ => return Err(SimulatorError::AppNotFound(path.to_path_buf())),
            }
        };

        if !bundle.is_dir() {
            return Err(SimulatorError::AppNotFound(bundle));
        }
        if !binary.is_file() {
            return Err(SimulatorError::AppNotFound(binary));
        }
        Ok(Self { bundle, binary })
    }
}

/// A resolved command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchPlan {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl LaunchPlan {
    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }
}

/// Looks for an executable named `tool` in each directory of `search_path`
/// (a `PATH`-style list). A `tool` containing a path separator is checked
/// directly, relative to the working directory.
pub fn find_in_path(tool: &str, search_path: Option<&OsStr>) -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    which::which_in(tool, search_path, cwd).ok()
}

/// Builds the simulator command line for `app`.
///
/// `helper` is the located helper tool, if any.
///
/// # Errors
///
/// - [`SimulatorError::SimulatorNotFound`] if the helper is missing and
///   direct launch is disabled or the simulator binary does not exist
pub fn launch_plan(
    app: &AppBundle,
    sdk: &str,
    helper: Option<&Path>,
    config: &SimulatorConfig,
) -> Result<LaunchPlan, SimulatorError> {
    if let Some(helper) = helper {
        return Ok(LaunchPlan {
            program: helper.to_path_buf(),
            args: vec![
                "-s".to_string(),
                sdk.to_string(),
                "-f".to_string(),
                config.device.helper_arg().to_string(),
                app.bundle.to_string_lossy().to_string(),
            ],
        });
    }

    if !config.allow_direct_launch {
        return Err(SimulatorError::SimulatorNotFound(format!(
            "helper tool '{}' not found and direct launch is disabled",
            config.helper_tool
        )));
    }

    if !config.simulator_path.is_file() {
        return Err(SimulatorError::SimulatorNotFound(format!(
            "helper tool '{}' not found and no simulator at {}",
            config.helper_tool,
            config.simulator_path.display()
        )));
    }

    warn!(
        helper = %config.helper_tool,
        simulator = %config.simulator_path.display(),
        "helper tool not found, launching simulator directly; the SDK version is ignored"
    );
    Ok(LaunchPlan {
        program: config.simulator_path.clone(),
        args: vec![
            "-SimulateDevice".to_string(),
            config.device.simulate_device_arg().to_string(),
            "-SimulateApplication".to_string(),
            app.binary.to_string_lossy().to_string(),
        ],
    })
}

/// Owns the simulator process between [`start`](Self::start) and
/// [`stop`](Self::stop).
pub struct SimulatorLauncher {
    config: SimulatorConfig,
    search_path: Option<OsString>,
    child: Option<Child>,
}

impl SimulatorLauncher {
    /// Creates a launcher that searches the process `PATH` for the helper.
    pub fn new(config: SimulatorConfig) -> Self {
        Self {
            config,
            search_path: std::env::var_os("PATH"),
            child: None,
        }
    }

    /// Overrides the directories searched for the helper tool.
    pub fn with_search_path(mut self, search_path: impl Into<OsString>) -> Self {
        self.search_path = Some(search_path.into());
        self
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    /// Locates the helper tool, accepting an explicit path as well.
    pub fn locate_helper(&self) -> Option<PathBuf> {
        find_in_path(&self.config.helper_tool, self.search_path.as_deref())
    }

    /// Resolves the app and the command line without launching anything.
    pub fn plan(&self, app_path: &Path, sdk: &str) -> Result<LaunchPlan, SimulatorError> {
        let app = AppBundle::from_path(app_path)?;
        let helper = self.locate_helper();
        debug!(helper = ?helper, bundle = %app.bundle.display(), "resolved app bundle");
        launch_plan(&app, sdk, helper.as_deref(), &self.config)
    }

    /// Launches the simulator with `app_path` for SDK `sdk` and returns the
    /// process id.
    pub fn start(&mut self, app_path: &Path, sdk: &str) -> Result<u32, SimulatorError> {
        let plan = self.plan(app_path, sdk)?;
        info!(program = %plan.program.display(), args = ?plan.args, "launching simulator");

        let child = plan
            .command()
            .spawn()
            .map_err(|e| SimulatorError::LaunchFailed(format!("{}: {}", plan.program.display(), e)))?;
        let pid = child.id();
        self.child = Some(child);
        Ok(pid)
    }

    /// Returns `true` while the launched process has not exited.
    pub fn is_running(&mut self) -> bool {
        match self.child.as_mut() {
            Some(child) => matches!(child.try_wait(), Ok(None)),
            None => false,
        }
    }

    /// Asks the simulator to quit and waits for the launched process to exit.
    ///
    /// Without a prior [`start`](Self::start) only the quit command is sent.
    pub fn stop(&mut self) -> Result<(), SimulatorError> {
        let (program, args) = self
            .config
            .quit_command
            .split_first()
            .ok_or_else(|| SimulatorError::CommandFailed("empty quit command".to_string()))?;

        let output = Command::new(program).args(args).output()?;
        if !output.status.success() {
            return Err(SimulatorError::CommandFailed(
                String::from_utf8_lossy(&output.stderr).to_string(),
            ));
        }

        if let Some(mut child) = self.child.take() {
            let status = child.wait()?;
            info!(%status, "simulator exited");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Creates `Name.app/Name` under `root`.
    fn fake_app(root: &Path, name: &str) -> PathBuf {
        let bundle = root.join(format!("{name}.app"));
        std::fs::create_dir_all(&bundle).unwrap();
        std::fs::write(bundle.join(name), b"").unwrap();
        bundle
    }

    #[cfg(unix)]
    fn fake_tool(dir: &Path, name: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join(name);
        std::fs::write(&path, "#!/bin/sh\nexit 0\n").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[test]
    fn app_bundle_from_bundle_path() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = fake_app(dir.path(), "Demo");

        let app = AppBundle::from_path(&bundle).unwrap();
        assert_eq!(app.bundle, bundle);
        assert_eq!(app.binary, bundle.join("Demo"));
    }

    #[test]
    fn app_bundle_from_binary_path() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = fake_app(dir.path(), "Demo");

        let app = AppBundle::from_path(&bundle.join("Demo")).unwrap();
        assert_eq!(app.bundle, bundle);
    }

    #[test]
    fn app_bundle_missing_binary() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = dir.path().join("Empty.app");
        std::fs::create_dir_all(&bundle).unwrap();

        match AppBundle::from_path(&bundle) {
            Err(SimulatorError::AppNotFound(p)) => assert_eq!(p, bundle.join("Empty")),
            other => panic!("expected AppNotFound, got {other:?}"),
        }
    }

    #[test]
    fn app_bundle_rejects_non_bundle_paths() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            AppBundle::from_path(&dir.path().join("Demo")),
            Err(SimulatorError::AppNotFound(_))
        ));
    }

    #[test]
    fn helper_plan_arguments() {
        let app = AppBundle {
            bundle: PathBuf::from("/apps/Demo.app"),
            binary: PathBuf::from("/apps/Demo.app/Demo"),
        };
        let config = SimulatorConfig { device: DeviceFamily::Ipad, ..Default::default() };

        let plan = launch_plan(&app, "6.1", Some(Path::new("/usr/local/bin/waxsim")), &config).unwrap();
        assert_eq!(plan.program, PathBuf::from("/usr/local/bin/waxsim"));
        assert_eq!(plan.args, vec!["-s", "6.1", "-f", "ipad", "/apps/Demo.app"]);
    }

    #[test]
    fn direct_plan_when_helper_missing() {
        let dir = tempfile::tempdir().unwrap();
        let simulator = dir.path().join("iPhone Simulator");
        std::fs::write(&simulator, b"").unwrap();
        let app = AppBundle {
            bundle: PathBuf::from("/apps/Demo.app"),
            binary: PathBuf::from("/apps/Demo.app/Demo"),
        };
        let config = SimulatorConfig { simulator_path: simulator.clone(), ..Default::default() };

        let plan = launch_plan(&app, "6.1", None, &config).unwrap();
        assert_eq!(plan.program, simulator);
        assert_eq!(
            plan.args,
            vec!["-SimulateDevice", "iPhone", "-SimulateApplication", "/apps/Demo.app/Demo"]
        );
    }

    #[test]
    fn direct_launch_can_be_disabled() {
        let app = AppBundle {
            bundle: PathBuf::from("/apps/Demo.app"),
            binary: PathBuf::from("/apps/Demo.app/Demo"),
        };
        let config = SimulatorConfig { allow_direct_launch: false, ..Default::default() };
        let err = launch_plan(&app, "6.1", None, &config).unwrap_err();
        assert!(err.to_string().contains("direct launch is disabled"));
    }

    #[test]
    fn nothing_found_is_simulator_not_found() {
        let app = AppBundle {
            bundle: PathBuf::from("/apps/Demo.app"),
            binary: PathBuf::from("/apps/Demo.app/Demo"),
        };
        let config = SimulatorConfig {
            simulator_path: PathBuf::from("/nonexistent/iPhone Simulator"),
            ..Default::default()
        };
        assert!(matches!(
            launch_plan(&app, "6.1", None, &config),
            Err(SimulatorError::SimulatorNotFound(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn find_in_path_scans_directories() {
        let empty = tempfile::tempdir().unwrap();
        let tools = tempfile::tempdir().unwrap();
        let waxsim = fake_tool(tools.path(), "waxsim");
        std::fs::write(empty.path().join("waxsim"), b"not executable").unwrap();

        let search = std::env::join_paths([empty.path(), tools.path()]).unwrap();
        let found = find_in_path("waxsim", Some(&search)).unwrap();
        assert_eq!(found.canonicalize().unwrap(), waxsim.canonicalize().unwrap());
        assert_eq!(find_in_path("ios-sim", Some(&search)), None);
        assert_eq!(find_in_path("waxsim", None), None);
    }

    #[cfg(unix)]
    #[test]
    fn helper_given_as_path_skips_search() {
        let tools = tempfile::tempdir().unwrap();
        let waxsim = fake_tool(tools.path(), "waxsim");
        let config = SimulatorConfig {
            helper_tool: waxsim.to_string_lossy().to_string(),
            ..Default::default()
        };

        let launcher = SimulatorLauncher::new(config).with_search_path("");
        let found = launcher.locate_helper().unwrap();
        assert_eq!(found.canonicalize().unwrap(), waxsim.canonicalize().unwrap());

        let missing = SimulatorConfig {
            helper_tool: tools.path().join("ios-sim").to_string_lossy().to_string(),
            ..Default::default()
        };
        assert_eq!(SimulatorLauncher::new(missing).locate_helper(), None);
    }

    #[test]
    fn app_path_expands_home() {
        let Some(home) = dirs::home_dir() else { return };
        assert_eq!(expand_home(Path::new("~/Apps/Demo.app")), home.join("Apps/Demo.app"));
        assert_eq!(expand_home(Path::new("/abs/Demo.app")), PathBuf::from("/abs/Demo.app"));
    }

    #[cfg(unix)]
    #[test]
    fn start_and_stop_through_helper() {
        let tools = tempfile::tempdir().unwrap();
        fake_tool(tools.path(), "waxsim");
        let apps = tempfile::tempdir().unwrap();
        let bundle = fake_app(apps.path(), "Demo");

        let config = SimulatorConfig {
            quit_command: vec!["true".to_string()],
            ..Default::default()
        };
        let mut launcher = SimulatorLauncher::new(config).with_search_path(tools.path());

        let pid = launcher.start(&bundle, "6.1").unwrap();
        assert!(pid > 0);
        launcher.stop().unwrap();
        assert!(!launcher.is_running());
    }

    #[test]
    fn stop_without_start_only_sends_quit() {
        let config = SimulatorConfig {
            quit_command: vec!["true".to_string()],
            ..Default::default()
        };
        let mut launcher = SimulatorLauncher::new(config);
        launcher.stop().unwrap();
    }

    #[test]
    fn failing_quit_command_is_reported() {
        let config = SimulatorConfig {
            quit_command: vec!["false".to_string()],
            ..Default::default()
        };
        let mut launcher = SimulatorLauncher::new(config);
        assert!(matches!(launcher.stop(), Err(SimulatorError::CommandFailed(_))));
    }

    #[test]
    fn device_family_parse() {
        assert_eq!("iPad".parse::<DeviceFamily>().unwrap(), DeviceFamily::Ipad);
        assert!("watch".parse::<DeviceFamily>().is_err());
    }
}
