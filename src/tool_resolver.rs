//! # Tool Path Resolver
//!
//! Finds the external optimizer binary:
//! - Explicit path from configuration
//! - Bundled next to the running executable (or in `PICOPTIM_TOOLS_DIR`)
//! - System `PATH`

use crate::config::Config;
use crate::platform::executable_name;
use std::env;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default external optimizer
pub const OPTIMIZER_TOOL: &str = "jpegoptim";

/// Tool path resolver for bundled and system-installed binaries
pub struct ToolPathResolver {
    /// Directory searched before PATH
    tools_dir: Option<PathBuf>,
}

impl ToolPathResolver {
    /// Create a new path resolver
    pub fn new() -> Self {
        Self {
            tools_dir: Self::detect_bundled_tools_dir(),
        }
    }

    pub fn with_tools_dir(tools_dir: Option<PathBuf>) -> Self {
        Self { tools_dir }
    }

    /// `PICOPTIM_TOOLS_DIR` wins; otherwise the directory holding the executable
    fn detect_bundled_tools_dir() -> Option<PathBuf> {
        if let Some(dir) = env::var_os("PICOPTIM_TOOLS_DIR") {
            let dir = PathBuf::from(dir);
            debug!("Checking PICOPTIM_TOOLS_DIR: {:?}", dir);
            if dir.is_dir() {
                return Some(dir);
            }
        }

        let exe_dir = env::current_exe().ok()?.parent()?.to_path_buf();
        debug!("Executable directory: {:?}", exe_dir);
        Some(exe_dir)
    }

    /// Resolve the path to a specific tool
    pub fn resolve_tool(&self, tool_name: &str) -> Option<PathBuf> {
        let file_name = executable_name(tool_name);

        if let Some(ref tools_dir) = self.tools_dir {
            let bundled_path = tools_dir.join(&file_name);
            if bundled_path.is_file() {
                debug!("Using bundled tool: {} -> {:?}", tool_name, bundled_path);
                return Some(bundled_path);
            }
        }

        if let Some(system_path) = Self::find_in_system_path(&file_name) {
            debug!("Using system tool: {} -> {:?}", tool_name, system_path);
            return Some(system_path);
        }

        None
    }

    /// Find tool in system PATH
    fn find_in_system_path(file_name: &str) -> Option<PathBuf> {
        env::split_paths(&env::var_os("PATH")?)
            .map(|dir| dir.join(file_name))
            .find(|path| path.is_file())
    }

    /// Pick the optimizer binary for a run.
    ///
    /// Falls back to the bare tool name, so a missing optimizer surfaces as
    /// per-file spawn failures rather than a configuration error.
    pub fn resolve_optimizer(&self, config: &Config) -> PathBuf {
        if let Some(ref explicit) = config.optimizer {
            return explicit.clone();
        }

        self.resolve_tool(OPTIMIZER_TOOL).unwrap_or_else(|| {
            debug!("{} not found, falling back to bare name", OPTIMIZER_TOOL);
            PathBuf::from(executable_name(OPTIMIZER_TOOL))
        })
    }

    /// Check whether an explicitly configured or resolved binary exists on disk
    pub fn is_available(path: &Path) -> bool {
        if path.components().count() > 1 {
            path.is_file()
        } else {
            Self::find_in_system_path(&path.to_string_lossy()).is_some()
        }
    }

    /// Installation hint for the current platform
    pub fn install_instructions(tool_name: &str) -> String {
        if cfg!(target_os = "linux") {
            format!("Install it with: sudo apt-get install {}", tool_name)
        } else if cfg!(target_os = "macos") {
            format!("Install it with: brew install {}", tool_name)
        } else if cfg!(windows) {
            format!(
                "Download {} from https://github.com/tjko/jpegoptim/releases and place it next to picoptim.exe",
                executable_name(tool_name)
            )
        } else {
            format!("Please install {} and make sure it is on PATH", tool_name)
        }
    }
}

impl Default for ToolPathResolver {
    fn default() -> Self {
        Self::new()
    }
}
