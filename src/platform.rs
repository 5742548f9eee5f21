//! # Platform-specific utilities
//!
//! Questo modulo centralizza la logica cross-platform: nomi degli eseguibili
//! e risoluzione del target posizionale (path, lettera di drive, o
//! "intera macchina") nelle root da scansionare.

use crate::error::OptimizeError;
use std::path::PathBuf;
use tracing::debug;

/// Target sentinel meaning "every storage root on this machine"
pub const ALL_TARGET: &str = "all";

/// Platform-specific executable file name (`jpegoptim` -> `jpegoptim.exe` on Windows)
pub fn executable_name(base_name: &str) -> String {
    if cfg!(windows) && !base_name.to_ascii_lowercase().ends_with(".exe") {
        format!("{}.exe", base_name)
    } else {
        base_name.to_string()
    }
}

/// Turn the positional target into the list of roots to scan.
///
/// Accepts a path, a drive designator (`D:` / `D:\`), or [`ALL_TARGET`].
pub fn resolve_target(target: &str) -> Result<Vec<PathBuf>, OptimizeError> {
    let target = target.trim();
    if target.is_empty() {
        return Err(OptimizeError::Config("Target must not be empty".to_string()));
    }

    if target.eq_ignore_ascii_case(ALL_TARGET) {
        let roots = machine_roots()?;
        debug!("Resolved '{}' to {} roots: {:?}", ALL_TARGET, roots.len(), roots);
        return Ok(roots);
    }

    let path = match drive_letter(target) {
        Some(letter) => PathBuf::from(format!("{}:\\", letter)),
        None => PathBuf::from(target),
    };

    if !path.exists() {
        return Err(OptimizeError::Config(format!(
            "Target does not exist: {}",
            path.display()
        )));
    }

    Ok(vec![path])
}

/// `D`, `D:` or `D:\` style designators; only meaningful on Windows
fn drive_letter(target: &str) -> Option<char> {
    if !cfg!(windows) {
        return None;
    }
    let trimmed = target.trim_end_matches(['\\', '/']);
    let mut chars = trimmed.chars();
    let letter = chars.next()?;
    let rest: String = chars.collect();
    (letter.is_ascii_alphabetic() && rest == ":").then(|| letter.to_ascii_uppercase())
}

#[cfg(unix)]
fn machine_roots() -> Result<Vec<PathBuf>, OptimizeError> {
    Ok(vec![PathBuf::from("/")])
}

#[cfg(windows)]
fn machine_roots() -> Result<Vec<PathBuf>, OptimizeError> {
    let roots: Vec<PathBuf> = ('A'..='Z')
        .map(|letter| PathBuf::from(format!("{}:\\", letter)))
        .filter(|root| root.exists())
        .collect();

    if roots.is_empty() {
        return Err(OptimizeError::Config("No drives found".to_string()));
    }
    Ok(roots)
}

#[cfg(not(any(unix, windows)))]
fn machine_roots() -> Result<Vec<PathBuf>, OptimizeError> {
    Err(OptimizeError::UnsupportedPlatform(
        std::env::consts::OS.to_string(),
    ))
}

/// Get system information for debugging
pub fn system_info() -> SystemInfo {
    SystemInfo {
        os: std::env::consts::OS,
        arch: std::env::consts::ARCH,
        family: std::env::consts::FAMILY,
    }
}

/// System information structure
#[derive(Debug, Clone)]
pub struct SystemInfo {
    pub os: &'static str,
    pub arch: &'static str,
    pub family: &'static str,
}

impl std::fmt::Display for SystemInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} ({})", self.os, self.arch, self.family)
    }
}
