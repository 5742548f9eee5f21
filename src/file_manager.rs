//! # File Management Module
//!
//! Questo modulo gestisce la discovery dei file e le utilità sui file.
//!
//! ## Responsabilità:
//! - Discovery ricorsiva dei file immagine sotto una o più root
//! - Filtro per estensione case-insensitive (default: jpg, jpeg)
//! - Path del backup accanto al file originale
//! - Formattazione human-readable delle dimensioni
//!
//! ## Regole di discovery:
//! - I link simbolici non vengono mai seguiti (niente cicli, niente fuga dalla root)
//! - Una root inesistente produce un warning e viene saltata
//! - Nessun file trovato = `Vec` vuoto, non un errore
//! - Ogni entry del filesystem è un file distinto (`a.JPG` e `a.jpg` sono due file)
//! - L'ordine di attraversamento non è garantito
//!
//! ## Esempio:
//! ```ignore
//! let files = FileManager::find_files(&[PathBuf::from("/photos")], &["jpg", "jpeg"]);
//! ```

use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Suffix appended to the full file name of a backup copy
pub const BACKUP_SUFFIX: &str = ".bak";

/// Manages file operations and discovery
pub struct FileManager;

impl FileManager {
    /// Get the current length of a file
    pub async fn file_size(path: &Path) -> std::io::Result<u64> {
        Ok(tokio::fs::metadata(path).await?.len())
    }

    /// Find all files under `roots` whose extension is in `extensions`
    pub fn find_files<S: AsRef<str>>(roots: &[PathBuf], extensions: &[S]) -> Vec<PathBuf> {
        let mut files = Vec::new();

        for root in roots {
            if std::fs::symlink_metadata(root).is_err() {
                warn!("Skipping missing root: {}", root.display());
                continue;
            }

            let before = files.len();
            for entry in WalkDir::new(root).follow_links(false) {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        debug!("Skipping unreadable entry under {}: {}", root.display(), e);
                        continue;
                    }
                };

                if entry.file_type().is_file() && Self::matches_extension(entry.path(), extensions) {
                    files.push(absolute(entry.path()));
                }
            }
            debug!("Found {} files under {}", files.len() - before, root.display());
        }

        files
    }

    /// Case-insensitive extension check against an allow-list (entries may carry a leading dot)
    pub fn matches_extension<S: AsRef<str>>(path: &Path, extensions: &[S]) -> bool {
        let Some(ext) = path.extension() else {
            return false;
        };
        let ext = ext.to_string_lossy();

        extensions.iter().any(|allowed| {
            let allowed = allowed.as_ref().trim().trim_start_matches('.');
            !allowed.is_empty() && ext.eq_ignore_ascii_case(allowed)
        })
    }

    /// Sibling path used for the pre-mutation copy: `photo.jpg` -> `photo.jpg.bak`
    pub fn backup_path(path: &Path) -> PathBuf {
        let mut name = path.file_name().unwrap_or_default().to_os_string();
        name.push(BACKUP_SUFFIX);
        path.with_file_name(name)
    }

    /// Get human-readable file size
    pub fn format_size(size: u64) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
        let mut size = size as f64;
        let mut unit_index = 0;

        while size >= 1024.0 && unit_index < UNITS.len() - 1 {
            size /= 1024.0;
            unit_index += 1;
        }

        format!("{:.2} {}", size, UNITS[unit_index])
    }

    /// Calculate percentage reduction
    pub fn calculate_reduction(original_size: u64, new_size: u64) -> f64 {
        if original_size == 0 {
            0.0
        } else {
            ((original_size as f64 - new_size as f64) / original_size as f64) * 100.0
        }
    }
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use tempfile::TempDir;

    const JPEG_EXTS: &[&str] = &["jpg", "jpeg"];

    fn names(files: &[PathBuf]) -> HashSet<String> {
        files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_find_files_filters_by_extension() {
        let dir = TempDir::new().unwrap();
        for name in ["a.jpg", "b.JPEG", "c.png", "d.txt"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }

        let files = FileManager::find_files(&[dir.path().to_path_buf()], JPEG_EXTS);

        let expected: HashSet<String> = ["a.jpg", "b.JPEG"].iter().map(|s| s.to_string()).collect();
        assert_eq!(names(&files), expected);
        assert!(files.iter().all(|p| p.is_absolute()));
    }

    #[test]
    fn test_find_files_recurses() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("2024").join("summer");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(nested.join("beach.jpg"), b"x").unwrap();
        std::fs::write(dir.path().join("top.jpeg"), b"x").unwrap();

        let files = FileManager::find_files(&[dir.path().to_path_buf()], JPEG_EXTS);
        assert_eq!(files.len(), 2);
    }

    #[test]
    fn test_missing_root_is_skipped() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.jpg"), b"x").unwrap();

        let roots = vec![dir.path().join("does-not-exist"), dir.path().to_path_buf()];
        let files = FileManager::find_files(&roots, JPEG_EXTS);
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_no_matches_is_empty() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"x").unwrap();

        assert!(FileManager::find_files(&[dir.path().to_path_buf()], JPEG_EXTS).is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_are_not_followed() {
        let dir = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        std::fs::write(outside.path().join("outside.jpg"), b"x").unwrap();
        std::fs::write(dir.path().join("inside.jpg"), b"x").unwrap();

        std::os::unix::fs::symlink(outside.path(), dir.path().join("linked-dir")).unwrap();
        std::os::unix::fs::symlink(
            outside.path().join("outside.jpg"),
            dir.path().join("linked.jpg"),
        )
        .unwrap();
        // Cycle back to the root
        std::os::unix::fs::symlink(dir.path(), dir.path().join("loop")).unwrap();

        let files = FileManager::find_files(&[dir.path().to_path_buf()], JPEG_EXTS);
        assert_eq!(names(&files), HashSet::from(["inside.jpg".to_string()]));
    }

    #[test]
    fn test_matches_extension() {
        assert!(FileManager::matches_extension(Path::new("x/IMG_01.JPG"), JPEG_EXTS));
        assert!(FileManager::matches_extension(Path::new("x/a.jpg"), &[".jpg"]));
        assert!(!FileManager::matches_extension(Path::new("x/a.jpg.bak"), JPEG_EXTS));
        assert!(!FileManager::matches_extension(Path::new("x/jpg"), JPEG_EXTS));
        assert!(!FileManager::matches_extension(Path::new("x/a.png"), JPEG_EXTS));
    }

    #[test]
    fn test_backup_path() {
        assert_eq!(
            FileManager::backup_path(Path::new("/photos/a.JPG")),
            PathBuf::from("/photos/a.JPG.bak")
        );
    }

    #[test]
    fn test_format_size() {
        assert_eq!(FileManager::format_size(0), "0.00 B");
        assert_eq!(FileManager::format_size(512), "512.00 B");
        assert_eq!(FileManager::format_size(1536), "1.50 KB");
        assert_eq!(FileManager::format_size(750 * 1024), "750.00 KB");
        assert_eq!(FileManager::format_size(5 * 1024 * 1024), "5.00 MB");
        assert_eq!(FileManager::format_size(3 * 1024u64.pow(3)), "3.00 GB");
        assert_eq!(FileManager::format_size(2048 * 1024u64.pow(4)), "2048.00 TB");
    }

    #[test]
    fn test_calculate_reduction() {
        assert_eq!(FileManager::calculate_reduction(0, 0), 0.0);
        assert_eq!(FileManager::calculate_reduction(200, 150), 25.0);
    }
}
