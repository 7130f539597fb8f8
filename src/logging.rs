use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
    sync::{Mutex, OnceLock},
};

use chrono::Local;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DesktopLogCategory {
    Startup,
    Runtime,
    Update,
    Shutdown,
}

impl DesktopLogCategory {
    fn label(self) -> &'static str {
        match self {
            DesktopLogCategory::Startup => "startup",
            DesktopLogCategory::Runtime => "runtime",
            DesktopLogCategory::Update => "update",
            DesktopLogCategory::Shutdown => "shutdown",
        }
    }
}

pub(crate) fn resolve_desktop_log_path(app_root_dir: Option<PathBuf>, log_file: &str) -> PathBuf {
    match app_root_dir {
        Some(root) => root.join("logs").join(log_file),
        None => PathBuf::from(log_file),
    }
}

pub(crate) fn append_desktop_log(
    category: DesktopLogCategory,
    message: &str,
    app_root_dir: Option<PathBuf>,
    log_file: &str,
    max_bytes: u64,
    backup_count: usize,
    write_lock: &OnceLock<Mutex<()>>,
) {
    let log_path = resolve_desktop_log_path(app_root_dir, log_file);
    let lock = write_lock.get_or_init(|| Mutex::new(()));
    let _guard = match lock.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };

    if let Err(error) = append_log_line(&log_path, category, message, max_bytes, backup_count) {
        eprintln!("desktop log write failed: {error}");
    }
}

fn append_log_line(
    log_path: &Path,
    category: DesktopLogCategory,
    message: &str,
    max_bytes: u64,
    backup_count: usize,
) -> Result<(), String> {
    if let Some(parent_dir) = log_path.parent() {
        if !parent_dir.as_os_str().is_empty() {
            fs::create_dir_all(parent_dir).map_err(|error| {
                format!(
                    "Failed to create log directory {}: {}",
                    parent_dir.display(),
                    error
                )
            })?;
        }
    }

    rotate_if_needed(log_path, max_bytes, backup_count)?;

    let line = format!(
        "[{}] [{}] {}\n",
        Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
        category.label(),
        message
    );
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .map_err(|error| format!("Failed to open log file {}: {}", log_path.display(), error))?;
    file.write_all(line.as_bytes())
        .map_err(|error| format!("Failed to write log file {}: {}", log_path.display(), error))
}

fn backup_path(log_path: &Path, index: usize) -> PathBuf {
    let mut backup = log_path.as_os_str().to_os_string();
    backup.push(format!(".{index}"));
    PathBuf::from(backup)
}

fn rotate_if_needed(log_path: &Path, max_bytes: u64, backup_count: usize) -> Result<(), String> {
    let current_size = match fs::metadata(log_path) {
        Ok(metadata) => metadata.len(),
        Err(_) => return Ok(()),
    };
    if current_size < max_bytes {
        return Ok(());
    }

    if backup_count == 0 {
        return fs::remove_file(log_path).map_err(|error| {
            format!(
                "Failed to truncate log file {}: {}",
                log_path.display(),
                error
            )
        });
    }

    let oldest = backup_path(log_path, backup_count);
    if oldest.exists() {
        fs::remove_file(&oldest).map_err(|error| {
            format!("Failed to remove log backup {}: {}", oldest.display(), error)
        })?;
    }
    for index in (1..backup_count).rev() {
        let source = backup_path(log_path, index);
        if source.exists() {
            let target = backup_path(log_path, index + 1);
            fs::rename(&source, &target).map_err(|error| {
                format!("Failed to rotate log backup {}: {}", source.display(), error)
            })?;
        }
    }
    fs::rename(log_path, backup_path(log_path, 1))
        .map_err(|error| format!("Failed to rotate log file {}: {}", log_path.display(), error))
}

#[cfg(test)]
mod tests {
    use std::sync::{Mutex, OnceLock};

    use super::*;

    #[test]
    fn resolve_desktop_log_path_prefers_app_root() {
        let path = resolve_desktop_log_path(Some(PathBuf::from("/tmp/echochat")), "desktop.log");
        assert_eq!(path, PathBuf::from("/tmp/echochat/logs/desktop.log"));
        assert_eq!(
            resolve_desktop_log_path(None, "desktop.log"),
            PathBuf::from("desktop.log")
        );
    }

    #[test]
    fn append_desktop_log_writes_categorized_line() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let lock: OnceLock<Mutex<()>> = OnceLock::new();

        append_desktop_log(
            DesktopLogCategory::Update,
            "update check failed",
            Some(temp_dir.path().to_path_buf()),
            "desktop.log",
            1024 * 1024,
            2,
            &lock,
        );

        let written = fs::read_to_string(temp_dir.path().join("logs").join("desktop.log"))
            .expect("log file should exist");
        assert!(written.contains("[update] update check failed"));
        assert!(written.ends_with('\n'));
    }

    #[test]
    fn rotation_shifts_backups_and_starts_a_fresh_file() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let log_path = temp_dir.path().join("desktop.log");
        fs::write(&log_path, "old contents that exceed the limit").expect("seed log");

        rotate_if_needed(&log_path, 8, 2).expect("rotation");
        assert!(!log_path.exists());
        assert!(backup_path(&log_path, 1).exists());

        fs::write(&log_path, "second generation of contents").expect("seed log");
        rotate_if_needed(&log_path, 8, 2).expect("rotation");
        assert_eq!(
            fs::read_to_string(backup_path(&log_path, 2)).expect("oldest backup"),
            "old contents that exceed the limit"
        );
        assert_eq!(
            fs::read_to_string(backup_path(&log_path, 1)).expect("newest backup"),
            "second generation of contents"
        );
    }

    #[test]
    fn rotation_leaves_small_files_alone() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let log_path = temp_dir.path().join("desktop.log");
        fs::write(&log_path, "tiny").expect("seed log");

        rotate_if_needed(&log_path, 1024, 2).expect("rotation");
        assert!(log_path.exists());
        assert!(!backup_path(&log_path, 1).exists());
    }
}
