//! Tracing subscriber setup.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Mutex;

use tracing::warn;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Log to stdout, and additionally to `log_file` (appending, no colours)
/// when given. Filtering follows `RUST_LOG` with an `info` floor.
pub fn init_logging(log_file: Option<&str>) {
    let filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    let (file, file_error) = match log_file.map(open_log_file) {
        Some(Ok(file)) => (Some(file), None),
        Some(Err(e)) => (None, Some(e)),
        None => (None, None),
    };
    let file_layer = file.map(|file| fmt::layer().with_ansi(false).with_writer(Mutex::new(file)));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .init();

    if let (Some(path), Some(e)) = (log_file, file_error) {
        warn!("Could not open log file {}: {}; logging to stdout only", path, e);
    }
}

/// Open `path` for appending, creating it and its parent directory.
fn open_log_file(path: &str) -> io::Result<File> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    OpenOptions::new().create(true).append(true).open(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_open_log_file_creates_parent_and_appends() {
        let dir = std::env::temp_dir().join(format!("guildgate-log-{}", std::process::id()));
        let path = dir.join("nested").join("bot.log");
        let path_str = path.to_str().unwrap();

        writeln!(open_log_file(path_str).unwrap(), "first").unwrap();
        writeln!(open_log_file(path_str).unwrap(), "second").unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "first\nsecond\n");
        fs::remove_dir_all(&dir).unwrap();
    }
}
