use chrono::Utc;
use slog::Drain;
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

/// Root logger writing to the terminal.
pub fn stdout_logger() -> slog::Logger {
    let decorator = slog_term::TermDecorator::new().build();
    let drain = slog_term::FullFormat::new(decorator).use_file_location().build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();

    slog::Logger::root(drain, slog::o!())
}

/// Root logger writing to both the terminal and a fresh timestamped file under `directory`.
/// Returns the logger and the path of the file it writes to.
pub fn stdout_and_file_logger(directory: &Path) -> Result<(slog::Logger, PathBuf), io::Error> {
    let (file_drain, log_path) = file_drain(directory)?;

    let decorator = slog_term::TermDecorator::new().build();
    let term_drain = slog_term::FullFormat::new(decorator).use_file_location().build().fuse();

    let drain = slog::Duplicate::new(term_drain, file_drain).fuse();
    let drain = slog_async::Async::new(drain).build().fuse();

    Ok((slog::Logger::root(drain, slog::o!()), log_path))
}

/// Logger that drops everything.
pub fn discard_logger() -> slog::Logger {
    slog::Logger::root(slog::Discard, slog::o!())
}

fn file_drain(
    directory: &Path,
) -> Result<(slog::Fuse<slog_term::FullFormat<slog_term::PlainSyncDecorator<fs::File>>>, PathBuf), io::Error> {
    fs::create_dir_all(directory)?;

    let now = Utc::now().format("%Y-%m-%dT%H-%M-%SZ");
    let log_path = directory.join(format!("{}_info.log", now));
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&log_path)?;

    let decorator = slog_term::PlainSyncDecorator::new(file);
    let drain = slog_term::FullFormat::new(decorator).build().fuse();

    Ok((drain, log_path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_logger_creates_directory_and_file() {
        let directory = std::env::temp_dir().join(format!("raft_kv_logging_{}", std::process::id()));
        let _ = fs::remove_dir_all(&directory);

        let (logger, log_path) = stdout_and_file_logger(&directory).unwrap();
        slog::info!(logger, "hello");
        drop(logger);

        assert!(log_path.starts_with(&directory));
        assert!(log_path.exists());

        let _ = fs::remove_dir_all(&directory);
    }
}
