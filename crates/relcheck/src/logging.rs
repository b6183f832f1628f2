#[cfg(debug_assertions)]
use simplelog::{ColorChoice, TermLogger, TerminalMode};
use simplelog::{CombinedLogger, ConfigBuilder, LevelFilter, SharedLogger, WriteLogger};
use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;

use relcheck_platform::AppPaths;

/// Each run appends to the same file, so the log is cut back to its most
/// recent lines before opening once it outgrows `max_log_size`.
fn open_log_file(log_path: &Path, max_log_size: u64) -> io::Result<File> {
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    if std::fs::metadata(log_path).is_ok_and(|metadata| metadata.len() > max_log_size) {
        let contents = std::fs::read(log_path)?;
        std::fs::write(log_path, recent_lines(&contents, max_log_size / 2))?;
    }
    OpenOptions::new().create(true).append(true).open(log_path)
}

/// The longest tail of `contents` that starts on a line boundary and fits in
/// `budget` bytes.
fn recent_lines(contents: &[u8], budget: u64) -> &[u8] {
    let budget = usize::try_from(budget).unwrap_or(usize::MAX);
    if contents.len() <= budget {
        return contents;
    }
    let cut = contents.len() - budget;
    match contents[cut..].iter().position(|&b| b == b'\n') {
        Some(pos) => &contents[cut + pos + 1..],
        None => &[],
    }
}

pub fn init_logging(paths: &AppPaths, debug_enabled: bool, max_log_size: u64) {
    let log_path = paths.log_file();

    let config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .add_filter_allow_str("relcheck")
        .build();

    let mut loggers: Vec<Box<dyn SharedLogger>> = Vec::new();

    #[cfg(debug_assertions)]
    loggers.push(TermLogger::new(
        LevelFilter::Debug,
        config.clone(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    ));

    match open_log_file(&log_path, max_log_size) {
        Ok(file) => loggers.push(WriteLogger::new(LevelFilter::Debug, config, file)),
        Err(error) => eprintln!("relcheck: cannot open {}: {error}", log_path.display()),
    }

    if !loggers.is_empty() {
        let _ = CombinedLogger::init(loggers);
    }

    set_logging_enabled(debug_enabled);
    log::debug!("Logging to {}", log_path.display());
}

/// Warnings and errors only, unless debug logging is on.
pub fn set_logging_enabled(enabled: bool) {
    if enabled {
        log::set_max_level(log::LevelFilter::Debug);
    } else {
        log::set_max_level(log::LevelFilter::Warn);
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use super::{open_log_file, recent_lines, set_logging_enabled};

    #[test]
    fn recent_lines_starts_on_a_line_boundary() {
        let contents = b"check-1\ncheck-2\ncheck-3\n";

        assert_eq!(recent_lines(contents, 12), b"check-3\n");
        assert_eq!(recent_lines(contents, 100), contents);
        assert_eq!(recent_lines(b"no newline at all", 4), b"");
    }

    #[test]
    fn oversized_log_is_cut_back_before_appending() {
        let temp_dir = tempfile::tempdir().expect("temporary directory should be created");
        let log_path = temp_dir.path().join("data").join("relcheck.log");
        std::fs::create_dir_all(log_path.parent().expect("log path has a parent"))
            .expect("data dir should be created");
        std::fs::write(&log_path, "check-1\ncheck-2\ncheck-3\ncheck-4\n")
            .expect("test log file should be written");

        let mut file = open_log_file(&log_path, 20).expect("log file should open");
        file.write_all(b"check-5\n").expect("append should succeed");
        drop(file);

        let contents = std::fs::read_to_string(&log_path).expect("log file should be readable");
        assert_eq!(contents, "check-4\ncheck-5\n");
    }

    #[test]
    fn small_log_is_appended_to() {
        let temp_dir = tempfile::tempdir().expect("temporary directory should be created");
        let log_path = temp_dir.path().join("relcheck.log");
        std::fs::write(&log_path, "check-1\n").expect("test log file should be written");

        let mut file = open_log_file(&log_path, 1024).expect("log file should open");
        file.write_all(b"check-2\n").expect("append should succeed");
        drop(file);

        let contents = std::fs::read_to_string(&log_path).expect("log file should be readable");
        assert_eq!(contents, "check-1\ncheck-2\n");
    }

    #[test]
    fn missing_data_dir_is_created() {
        let temp_dir = tempfile::tempdir().expect("temporary directory should be created");
        let log_path = temp_dir.path().join("nested").join("relcheck.log");

        open_log_file(&log_path, 1024).expect("log file should open");

        assert!(log_path.is_file());
    }

    #[test]
    fn set_logging_enabled_updates_global_level() {
        set_logging_enabled(true);
        assert_eq!(log::max_level(), log::LevelFilter::Debug);

        set_logging_enabled(false);
        assert_eq!(log::max_level(), log::LevelFilter::Warn);
    }
}
