mod logging;
mod settings;
mod settings_save;
mod terminal;

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use log::{error, info, warn};

use relcheck_core::{
    Background, BuildInfo, ForegroundLoop, HttpReleaseFeed, VersionChecker, foreground_queue,
};
use relcheck_platform::AppPaths;

use crate::settings::{AppSettings, SettingsStore};
use crate::terminal::TerminalRenderer;

/// Check for newer releases and report them.
#[derive(Debug, Parser)]
#[command(name = "relcheck", version)]
struct Cli {
    /// Check now and always show the result, ignoring the automatic check
    /// setting and schedule.
    #[arg(short, long)]
    interactive: bool,

    /// Log debug output for this run.
    #[arg(long)]
    debug: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let paths = match AppPaths::new() {
        Ok(paths) => Some(paths),
        Err(error) => {
            eprintln!("relcheck: {error}; settings will not be saved");
            None
        }
    };

    let settings = paths.as_ref().map(AppSettings::load).unwrap_or_default();
    if let Some(paths) = &paths {
        logging::init_logging(
            paths,
            settings.debug_logging || cli.debug,
            settings.max_log_size_bytes,
        );
    }

    let build = BuildInfo::current();
    info!(
        "relcheck {} (revision {}) starting, interactive={}",
        build.version, build.revision, cli.interactive
    );

    let store = Arc::new(SettingsStore::new(settings, paths));

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(error) => {
            error!("Failed to start async runtime: {error}");
            eprintln!("relcheck: failed to start async runtime: {error}");
            return ExitCode::FAILURE;
        }
    };

    let (foreground, receiver) = foreground_queue();
    {
        let checker = VersionChecker::new(
            Arc::new(HttpReleaseFeed::with_defaults()),
            store.clone(),
            foreground,
            Background::new(runtime.handle().clone()),
        )
        .with_build(build);
        checker.perform_check(cli.interactive);
    }

    // Returns once the check task has finished and released its queue handle.
    let dialogs = ForegroundLoop::new(receiver, store.clone(), TerminalRenderer::stdio).run();
    if dialogs == 0 && cli.interactive {
        warn!("Interactive check finished without a dialog");
    }

    drop(runtime);
    store.flush();
    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::Cli;

    #[test]
    fn defaults_to_automatic_check() {
        let cli = Cli::try_parse_from(["relcheck"]).expect("no arguments should parse");
        assert!(!cli.interactive);
        assert!(!cli.debug);
    }

    #[test]
    fn accepts_short_interactive_flag() {
        let cli = Cli::try_parse_from(["relcheck", "-i", "--debug"]).expect("flags should parse");
        assert!(cli.interactive);
        assert!(cli.debug);
    }
}
