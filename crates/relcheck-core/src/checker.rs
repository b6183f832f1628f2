use std::sync::Arc;

use chrono::{TimeDelta, Utc};
use log::{debug, error, info};

use crate::build_info::BuildInfo;
use crate::dispatch::{Background, Foreground, UiCommand};
use crate::error::CheckError;
use crate::fetch::ReleaseFeed;
use crate::lock::CheckLock;
use crate::manifest::UpdateDescription;
use crate::options::OptionsStore;

const NEXT_CHECK_DELAY_SECS: i64 = 60 * 60;

pub const DEFAULT_APP_NAME: &str = "relcheck";

#[derive(Debug)]
pub enum CheckOutcome {
    /// Automatic checks are switched off.
    Disabled,
    /// The next automatic check is not due yet.
    NotDue,
    /// Another check holds the lock; this request was dropped.
    AlreadyRunning,
    Completed(Vec<UpdateDescription>),
    Failed(CheckError),
}

impl CheckOutcome {
    /// Whether the check reached the network.
    #[must_use]
    pub fn attempted(&self) -> bool {
        matches!(self, Self::Completed(_) | Self::Failed(_))
    }
}

#[must_use]
pub fn result_headline(app_name: &str, update_count: usize) -> String {
    match update_count {
        0 => format!("There are no updates to {app_name}."),
        1 => format!("An update to {app_name} was found."),
        _ => format!("Several possible updates to {app_name} were found."),
    }
}

#[must_use]
pub fn error_message(app_name: &str, error: &CheckError) -> String {
    format!(
        "There was an error checking for updates to {app_name}:\n{error}\n\n\
         If other applications can access the Internet fine, this is probably a \
         temporary server problem on our end."
    )
}

#[must_use]
pub fn unknown_error_message(app_name: &str) -> String {
    format!("An unknown error occurred while checking for updates to {app_name}.")
}

struct Inner {
    feed: Arc<dyn ReleaseFeed>,
    options: Arc<dyn OptionsStore>,
    lock: CheckLock,
    build: BuildInfo,
    app_name: String,
    foreground: Foreground,
    background: Background,
}

/// Coordinates update checks: decides whether a check should run, keeps
/// checks from overlapping, reports results to the UI and schedules the next
/// automatic check.
#[derive(Clone)]
pub struct VersionChecker {
    inner: Arc<Inner>,
}

impl VersionChecker {
    pub fn new(
        feed: Arc<dyn ReleaseFeed>,
        options: Arc<dyn OptionsStore>,
        foreground: Foreground,
        background: Background,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                feed,
                options,
                lock: CheckLock::new(),
                build: BuildInfo::current(),
                app_name: DEFAULT_APP_NAME.to_string(),
                foreground,
                background,
            }),
        }
    }

    #[must_use]
    pub fn with_lock(self, lock: CheckLock) -> Self {
        self.map_inner(|inner| inner.lock = lock)
    }

    #[must_use]
    pub fn with_build(self, build: BuildInfo) -> Self {
        self.map_inner(|inner| inner.build = build)
    }

    #[must_use]
    pub fn with_app_name(self, app_name: impl Into<String>) -> Self {
        let app_name = app_name.into();
        self.map_inner(|inner| inner.app_name = app_name)
    }

    fn map_inner(self, apply: impl FnOnce(&mut Inner)) -> Self {
        let mut inner = match Arc::try_unwrap(self.inner) {
            Ok(inner) => inner,
            Err(shared) => Inner {
                feed: Arc::clone(&shared.feed),
                options: Arc::clone(&shared.options),
                lock: shared.lock.clone(),
                build: shared.build,
                app_name: shared.app_name.clone(),
                foreground: shared.foreground.clone(),
                background: shared.background.clone(),
            },
        };
        apply(&mut inner);
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Start a check on the background context and return immediately.
    ///
    /// `interactive` checks were requested by the user: they always end in a
    /// dialog, including "no updates" and error reports. Automatic checks
    /// only surface a dialog when updates were found.
    pub fn perform_check(&self, interactive: bool) {
        let inner = Arc::clone(&self.inner);
        self.inner.background.spawn(async move {
            let attempt = inner.background.spawn({
                let inner = Arc::clone(&inner);
                async move { inner.run_check(interactive).await }
            });
            match attempt.await {
                Ok(outcome) => debug!("Update check finished: {outcome:?}"),
                Err(join_error) => {
                    error!("Update check aborted: {join_error}");
                    if interactive {
                        inner
                            .foreground
                            .post(UiCommand::ShowError(unknown_error_message(&inner.app_name)));
                    }
                    inner.schedule_next_check();
                }
            }
        });
    }

    /// Run a check on the current task and report what happened.
    pub async fn run_check(&self, interactive: bool) -> CheckOutcome {
        self.inner.run_check(interactive).await
    }
}

impl Inner {
    async fn run_check(&self, interactive: bool) -> CheckOutcome {
        if !interactive {
            if !self.options.auto_check_enabled() {
                return CheckOutcome::Disabled;
            }
            if self.options.next_check() > Utc::now() {
                return CheckOutcome::NotDue;
            }
        }

        let Some(guard) = self.lock.try_acquire() else {
            debug!("Update check already in progress, dropping request");
            return CheckOutcome::AlreadyRunning;
        };

        let result = self.feed.fetch_updates(self.build.revision).await;
        drop(guard);

        // Posted ahead of any dialog so that a "remind me later" chosen in
        // that dialog is not overwritten by this hourly reschedule.
        self.schedule_next_check();

        match result {
            Ok(updates) => {
                info!(
                    "Update check found {} release(s) newer than revision {}",
                    updates.len(),
                    self.build.revision
                );
                if interactive || !updates.is_empty() {
                    self.foreground.post(UiCommand::ShowResult {
                        headline: result_headline(&self.app_name, updates.len()),
                        updates: updates.clone(),
                    });
                }
                CheckOutcome::Completed(updates)
            }
            Err(error) => {
                if interactive {
                    self.foreground
                        .post(UiCommand::ShowError(error_message(&self.app_name, &error)));
                } else {
                    debug!("Automatic update check failed: {error}");
                }
                CheckOutcome::Failed(error)
            }
        }
    }

    fn schedule_next_check(&self) {
        let at = Utc::now() + TimeDelta::seconds(NEXT_CHECK_DELAY_SECS);
        self.foreground.post(UiCommand::ScheduleNextCheck(at));
    }
}
