use std::sync::mpsc;
use std::thread::JoinHandle;
use std::time::Duration;

use relcheck_platform::AppPaths;

use crate::settings::AppSettings;

const SETTINGS_SAVE_DEBOUNCE: Duration = Duration::from_millis(250);

/// Background writer that coalesces bursts of settings changes into one save.
pub struct SettingsSaver {
    sender: mpsc::Sender<AppSettings>,
    worker: JoinHandle<()>,
}

impl SettingsSaver {
    pub fn spawn(paths: AppPaths) -> Self {
        let (sender, receiver) = mpsc::channel::<AppSettings>();
        let worker = std::thread::spawn(move || {
            while let Ok(mut latest) = receiver.recv() {
                loop {
                    match receiver.recv_timeout(SETTINGS_SAVE_DEBOUNCE) {
                        Ok(next) => latest = next,
                        Err(mpsc::RecvTimeoutError::Timeout) => {
                            save(&latest, &paths);
                            break;
                        }
                        Err(mpsc::RecvTimeoutError::Disconnected) => {
                            save(&latest, &paths);
                            return;
                        }
                    }
                }
            }
        });
        Self { sender, worker }
    }

    pub fn enqueue(&self, settings: AppSettings) {
        let _ = self.sender.send(settings);
    }

    /// Close the queue and wait for the final write.
    pub fn finish(self) {
        drop(self.sender);
        if self.worker.join().is_err() {
            log::error!("Settings save thread panicked");
        }
    }
}

fn save(settings: &AppSettings, paths: &AppPaths) {
    if let Err(error) = settings.save(paths) {
        log::error!("Failed to save settings: {error}");
    }
}

#[cfg(test)]
mod tests {
    use relcheck_platform::AppPaths;

    use super::SettingsSaver;
    use crate::settings::AppSettings;

    #[test]
    fn burst_of_changes_ends_with_latest_value_on_disk() {
        let temp_dir = tempfile::tempdir().expect("temporary directory should be created");
        let paths = AppPaths::rooted_at(temp_dir.path());
        let saver = SettingsSaver::spawn(paths.clone());

        for next_check in 1..=20 {
            saver.enqueue(AppSettings {
                next_check,
                ..AppSettings::default()
            });
        }
        saver.finish();

        assert_eq!(AppSettings::load(&paths).next_check, 20);
    }

    #[test]
    fn finish_without_changes_writes_nothing() {
        let temp_dir = tempfile::tempdir().expect("temporary directory should be created");
        let paths = AppPaths::rooted_at(temp_dir.path());

        SettingsSaver::spawn(paths.clone()).finish();

        assert!(!paths.settings_file().exists());
    }
}
