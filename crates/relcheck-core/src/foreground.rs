use std::sync::Arc;

use crossbeam_channel::Receiver;
use log::debug;

use crate::dialog::{CloseReason, DialogRenderer, ResultDialog, run_dialog};
use crate::dispatch::UiCommand;
use crate::manifest::UpdateDescription;
use crate::options::OptionsStore;

/// Executes [`UiCommand`]s on the UI-owning thread.
pub struct ForegroundLoop<F> {
    receiver: Receiver<UiCommand>,
    options: Arc<dyn OptionsStore>,
    renderer_factory: F,
}

impl<F, R> ForegroundLoop<F>
where
    F: FnMut() -> R,
    R: DialogRenderer,
{
    pub fn new(
        receiver: Receiver<UiCommand>,
        options: Arc<dyn OptionsStore>,
        renderer_factory: F,
    ) -> Self {
        Self {
            receiver,
            options,
            renderer_factory,
        }
    }

    /// Apply one command. Returns how the dialog was closed when the command
    /// opened one.
    pub fn apply(&mut self, command: UiCommand) -> Option<CloseReason> {
        match command {
            UiCommand::ShowResult { headline, updates } => Some(self.show(headline, updates)),
            UiCommand::ShowError(message) => Some(self.show(message, Vec::new())),
            UiCommand::ScheduleNextCheck(at) => {
                debug!("Next automatic update check at {at}");
                self.options.set_next_check(at);
                None
            }
        }
    }

    /// Process commands until every sender is gone. Returns the number of
    /// dialogs shown.
    pub fn run(&mut self) -> usize {
        let mut dialogs = 0;
        while let Ok(command) = self.receiver.recv() {
            if self.apply(command).is_some() {
                dialogs += 1;
            }
        }
        dialogs
    }

    /// Apply whatever is queued right now without waiting.
    pub fn run_pending(&mut self) -> usize {
        let pending: Vec<UiCommand> = self.receiver.try_iter().collect();
        pending
            .into_iter()
            .filter_map(|command| self.apply(command))
            .count()
    }

    fn show(&mut self, headline: String, updates: Vec<UpdateDescription>) -> CloseReason {
        let mut dialog = ResultDialog::new(headline, updates, self.options.as_ref());
        let mut renderer = (self.renderer_factory)();
        let reason = run_dialog(&mut dialog, &mut renderer, self.options.as_ref());
        debug!("Update dialog finished ({reason:?})");
        reason
    }
}
