//! Result dialog model.
//!
//! The dialog is a small state machine: it starts `Open` and every way of
//! dismissing it (the Close button, "remind me later", the window manager or
//! escape) goes through [`ResultDialog::exit`], the only transition that
//! persists the auto-check checkbox. A closed dialog ignores further events.

use chrono::{DateTime, TimeDelta, Utc};
use log::debug;

use crate::manifest::UpdateDescription;
use crate::options::OptionsStore;

pub const DIALOG_TITLE: &str = "Version Checker";
pub const AUTO_CHECK_LABEL: &str = "Auto Check for Updates";
pub const REMIND_LATER_LABEL: &str = "Remind me again in a week";
pub const CLOSE_LABEL: &str = "Close";

/// Preferred wrap width for headline and body text, in pixels.
pub const CONTROLS_WIDTH: u32 = 500;

const REMIND_LATER_SECS: i64 = 7 * 24 * 60 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    CloseButton,
    RemindLater,
    WindowClosed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DialogState {
    Open,
    Closed(CloseReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogEvent {
    ToggleAutoCheck,
    Close,
    RemindLater,
    WindowClosed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogElement {
    Headline(String),
    Separator,
    UpdateTitle(String),
    UpdateBody(String),
    Link(String),
    AutoCheck {
        label: &'static str,
        checked: bool,
    },
    Buttons {
        close: &'static str,
        remind_later: Option<&'static str>,
    },
}

/// Toolkit adapter that draws a dialog and reports user input.
pub trait DialogRenderer {
    fn render(&mut self, title: &str, elements: &[DialogElement]);

    /// Block until the user does something. Implementations map "input went
    /// away" (window destroyed, stdin closed) to [`DialogEvent::WindowClosed`].
    fn next_event(&mut self) -> DialogEvent;
}

#[derive(Debug)]
pub struct ResultDialog {
    headline: String,
    updates: Vec<UpdateDescription>,
    auto_check: bool,
    state: DialogState,
}

impl ResultDialog {
    pub fn new(
        headline: impl Into<String>,
        updates: Vec<UpdateDescription>,
        options: &dyn OptionsStore,
    ) -> Self {
        Self {
            headline: headline.into(),
            updates,
            auto_check: options.auto_check_enabled(),
            state: DialogState::Open,
        }
    }

    #[must_use]
    pub fn title(&self) -> &'static str {
        DIALOG_TITLE
    }

    #[must_use]
    pub fn headline(&self) -> &str {
        &self.headline
    }

    #[must_use]
    pub fn updates(&self) -> &[UpdateDescription] {
        &self.updates
    }

    #[must_use]
    pub fn auto_check(&self) -> bool {
        self.auto_check
    }

    #[must_use]
    pub fn offers_remind_later(&self) -> bool {
        !self.updates.is_empty()
    }

    /// The dialog never holds up application shutdown.
    #[must_use]
    pub fn prevents_app_exit(&self) -> bool {
        false
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state == DialogState::Open
    }

    #[must_use]
    pub fn close_reason(&self) -> Option<CloseReason> {
        match self.state {
            DialogState::Open => None,
            DialogState::Closed(reason) => Some(reason),
        }
    }

    #[must_use]
    pub fn elements(&self) -> Vec<DialogElement> {
        let mut elements = vec![DialogElement::Headline(self.headline.clone())];

        for update in &self.updates {
            elements.push(DialogElement::Separator);
            elements.push(DialogElement::UpdateTitle(update.title.clone()));
            elements.push(DialogElement::UpdateBody(update.body.clone()));
            elements.push(DialogElement::Link(update.url.clone()));
        }

        if !self.updates.is_empty() {
            elements.push(DialogElement::Separator);
        }
        elements.push(DialogElement::AutoCheck {
            label: AUTO_CHECK_LABEL,
            checked: self.auto_check,
        });
        elements.push(DialogElement::Buttons {
            close: CLOSE_LABEL,
            remind_later: self.offers_remind_later().then_some(REMIND_LATER_LABEL),
        });
        elements
    }

    pub fn set_auto_check(&mut self, checked: bool) {
        if self.is_open() {
            self.auto_check = checked;
        }
    }

    pub fn toggle_auto_check(&mut self) {
        self.set_auto_check(!self.auto_check);
    }

    pub fn close(&mut self, options: &dyn OptionsStore) {
        self.exit(CloseReason::CloseButton, options);
    }

    pub fn window_closed(&mut self, options: &dyn OptionsStore) {
        self.exit(CloseReason::WindowClosed, options);
    }

    /// Postpone the next automatic check by a week, then close.
    pub fn remind_later(&mut self, options: &dyn OptionsStore, now: DateTime<Utc>) {
        if !self.is_open() || !self.offers_remind_later() {
            return;
        }
        options.set_next_check(now + TimeDelta::seconds(REMIND_LATER_SECS));
        self.exit(CloseReason::RemindLater, options);
    }

    /// Apply one user event. Returns `true` while the dialog stays open.
    pub fn handle(
        &mut self,
        event: DialogEvent,
        options: &dyn OptionsStore,
        now: DateTime<Utc>,
    ) -> bool {
        match event {
            DialogEvent::ToggleAutoCheck => self.toggle_auto_check(),
            DialogEvent::Close => self.close(options),
            DialogEvent::RemindLater => self.remind_later(options, now),
            DialogEvent::WindowClosed => self.window_closed(options),
        }
        self.is_open()
    }

    fn exit(&mut self, reason: CloseReason, options: &dyn OptionsStore) {
        if !self.is_open() {
            return;
        }
        options.set_auto_check_enabled(self.auto_check);
        self.state = DialogState::Closed(reason);
        debug!("Version check dialog closed ({reason:?})");
    }
}

/// Drive `dialog` through `renderer` until it closes.
pub fn run_dialog<R>(
    dialog: &mut ResultDialog,
    renderer: &mut R,
    options: &dyn OptionsStore,
) -> CloseReason
where
    R: DialogRenderer + ?Sized,
{
    loop {
        if let Some(reason) = dialog.close_reason() {
            return reason;
        }
        renderer.render(dialog.title(), &dialog.elements());
        let event = renderer.next_event();
        dialog.handle(event, options, Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use chrono::{DateTime, TimeDelta, Utc};

    use super::{
        CloseReason, DialogElement, DialogEvent, DialogRenderer, REMIND_LATER_LABEL,
        ResultDialog, run_dialog,
    };
    use crate::manifest::UpdateDescription;
    use crate::options::{MemoryOptions, OptionsStore};

    fn update(title: &str) -> UpdateDescription {
        UpdateDescription {
            url: format!("https://example.org/{title}"),
            title: title.to_string(),
            body: format!("{title} notes"),
        }
    }

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).expect("timestamp should be valid")
    }

    struct ScriptedRenderer {
        events: VecDeque<DialogEvent>,
        frames: Vec<Vec<DialogElement>>,
    }

    impl ScriptedRenderer {
        fn new(events: &[DialogEvent]) -> Self {
            Self {
                events: events.iter().copied().collect(),
                frames: Vec::new(),
            }
        }
    }

    impl DialogRenderer for ScriptedRenderer {
        fn render(&mut self, _title: &str, elements: &[DialogElement]) {
            self.frames.push(elements.to_vec());
        }

        fn next_event(&mut self) -> DialogEvent {
            self.events.pop_front().unwrap_or(DialogEvent::WindowClosed)
        }
    }

    #[test]
    fn checkbox_is_seeded_from_options() {
        let options = MemoryOptions::new(false, now());
        let dialog = ResultDialog::new("headline", vec![], &options);

        assert!(!dialog.auto_check());
        assert!(!dialog.prevents_app_exit());
    }

    #[test]
    fn layout_lists_each_update_then_checkbox_and_buttons() {
        let options = MemoryOptions::default();
        let dialog = ResultDialog::new("Found", vec![update("a"), update("b")], &options);

        assert_eq!(
            dialog.elements(),
            vec![
                DialogElement::Headline("Found".to_string()),
                DialogElement::Separator,
                DialogElement::UpdateTitle("a".to_string()),
                DialogElement::UpdateBody("a notes".to_string()),
                DialogElement::Link("https://example.org/a".to_string()),
                DialogElement::Separator,
                DialogElement::UpdateTitle("b".to_string()),
                DialogElement::UpdateBody("b notes".to_string()),
                DialogElement::Link("https://example.org/b".to_string()),
                DialogElement::Separator,
                DialogElement::AutoCheck {
                    label: "Auto Check for Updates",
                    checked: true,
                },
                DialogElement::Buttons {
                    close: "Close",
                    remind_later: Some(REMIND_LATER_LABEL),
                },
            ]
        );
    }

    #[test]
    fn empty_dialog_has_no_remind_later_button() {
        let options = MemoryOptions::default();
        let dialog = ResultDialog::new("There are no updates", vec![], &options);

        assert_eq!(
            dialog.elements(),
            vec![
                DialogElement::Headline("There are no updates".to_string()),
                DialogElement::AutoCheck {
                    label: "Auto Check for Updates",
                    checked: true,
                },
                DialogElement::Buttons {
                    close: "Close",
                    remind_later: None,
                },
            ]
        );
    }

    #[test]
    fn remind_later_postpones_a_week_and_persists_checkbox() {
        let options = MemoryOptions::default();
        let mut dialog = ResultDialog::new("Found", vec![update("a")], &options);
        dialog.toggle_auto_check();

        dialog.remind_later(&options, now());

        assert_eq!(options.next_check(), now() + TimeDelta::seconds(604_800));
        assert_eq!(dialog.close_reason(), Some(CloseReason::RemindLater));
        assert!(!options.auto_check_enabled());
        assert_eq!(options.auto_check_writes(), 1);
    }

    #[test]
    fn remind_later_delay_does_not_depend_on_update_count() {
        for count in [1, 3] {
            let options = MemoryOptions::default();
            let updates = (0..count).map(|i| update(&i.to_string())).collect();
            let mut dialog = ResultDialog::new("Found", updates, &options);

            dialog.remind_later(&options, now());

            assert_eq!(options.next_check(), now() + TimeDelta::days(7));
        }
    }

    #[test]
    fn remind_later_is_ignored_without_updates() {
        let options = MemoryOptions::default();
        let mut dialog = ResultDialog::new("error", vec![], &options);

        assert!(dialog.handle(DialogEvent::RemindLater, &options, now()));
        assert_eq!(options.next_check_writes(), 0);
        assert!(dialog.is_open());
    }

    #[test]
    fn every_close_path_writes_checkbox_exactly_once() {
        let paths = [
            DialogEvent::Close,
            DialogEvent::RemindLater,
            DialogEvent::WindowClosed,
        ];
        for path in paths {
            let options = MemoryOptions::new(true, now());
            let mut dialog = ResultDialog::new("Found", vec![update("a")], &options);
            dialog.set_auto_check(false);

            assert!(!dialog.handle(path, &options, now()));
            dialog.handle(DialogEvent::Close, &options, now());
            dialog.handle(DialogEvent::WindowClosed, &options, now());
            dialog.handle(DialogEvent::ToggleAutoCheck, &options, now());

            assert_eq!(options.auto_check_writes(), 1, "path {path:?}");
            assert!(!options.auto_check_enabled(), "path {path:?}");
            assert!(!dialog.auto_check(), "path {path:?}");
        }
    }

    #[test]
    fn run_dialog_renders_until_closed() {
        let options = MemoryOptions::new(true, now());
        let mut dialog = ResultDialog::new("Found", vec![update("a")], &options);
        let mut renderer =
            ScriptedRenderer::new(&[DialogEvent::ToggleAutoCheck, DialogEvent::Close]);

        let reason = run_dialog(&mut dialog, &mut renderer, &options);

        assert_eq!(reason, CloseReason::CloseButton);
        assert_eq!(renderer.frames.len(), 2);
        assert!(renderer.frames[1].contains(&DialogElement::AutoCheck {
            label: "Auto Check for Updates",
            checked: false,
        }));
        assert!(!options.auto_check_enabled());
    }

    #[test]
    fn run_dialog_treats_lost_input_as_window_close() {
        let options = MemoryOptions::default();
        let mut dialog = ResultDialog::new("headline", vec![], &options);
        let mut renderer = ScriptedRenderer::new(&[]);

        assert_eq!(
            run_dialog(&mut dialog, &mut renderer, &options),
            CloseReason::WindowClosed
        );
        assert_eq!(options.auto_check_writes(), 1);
    }
}
