//! Terminal rendering of the version check dialog.

use std::io::{self, BufRead, Write};

use log::warn;
use relcheck_core::dialog::CONTROLS_WIDTH;
use relcheck_core::{DialogElement, DialogEvent, DialogRenderer};

const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Roughly [`CONTROLS_WIDTH`] pixels of text at a typical terminal cell width.
const WRAP_COLUMNS: usize = CONTROLS_WIDTH as usize / 7;

pub struct TerminalRenderer<I, O> {
    input: I,
    output: O,
    links: Vec<String>,
    remind_later: Option<&'static str>,
    close: &'static str,
    open_link: fn(&str) -> io::Result<()>,
}

impl TerminalRenderer<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<I: BufRead, O: Write> TerminalRenderer<I, O> {
    pub fn new(input: I, output: O) -> Self {
        Self {
            input,
            output,
            links: Vec::new(),
            remind_later: None,
            close: "Close",
            open_link: |url| open::that(url),
        }
    }

    #[cfg(test)]
    fn with_link_opener(mut self, open_link: fn(&str) -> io::Result<()>) -> Self {
        self.open_link = open_link;
        self
    }

    fn draw(&mut self, title: &str, elements: &[DialogElement]) -> io::Result<()> {
        self.links.clear();
        let out = &mut self.output;
        writeln!(out)?;
        writeln!(out, "{BOLD}{title}{RESET}")?;
        writeln!(out, "{}", "=".repeat(title.chars().count()))?;

        for element in elements {
            match element {
                DialogElement::Headline(text) => {
                    for line in wrap(text, WRAP_COLUMNS) {
                        writeln!(out, "{line}")?;
                    }
                }
                DialogElement::Separator => writeln!(out, "{}", "-".repeat(WRAP_COLUMNS))?,
                DialogElement::UpdateTitle(title) => writeln!(out, "{BOLD}{title}{RESET}")?,
                DialogElement::UpdateBody(body) => {
                    for line in wrap(body, WRAP_COLUMNS - 2) {
                        writeln!(out, "  {line}")?;
                    }
                }
                DialogElement::Link(url) => {
                    self.links.push(url.clone());
                    writeln!(out, "  [{}] {url}", self.links.len())?;
                }
                DialogElement::AutoCheck { label, checked } => {
                    let mark = if *checked { 'x' } else { ' ' };
                    writeln!(out, "[{mark}] {label}")?;
                }
                DialogElement::Buttons {
                    close,
                    remind_later,
                } => {
                    self.close = close;
                    self.remind_later = *remind_later;
                }
            }
        }
        out.flush()
    }

    fn prompt(&mut self) -> io::Result<()> {
        let mut choices = vec![format!("[Enter] {}", self.close), "[a] Toggle auto check".to_string()];
        if let Some(label) = self.remind_later {
            choices.push(format!("[r] {label}"));
        }
        if !self.links.is_empty() {
            choices.push("[o N] Open link N".to_string());
        }
        write!(self.output, "{} > ", choices.join("  "))?;
        self.output.flush()
    }

    fn read_event(&mut self) -> io::Result<DialogEvent> {
        loop {
            self.prompt()?;
            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                return Ok(DialogEvent::WindowClosed);
            }
            match parse_choice(&line) {
                Choice::Event(event) => return Ok(event),
                Choice::OpenLink(index) => match index
                    .checked_sub(1)
                    .and_then(|index| self.links.get(index))
                {
                    Some(url) => {
                        if let Err(error) = (self.open_link)(url) {
                            warn!("Failed to open {url}: {error}");
                            writeln!(self.output, "Could not open {url}: {error}")?;
                        }
                    }
                    None => writeln!(self.output, "There is no link {index}.")?,
                },
                Choice::Unknown => writeln!(self.output, "Unrecognized choice.")?,
            }
        }
    }
}

impl<I: BufRead, O: Write> DialogRenderer for TerminalRenderer<I, O> {
    fn render(&mut self, title: &str, elements: &[DialogElement]) {
        if let Err(error) = self.draw(title, elements) {
            warn!("Failed to draw update dialog: {error}");
        }
    }

    fn next_event(&mut self) -> DialogEvent {
        self.read_event().unwrap_or_else(|error| {
            warn!("Lost dialog input: {error}");
            DialogEvent::WindowClosed
        })
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Choice {
    Event(DialogEvent),
    OpenLink(usize),
    Unknown,
}

fn parse_choice(line: &str) -> Choice {
    let choice = line.trim().to_ascii_lowercase();
    match choice.as_str() {
        // Enter and escape both map to Close.
        "" | "c" | "close" | "q" | "esc" | "\u{1b}" => Choice::Event(DialogEvent::Close),
        "a" | "auto" => Choice::Event(DialogEvent::ToggleAutoCheck),
        "r" | "remind" => Choice::Event(DialogEvent::RemindLater),
        other => other
            .strip_prefix('o')
            .and_then(|rest| rest.trim().parse().ok())
            .map_or(Choice::Unknown, Choice::OpenLink),
    }
}

fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            if !line.is_empty() && line.chars().count() + 1 + word.chars().count() > width {
                lines.push(std::mem::take(&mut line));
            }
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(word);
        }
        lines.push(line);
    }
    lines
}
