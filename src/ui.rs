// UI layer: terminal implementation of the session `Console`.
// Prompts go through `dialoguer`, network waits show an `indicatif`
// spinner, and diagnostics are printed in red on stderr.

use std::io::IsTerminal;
use std::time::Duration;

use crossterm::style::{style, Color, Stylize};
use dialoguer::Input;
use indicatif::{ProgressBar, ProgressStyle};

use crate::error::Result;
use crate::session::Console;

/// Interactive console bound to the current terminal.
#[derive(Default)]
pub struct TerminalConsole {
    spinner: Option<ProgressBar>,
}

impl TerminalConsole {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Console for TerminalConsole {
    fn prompt(&mut self, question: &str) -> Result<String> {
        // Empty answers are allowed: the session decides what they mean.
        let answer: String = Input::new()
            .with_prompt(question)
            .allow_empty(true)
            .interact_text()?;
        Ok(answer)
    }

    fn info(&mut self, line: &str) {
        println!("{}", line);
    }

    fn error(&mut self, line: &str) {
        if std::io::stderr().is_terminal() {
            eprintln!("{}", style(line).with(Color::Red).bold());
        } else {
            eprintln!("{}", line);
        }
    }

    fn busy(&mut self, message: &str) {
        let spinner = ProgressBar::new_spinner();
        if let Ok(template) = ProgressStyle::with_template("{spinner} {msg}") {
            spinner.set_style(template);
        }
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(Duration::from_millis(100));
        self.spinner = Some(spinner);
    }

    fn idle(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }
}
