//! Terminal rendering of notifications and confirmation prompts.

use crate::core::notifier::{Confirmation, Level, Notifier};
use async_trait::async_trait;
use crossterm::{
    execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
};
use std::io::{self, BufRead, Write};

/// Notifier writing to stderr. Confirmations are asked on stdin when it is a
/// terminal; otherwise they are declined unless `assume_yes` is set.
pub struct TerminalNotifier {
    assume_yes: bool,
    use_colors: bool,
}

impl TerminalNotifier {
    pub fn new(assume_yes: bool) -> Self {
        Self {
            assume_yes,
            use_colors: atty::is(atty::Stream::Stderr),
        }
    }

    fn color(level: Level) -> Color {
        match level {
            Level::Success => Color::Green,
            Level::Info => Color::Cyan,
            Level::Warning => Color::Yellow,
            Level::Error => Color::Red,
        }
    }

    fn symbol(level: Level) -> &'static str {
        match level {
            Level::Success => "✅",
            Level::Info => "ℹ️",
            Level::Warning => "⚠️",
            Level::Error => "❌",
        }
    }

    fn write_line(&self, level: Level, text: &str) {
        let mut stderr = io::stderr();
        let line = format!("{} {}\n", Self::symbol(level), text);
        let result = if self.use_colors {
            execute!(
                stderr,
                SetForegroundColor(Self::color(level)),
                Print(line),
                ResetColor
            )
        } else {
            stderr.write_all(line.as_bytes())
        };
        if let Err(e) = result {
            log::debug!("failed to write notification: {}", e);
        }
    }
}

#[async_trait]
impl Notifier for TerminalNotifier {
    fn toast(&self, level: Level, message: &str) {
        self.write_line(level, message);
    }

    fn alert(&self, level: Level, title: &str, detail: Option<&str>) {
        match detail {
            Some(detail) if !detail.is_empty() => {
                self.write_line(level, &format!("{}: {}", title, detail))
            }
            _ => self.write_line(level, title),
        }
    }

    async fn confirm(&self, confirmation: &Confirmation) -> bool {
        if self.assume_yes {
            return true;
        }
        if !atty::is(atty::Stream::Stdin) {
            log::warn!("stdin is not a terminal; declining '{}'", confirmation.title);
            return false;
        }

        eprint!(
            "{} [y = {}, N = {}] ",
            confirmation.title, confirmation.confirm_label, confirmation.cancel_label
        );
        let _ = io::stderr().flush();

        match read_line().await {
            Ok(Some(answer)) => is_yes(&answer),
            _ => false,
        }
    }
}

/// Read one line from stdin without blocking the runtime. `None` on EOF.
pub async fn read_line() -> io::Result<Option<String>> {
    tokio::task::spawn_blocking(|| {
        let mut line = String::new();
        let read = io::stdin().lock().read_line(&mut line)?;
        Ok((read > 0).then(|| line.trim_end_matches(['\r', '\n']).to_string()))
    })
    .await
    .map_err(io::Error::other)?
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}
