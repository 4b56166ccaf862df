//! Line-driven interactive list: search, page, delete and export from one
//! prompt.

use crate::api::models::EntityId;
use crate::cli::terminal::read_line;
use crate::core::list_controller::{DeleteOutcome, ListController, ListState, LoadState};
use crate::display::{TableDisplay, pagination_footer};
use crate::error::CliError;
use crate::storage::download::DownloadSink;
use std::io::Write;

const HELP: &str = "/<term> search · n next · p previous · <page|url> jump · \
d <id> delete · r refresh · e export PDF · q quit";

/// One parsed prompt line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowseCommand {
    Search(String),
    Next,
    Previous,
    Page(String),
    Delete(String),
    Refresh,
    Export,
    Help,
    Quit,
}

impl BrowseCommand {
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if let Some(term) = line.strip_prefix('/') {
            return Some(BrowseCommand::Search(term.to_string()));
        }
        match line {
            "" => None,
            "n" | "next" => Some(BrowseCommand::Next),
            "p" | "prev" | "previous" => Some(BrowseCommand::Previous),
            "r" | "refresh" => Some(BrowseCommand::Refresh),
            "e" | "export" => Some(BrowseCommand::Export),
            "?" | "h" | "help" => Some(BrowseCommand::Help),
            "q" | "quit" | "exit" => Some(BrowseCommand::Quit),
            _ => match line.split_once(char::is_whitespace) {
                Some(("d" | "delete", id)) if !id.trim().is_empty() => {
                    Some(BrowseCommand::Delete(id.trim().to_string()))
                }
                _ => Some(BrowseCommand::Page(line.to_string())),
            },
        }
    }
}

pub struct Browser<S: DownloadSink> {
    controller: ListController,
    sink: S,
    display: TableDisplay,
}

impl<S: DownloadSink> Browser<S> {
    pub fn new(controller: ListController, sink: S) -> Self {
        Self {
            controller,
            sink,
            display: TableDisplay::new(),
        }
    }

    pub async fn run(self) -> crate::Result<()> {
        self.controller.mount().await?;
        self.render(&self.controller.snapshot());
        println!("{}", HELP);

        loop {
            print!("{}> ", self.controller.resource());
            let _ = std::io::stdout().flush();

            let Some(line) = read_line()
                .await
                .map_err(|e| CliError::CommandFailed(format!("failed to read input: {}", e)))?
            else {
                break;
            };
            let Some(command) = BrowseCommand::parse(&line) else {
                continue;
            };

            match command {
                BrowseCommand::Quit => break,
                BrowseCommand::Help => {
                    println!("{}", HELP);
                    continue;
                }
                BrowseCommand::Search(term) => {
                    self.controller.search(&term)?;
                    self.controller.settle().await;
                }
                BrowseCommand::Next => {
                    if self.controller.next_page().await?.is_none() {
                        println!("Already on the last page");
                        continue;
                    }
                }
                BrowseCommand::Previous => {
                    if self.controller.previous_page().await?.is_none() {
                        println!("Already on the first page");
                        continue;
                    }
                }
                BrowseCommand::Page(token) => {
                    if let Err(e) = self.controller.change_page(&token).await {
                        println!("{} ({})", e, HELP);
                        continue;
                    }
                }
                BrowseCommand::Delete(id) => {
                    match self.controller.request_delete(EntityId::from(id.as_str())).await? {
                        DeleteOutcome::Deleted => {}
                        DeleteOutcome::Cancelled => continue,
                        DeleteOutcome::InFlight => {
                            println!("{} is already being deleted", id);
                            continue;
                        }
                        // the notifier has already reported it
                        DeleteOutcome::Failed(_) => continue,
                    }
                }
                BrowseCommand::Refresh => {
                    self.controller.refresh().await?;
                }
                BrowseCommand::Export => {
                    // reported through the notifier
                    let _ = self.controller.export_pdf(&self.sink).await;
                    continue;
                }
            }

            self.render(&self.controller.snapshot());
        }

        self.controller.close();
        Ok(())
    }

    fn render(&self, state: &ListState) {
        match &state.status {
            LoadState::Idle => {}
            LoadState::Loading => println!("Loading..."),
            LoadState::Error(message) => println!("{} (r to retry)", message),
            LoadState::Loaded(page) => {
                if !state.query.is_empty() {
                    println!("Search: {}", state.query);
                }
                if !page.is_empty() {
                    println!("{}", self.display.render_entities(&page.data));
                }
                println!("{}", pagination_footer(page));
            }
        }
    }
}
