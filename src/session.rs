//! Line-oriented interactive session over a [`ViewController`].
//!
//! Plain text sets the address; slash commands press the page's buttons.

use crate::controller::{ActionOutcome, ViewController};
use crate::error::Result;
use std::path::PathBuf;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

const HELP: &str = "\
Type an address, then:
  /search [address]   find it and show the satellite map
  /suggest [text]     list autocomplete candidates
  /pick N             show candidate N
  /paint              turn the current map into a painting
  /save PATH          write the painting to PATH
  /show               redraw the page
  /help               this text
  /quit               leave";

/// A parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Replace the address text.
    SetQuery(String),
    /// Search, optionally replacing the address first.
    Search(Option<String>),
    /// Refresh candidates, optionally replacing the address first.
    Suggest(Option<String>),
    /// Select a candidate (one-based).
    Pick(usize),
    /// Generate a painting.
    Paint,
    /// Save the painting.
    Save(PathBuf),
    /// Print the page.
    Show,
    /// Print usage.
    Help,
    /// End the session.
    Quit,
}

impl Command {
    /// Parses one line of input.
    pub fn parse(line: &str) -> std::result::Result<Self, String> {
        let line = line.trim();
        let Some(rest) = line.strip_prefix('/') else {
            return Ok(Self::SetQuery(line.to_string()));
        };

        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, Some(arg.trim()).filter(|a| !a.is_empty())),
            None => (rest, None),
        };

        match name {
            "search" | "s" => Ok(Self::Search(arg.map(String::from))),
            "suggest" => Ok(Self::Suggest(arg.map(String::from))),
            "pick" | "p" => {
                let n: usize = arg
                    .and_then(|a| a.parse().ok())
                    .filter(|n| *n > 0)
                    .ok_or_else(|| "usage: /pick N (N starts at 1)".to_string())?;
                Ok(Self::Pick(n))
            }
            "paint" | "generate" => Ok(Self::Paint),
            "save" => arg
                .map(|a| Self::Save(PathBuf::from(a)))
                .ok_or_else(|| "usage: /save PATH".to_string()),
            "show" => Ok(Self::Show),
            "help" | "?" => Ok(Self::Help),
            "quit" | "exit" | "q" => Ok(Self::Quit),
            other => Err(format!("unknown command /{other}; try /help")),
        }
    }
}

/// Drives a controller from lines of text.
pub struct Session<'a> {
    controller: &'a ViewController,
}

impl<'a> Session<'a> {
    /// Creates a session over `controller`.
    pub fn new(controller: &'a ViewController) -> Self {
        Self { controller }
    }

    /// Reads commands from `input` until EOF or `/quit`, writing the page
    /// after each one to `output`.
    pub async fn run<R, W>(&mut self, input: R, mut output: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = input.lines();
        output
            .write_all(format!("{}\n{}\n", self.controller.view(), HELP).as_bytes())
            .await?;
        output.flush().await?;

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            let (reply, keep_going) = self.handle_line(&line).await;
            output.write_all(reply.as_bytes()).await?;
            if !reply.ends_with('\n') {
                output.write_all(b"\n").await?;
            }
            output.flush().await?;
            if !keep_going {
                break;
            }
        }
        Ok(())
    }

    /// Handles one line, returning the text to print and whether to continue.
    pub async fn handle_line(&mut self, line: &str) -> (String, bool) {
        let command = match Command::parse(line) {
            Ok(command) => command,
            Err(usage) => return (usage, true),
        };

        let note = match command {
            Command::SetQuery(text) => {
                self.controller.set_query(text);
                None
            }
            Command::Search(text) => {
                if let Some(text) = text {
                    self.controller.set_query(text);
                }
                outcome_note(self.controller.search().await)
            }
            Command::Suggest(text) => {
                if let Some(text) = text {
                    self.controller.set_query(text);
                }
                outcome_note(self.controller.refresh_suggestions().await)
            }
            Command::Pick(n) => outcome_note(self.controller.select_suggestion(n - 1).await),
            Command::Paint => outcome_note(self.controller.generate_painting().await),
            Command::Save(path) => Some(match self.controller.painting() {
                Some(painting) => match painting.save(&path) {
                    Ok(()) => format!("saved painting to {}", path.display()),
                    Err(e) => e.user_message(),
                },
                None => "no painting yet; use /paint first".to_string(),
            }),
            Command::Show => None,
            Command::Help => return (HELP.to_string(), true),
            Command::Quit => return ("bye".to_string(), false),
        };

        let mut reply = self.controller.view().to_string();
        if let Some(note) = note {
            reply.push_str(&note);
            reply.push('\n');
        }
        (reply, true)
    }
}

/// Extra line for outcomes the page itself does not show.
fn outcome_note(outcome: ActionOutcome) -> Option<String> {
    match outcome {
        // Blank queries already show their message in the page.
        ActionOutcome::Rejected(crate::controller::Rejection::BlankQuery) => None,
        ActionOutcome::Rejected(rejection) => Some(format!("({rejection})")),
        ActionOutcome::Completed | ActionOutcome::Failed(_) => None,
    }
}
