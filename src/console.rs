//! Line-oriented console front-end for the trip planner.
//!
//! Reads one line per turn from stdin and prints the planner's replies.
//! Lines typed while a request is still in flight are dropped with a notice.

use tokio::io::{AsyncBufReadExt, BufReader};

use crate::planner::{Message, Session, TripController};

/// Shown when input arrives while a submission is still being processed.
pub const STILL_WORKING: &str = "Still working on your last request, please wait...";

const HELP: &str = "Commands: /reset to start over, /quit to exit.";

/// A parsed console line.
#[derive(Debug, Eq, PartialEq)]
pub enum ConsoleInput<'a> {
    /// Leave the console.
    Quit,
    /// Start a new conversation.
    Reset,
    /// Show available commands.
    Help,
    /// Text for the planner.
    Submit(&'a str),
}

impl<'a> ConsoleInput<'a> {
    /// Classify a raw input line.
    #[must_use]
    pub fn parse(line: &'a str) -> Self {
        match line.trim() {
            "/quit" | "/exit" => Self::Quit,
            "/reset" => Self::Reset,
            "/help" => Self::Help,
            text => Self::Submit(text),
        }
    }
}

/// Run the interactive loop until `/quit` or end of input.
///
/// # Errors
/// Returns an error if stdin cannot be read.
pub async fn run_console(controller: &TripController) -> anyhow::Result<()> {
    let mut session = Session::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    print_bot_messages(session.transcript());
    println!("{HELP}");

    while stdin_open {
        let Some(line) = lines.next_line().await? else {
            break;
        };

        let text = match ConsoleInput::parse(&line) {
            ConsoleInput::Quit => break,
            ConsoleInput::Help => {
                println!("{HELP}");
                continue;
            }
            ConsoleInput::Reset => {
                session.reset();
                print_bot_messages(session.transcript());
                continue;
            }
            ConsoleInput::Submit(text) => text,
        };

        let submission = controller.submit(&mut session, text);
        tokio::pin!(submission);

        let replies = loop {
            tokio::select! {
                replies = &mut submission => break replies.to_vec(),
                extra = lines.next_line(), if stdin_open => {
                    if extra?.is_some() {
                        println!("{STILL_WORKING}");
                    } else {
                        stdin_open = false;
                    }
                }
            }
        };

        print_bot_messages(&replies);
    }

    tracing::debug!("Console session {} closed", session.id());
    Ok(())
}

fn print_bot_messages(messages: &[Message]) {
    for message in messages.iter().filter(|m| m.is_bot) {
        println!("{}\n", message.render());
    }
}
