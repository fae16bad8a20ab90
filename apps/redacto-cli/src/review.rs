//! Interactive review loop
//!
//! Reads one command per line:
//!
//! | input     | effect                                   |
//! |-----------|------------------------------------------|
//! | `<n>`     | toggle detection `n` (1-based)           |
//! | `all`     | approve every detection                  |
//! | `none`    | reject every detection                   |
//! | `list`    | print the audit log again                |
//! | `burn`    | finish review and redact                 |
//! | `quit`    | abandon without redacting                |

use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use redacto_core::{RedactionSession, Theme, WorkflowError};

use crate::render;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewCommand {
    /// Zero-based position
    Toggle(usize),
    All,
    None,
    List,
    Burn,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewOutcome {
    Burn,
    Quit,
}

pub fn parse_command(line: &str) -> Option<ReviewCommand> {
    let line = line.trim();
    match line.to_ascii_lowercase().as_str() {
        "all" => Some(ReviewCommand::All),
        "none" => Some(ReviewCommand::None),
        "list" | "ls" => Some(ReviewCommand::List),
        "burn" => Some(ReviewCommand::Burn),
        "quit" | "q" | "exit" => Some(ReviewCommand::Quit),
        other => match other.parse::<usize>() {
            Ok(n) if n >= 1 => Some(ReviewCommand::Toggle(n - 1)),
            _ => None,
        },
    }
}

/// Drive the review step from `input` until the operator burns or quits.
///
/// End of input counts as quit.
pub async fn run<R>(session: &RedactionSession, input: R, theme: Theme) -> Result<ReviewOutcome>
where
    R: AsyncBufRead + Unpin,
{
    print_log(session, theme).await;
    println!("Commands: <number> toggles, all, none, list, burn, quit");

    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let Some(command) = parse_command(&line) else {
            println!("Unknown command: {}", line.trim());
            continue;
        };

        match command {
            ReviewCommand::Toggle(index) => match session.toggle_approval(index).await {
                Ok(()) => print_entry(session, index).await,
                Err(WorkflowError::Redact(_)) => {
                    if let Some(message) = session.last_error().await {
                        println!("{}", message);
                    }
                }
                Err(err) => return Err(err.into()),
            },
            ReviewCommand::All => {
                session.set_all_approvals(true).await?;
                print_log(session, theme).await;
            }
            ReviewCommand::None => {
                session.set_all_approvals(false).await?;
                print_log(session, theme).await;
            }
            ReviewCommand::List => print_log(session, theme).await,
            ReviewCommand::Burn => return Ok(ReviewOutcome::Burn),
            ReviewCommand::Quit => return Ok(ReviewOutcome::Quit),
        }
    }

    Ok(ReviewOutcome::Quit)
}

async fn print_log(session: &RedactionSession, theme: Theme) {
    if let Some(log) = session.audit_log().await {
        print!("{}", render::audit_log_table(&log, theme));
    }
}

async fn print_entry(session: &RedactionSession, index: usize) {
    let Some(log) = session.audit_log().await else {
        return;
    };
    if let Some(entry) = log.get(index) {
        let state = if entry.approved { "redact" } else { "keep" };
        println!(
            "{:>4}  {}  {} ({}, page {})",
            index + 1,
            state,
            entry.text_found,
            entry.entity_type,
            entry.page
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse_command("3"), Some(ReviewCommand::Toggle(2)));
        assert_eq!(parse_command("  12 \n"), Some(ReviewCommand::Toggle(11)));
        assert_eq!(parse_command("ALL"), Some(ReviewCommand::All));
        assert_eq!(parse_command("none"), Some(ReviewCommand::None));
        assert_eq!(parse_command("list"), Some(ReviewCommand::List));
        assert_eq!(parse_command("burn"), Some(ReviewCommand::Burn));
        assert_eq!(parse_command("q"), Some(ReviewCommand::Quit));
    }

    #[test]
    fn test_parse_rejects_zero_and_garbage() {
        assert_eq!(parse_command("0"), None);
        assert_eq!(parse_command("-1"), None);
        assert_eq!(parse_command("redact everything"), None);
    }
}
