//! Line-oriented REPL driving the chat controller.
//!
//! Display-and-forward glue only: every state rule lives in the `chat`
//! crate; this loop parses commands, calls the controller, and prints.

use chat::{ChatController, SendOutcome};
use chrono::{DateTime, Local};
use gateway::SessionGateway;
use proto::{Message, Role, SessionId, SessionSummary};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::info;

const PROMPT: &[u8] = b"medilink> ";

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    /// `/new` — create a session and select it.
    NewSession,
    /// `/list` — print the session sidebar.
    ListSessions,
    /// `/open <n>` — select the n-th listed session (1-based).
    OpenSession(usize),
    /// `/delete <n>` — delete the n-th listed session (1-based).
    DeleteSession(usize),
    /// `/quit` or `/exit`.
    Quit,
    /// Anything else: send as a message to the active session.
    Send(String),
}

/// Parses a raw input line. Empty lines and malformed commands yield no
/// command; malformed commands additionally return a usage hint.
pub fn parse_line(raw: &str) -> Result<Option<ReplCommand>, String> {
    let line = raw.trim();
    if line.is_empty() {
        return Ok(None);
    }
    if !line.starts_with('/') {
        return Ok(Some(ReplCommand::Send(line.to_string())));
    }

    let mut parts = line.split_whitespace();
    let command = parts.next().unwrap_or_default();
    match command {
        "/new" => Ok(Some(ReplCommand::NewSession)),
        "/list" => Ok(Some(ReplCommand::ListSessions)),
        "/quit" | "/exit" => Ok(Some(ReplCommand::Quit)),
        "/open" | "/delete" => {
            let index = parts
                .next()
                .and_then(|n| n.parse::<usize>().ok())
                .filter(|n| *n >= 1)
                .ok_or_else(|| format!("usage: {command} <number>"))?;
            Ok(Some(match command {
                "/open" => ReplCommand::OpenSession(index),
                _ => ReplCommand::DeleteSession(index),
            }))
        }
        other => Err(format!("unknown command: {other}")),
    }
}

/// Formats one sidebar line: `  3. Knee pain (2024-05-01)`.
pub fn format_summary_line(index: usize, summary: &SessionSummary, active: bool) -> String {
    let marker = if active { "*" } else { " " };
    format!(
        "{marker} {index}. {} ({})",
        summary.title,
        summary.updated_at.format("%Y-%m-%d")
    )
}

/// Formats one transcript line with a local-time stamp.
pub fn format_message(message: &Message) -> String {
    let who = match message.role {
        Role::User => "You",
        Role::Assistant => "Assistant",
    };
    let time: DateTime<Local> = message.timestamp.into();
    format!("[{}] {who}: {}", time.format("%H:%M"), message.content)
}

/// Resolves a 1-based sidebar index to a session id.
pub fn resolve_index(summaries: &[SessionSummary], index: usize) -> Option<SessionId> {
    summaries.get(index.checked_sub(1)?).map(|s| s.id.clone())
}

/// Runs the REPL until `/quit` or stdin closes.
pub async fn run<G: SessionGateway + 'static>(
    controller: &mut ChatController<G>,
) -> anyhow::Result<()> {
    let stdin = tokio::io::stdin();
    let mut reader = BufReader::new(stdin).lines();
    let mut stdout = tokio::io::stdout();

    info!("REPL started");
    print_help(&mut stdout).await?;
    stdout.write_all(PROMPT).await?;
    stdout.flush().await?;

    while let Some(line) = reader.next_line().await? {
        let command = match parse_line(&line) {
            Ok(Some(command)) => command,
            Ok(None) => {
                stdout.write_all(PROMPT).await?;
                stdout.flush().await?;
                continue;
            }
            Err(hint) => {
                stdout.write_all(format!("{hint}\n").as_bytes()).await?;
                stdout.write_all(PROMPT).await?;
                stdout.flush().await?;
                continue;
            }
        };

        let Some(output) = execute(controller, command).await else {
            break;
        };
        stdout.write_all(output.as_bytes()).await?;

        stdout.write_all(PROMPT).await?;
        stdout.flush().await?;
    }

    info!("REPL stopped");
    Ok(())
}

async fn print_help(stdout: &mut tokio::io::Stdout) -> std::io::Result<()> {
    stdout
        .write_all(
            b"Commands: /new, /list, /open <n>, /delete <n>, /quit. \
Anything else is sent to the assistant.\n",
        )
        .await
}

/// Executes one command against the controller and renders the result;
/// `None` ends the session. Failures leave controller state untouched and
/// come back as text.
async fn execute<G: SessionGateway + 'static>(
    controller: &mut ChatController<G>,
    command: ReplCommand,
) -> Option<String> {
    let output = match command {
        ReplCommand::Quit => return None,
        ReplCommand::NewSession => match controller.create_and_select().await {
            Ok(()) => "Started a new conversation.\n".to_string(),
            Err(e) => format!("Error: {e}\n"),
        },
        ReplCommand::ListSessions => {
            if let Err(e) = controller.refresh_sessions().await {
                return Some(format!("Error: {e}\n"));
            }
            render_sidebar(controller)
        }
        ReplCommand::OpenSession(index) => {
            let Some(id) = resolve_index(controller.store().summaries(), index) else {
                return Some(format!("No session at index {index}.\n"));
            };
            match controller.select_existing(&id).await {
                Ok(()) => {
                    let mut out = String::new();
                    for message in controller.store().messages() {
                        out.push_str(&format_message(message));
                        out.push('\n');
                    }
                    out
                }
                Err(e) => format!("Error: {e}\n"),
            }
        }
        ReplCommand::DeleteSession(index) => {
            let Some(id) = resolve_index(controller.store().summaries(), index) else {
                return Some(format!("No session at index {index}.\n"));
            };
            match controller.delete_session(&id).await {
                Ok(()) => "Deleted.\n".to_string(),
                Err(e) => format!("Error: {e}\n"),
            }
        }
        ReplCommand::Send(content) => match controller.send(&content).await {
            Ok(Some(SendOutcome::Settled { reply })) => {
                format!("{}\n", format_message(&reply))
            }
            Ok(Some(SendOutcome::RolledBack { error })) => {
                format!("Failed to send message: {error}\n")
            }
            Ok(Some(SendOutcome::Discarded)) => String::new(),
            // Another send is outstanding; admission control dropped this one.
            Ok(None) => String::new(),
            Err(e) => format!("Error: {e}\n"),
        },
    };
    Some(output)
}

fn render_sidebar<G: SessionGateway + 'static>(controller: &ChatController<G>) -> String {
    let summaries = controller.store().summaries();
    if summaries.is_empty() {
        return "No conversations yet.\n".to_string();
    }
    let active = controller.active_session();
    let mut out = String::new();
    for (i, summary) in summaries.iter().enumerate() {
        let is_active = active == Some(&summary.id);
        out.push_str(&format_summary_line(i + 1, summary, is_active));
        out.push('\n');
    }
    out
}
