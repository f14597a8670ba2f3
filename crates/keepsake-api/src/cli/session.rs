//! Session management CLI commands: start, list, show.
//!
//! Provides session browsing with rich tables and per-session transcript
//! display.

use anyhow::{Context, Result};
use clap::Subcommand;
use comfy_table::{presets, Cell, Color, ContentArrangement, Table};
use console::style;
use keepsake_types::session::{SessionStatus, TurnRole};
use uuid::Uuid;

use crate::state::AppState;

/// Session subcommands.
#[derive(Subcommand)]
pub enum SessionCommand {
    /// Start a new interview session.
    Start {
        /// Interviewee handle (defaults to the unassigned pool).
        #[arg(long)]
        handle: Option<String>,

        /// Title for the session.
        #[arg(long)]
        title: Option<String>,
    },

    /// List sessions, newest first.
    #[command(alias = "ls")]
    List {
        /// Filter by interviewee handle.
        #[arg(long)]
        handle: Option<String>,

        /// Maximum number of sessions to show.
        #[arg(long)]
        limit: Option<i64>,
    },

    /// Show a session with its full transcript.
    Show {
        /// Session ID to display.
        id: String,
    },
}

/// Start a new interview session.
///
/// # Examples
///
/// ```bash
/// ksake session start
/// ksake session start --handle margaret --title "Farm years"
/// ```
pub async fn start_session(
    state: &AppState,
    handle: Option<String>,
    title: Option<String>,
    json: bool,
) -> Result<()> {
    let session = state
        .session_service
        .create_session(handle.as_deref(), title)
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&session)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} Session started for '{}'",
        style("+").green().bold(),
        style(session.handle.as_str()).cyan()
    );
    println!();
    println!("  ID: {}", style(session.id).yellow());
    println!(
        "  Speak with: {}",
        style(format!("ksake ask {} \"...\"", session.id)).dim()
    );
    println!();

    Ok(())
}

/// List sessions with handle, date, turn count, and status.
///
/// # Examples
///
/// ```bash
/// ksake session list
/// ksake session list --handle margaret --limit 10
/// ```
pub async fn list_sessions(
    state: &AppState,
    handle: Option<String>,
    limit: Option<i64>,
    json: bool,
) -> Result<()> {
    let sessions = state
        .session_service
        .list_sessions(handle.as_deref(), limit, None)
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&sessions)?);
        return Ok(());
    }

    if sessions.is_empty() {
        println!();
        println!(
            "  {} No sessions found. Start one with: {}",
            style("i").blue().bold(),
            style("ksake session start").yellow()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("ID").fg(Color::White),
        Cell::new("Handle").fg(Color::White),
        Cell::new("Title").fg(Color::White),
        Cell::new("Started").fg(Color::White),
        Cell::new("Turns").fg(Color::White),
        Cell::new("Status").fg(Color::White),
    ]);

    for session in &sessions {
        let title = session
            .title
            .as_deref()
            .unwrap_or("(untitled)")
            .to_string();

        let title_display = if title.len() > 40 {
            format!("{}...", &title[..37])
        } else {
            title
        };

        let started = session.created_at.format("%Y-%m-%d %H:%M").to_string();

        let status_cell = match session.status {
            SessionStatus::Active => Cell::new("active").fg(Color::Green),
            SessionStatus::Completed => Cell::new("completed").fg(Color::DarkGrey),
        };

        table.add_row(vec![
            Cell::new(session.id.to_string()).fg(Color::DarkGrey),
            Cell::new(session.handle.as_str()).fg(Color::Cyan),
            Cell::new(title_display).fg(Color::White),
            Cell::new(started).fg(Color::White),
            Cell::new(session.turn_count.to_string()).fg(Color::White),
            status_cell,
        ]);
    }

    println!();
    println!("{table}");
    println!();
    println!(
        "  {} session{}",
        style(sessions.len()).bold(),
        if sessions.len() == 1 { "" } else { "s" }
    );
    println!();

    Ok(())
}

/// Show a session with its full transcript.
///
/// # Examples
///
/// ```bash
/// ksake session show <session-id>
/// ksake session show <session-id> --json
/// ```
pub async fn show_session(state: &AppState, id: &str, json: bool) -> Result<()> {
    let session_id = Uuid::parse_str(id)
        .map_err(|_| anyhow::anyhow!("Invalid session ID: {id}"))?;

    let hydrated = state
        .session_service
        .get_session_with_turns(&session_id)
        .await?
        .with_context(|| format!("Session '{session_id}' not found"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&hydrated)?);
        return Ok(());
    }

    let session = &hydrated.session;
    let title = session.title.as_deref().unwrap_or("(untitled)");

    println!();
    println!(
        "  {} -- {}",
        style(title).cyan().bold(),
        style(session.handle.as_str()).cyan()
    );
    println!(
        "  Started {}  |  {} turn{}  |  {}",
        session.created_at.format("%Y-%m-%d %H:%M UTC"),
        session.turn_count,
        if session.turn_count == 1 { "" } else { "s" },
        session.status
    );
    println!();

    for turn in &hydrated.turns {
        let speaker = match turn.role {
            TurnRole::User => style("They said").green().bold(),
            TurnRole::Assistant => style("Interviewer").blue().bold(),
        };
        let timestamp = turn.created_at.format("%H:%M");
        println!("  {speaker} ({timestamp})");
        println!("  {}", turn.text);
        if let Some(audio_ref) = &turn.audio_ref {
            println!("  {}", style(format!("audio: {audio_ref}")).dim());
        }
        println!();
    }

    Ok(())
}
