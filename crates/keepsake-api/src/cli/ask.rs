//! Live interview CLI commands: ask and finalize.
//!
//! `ask` submits one transcribed utterance and prints the reply the
//! interviewer reads back; `finalize` closes the session and rebuilds the
//! interviewee's memory primer.

use anyhow::Result;
use console::style;
use uuid::Uuid;

use crate::state::AppState;

/// Submit one utterance to a session and print the reconciled reply.
///
/// # Examples
///
/// ```bash
/// ksake ask <session-id> "I grew up on a farm near the coast."
/// ksake ask <session-id> "..." --audio-ref rec/0042.ogg
/// ```
pub async fn ask(
    state: &AppState,
    session_id: &str,
    text: &str,
    audio_ref: Option<String>,
    json: bool,
) -> Result<()> {
    let session_id = Uuid::parse_str(session_id)
        .map_err(|_| anyhow::anyhow!("Invalid session ID: {session_id}"))?;

    let reply = state.ask_service.ask(&session_id, text, audio_ref).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&reply)?);
        return Ok(());
    }

    println!();
    if !reply.transcript.is_empty() {
        println!("  {}", style(&reply.transcript).dim());
        println!();
    }
    println!("  {}", reply.reply);
    println!();
    if reply.end_intent {
        println!(
            "  {} They sound ready to wrap up. Close with: {}",
            style("i").blue().bold(),
            style(format!("ksake finalize {session_id}")).yellow()
        );
        println!();
    }

    Ok(())
}

/// Finalize a session and rebuild the interviewee's memory primer.
///
/// # Examples
///
/// ```bash
/// ksake finalize <session-id> --handle margaret --title "Farm years"
/// ```
pub async fn finalize(
    state: &AppState,
    session_id: &str,
    handle: Option<String>,
    title: Option<String>,
    json: bool,
) -> Result<()> {
    let session_id = Uuid::parse_str(session_id)
        .map_err(|_| anyhow::anyhow!("Invalid session ID: {session_id}"))?;

    let session = state
        .finalize_service
        .finalize(&session_id, handle.as_deref(), title)
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&session)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} Session '{}' completed ({} turn{}).",
        style("*").green().bold(),
        style(session.title.as_deref().unwrap_or("(untitled)")).cyan(),
        session.turn_count,
        if session.turn_count == 1 { "" } else { "s" }
    );
    println!(
        "  Memory primer updated for '{}'. View it with: {}",
        style(session.handle.as_str()).cyan(),
        style(format!("ksake primer show {}", session.handle.as_str())).yellow()
    );
    println!();

    Ok(())
}
