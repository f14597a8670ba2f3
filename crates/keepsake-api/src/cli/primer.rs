//! Memory primer CLI commands: show and rebuild.

use anyhow::Result;
use clap::Subcommand;
use console::style;
use keepsake_types::handle::Handle;

use crate::state::AppState;

/// Primer subcommands.
#[derive(Subcommand)]
pub enum PrimerCommand {
    /// Print the compiled memory primer for an interviewee.
    Show {
        /// Interviewee handle.
        handle: String,
    },

    /// Rebuild the memory primer from the full session history.
    Rebuild {
        /// Interviewee handle.
        handle: String,
    },
}

/// Print the stored primer Markdown for a handle.
///
/// # Examples
///
/// ```bash
/// ksake primer show margaret
/// ksake primer show margaret --json
/// ```
pub async fn show_primer(state: &AppState, handle: &str, json: bool) -> Result<()> {
    let primer = state.finalize_service.primer(handle).await?;

    let Some(primer) = primer else {
        if json {
            println!("null");
            return Ok(());
        }
        println!();
        println!(
            "  {} No primer compiled for '{}'. Create one with: {}",
            style("i").blue().bold(),
            style(handle).cyan(),
            style(format!("ksake primer rebuild {handle}")).yellow()
        );
        println!();
        return Ok(());
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&primer)?);
        return Ok(());
    }

    // The primer body is Markdown; print it verbatim for piping.
    println!("{}", primer.markdown);

    Ok(())
}

/// Rebuild and store the primer for a handle, then report the result.
///
/// # Examples
///
/// ```bash
/// ksake primer rebuild margaret
/// ```
pub async fn rebuild_primer(state: &AppState, handle: &str, json: bool) -> Result<()> {
    let handle = Handle::normalize(Some(handle));
    let primer = state.finalize_service.rebuild_primer(&handle).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&primer)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} Primer rebuilt for '{}' ({} lines).",
        style("*").green().bold(),
        style(handle.as_str()).cyan(),
        primer.markdown.lines().count()
    );
    println!(
        "  View it with: {}",
        style(format!("ksake primer show {}", handle.as_str())).yellow()
    );
    println!();

    Ok(())
}
