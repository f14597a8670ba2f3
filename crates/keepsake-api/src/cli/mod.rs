//! CLI command definitions and dispatch for the `ksake` binary.
//!
//! Uses clap derive macros for argument parsing. The CLI follows a verb-noun
//! pattern (e.g., `ksake session start`, `ksake primer show`).

pub mod ask;
pub mod primer;
pub mod session;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Record, continue, and compose long-form spoken interviews.
#[derive(Parser)]
#[command(name = "ksake", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage interview sessions (start, list, show).
    Session {
        #[command(subcommand)]
        action: session::SessionCommand,
    },

    /// Submit one spoken utterance to a session and print the reply.
    Ask {
        /// Session ID to speak into.
        session_id: String,

        /// The transcribed utterance.
        text: String,

        /// Opaque reference to the recorded audio for this utterance.
        #[arg(long)]
        audio_ref: Option<String>,
    },

    /// Finalize a session: assign it to an interviewee and rebuild their primer.
    Finalize {
        /// Session ID to finalize.
        session_id: String,

        /// Interviewee handle to file the session under.
        #[arg(long)]
        handle: Option<String>,

        /// Title for the session.
        #[arg(long)]
        title: Option<String>,
    },

    /// Manage memory primers (show, rebuild).
    Primer {
        #[command(subcommand)]
        action: primer::PrimerCommand,
    },

    /// Start the REST API server.
    Serve {
        /// Port to listen on.
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to.
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Export OpenTelemetry spans to stdout.
        #[arg(long)]
        otel: bool,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}
