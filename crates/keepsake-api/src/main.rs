//! Keepsake CLI and REST API entry point.
//!
//! Binary name: `ksake`
//!
//! Parses CLI arguments, initializes database and services, then dispatches
//! to the appropriate command handler or starts the REST API server.

mod cli;
mod http;
mod state;

use clap::Parser;
use clap_complete::generate;

use cli::{Cli, Commands};
use cli::primer::PrimerCommand;
use cli::session::SessionCommand;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Shell completions don't need tracing or app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "ksake", &mut std::io::stdout());
        return Ok(());
    }

    // Set up tracing based on verbosity; RUST_LOG still wins when set
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info,keepsake_core=debug,keepsake_infra=debug",
        _ => "trace",
    };
    let enable_otel = matches!(&cli.command, Commands::Serve { otel: true, .. });
    keepsake_observe::tracing_setup::init_tracing(filter, enable_otel)
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    // Initialize application state (config, DB, services)
    let state = AppState::init().await?;

    match cli.command {
        Commands::Session { action } => match action {
            SessionCommand::Start { handle, title } => {
                cli::session::start_session(&state, handle, title, cli.json).await?;
            }
            SessionCommand::List { handle, limit } => {
                cli::session::list_sessions(&state, handle, limit, cli.json).await?;
            }
            SessionCommand::Show { id } => {
                cli::session::show_session(&state, &id, cli.json).await?;
            }
        },

        Commands::Ask {
            session_id,
            text,
            audio_ref,
        } => {
            cli::ask::ask(&state, &session_id, &text, audio_ref, cli.json).await?;
        }

        Commands::Finalize {
            session_id,
            handle,
            title,
        } => {
            cli::ask::finalize(&state, &session_id, handle, title, cli.json).await?;
        }

        Commands::Primer { action } => match action {
            PrimerCommand::Show { handle } => {
                cli::primer::show_primer(&state, &handle, cli.json).await?;
            }
            PrimerCommand::Rebuild { handle } => {
                cli::primer::rebuild_primer(&state, &handle, cli.json).await?;
            }
        },

        Commands::Serve { port, host, .. } => {
            let addr = format!("{host}:{port}");
            let listener = tokio::net::TcpListener::bind(&addr).await?;

            println!(
                "  {} Keepsake API listening on {}",
                console::style("*").bold(),
                console::style(format!("http://{addr}")).cyan()
            );
            println!("  {}", console::style("Press Ctrl+C to stop").dim());

            let router = http::router::build_router(state);

            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown_signal())
                .await?;

            keepsake_observe::tracing_setup::shutdown_tracing();
            println!("\n  Server stopped.");
        }

        Commands::Completions { .. } => unreachable!("handled above"),
    }

    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
