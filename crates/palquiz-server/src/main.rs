mod sweeper;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use palquiz_db::Database;
use palquiz_engine::QuizEngine;
use palquiz_types::{QUIZ_LENGTH, QuestionBank};

#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// SQLite database file.
    #[arg(long, env = "PALQUIZ_DB_PATH", default_value = "palquiz.db")]
    db_path: PathBuf,

    #[command(flatten)]
    serve: ServeArgs,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the HTTP API (default).
    Serve,

    /// Drop and recreate every table.
    InitDb,
}

#[derive(clap::Args, Debug)]
struct ServeArgs {
    /// Question bank JSON document.
    #[arg(long, env = "PALQUIZ_QUESTIONS", default_value = "questions.json")]
    questions: PathBuf,

    #[arg(long, env = "PALQUIZ_HOST", default_value = "0.0.0.0")]
    host: String,

    #[arg(long, env = "PALQUIZ_PORT", default_value_t = 3000)]
    port: u16,

    /// Quizzes older than this are deleted.
    #[arg(long, env = "PALQUIZ_MAX_AGE_HOURS", default_value_t = 48)]
    max_age_hours: u32,

    #[arg(
        long,
        env = "PALQUIZ_SWEEP_INTERVAL_SECS",
        default_value_t = 1800,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    sweep_interval_secs: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "palquiz=debug,tower_http=debug".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Command::InitDb) => {
            let db = Database::open(&cli.db_path)?;
            db.reset()?;
            info!("Recreated the database at {}", cli.db_path.display());
            Ok(())
        }
        Some(Command::Serve) | None => serve(cli.db_path, cli.serve).await,
    }
}

async fn serve(db_path: PathBuf, args: ServeArgs) -> anyhow::Result<()> {
    // A malformed bank aborts startup
    let bank = QuestionBank::from_path(&args.questions)?;
    if bank.len() < QUIZ_LENGTH {
        warn!(
            "Question bank has {} questions, quizzes need {} to be completed",
            bank.len(),
            QUIZ_LENGTH
        );
    }

    let db = Database::open(&db_path)?;
    let engine = Arc::new(QuizEngine::new(db, bank));

    // Background sweep of stale quizzes
    tokio::spawn(sweeper::run_sweep_loop(
        engine.clone(),
        args.max_age_hours,
        args.sweep_interval_secs,
    ));

    let app = palquiz_api::router(engine)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    info!("palquiz listening on {}", addr);
    info!(
        "Retention: {} hours, swept every {} seconds",
        args.max_age_hours, args.sweep_interval_secs
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Received Ctrl+C, shutting down...");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_serve() {
        let cli = Cli::try_parse_from(["palquiz", "--sweep-interval-secs", "60"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.serve.sweep_interval_secs, 60);
    }

    #[test]
    fn test_zero_sweep_interval_is_rejected() {
        assert!(Cli::try_parse_from(["palquiz", "--sweep-interval-secs", "0"]).is_err());
        assert!(Cli::try_parse_from(["palquiz", "--sweep-interval-secs", "0", "serve"]).is_err());
    }
}
