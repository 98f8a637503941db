use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use palquiz_engine::QuizEngine;

/// Background task that deletes stale quizzes.
///
/// Runs on an interval; each tick removes quizzes older than `max_age_hours`
/// together with their attempts and answers.
pub async fn run_sweep_loop(engine: Arc<QuizEngine>, max_age_hours: u32, interval_secs: u64) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));

    loop {
        interval.tick().await;

        let engine = engine.clone();
        let result = tokio::task::spawn_blocking(move || engine.sweep(max_age_hours)).await;

        match result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(code = ?e.code(), "Sweep error: {}", e),
            Err(e) => warn!("Sweep task failed: {}", e),
        }
    }
}
