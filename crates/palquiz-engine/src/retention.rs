use chrono::{DateTime, Duration, Utc};
use palquiz_db::{Database, DbError};
use tracing::{debug, info};

use crate::QuizEngine;

/// Delete every quiz created more than `max_age_hours` ago, along with its
/// attempts and all of their answers. Running it again right away is a no-op.
pub fn sweep(db: &Database, max_age_hours: u32) -> Result<(), DbError> {
    sweep_at(db, max_age_hours, Utc::now())
}

pub fn sweep_at(db: &Database, max_age_hours: u32, now: DateTime<Utc>) -> Result<(), DbError> {
    // An age reaching past the earliest representable time keeps everything
    let Some(cutoff) = Duration::try_hours(i64::from(max_age_hours))
        .and_then(|age| now.checked_sub_signed(age))
    else {
        debug!("Sweep: {} hours is beyond any stored quiz", max_age_hours);
        return Ok(());
    };

    let deleted = db.delete_quizzes_created_before(cutoff.timestamp())?;
    if deleted > 0 {
        info!("Sweep: deleted {} quizzes older than {} hours", deleted, max_age_hours);
    }

    Ok(())
}

impl QuizEngine {
    pub fn sweep(&self, max_age_hours: u32) -> Result<(), DbError> {
        sweep(&self.db, max_age_hours)
    }
}
