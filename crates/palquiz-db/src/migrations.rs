use rusqlite::Connection;
use tracing::info;

use crate::Result;

/// The five relations. Join tables repeat `QuestionIndex` so a question can
/// only be answered once per quiz or attempt, enforced by SQLite itself.
const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS Quiz (
        Id                      TEXT PRIMARY KEY,
        PublicId                TEXT NOT NULL UNIQUE,
        CreatorName             TEXT NOT NULL,
        ShuffledQuestionIndices TEXT NOT NULL,
        CurrentQuestionIndex    INTEGER NOT NULL DEFAULT 0,
        CreationTimeStamp       INTEGER NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_quiz_created
        ON Quiz(CreationTimeStamp);

    CREATE TABLE IF NOT EXISTS CompletedQuiz (
        Id                   TEXT PRIMARY KEY,
        FriendName           TEXT NOT NULL,
        CurrentQuestionIndex INTEGER NOT NULL DEFAULT 0,
        QuizId               TEXT NOT NULL REFERENCES Quiz(Id) ON DELETE CASCADE
    );

    CREATE INDEX IF NOT EXISTS idx_completed_quiz_quiz
        ON CompletedQuiz(QuizId);

    CREATE TABLE IF NOT EXISTS QuestionAnswer (
        Id            INTEGER PRIMARY KEY AUTOINCREMENT,
        QuestionIndex INTEGER NOT NULL,
        AnswerIndices TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS QuizQuestionAnswer (
        QuizId           TEXT NOT NULL REFERENCES Quiz(Id) ON DELETE CASCADE,
        QuestionAnswerId INTEGER NOT NULL UNIQUE REFERENCES QuestionAnswer(Id) ON DELETE CASCADE,
        QuestionIndex    INTEGER NOT NULL,
        UNIQUE(QuizId, QuestionIndex)
    );

    CREATE TABLE IF NOT EXISTS CompletedQuizQuestionAnswer (
        CompletedQuizId  TEXT NOT NULL REFERENCES CompletedQuiz(Id) ON DELETE CASCADE,
        QuestionAnswerId INTEGER NOT NULL UNIQUE REFERENCES QuestionAnswer(Id) ON DELETE CASCADE,
        QuestionIndex    INTEGER NOT NULL,
        UNIQUE(CompletedQuizId, QuestionIndex)
    );
";

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;

    info!("Database migrations complete");
    Ok(())
}

/// Recreate all relations, discarding every quiz.
pub fn reset(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        DROP TABLE IF EXISTS CompletedQuizQuestionAnswer;
        DROP TABLE IF EXISTS QuizQuestionAnswer;
        DROP TABLE IF EXISTS QuestionAnswer;
        DROP TABLE IF EXISTS CompletedQuiz;
        DROP TABLE IF EXISTS Quiz;
        ",
    )?;

    info!("Dropped all tables");
    run(conn)
}
