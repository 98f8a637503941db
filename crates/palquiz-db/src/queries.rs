use palquiz_types::AnswerSet;
use rusqlite::{Connection, params};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{is_foreign_key_violation, is_unique_violation};
use crate::models::{AnswerRow, CompletedQuizRow, CompletedQuizSummary, Owner, QuizRow};
use crate::{Database, DbError, Result};

impl Database {
    // -- Quizzes --

    pub fn create_quiz(&self, quiz: &QuizRow) -> Result<()> {
        let order = encode("ShuffledQuestionIndices", &quiz.shuffled_question_indices)?;

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO Quiz (Id, PublicId, CreatorName, ShuffledQuestionIndices, CurrentQuestionIndex, CreationTimeStamp)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    quiz.id,
                    quiz.public_id,
                    quiz.creator_name,
                    order,
                    quiz.current_question_index,
                    quiz.created_at
                ],
            )
            .map_err(|e| {
                if is_unique_violation(&e) {
                    DbError::DuplicateId("quiz")
                } else {
                    e.into()
                }
            })?;
            Ok(())
        })
    }

    pub fn get_quiz(&self, id: &str) -> Result<QuizRow> {
        self.with_conn(|conn| query_quiz(conn, id))?
            .ok_or_else(|| DbError::not_found("quiz", id))
    }

    pub fn quiz_id_by_public_id(&self, public_id: &str) -> Result<String> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT Id FROM Quiz WHERE PublicId = ?1",
                [public_id],
                |row| row.get(0),
            )
            .optional()
        })?
        .ok_or_else(|| DbError::not_found("quiz", public_id))
    }

    // -- Completed quizzes --

    pub fn create_completed_quiz(&self, completed: &CompletedQuizRow) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO CompletedQuiz (Id, FriendName, CurrentQuestionIndex, QuizId) VALUES (?1, ?2, ?3, ?4)",
                params![
                    completed.id,
                    completed.friend_name,
                    completed.current_question_index,
                    completed.quiz_id
                ],
            )
            .map_err(|e| {
                if is_unique_violation(&e) {
                    DbError::DuplicateId("completed quiz")
                } else if is_foreign_key_violation(&e) {
                    DbError::not_found("quiz", &completed.quiz_id)
                } else {
                    e.into()
                }
            })?;
            Ok(())
        })
    }

    pub fn get_completed_quiz(&self, id: &str) -> Result<CompletedQuizRow> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT Id, FriendName, CurrentQuestionIndex, QuizId FROM CompletedQuiz WHERE Id = ?1",
                [id],
                |row| {
                    Ok(CompletedQuizRow {
                        id: row.get(0)?,
                        friend_name: row.get(1)?,
                        current_question_index: row.get(2)?,
                        quiz_id: row.get(3)?,
                    })
                },
            )
            .optional()
        })?
        .ok_or_else(|| DbError::not_found("completed quiz", id))
    }

    /// Attempts at `quiz_id` with exactly `answer_count` answers, by friend name.
    pub fn finished_completed_quizzes(
        &self,
        quiz_id: &str,
        answer_count: usize,
    ) -> Result<Vec<CompletedQuizSummary>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT c.Id, c.FriendName
                 FROM CompletedQuiz c
                 WHERE c.QuizId = ?1
                   AND (SELECT COUNT(*) FROM CompletedQuizQuestionAnswer j
                        WHERE j.CompletedQuizId = c.Id) = ?2
                 ORDER BY c.FriendName ASC, c.Id ASC",
            )?;

            let rows = stmt
                .query_map(params![quiz_id, answer_count as i64], |row| {
                    Ok(CompletedQuizSummary {
                        id: row.get(0)?,
                        friend_name: row.get(1)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    // -- Progress --

    pub fn set_current_question_index(&self, owner: Owner<'_>, index: u32) -> Result<()> {
        let sql = format!(
            "UPDATE {} SET CurrentQuestionIndex = ?1 WHERE Id = ?2",
            owner.table()
        );

        let changed = self.with_conn(|conn| Ok(conn.execute(&sql, params![index, owner.id()])?))?;
        if changed == 0 {
            return Err(DbError::not_found(owner.entity(), owner.id()));
        }
        Ok(())
    }

    // -- Answers --

    /// Insert a `QuestionAnswer` row and its join row in one transaction.
    /// A second answer to the same question fails with `DuplicateAnswer`.
    pub fn insert_answer(
        &self,
        owner: Owner<'_>,
        question_index: u32,
        answers: &AnswerSet,
    ) -> Result<()> {
        self.insert_answer_inner(owner, question_index, answers, None)
    }

    /// Like `insert_answer`, but fails with `AnswerLimit` when `owner`
    /// already has `limit` answers. The count is taken inside the insert
    /// transaction, so concurrent submissions cannot overshoot it.
    pub fn insert_answer_within(
        &self,
        owner: Owner<'_>,
        question_index: u32,
        answers: &AnswerSet,
        limit: usize,
    ) -> Result<()> {
        self.insert_answer_inner(owner, question_index, answers, Some(limit))
    }

    fn insert_answer_inner(
        &self,
        owner: Owner<'_>,
        question_index: u32,
        answers: &AnswerSet,
        limit: Option<usize>,
    ) -> Result<()> {
        let encoded = encode("AnswerIndices", answers)?;
        let count_sql = format!(
            "SELECT COUNT(*) FROM {} WHERE {} = ?1",
            owner.join_table(),
            owner.join_column()
        );
        let join_sql = format!(
            "INSERT INTO {} ({}, QuestionAnswerId, QuestionIndex) VALUES (?1, ?2, ?3)",
            owner.join_table(),
            owner.join_column()
        );

        self.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;

            if let Some(limit) = limit {
                let count: i64 = tx.query_row(&count_sql, [owner.id()], |row| row.get(0))?;
                if count as usize >= limit {
                    return Err(DbError::AnswerLimit { limit });
                }
            }

            tx.execute(
                "INSERT INTO QuestionAnswer (QuestionIndex, AnswerIndices) VALUES (?1, ?2)",
                params![question_index, encoded],
            )?;
            let answer_id = tx.last_insert_rowid();

            // Dropping `tx` on error rolls back the QuestionAnswer insert
            tx.execute(&join_sql, params![owner.id(), answer_id, question_index])
                .map_err(|e| {
                    if is_unique_violation(&e) {
                        DbError::DuplicateAnswer { question_index }
                    } else if is_foreign_key_violation(&e) {
                        DbError::not_found(owner.entity(), owner.id())
                    } else {
                        e.into()
                    }
                })?;

            tx.commit()?;
            Ok(())
        })
    }

    pub fn answer_count(&self, owner: Owner<'_>) -> Result<usize> {
        let sql = format!(
            "SELECT COUNT(*) FROM {} WHERE {} = ?1",
            owner.join_table(),
            owner.join_column()
        );

        self.with_conn(|conn| {
            let count: i64 = conn.query_row(&sql, [owner.id()], |row| row.get(0))?;
            Ok(count as usize)
        })
    }

    /// Bank indices answered by `owner`, ascending.
    pub fn answered_question_indices(&self, owner: Owner<'_>) -> Result<Vec<u32>> {
        let sql = format!(
            "SELECT QuestionIndex FROM {} WHERE {} = ?1 ORDER BY QuestionIndex ASC",
            owner.join_table(),
            owner.join_column()
        );

        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([owner.id()], |row| row.get(0))?
                .collect::<std::result::Result<Vec<u32>, _>>()?;
            Ok(rows)
        })
    }

    /// Every answer recorded by `owner`, ascending by bank index.
    pub fn answers(&self, owner: Owner<'_>) -> Result<Vec<AnswerRow>> {
        let sql = format!(
            "SELECT qa.QuestionIndex, qa.AnswerIndices
             FROM QuestionAnswer qa
             JOIN {} j ON j.QuestionAnswerId = qa.Id
             WHERE j.{} = ?1
             ORDER BY qa.QuestionIndex ASC",
            owner.join_table(),
            owner.join_column()
        );

        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let raw = stmt
                .query_map([owner.id()], |row| {
                    Ok((row.get::<_, u32>(0)?, row.get::<_, String>(1)?))
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            raw.into_iter()
                .map(|(question_index, encoded)| {
                    Ok(AnswerRow {
                        question_index,
                        answer_indices: decode("AnswerIndices", &encoded)?,
                    })
                })
                .collect()
        })
    }

    // -- Retention --

    /// Delete quizzes created before `cutoff` (Unix seconds) together with
    /// their attempts and every answer row either of them owns.
    /// Returns the number of quizzes deleted.
    pub fn delete_quizzes_created_before(&self, cutoff: i64) -> Result<usize> {
        self.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;

            tx.execute(
                "DELETE FROM QuestionAnswer WHERE Id IN (
                     SELECT j.QuestionAnswerId
                     FROM QuizQuestionAnswer j
                     JOIN Quiz q ON q.Id = j.QuizId
                     WHERE q.CreationTimeStamp < ?1)",
                [cutoff],
            )?;
            tx.execute(
                "DELETE FROM QuestionAnswer WHERE Id IN (
                     SELECT j.QuestionAnswerId
                     FROM CompletedQuizQuestionAnswer j
                     JOIN CompletedQuiz c ON c.Id = j.CompletedQuizId
                     JOIN Quiz q ON q.Id = c.QuizId
                     WHERE q.CreationTimeStamp < ?1)",
                [cutoff],
            )?;
            // CompletedQuiz and join rows go with the quiz via ON DELETE CASCADE
            let deleted = tx.execute("DELETE FROM Quiz WHERE CreationTimeStamp < ?1", [cutoff])?;

            tx.commit()?;
            Ok(deleted)
        })
    }
}

fn query_quiz(conn: &Connection, id: &str) -> Result<Option<QuizRow>> {
    let mut stmt = conn.prepare(
        "SELECT Id, PublicId, CreatorName, ShuffledQuestionIndices, CurrentQuestionIndex, CreationTimeStamp
         FROM Quiz WHERE Id = ?1",
    )?;

    let row = stmt
        .query_row([id], |row| {
            Ok((
                QuizRow {
                    id: row.get(0)?,
                    public_id: row.get(1)?,
                    creator_name: row.get(2)?,
                    shuffled_question_indices: Vec::new(),
                    current_question_index: row.get(4)?,
                    created_at: row.get(5)?,
                },
                row.get::<_, String>(3)?,
            ))
        })
        .optional()?;

    row.map(|(mut quiz, order)| {
        quiz.shuffled_question_indices = decode("ShuffledQuestionIndices", &order)?;
        Ok(quiz)
    })
    .transpose()
}

/// Integer sequences are stored as JSON arrays.
fn encode<T: Serialize + ?Sized>(column: &'static str, value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(|source| DbError::Corrupt {
        column,
        value: String::new(),
        source,
    })
}

fn decode<T: DeserializeOwned>(column: &'static str, value: &str) -> Result<T> {
    serde_json::from_str(value).map_err(|source| DbError::Corrupt {
        column,
        value: value.to_string(),
        source,
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiz(id: &str, created_at: i64) -> QuizRow {
        QuizRow {
            id: id.to_string(),
            public_id: format!("pub-{id}"),
            creator_name: "Alice".to_string(),
            shuffled_question_indices: vec![2, 0, 3, 1],
            current_question_index: 0,
            created_at,
        }
    }

    fn completed(id: &str, friend: &str, quiz_id: &str) -> CompletedQuizRow {
        CompletedQuizRow {
            id: id.to_string(),
            friend_name: friend.to_string(),
            current_question_index: 0,
            quiz_id: quiz_id.to_string(),
        }
    }

    fn answers(indices: &[u32]) -> AnswerSet {
        indices.iter().copied().collect()
    }

    fn row_count(db: &Database, table: &str) -> i64 {
        db.with_conn(|conn| {
            Ok(conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))?)
        })
        .unwrap()
    }

    #[test]
    fn test_quiz_round_trip() {
        let db = Database::open_in_memory().unwrap();
        db.create_quiz(&quiz("q1", 100)).unwrap();

        assert_eq!(db.get_quiz("q1").unwrap(), quiz("q1", 100));
        assert_eq!(db.quiz_id_by_public_id("pub-q1").unwrap(), "q1");
    }

    #[test]
    fn test_unknown_ids_are_not_found() {
        let db = Database::open_in_memory().unwrap();

        assert!(matches!(db.get_quiz("nope"), Err(DbError::NotFound { .. })));
        assert!(matches!(
            db.quiz_id_by_public_id("nope"),
            Err(DbError::NotFound { .. })
        ));
        assert!(matches!(
            db.get_completed_quiz("nope"),
            Err(DbError::NotFound { .. })
        ));
        assert!(matches!(
            db.set_current_question_index(Owner::Quiz("nope"), 1),
            Err(DbError::NotFound { .. })
        ));
    }

    #[test]
    fn test_id_collisions() {
        let db = Database::open_in_memory().unwrap();
        db.create_quiz(&quiz("q1", 0)).unwrap();

        assert!(matches!(
            db.create_quiz(&quiz("q1", 0)),
            Err(DbError::DuplicateId("quiz"))
        ));

        let mut same_public = quiz("q2", 0);
        same_public.public_id = "pub-q1".to_string();
        assert!(matches!(
            db.create_quiz(&same_public),
            Err(DbError::DuplicateId("quiz"))
        ));

        db.create_completed_quiz(&completed("c1", "Bob", "q1")).unwrap();
        assert!(matches!(
            db.create_completed_quiz(&completed("c1", "Bob", "q1")),
            Err(DbError::DuplicateId("completed quiz"))
        ));
    }

    #[test]
    fn test_completed_quiz_needs_existing_quiz() {
        let db = Database::open_in_memory().unwrap();
        assert!(matches!(
            db.create_completed_quiz(&completed("c1", "Bob", "missing")),
            Err(DbError::NotFound { entity: "quiz", .. })
        ));
    }

    #[test]
    fn test_duplicate_answer_leaves_rows_untouched() {
        let db = Database::open_in_memory().unwrap();
        db.create_quiz(&quiz("q1", 0)).unwrap();
        let owner = Owner::Quiz("q1");

        db.insert_answer(owner, 3, &answers(&[1])).unwrap();
        let err = db.insert_answer(owner, 3, &answers(&[2])).unwrap_err();
        assert!(matches!(err, DbError::DuplicateAnswer { question_index: 3 }));

        assert_eq!(row_count(&db, "QuestionAnswer"), 1);
        assert_eq!(row_count(&db, "QuizQuestionAnswer"), 1);
        assert_eq!(db.answers(owner).unwrap()[0].answer_indices, answers(&[1]));
    }

    #[test]
    fn test_answer_limit_is_checked_in_the_insert() {
        let db = Database::open_in_memory().unwrap();
        db.create_quiz(&quiz("q1", 0)).unwrap();
        let owner = Owner::Quiz("q1");

        db.insert_answer_within(owner, 0, &answers(&[0]), 2).unwrap();
        db.insert_answer_within(owner, 1, &answers(&[1]), 2).unwrap();
        let err = db
            .insert_answer_within(owner, 2, &answers(&[0]), 2)
            .unwrap_err();
        assert!(matches!(err, DbError::AnswerLimit { limit: 2 }));

        assert_eq!(row_count(&db, "QuestionAnswer"), 2);
        assert_eq!(db.answer_count(owner).unwrap(), 2);
    }

    #[test]
    fn test_answer_for_missing_owner_is_rolled_back() {
        let db = Database::open_in_memory().unwrap();

        let err = db
            .insert_answer(Owner::CompletedQuiz("ghost"), 0, &answers(&[0]))
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::NotFound {
                entity: "completed quiz",
                ..
            }
        ));
        assert_eq!(row_count(&db, "QuestionAnswer"), 0);
    }

    #[test]
    fn test_answers_are_ordered_by_question_index() {
        let db = Database::open_in_memory().unwrap();
        db.create_quiz(&quiz("q1", 0)).unwrap();
        db.create_completed_quiz(&completed("c1", "Bob", "q1")).unwrap();

        let quiz_owner = Owner::Quiz("q1");
        db.insert_answer(quiz_owner, 3, &answers(&[0])).unwrap();
        db.insert_answer(quiz_owner, 0, &answers(&[2, 1])).unwrap();
        db.insert_answer(quiz_owner, 2, &answers(&[1])).unwrap();

        // The same question index may be answered by another owner
        db.insert_answer(Owner::CompletedQuiz("c1"), 3, &answers(&[1]))
            .unwrap();

        assert_eq!(db.answer_count(quiz_owner).unwrap(), 3);
        assert_eq!(
            db.answered_question_indices(quiz_owner).unwrap(),
            vec![0, 2, 3]
        );

        let rows = db.answers(quiz_owner).unwrap();
        assert_eq!(rows[0].question_index, 0);
        assert_eq!(rows[0].answer_indices, answers(&[1, 2]));
        assert_eq!(db.answer_count(Owner::CompletedQuiz("c1")).unwrap(), 1);
    }

    #[test]
    fn test_current_question_index_update() {
        let db = Database::open_in_memory().unwrap();
        db.create_quiz(&quiz("q1", 0)).unwrap();
        db.create_completed_quiz(&completed("c1", "Bob", "q1")).unwrap();

        db.set_current_question_index(Owner::Quiz("q1"), 2).unwrap();
        db.set_current_question_index(Owner::CompletedQuiz("c1"), 5)
            .unwrap();

        assert_eq!(db.get_quiz("q1").unwrap().current_question_index, 2);
        assert_eq!(
            db.get_completed_quiz("c1").unwrap().current_question_index,
            5
        );
    }

    #[test]
    fn test_finished_completed_quizzes() {
        let db = Database::open_in_memory().unwrap();
        db.create_quiz(&quiz("q1", 0)).unwrap();

        for (id, friend) in [("c1", "Zoe"), ("c2", "Bob"), ("c3", "Max")] {
            db.create_completed_quiz(&completed(id, friend, "q1")).unwrap();
        }
        for i in 0..2 {
            db.insert_answer(Owner::CompletedQuiz("c1"), i, &answers(&[0]))
                .unwrap();
            db.insert_answer(Owner::CompletedQuiz("c2"), i, &answers(&[0]))
                .unwrap();
        }
        db.insert_answer(Owner::CompletedQuiz("c3"), 0, &answers(&[0]))
            .unwrap();

        let finished = db.finished_completed_quizzes("q1", 2).unwrap();
        let names: Vec<_> = finished.iter().map(|c| c.friend_name.as_str()).collect();
        assert_eq!(names, vec!["Bob", "Zoe"]);
    }

    #[test]
    fn test_delete_cascades_to_attempts_and_answers() {
        let db = Database::open_in_memory().unwrap();
        db.create_quiz(&quiz("old", 1_000)).unwrap();
        db.create_quiz(&quiz("new", 5_000)).unwrap();
        db.create_completed_quiz(&completed("c-old", "Bob", "old"))
            .unwrap();
        db.create_completed_quiz(&completed("c-new", "Bob", "new"))
            .unwrap();

        for owner in [
            Owner::Quiz("old"),
            Owner::Quiz("new"),
            Owner::CompletedQuiz("c-old"),
            Owner::CompletedQuiz("c-new"),
        ] {
            db.insert_answer(owner, 0, &answers(&[1])).unwrap();
        }

        assert_eq!(db.delete_quizzes_created_before(2_000).unwrap(), 1);

        assert!(matches!(db.get_quiz("old"), Err(DbError::NotFound { .. })));
        assert!(matches!(
            db.get_completed_quiz("c-old"),
            Err(DbError::NotFound { .. })
        ));
        assert!(db.get_quiz("new").is_ok());
        assert_eq!(row_count(&db, "QuestionAnswer"), 2);
        assert_eq!(row_count(&db, "QuizQuestionAnswer"), 1);
        assert_eq!(row_count(&db, "CompletedQuizQuestionAnswer"), 1);

        // Second run has nothing left to do
        assert_eq!(db.delete_quizzes_created_before(2_000).unwrap(), 0);
    }

    #[test]
    fn test_on_disk_database_survives_reopen_and_reset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("palquiz.db");

        {
            let db = Database::open(&path).unwrap();
            db.create_quiz(&quiz("q1", 0)).unwrap();
        }

        let db = Database::open(&path).unwrap();
        assert!(db.get_quiz("q1").is_ok());

        db.reset().unwrap();
        assert!(matches!(db.get_quiz("q1"), Err(DbError::NotFound { .. })));
    }

    #[test]
    fn test_corrupt_sequence_column() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO Quiz (Id, PublicId, CreatorName, ShuffledQuestionIndices, CreationTimeStamp)
                 VALUES ('q1', 'p1', 'Alice', '1,2,3', 0)",
                [],
            )?;
            Ok(())
        })
        .unwrap();

        assert!(matches!(
            db.get_quiz("q1"),
            Err(DbError::Corrupt {
                column: "ShuffledQuestionIndices",
                ..
            })
        ));
    }
}
