use rusqlite::ffi;

pub type Result<T, E = DbError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("could not find {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("question {question_index} has already been answered")]
    DuplicateAnswer { question_index: u32 },

    #[error("no more than {limit} answers can be recorded")]
    AnswerLimit { limit: usize },

    #[error("identifier collision while creating {0}")]
    DuplicateId(&'static str),

    #[error("corrupt {column} value {value:?}: {source}")]
    Corrupt {
        column: &'static str,
        value: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("storage error: {source}")]
    Storage {
        /// SQLite extended result code, when the fault came from the engine.
        code: Option<i32>,
        #[source]
        source: rusqlite::Error,
    },

    #[error("DB lock poisoned: {0}")]
    LockPoisoned(String),
}

impl DbError {
    pub fn not_found(entity: &'static str, id: &str) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn code(&self) -> Option<i32> {
        match self {
            Self::Storage { code, .. } => *code,
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(source: rusqlite::Error) -> Self {
        Self::Storage {
            code: source.sqlite_error().map(|e| e.extended_code),
            source,
        }
    }
}

pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err.sqlite_error().map(|e| e.extended_code),
        Some(ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY)
    )
}

pub(crate) fn is_foreign_key_violation(err: &rusqlite::Error) -> bool {
    err.sqlite_error().map(|e| e.extended_code) == Some(ffi::SQLITE_CONSTRAINT_FOREIGNKEY)
}
