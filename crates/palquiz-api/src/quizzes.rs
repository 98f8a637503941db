use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use palquiz_engine::{Owner, QuizEngine};
use palquiz_types::QUIZ_LENGTH;
use palquiz_types::api::{
    AttemptResult, CreateQuizRequest, CreateQuizResponse, QuestionView, QuizStatus,
    SubmitAnswerRequest,
};

use crate::error::ApiError;
use crate::{AppState, run_blocking};

pub async fn create_quiz(
    State(state): State<AppState>,
    Json(req): Json<CreateQuizRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let quiz = run_blocking(&state, move |engine| engine.create_quiz(&req.creator_name)).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateQuizResponse {
            quiz_id: quiz.id,
            public_id: quiz.public_id,
        }),
    ))
}

pub async fn get_quiz(
    State(state): State<AppState>,
    Path(quiz_id): Path<String>,
) -> Result<Json<QuizStatus>, ApiError> {
    let status = run_blocking(&state, move |engine| quiz_status(engine, &quiz_id)).await?;
    Ok(Json(status))
}

pub async fn submit_answer(
    State(state): State<AppState>,
    Path(quiz_id): Path<String>,
    Json(req): Json<SubmitAnswerRequest>,
) -> Result<Json<QuizStatus>, ApiError> {
    let status = run_blocking(&state, move |engine| {
        engine.submit_answer(Owner::Quiz(&quiz_id), req.question_index, &req.answers)?;
        quiz_status(engine, &quiz_id)
    })
    .await?;

    Ok(Json(status))
}

pub async fn skip_question(
    State(state): State<AppState>,
    Path(quiz_id): Path<String>,
) -> Result<Json<QuizStatus>, ApiError> {
    let status = run_blocking(&state, move |engine| {
        engine.advance(Owner::Quiz(&quiz_id))?;
        quiz_status(engine, &quiz_id)
    })
    .await?;

    Ok(Json(status))
}

/// Scores of every friend who finished the quiz.
pub async fn get_results(
    State(state): State<AppState>,
    Path(quiz_id): Path<String>,
) -> Result<Json<Vec<AttemptResult>>, ApiError> {
    let results = run_blocking(&state, move |engine| engine.quiz_results(&quiz_id)).await?;

    Ok(Json(
        results
            .into_iter()
            .map(|r| AttemptResult {
                attempt_id: r.completed_quiz_id,
                friend_name: r.friend_name,
                score: r.score,
            })
            .collect(),
    ))
}

fn quiz_status(engine: &QuizEngine, quiz_id: &str) -> palquiz_engine::Result<QuizStatus> {
    let overview = engine.quiz_overview(quiz_id)?;
    let current = overview.current_question.and_then(|index| {
        engine
            .bank()
            .get(index)
            .map(|question| QuestionView::new(index, question, false))
    });

    Ok(QuizStatus {
        quiz_id: overview.id,
        public_id: overview.public_id,
        creator_name: overview.creator_name,
        answered: overview.answered,
        total: QUIZ_LENGTH,
        current,
    })
}
