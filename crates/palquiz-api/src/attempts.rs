use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use palquiz_engine::{Owner, QuizEngine};
use palquiz_types::QUIZ_LENGTH;
use palquiz_types::api::{
    AttemptStatus, CreateAttemptRequest, CreateAttemptResponse, QuestionView, ScoreResponse,
    ShareInfo, SubmitAnswerRequest,
};

use crate::error::ApiError;
use crate::{AppState, run_blocking};

/// What a friend sees when opening a shared link.
pub async fn get_share_info(
    State(state): State<AppState>,
    Path(public_id): Path<String>,
) -> Result<Json<ShareInfo>, ApiError> {
    let overview = run_blocking(&state, move |engine| {
        let quiz_id = engine.resolve_public_id(&public_id)?;
        engine.quiz_overview(&quiz_id)
    })
    .await?;

    Ok(Json(ShareInfo {
        ready: overview.is_ready(),
        creator_name: overview.creator_name,
    }))
}

pub async fn create_attempt(
    State(state): State<AppState>,
    Path(public_id): Path<String>,
    Json(req): Json<CreateAttemptRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let attempt_id = run_blocking(&state, move |engine| {
        let quiz_id = engine.resolve_public_id(&public_id)?;
        engine.create_completed_quiz(&req.friend_name, &quiz_id)
    })
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateAttemptResponse { attempt_id }),
    ))
}

pub async fn get_attempt(
    State(state): State<AppState>,
    Path(attempt_id): Path<String>,
) -> Result<Json<AttemptStatus>, ApiError> {
    let status = run_blocking(&state, move |engine| attempt_status(engine, &attempt_id)).await?;
    Ok(Json(status))
}

pub async fn submit_answer(
    State(state): State<AppState>,
    Path(attempt_id): Path<String>,
    Json(req): Json<SubmitAnswerRequest>,
) -> Result<Json<AttemptStatus>, ApiError> {
    let status = run_blocking(&state, move |engine| {
        engine.submit_answer(
            Owner::CompletedQuiz(&attempt_id),
            req.question_index,
            &req.answers,
        )?;
        attempt_status(engine, &attempt_id)
    })
    .await?;

    Ok(Json(status))
}

pub async fn skip_question(
    State(state): State<AppState>,
    Path(attempt_id): Path<String>,
) -> Result<Json<AttemptStatus>, ApiError> {
    let status = run_blocking(&state, move |engine| {
        engine.advance(Owner::CompletedQuiz(&attempt_id))?;
        attempt_status(engine, &attempt_id)
    })
    .await?;

    Ok(Json(status))
}

pub async fn get_score(
    State(state): State<AppState>,
    Path(attempt_id): Path<String>,
) -> Result<Json<ScoreResponse>, ApiError> {
    let (overview, score) = run_blocking(&state, move |engine| {
        let overview = engine.completed_quiz_overview(&attempt_id)?;
        let score = engine.score(&attempt_id)?;
        Ok((overview, score))
    })
    .await?;

    Ok(Json(ScoreResponse {
        friend_name: overview.friend_name,
        creator_name: overview.creator_name,
        // Displayed as a whole percentage
        score: score as u32,
    }))
}

fn attempt_status(engine: &QuizEngine, attempt_id: &str) -> palquiz_engine::Result<AttemptStatus> {
    let overview = engine.completed_quiz_overview(attempt_id)?;
    let current = overview.current_question.and_then(|index| {
        engine
            .bank()
            .get(index)
            .map(|question| QuestionView::new(index, question, true))
    });

    Ok(AttemptStatus {
        attempt_id: overview.id,
        friend_name: overview.friend_name,
        creator_name: overview.creator_name,
        answered: overview.answered,
        total: QUIZ_LENGTH,
        current,
    })
}
