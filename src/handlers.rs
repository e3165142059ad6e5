// handlers.rs
use axum::{
    extract::{rejection::FormRejection, rejection::PathRejection, Path, State},
    response::{IntoResponse, Redirect, Response},
    Form,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, info, instrument};

use crate::error::AppError;
use crate::models::Question;
use crate::query::{QuestionOrder, QuestionQuery};
use crate::render::{DetailContext, Format, IndexContext, Page, ResultsContext};
use crate::routes;
use crate::state::AppState;
use crate::store::Store;

/// How many questions the poll index shows.
pub const LATEST_QUESTIONS: usize = 5;

pub const NO_CHOICE_MESSAGE: &str = "You didn't make a choice.";

#[derive(Debug, Deserialize)]
pub struct VoteForm {
    pub choice: Option<String>,
}

/// Non-numeric ids cannot name a question, so they are a 404 rather than a bad request.
pub fn question_id(path: Result<Path<i64>, PathRejection>) -> Result<i64, AppError> {
    path.map(|Path(id)| id).map_err(|_| AppError::NotFound)
}

/// Loads a question that voters are allowed to see.
async fn published_question<S: Store>(store: &S, id: i64) -> Result<Question, AppError> {
    let query = QuestionQuery::new().id(id).published_at_or_before(Utc::now());
    store.question(&query).await?.ok_or(AppError::NotFound)
}

/// List the most recently published questions, skipping ones scheduled for the future.
#[instrument(skip_all)]
pub async fn index<S: Store>(
    State(state): State<AppState<S>>,
    format: Format,
) -> Result<Page<IndexContext>, AppError> {
    let query = QuestionQuery::new()
        .published_at_or_before(Utc::now())
        .order_by(QuestionOrder::PubDateDesc)
        .limit(LATEST_QUESTIONS);
    let latest_question_list = state.store.questions(&query).await?;

    debug!(count = latest_question_list.len(), "Listing questions");
    Ok(Page::new(format, IndexContext { latest_question_list }))
}

#[instrument(skip_all)]
pub async fn detail<S: Store>(
    State(state): State<AppState<S>>,
    path: Result<Path<i64>, PathRejection>,
    format: Format,
) -> Result<Page<DetailContext>, AppError> {
    let question = published_question(&state.store, question_id(path)?).await?;
    let choices = state.store.choices(question.id).await?;

    Ok(Page::new(
        format,
        DetailContext {
            question,
            choices,
            error_message: None,
        },
    ))
}

#[instrument(skip_all)]
pub async fn results<S: Store>(
    State(state): State<AppState<S>>,
    path: Result<Path<i64>, PathRejection>,
    format: Format,
) -> Result<Page<ResultsContext>, AppError> {
    let question = published_question(&state.store, question_id(path)?).await?;
    let choices = state.store.choices(question.id).await?;

    Ok(Page::new(format, ResultsContext { question, choices }))
}

/// Record a vote, then redirect so a page refresh cannot submit it twice.
#[instrument(skip_all)]
pub async fn vote<S: Store>(
    State(state): State<AppState<S>>,
    path: Result<Path<i64>, PathRejection>,
    format: Format,
    form: Result<Form<VoteForm>, FormRejection>,
) -> Result<Response, AppError> {
    let question = published_question(&state.store, question_id(path)?).await?;

    let choice_id = form
        .ok()
        .and_then(|Form(form)| form.choice)
        .and_then(|choice| choice.trim().parse::<i64>().ok());
    let selected = match choice_id {
        Some(choice_id) => state.store.choice(question.id, choice_id).await?,
        None => None,
    };

    let Some(selected) = selected else {
        debug!(question_id = question.id, "Vote without a valid choice");
        let choices = state.store.choices(question.id).await?;
        let context = DetailContext {
            question,
            choices,
            error_message: Some(NO_CHOICE_MESSAGE.to_string()),
        };
        return Ok(Page::new(format, context).into_response());
    };

    let choice = state.store.record_vote(selected.id).await?;
    info!(
        question_id = question.id,
        choice_id = choice.id,
        votes = choice.votes,
        "Vote recorded"
    );

    Ok(Redirect::to(&routes::results_url(question.id)).into_response())
}
