use std::{collections::HashSet, sync::Arc};

use axum::{
    extract::{rejection::PathRejection, Path, Query, State},
    response::{IntoResponse, Redirect, Response},
    Form,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::{info, instrument, warn};

use super::{
    changelist_url,
    forms::{CleanedQuestion, QuestionForm},
    render::{ChangeFormContext, ChangelistContext, ChangelistRow, FilterLink},
    AdminSite, DateFilter, ListFilter, QuestionAdmin, CHANGELIST,
};
use crate::{
    error::AppError,
    handlers::question_id,
    models::ChoiceChange,
    query::{QuestionOrder, QuestionQuery},
    render::{Format, Page},
    state::AppState,
    store::Store,
};

#[derive(Debug, Default, Deserialize)]
pub struct ChangelistParams {
    pub pub_date: Option<String>,
}

fn site<S>(state: &AppState<S>) -> Result<Arc<AdminSite>, AppError> {
    state.admin.clone().ok_or(AppError::NotFound)
}

fn filter_links(admin: &QuestionAdmin, selected: DateFilter) -> Vec<FilterLink> {
    if !admin.list_filter.contains(&ListFilter::PubDate) {
        return Vec::new();
    }
    DateFilter::ALL
        .into_iter()
        .map(|filter| FilterLink {
            label: filter.label(),
            href: match filter.param() {
                Some(param) => format!("{CHANGELIST}?pub_date={param}"),
                None => CHANGELIST.to_string(),
            },
            selected: filter == selected,
        })
        .collect()
}

fn form_page(
    format: Format,
    admin: &QuestionAdmin,
    question_id: Option<i64>,
    form: QuestionForm,
    errors: Vec<String>,
) -> Page<ChangeFormContext> {
    Page::new(
        format,
        ChangeFormContext {
            question_id,
            fieldsets: admin.fieldsets.clone(),
            form,
            errors,
        },
    )
}

#[instrument(skip_all)]
pub async fn changelist<S: Store>(
    State(state): State<AppState<S>>,
    Query(params): Query<ChangelistParams>,
    format: Format,
) -> Result<Page<ChangelistContext>, AppError> {
    let site = site(&state)?;
    let admin = &site.questions;
    let now = Utc::now();

    let selected = match admin.list_filter.contains(&ListFilter::PubDate) {
        true => DateFilter::parse(params.pub_date.as_deref()),
        false => DateFilter::Any,
    };
    let query = selected.apply(QuestionQuery::new().order_by(QuestionOrder::PubDateDesc), now);
    let questions = state.store.questions(&query).await?;

    let rows = questions
        .iter()
        .map(|question| ChangelistRow {
            id: question.id,
            cells: admin
                .list_display
                .iter()
                .map(|column| column.cell(question, now))
                .collect(),
        })
        .collect();

    Ok(Page::new(
        format,
        ChangelistContext {
            headers: admin.list_display.iter().map(|column| column.header()).collect(),
            rows,
            filters: filter_links(admin, selected),
        },
    ))
}

#[instrument(skip_all)]
pub async fn add_form<S: Store>(
    State(state): State<AppState<S>>,
    format: Format,
) -> Result<Page<ChangeFormContext>, AppError> {
    let site = site(&state)?;
    let admin = &site.questions;
    Ok(form_page(
        format,
        admin,
        None,
        QuestionForm::blank(admin.inline.extra),
        Vec::new(),
    ))
}

#[instrument(skip_all)]
pub async fn add<S: Store>(
    State(state): State<AppState<S>>,
    format: Format,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Response, AppError> {
    let site = site(&state)?;
    let admin = &site.questions;
    let form = QuestionForm::from_pairs(pairs);

    let cleaned = match form.validate() {
        Ok(cleaned) => cleaned,
        Err(errors) => {
            let form = form.with_extra(admin.inline.extra);
            return Ok(form_page(format, admin, None, form, errors).into_response());
        }
    };

    // Nothing exists yet, so only new choices make sense here.
    if let Some(errors) = unknown_choices(&cleaned, &HashSet::new()) {
        let form = form.with_extra(admin.inline.extra);
        return Ok(form_page(format, admin, None, form, errors).into_response());
    }

    let question = state
        .store
        .save_question(None, cleaned.question, cleaned.choices)
        .await?;
    info!(question_id = question.id, "Question added");

    Ok(Redirect::to(&changelist_url()).into_response())
}

#[instrument(skip_all)]
pub async fn change_form<S: Store>(
    State(state): State<AppState<S>>,
    path: Result<Path<i64>, PathRejection>,
    format: Format,
) -> Result<Page<ChangeFormContext>, AppError> {
    let site = site(&state)?;
    let admin = &site.questions;
    let id = question_id(path)?;

    let question = state
        .store
        .question(&QuestionQuery::new().id(id))
        .await?
        .ok_or(AppError::NotFound)?;
    let choices = state.store.choices(question.id).await?;

    let form = QuestionForm::from_question(&question, &choices, admin.inline.extra);
    Ok(form_page(format, admin, Some(question.id), form, Vec::new()))
}

#[instrument(skip_all)]
pub async fn change<S: Store>(
    State(state): State<AppState<S>>,
    path: Result<Path<i64>, PathRejection>,
    format: Format,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Response, AppError> {
    let site = site(&state)?;
    let admin = &site.questions;
    let id = question_id(path)?;

    let question = state
        .store
        .question(&QuestionQuery::new().id(id))
        .await?
        .ok_or(AppError::NotFound)?;
    let form = QuestionForm::from_pairs(pairs);

    let cleaned = match form.validate() {
        Ok(cleaned) => cleaned,
        Err(errors) => {
            let form = form.with_extra(admin.inline.extra);
            return Ok(form_page(format, admin, Some(question.id), form, errors).into_response());
        }
    };

    let owned: HashSet<i64> = state
        .store
        .choices(question.id)
        .await?
        .into_iter()
        .map(|choice| choice.id)
        .collect();
    if let Some(errors) = unknown_choices(&cleaned, &owned) {
        let form = form.with_extra(admin.inline.extra);
        return Ok(form_page(format, admin, Some(question.id), form, errors).into_response());
    }

    state
        .store
        .save_question(Some(question.id), cleaned.question, cleaned.choices)
        .await?;
    info!(question_id = question.id, "Question changed");

    Ok(Redirect::to(&changelist_url()).into_response())
}

#[instrument(skip_all)]
pub async fn delete<S: Store>(
    State(state): State<AppState<S>>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Response, AppError> {
    site(&state)?;
    let id = question_id(path)?;

    state.store.delete_question(id).await?;
    info!(question_id = id, "Question deleted");

    Ok(Redirect::to(&changelist_url()).into_response())
}

/// Rows may only touch choices that belong to the question being edited.
fn unknown_choices(cleaned: &CleanedQuestion, owned: &HashSet<i64>) -> Option<Vec<String>> {
    let errors: Vec<String> = cleaned
        .choices
        .iter()
        .filter_map(|change| match change {
            ChoiceChange::Update(id, _) | ChoiceChange::Delete(id) if !owned.contains(id) => {
                Some(format!("Choice {id} does not belong to this question."))
            }
            _ => None,
        })
        .collect();

    if errors.is_empty() {
        None
    } else {
        warn!(count = errors.len(), "Rejected foreign choice rows");
        Some(errors)
    }
}
