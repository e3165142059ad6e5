//! Back-office pages for managing questions and their choices.
//!
//! What the pages show is driven by an [`AdminSite`] handed to the router at
//! bootstrap. There is no global registry.
use axum::{
    response::Redirect,
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::Serialize;

use crate::{models::Question, query::QuestionQuery, state::AppState, store::Store};

pub mod forms;
pub mod handlers;
pub mod render;

pub const CHANGELIST: &str = "/admin/polls/question/";
const ADD: &str = "/admin/polls/question/add/";
const CHANGE: &str = "/admin/polls/question/{question_id}/change/";
const DELETE: &str = "/admin/polls/question/{question_id}/delete/";

pub fn changelist_url() -> String {
    CHANGELIST.to_string()
}

pub fn add_url() -> String {
    ADD.to_string()
}

pub fn change_url(question_id: i64) -> String {
    format!("/admin/polls/question/{question_id}/change/")
}

pub fn delete_url(question_id: i64) -> String {
    format!("/admin/polls/question/{question_id}/delete/")
}

pub fn routes<S: Store>() -> Router<AppState<S>> {
    Router::new()
        .route("/admin/", get(|| async { Redirect::to(CHANGELIST) }))
        .route(CHANGELIST, get(handlers::changelist::<S>))
        .route(ADD, get(handlers::add_form::<S>).post(handlers::add::<S>))
        .route(CHANGE, get(handlers::change_form::<S>).post(handlers::change::<S>))
        .route(DELETE, post(handlers::delete::<S>))
}

#[derive(Debug, Clone, Default)]
pub struct AdminSite {
    pub questions: QuestionAdmin,
}

#[derive(Debug, Clone)]
pub struct QuestionAdmin {
    pub list_display: Vec<ListColumn>,
    pub fieldsets: Vec<Fieldset>,
    pub inline: ChoiceInline,
    pub list_filter: Vec<ListFilter>,
}

impl Default for QuestionAdmin {
    fn default() -> Self {
        Self {
            list_display: vec![
                ListColumn::QuestionText,
                ListColumn::PubDate,
                ListColumn::WasPublishedRecently,
            ],
            fieldsets: vec![
                Fieldset {
                    name: None,
                    fields: vec![Field::QuestionText],
                    collapse: false,
                },
                Fieldset {
                    name: Some("Date information".to_string()),
                    fields: vec![Field::PubDate],
                    collapse: true,
                },
            ],
            inline: ChoiceInline { extra: 3 },
            list_filter: vec![ListFilter::PubDate],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ListColumn {
    QuestionText,
    PubDate,
    WasPublishedRecently,
}

impl ListColumn {
    pub fn header(self) -> &'static str {
        match self {
            ListColumn::QuestionText => "Question text",
            ListColumn::PubDate => "Date published",
            ListColumn::WasPublishedRecently => "Published recently?",
        }
    }

    pub fn cell(self, question: &Question, now: DateTime<Utc>) -> String {
        match self {
            ListColumn::QuestionText => question.question_text.clone(),
            ListColumn::PubDate => question.pub_date.format("%b %-d, %Y, %H:%M").to_string(),
            ListColumn::WasPublishedRecently => match question.was_published_recently_at(now) {
                true => "True".to_string(),
                false => "False".to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Field {
    QuestionText,
    PubDate,
}

impl Field {
    pub fn label(self) -> &'static str {
        match self {
            Field::QuestionText => "Question text",
            Field::PubDate => "Date published",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fieldset {
    pub name: Option<String>,
    pub fields: Vec<Field>,
    /// Rendered folded until the user expands it.
    pub collapse: bool,
}

/// Choices edited as table rows under their question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChoiceInline {
    /// Blank rows offered for new choices.
    pub extra: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ListFilter {
    PubDate,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum DateFilter {
    #[default]
    Any,
    Today,
    Past7Days,
    ThisMonth,
    ThisYear,
}

impl DateFilter {
    pub const ALL: [DateFilter; 5] = [
        DateFilter::Any,
        DateFilter::Today,
        DateFilter::Past7Days,
        DateFilter::ThisMonth,
        DateFilter::ThisYear,
    ];

    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("today") => DateFilter::Today,
            Some("past_7_days") => DateFilter::Past7Days,
            Some("this_month") => DateFilter::ThisMonth,
            Some("this_year") => DateFilter::ThisYear,
            _ => DateFilter::Any,
        }
    }

    pub fn param(self) -> Option<&'static str> {
        match self {
            DateFilter::Any => None,
            DateFilter::Today => Some("today"),
            DateFilter::Past7Days => Some("past_7_days"),
            DateFilter::ThisMonth => Some("this_month"),
            DateFilter::ThisYear => Some("this_year"),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DateFilter::Any => "Any date",
            DateFilter::Today => "Today",
            DateFilter::Past7Days => "Past 7 days",
            DateFilter::ThisMonth => "This month",
            DateFilter::ThisYear => "This year",
        }
    }

    /// Half-open `[start, end)` window in UTC, `None` for no restriction.
    pub fn window(self, now: DateTime<Utc>) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let today = now.date_naive();
        let tomorrow = midnight(today + Duration::days(1));
        match self {
            DateFilter::Any => None,
            DateFilter::Today => Some((midnight(today), tomorrow)),
            DateFilter::Past7Days => Some((midnight(today - Duration::days(7)), tomorrow)),
            DateFilter::ThisMonth => {
                let first = today.with_day(1)?;
                let next = match first.month() {
                    12 => NaiveDate::from_ymd_opt(first.year() + 1, 1, 1)?,
                    month => NaiveDate::from_ymd_opt(first.year(), month + 1, 1)?,
                };
                Some((midnight(first), midnight(next)))
            }
            DateFilter::ThisYear => {
                let first = NaiveDate::from_ymd_opt(today.year(), 1, 1)?;
                let next = NaiveDate::from_ymd_opt(today.year() + 1, 1, 1)?;
                Some((midnight(first), midnight(next)))
            }
        }
    }

    pub fn apply(self, query: QuestionQuery, now: DateTime<Utc>) -> QuestionQuery {
        match self.window(now) {
            Some((start, end)) => query.published_on_or_after(start).published_before(end),
            None => query,
        }
    }
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}
