// query.rs
//! Declarative question lookups.
//!
//! A [`QuestionQuery`] carries filters, an ordering and a limit. The in-memory
//! store evaluates it directly, the Postgres store turns it into SQL with
//! bound parameters.
use chrono::{DateTime, Utc};
use sqlx::{Postgres, QueryBuilder};

use crate::models::Question;

pub const QUESTION_COLUMNS: &str = "id, question_text, pub_date";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionFilter {
    Id(i64),
    PublishedAtOrBefore(DateTime<Utc>),
    PublishedOnOrAfter(DateTime<Utc>),
    PublishedBefore(DateTime<Utc>),
}

impl QuestionFilter {
    fn matches(&self, question: &Question) -> bool {
        match *self {
            QuestionFilter::Id(id) => question.id == id,
            QuestionFilter::PublishedAtOrBefore(at) => question.is_published_at(at),
            QuestionFilter::PublishedOnOrAfter(at) => question.pub_date >= at,
            QuestionFilter::PublishedBefore(at) => question.pub_date < at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionOrder {
    PubDateDesc,
}

impl QuestionOrder {
    fn sql(self) -> &'static str {
        match self {
            QuestionOrder::PubDateDesc => "pub_date DESC, id DESC",
        }
    }

    fn sort(self, questions: &mut [Question]) {
        match self {
            QuestionOrder::PubDateDesc => {
                questions.sort_by(|a, b| b.pub_date.cmp(&a.pub_date).then(b.id.cmp(&a.id)))
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionQuery {
    filters: Vec<QuestionFilter>,
    order: Option<QuestionOrder>,
    limit: Option<usize>,
}

impl QuestionQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(self, id: i64) -> Self {
        self.filter(QuestionFilter::Id(id))
    }

    pub fn published_at_or_before(self, at: DateTime<Utc>) -> Self {
        self.filter(QuestionFilter::PublishedAtOrBefore(at))
    }

    pub fn published_on_or_after(self, at: DateTime<Utc>) -> Self {
        self.filter(QuestionFilter::PublishedOnOrAfter(at))
    }

    pub fn published_before(self, at: DateTime<Utc>) -> Self {
        self.filter(QuestionFilter::PublishedBefore(at))
    }

    pub fn filter(mut self, filter: QuestionFilter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn order_by(mut self, order: QuestionOrder) -> Self {
        self.order = Some(order);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, question: &Question) -> bool {
        self.filters.iter().all(|f| f.matches(question))
    }

    /// Evaluates the query over an in-memory set of rows.
    pub fn apply<'a>(&self, rows: impl IntoIterator<Item = &'a Question>) -> Vec<Question> {
        let mut questions: Vec<Question> = rows
            .into_iter()
            .filter(|q| self.matches(q))
            .cloned()
            .collect();

        if let Some(order) = self.order {
            order.sort(&mut questions);
        }
        if let Some(limit) = self.limit {
            questions.truncate(limit);
        }

        questions
    }

    pub fn to_sql(&self) -> QueryBuilder<'static, Postgres> {
        let mut builder = QueryBuilder::new(format!("SELECT {QUESTION_COLUMNS} FROM polls_question"));

        let mut separator = " WHERE ";
        for filter in &self.filters {
            builder.push(separator);
            match *filter {
                QuestionFilter::Id(id) => builder.push("id = ").push_bind(id),
                QuestionFilter::PublishedAtOrBefore(at) => builder.push("pub_date <= ").push_bind(at),
                QuestionFilter::PublishedOnOrAfter(at) => builder.push("pub_date >= ").push_bind(at),
                QuestionFilter::PublishedBefore(at) => builder.push("pub_date < ").push_bind(at),
            };
            separator = " AND ";
        }

        if let Some(order) = self.order {
            builder.push(" ORDER BY ").push(order.sql());
        }
        if let Some(limit) = self.limit {
            builder.push(" LIMIT ").push_bind(i64::try_from(limit).unwrap_or(i64::MAX));
        }

        builder
    }
}
