// models.rs
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Longest text accepted for a question or a choice.
pub const MAX_TEXT_LEN: usize = 200;

/// Vote counts are stored in a Postgres `INTEGER` column.
pub const MAX_VOTES: u32 = i32::MAX as u32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Question {
    pub id: i64,
    pub question_text: String,
    pub pub_date: DateTime<Utc>,
}

impl Question {
    /// A question is visible to voters once its publication date has passed.
    pub fn is_published_at(&self, now: DateTime<Utc>) -> bool {
        self.pub_date <= now
    }

    /// True when the question went live within the day leading up to `now`.
    /// Future-dated questions are never "recent".
    pub fn was_published_recently_at(&self, now: DateTime<Utc>) -> bool {
        now - Duration::days(1) <= self.pub_date && self.pub_date <= now
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Choice {
    pub id: i64,
    pub question_id: i64,
    pub choice_text: String,
    #[sqlx(try_from = "i32")]
    pub votes: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewQuestion {
    pub question_text: String,
    pub pub_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewChoice {
    pub choice_text: String,
    pub votes: u32,
}

impl NewChoice {
    pub fn new(choice_text: impl Into<String>) -> Self {
        Self {
            choice_text: choice_text.into(),
            votes: 0,
        }
    }
}

/// One edit to the choices of a question, saved together with the question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChoiceChange {
    Create(NewChoice),
    Update(i64, NewChoice),
    Delete(i64),
}
