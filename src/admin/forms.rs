//! Parsing and validation of the question change form.
//!
//! Inline choice rows arrive as `choice_set-{n}-{field}` pairs, mirroring the
//! names the change form renders.
use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;

use crate::models::{Choice, ChoiceChange, NewChoice, NewQuestion, Question, MAX_TEXT_LEN};

pub const INLINE_PREFIX: &str = "choice_set";
const INPUT_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
const NAIVE_DATE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Raw submitted values, kept as text so an invalid form can be shown again.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QuestionForm {
    pub question_text: String,
    pub pub_date: String,
    pub choices: Vec<ChoiceRow>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChoiceRow {
    pub id: Option<i64>,
    pub choice_text: String,
    pub votes: String,
    pub delete: bool,
}

impl ChoiceRow {
    fn blank() -> Self {
        Self {
            votes: "0".to_string(),
            ..Self::default()
        }
    }

    fn is_untouched(&self) -> bool {
        self.id.is_none() && self.choice_text.trim().is_empty() && matches!(self.votes.trim(), "" | "0")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanedQuestion {
    pub question: NewQuestion,
    pub choices: Vec<ChoiceChange>,
}

impl QuestionForm {
    pub fn blank(extra: usize) -> Self {
        Self {
            question_text: String::new(),
            pub_date: Utc::now().format(INPUT_DATE_FORMAT).to_string(),
            choices: vec![ChoiceRow::blank(); extra],
        }
    }

    pub fn from_question(question: &Question, choices: &[Choice], extra: usize) -> Self {
        let mut rows: Vec<ChoiceRow> = choices
            .iter()
            .map(|choice| ChoiceRow {
                id: Some(choice.id),
                choice_text: choice.choice_text.clone(),
                votes: choice.votes.to_string(),
                delete: false,
            })
            .collect();
        rows.extend(std::iter::repeat(ChoiceRow::blank()).take(extra));

        Self {
            question_text: question.question_text.clone(),
            pub_date: question.pub_date.format(INPUT_DATE_FORMAT).to_string(),
            choices: rows,
        }
    }

    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut form = Self::default();
        let mut rows: BTreeMap<usize, ChoiceRow> = BTreeMap::new();

        for (key, value) in pairs {
            match key.as_str() {
                "question_text" => form.question_text = value,
                "pub_date" => form.pub_date = value,
                _ => {
                    let Some((index, field)) = inline_field(&key) else {
                        continue;
                    };
                    let row = rows.entry(index).or_default();
                    match field {
                        "id" => row.id = value.trim().parse().ok(),
                        "choice_text" => row.choice_text = value,
                        "votes" => row.votes = value,
                        "DELETE" => row.delete = matches!(value.as_str(), "on" | "true" | "1"),
                        _ => {}
                    }
                }
            }
        }

        form.choices = rows.into_values().collect();
        form
    }

    /// Pads the form with blank rows so it can be re-rendered.
    pub fn with_extra(mut self, extra: usize) -> Self {
        let untouched = self.choices.iter().filter(|row| row.is_untouched()).count();
        self.choices
            .extend(std::iter::repeat(ChoiceRow::blank()).take(extra.saturating_sub(untouched)));
        self
    }

    pub fn validate(&self) -> Result<CleanedQuestion, Vec<String>> {
        let mut errors = Vec::new();

        let question_text = match clean_text(&self.question_text) {
            Ok(text) => text,
            Err(e) => {
                errors.push(format!("Question text: {e}"));
                String::new()
            }
        };

        let pub_date = match parse_pub_date(&self.pub_date) {
            Some(date) => date,
            None => {
                errors.push("Date published: Enter a valid date/time.".to_string());
                Utc::now()
            }
        };

        let mut choices = Vec::new();
        let mut seen = HashSet::new();
        for (number, row) in self.choices.iter().enumerate().map(|(i, row)| (i + 1, row)) {
            if row.is_untouched() {
                continue;
            }
            if let Some(id) = row.id {
                if !seen.insert(id) {
                    errors.push(format!("Choice {number}: Choice {id} appears more than once."));
                    continue;
                }
            }
            if let (Some(id), true) = (row.id, row.delete) {
                choices.push(ChoiceChange::Delete(id));
                continue;
            }

            let choice_text = clean_text(&row.choice_text)
                .map_err(|e| errors.push(format!("Choice {number}: {e}")))
                .ok();
            let votes = clean_votes(&row.votes)
                .map_err(|e| errors.push(format!("Choice {number}: {e}")))
                .ok();

            if let (Some(choice_text), Some(votes)) = (choice_text, votes) {
                let choice = NewChoice { choice_text, votes };
                choices.push(match row.id {
                    Some(id) => ChoiceChange::Update(id, choice),
                    None => ChoiceChange::Create(choice),
                });
            }
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(CleanedQuestion {
            question: NewQuestion {
                question_text,
                pub_date,
            },
            choices,
        })
    }
}

fn inline_field(key: &str) -> Option<(usize, &str)> {
    let rest = key.strip_prefix(INLINE_PREFIX)?.strip_prefix('-')?;
    let (index, field) = rest.split_once('-')?;
    Some((index.parse().ok()?, field))
}

fn clean_text(text: &str) -> Result<String, String> {
    let text = text.trim();
    if text.is_empty() {
        return Err("This field is required.".to_string());
    }
    let length = text.chars().count();
    if length > MAX_TEXT_LEN {
        return Err(format!(
            "Ensure this value has at most {MAX_TEXT_LEN} characters (it has {length})."
        ));
    }
    Ok(text.to_string())
}

fn clean_votes(votes: &str) -> Result<u32, String> {
    let votes = votes.trim();
    if votes.is_empty() {
        return Ok(0);
    }
    match votes.parse::<i32>() {
        Ok(count) if count >= 0 => Ok(count.unsigned_abs()),
        Ok(_) => Err("Votes must not be negative.".to_string()),
        Err(_) => Err("Enter a whole number of votes.".to_string()),
    }
}

/// Accepts RFC 3339 or a naive `datetime-local` value taken as UTC.
pub fn parse_pub_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(date) = DateTime::parse_from_rfc3339(value) {
        return Some(date.with_timezone(&Utc));
    }
    NAIVE_DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|date| date.and_utc())
}
