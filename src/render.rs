//! HTML pages for the poll views.
//!
//! Each page is built from a serializable context. Clients asking for
//! `application/json` get the context itself instead of the markup.
use std::{convert::Infallible, fmt::Write};

use axum::{
    extract::FromRequestParts,
    http::{header::ACCEPT, request::Parts, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::{
    models::{Choice, Question},
    routes,
};

pub const NO_POLLS_MESSAGE: &str = "No polls are available.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Html,
    Json,
}

impl<S: Send + Sync> FromRequestParts<S> for Format {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let wants_json = parts
            .headers
            .get(ACCEPT)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|accept| accept.contains("application/json"));

        Ok(if wants_json { Format::Json } else { Format::Html })
    }
}

pub trait Template: Serialize {
    fn title(&self) -> String;

    fn body(&self) -> String;
}

pub struct Page<C> {
    pub format: Format,
    pub context: C,
}

impl<C: Template> Page<C> {
    pub fn new(format: Format, context: C) -> Self {
        Self { format, context }
    }
}

impl<C: Template> IntoResponse for Page<C> {
    fn into_response(self) -> Response {
        match self.format {
            Format::Json => (StatusCode::OK, Json(self.context)).into_response(),
            Format::Html => {
                (StatusCode::OK, Html(layout(&self.context.title(), &self.context.body()))).into_response()
            }
        }
    }
}

/// Escapes text for element content and double-quoted attributes.
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

pub fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n</head>\n<body>\n{body}</body>\n</html>\n",
        escape(title)
    )
}

#[derive(Debug, Serialize)]
pub struct IndexContext {
    pub latest_question_list: Vec<Question>,
}

impl Template for IndexContext {
    fn title(&self) -> String {
        "Polls".to_string()
    }

    fn body(&self) -> String {
        if self.latest_question_list.is_empty() {
            return format!("<p>{NO_POLLS_MESSAGE}</p>\n");
        }

        let mut body = String::from("<ul>\n");
        for question in &self.latest_question_list {
            let _ = writeln!(
                body,
                "<li><a href=\"{}\">{}</a></li>",
                routes::detail_url(question.id),
                escape(&question.question_text)
            );
        }
        body.push_str("</ul>\n");
        body
    }
}

#[derive(Debug, Serialize)]
pub struct DetailContext {
    pub question: Question,
    pub choices: Vec<Choice>,
    pub error_message: Option<String>,
}

impl Template for DetailContext {
    fn title(&self) -> String {
        self.question.question_text.clone()
    }

    fn body(&self) -> String {
        let mut body = format!(
            "<form action=\"{}\" method=\"post\">\n<fieldset>\n<legend><h1>{}</h1></legend>\n",
            routes::vote_url(self.question.id),
            escape(&self.question.question_text)
        );
        if let Some(message) = &self.error_message {
            let _ = writeln!(body, "<p><strong>{}</strong></p>", escape(message));
        }
        for (counter, choice) in self.choices.iter().enumerate().map(|(i, c)| (i + 1, c)) {
            let _ = writeln!(
                body,
                "<input type=\"radio\" name=\"choice\" id=\"choice{counter}\" value=\"{}\">\n\
                 <label for=\"choice{counter}\">{}</label><br>",
                choice.id,
                escape(&choice.choice_text)
            );
        }
        body.push_str("</fieldset>\n<input type=\"submit\" value=\"Vote\">\n</form>\n");
        body
    }
}

#[derive(Debug, Serialize)]
pub struct ResultsContext {
    pub question: Question,
    pub choices: Vec<Choice>,
}

pub fn pluralize(count: u32, singular: &str) -> String {
    match count {
        1 => format!("{count} {singular}"),
        _ => format!("{count} {singular}s"),
    }
}

impl Template for ResultsContext {
    fn title(&self) -> String {
        self.question.question_text.clone()
    }

    fn body(&self) -> String {
        let mut body = format!("<h1>{}</h1>\n<ul>\n", escape(&self.question.question_text));
        for choice in &self.choices {
            let _ = writeln!(
                body,
                "<li>{} -- {}</li>",
                escape(&choice.choice_text),
                pluralize(choice.votes, "vote")
            );
        }
        let _ = writeln!(
            body,
            "</ul>\n<a href=\"{}\">Vote again?</a>",
            routes::detail_url(self.question.id)
        );
        body
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn question() -> Question {
        Question {
            id: 3,
            question_text: "Tabs <or> spaces?".to_string(),
            pub_date: Utc::now(),
        }
    }

    fn choice(id: i64, text: &str, votes: u32) -> Choice {
        Choice {
            id,
            question_id: 3,
            choice_text: text.to_string(),
            votes,
        }
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(escape("<b>\"A & B\"</b>"), "&lt;b&gt;&quot;A &amp; B&quot;&lt;/b&gt;");
        assert_eq!(escape("You didn't make a choice."), "You didn't make a choice.");
    }

    #[test]
    fn empty_index_says_so() {
        let context = IndexContext {
            latest_question_list: Vec::new(),
        };
        assert!(context.body().contains(NO_POLLS_MESSAGE));
    }

    #[test]
    fn index_links_to_detail_pages() {
        let context = IndexContext {
            latest_question_list: vec![question()],
        };
        let body = context.body();
        assert!(body.contains("<a href=\"/polls/3/\">Tabs &lt;or&gt; spaces?</a>"));
    }

    #[test]
    fn detail_form_posts_to_vote() {
        let context = DetailContext {
            question: question(),
            choices: vec![choice(7, "Tabs", 0), choice(8, "Spaces", 0)],
            error_message: None,
        };
        let body = context.body();
        assert!(body.contains("action=\"/polls/3/vote/\""));
        assert!(body.contains("id=\"choice2\" value=\"8\""));
        assert!(!body.contains("<strong>"));
    }

    #[test]
    fn results_pluralize_votes() {
        let context = ResultsContext {
            question: question(),
            choices: vec![choice(7, "Tabs", 1), choice(8, "Spaces", 2)],
        };
        let body = context.body();
        assert!(body.contains("Tabs -- 1 vote</li>"));
        assert!(body.contains("Spaces -- 2 votes</li>"));
        assert!(body.contains("<a href=\"/polls/3/\">Vote again?</a>"));
    }
}
