use std::fmt::Write;

use serde::Serialize;

use super::{
    add_url, changelist_url, delete_url,
    forms::{QuestionForm, INLINE_PREFIX},
    Field, Fieldset,
};
use crate::render::{escape, Template};
use crate::routes;

#[derive(Debug, Serialize)]
pub struct FilterLink {
    pub label: &'static str,
    pub href: String,
    pub selected: bool,
}

#[derive(Debug, Serialize)]
pub struct ChangelistRow {
    pub id: i64,
    pub cells: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ChangelistContext {
    pub headers: Vec<&'static str>,
    pub rows: Vec<ChangelistRow>,
    pub filters: Vec<FilterLink>,
}

impl Template for ChangelistContext {
    fn title(&self) -> String {
        "Select question to change".to_string()
    }

    fn body(&self) -> String {
        let mut body = format!(
            "<h1>Select question to change</h1>\n<p><a href=\"{}\">Add question</a> | <a href=\"{}\">View site</a></p>\n",
            add_url(),
            routes::index_url()
        );

        if !self.filters.is_empty() {
            body.push_str("<nav id=\"changelist-filter\">\n<h2>Filter</h2>\n<h3>By date published</h3>\n<ul>\n");
            for filter in &self.filters {
                let class = if filter.selected { " class=\"selected\"" } else { "" };
                let _ = writeln!(
                    body,
                    "<li{class}><a href=\"{}\">{}</a></li>",
                    escape(&filter.href),
                    filter.label
                );
            }
            body.push_str("</ul>\n</nav>\n");
        }

        body.push_str("<table id=\"result_list\">\n<thead>\n<tr>");
        for header in &self.headers {
            let _ = write!(body, "<th>{header}</th>");
        }
        body.push_str("</tr>\n</thead>\n<tbody>\n");
        for row in &self.rows {
            body.push_str("<tr>");
            for (column, cell) in row.cells.iter().enumerate() {
                match column {
                    0 => {
                        let _ = write!(
                            body,
                            "<th><a href=\"{}\">{}</a></th>",
                            super::change_url(row.id),
                            escape(cell)
                        );
                    }
                    _ => {
                        let _ = write!(body, "<td>{}</td>", escape(cell));
                    }
                }
            }
            body.push_str("</tr>\n");
        }
        body.push_str("</tbody>\n</table>\n");

        let _ = writeln!(
            body,
            "<p class=\"paginator\">{}</p>",
            match self.rows.len() {
                1 => "1 question".to_string(),
                n => format!("{n} questions"),
            }
        );
        body
    }
}

#[derive(Debug, Serialize)]
pub struct ChangeFormContext {
    pub question_id: Option<i64>,
    pub fieldsets: Vec<Fieldset>,
    pub form: QuestionForm,
    pub errors: Vec<String>,
}

impl ChangeFormContext {
    fn action(&self) -> String {
        match self.question_id {
            Some(id) => super::change_url(id),
            None => add_url(),
        }
    }

    fn field_input(&self, field: Field) -> String {
        match field {
            Field::QuestionText => format!(
                "<input type=\"text\" name=\"question_text\" id=\"id_question_text\" maxlength=\"200\" value=\"{}\">",
                escape(&self.form.question_text)
            ),
            Field::PubDate => format!(
                "<input type=\"datetime-local\" step=\"1\" name=\"pub_date\" id=\"id_pub_date\" value=\"{}\">",
                escape(&self.form.pub_date)
            ),
        }
    }

    fn fieldset(&self, fieldset: &Fieldset) -> String {
        let mut html = String::new();
        for field in &fieldset.fields {
            let _ = writeln!(
                html,
                "<div class=\"form-row\"><label for=\"id_{}\">{}:</label> {}</div>",
                match field {
                    Field::QuestionText => "question_text",
                    Field::PubDate => "pub_date",
                },
                field.label(),
                self.field_input(*field)
            );
        }

        match (&fieldset.name, fieldset.collapse) {
            (Some(name), true) => format!(
                "<fieldset class=\"module collapse\">\n<details>\n<summary>{}</summary>\n{html}</details>\n</fieldset>\n",
                escape(name)
            ),
            (Some(name), false) => {
                format!("<fieldset class=\"module\">\n<h2>{}</h2>\n{html}</fieldset>\n", escape(name))
            }
            (None, _) => format!("<fieldset class=\"module\">\n{html}</fieldset>\n"),
        }
    }

    fn inline(&self) -> String {
        let mut html = String::from(
            "<fieldset class=\"module inline-tabular\">\n<h2>Choices</h2>\n<table>\n\
             <thead><tr><th>Choice text</th><th>Votes</th><th>Delete?</th></tr></thead>\n<tbody>\n",
        );
        for (index, row) in self.form.choices.iter().enumerate() {
            let prefix = format!("{INLINE_PREFIX}-{index}");
            html.push_str("<tr>");
            if let Some(id) = row.id {
                let _ = write!(html, "<input type=\"hidden\" name=\"{prefix}-id\" value=\"{id}\">");
            }
            let _ = write!(
                html,
                "<td><input type=\"text\" name=\"{prefix}-choice_text\" maxlength=\"200\" value=\"{}\"></td>\
                 <td><input type=\"number\" min=\"0\" name=\"{prefix}-votes\" value=\"{}\"></td>",
                escape(&row.choice_text),
                escape(&row.votes)
            );
            match row.id {
                Some(_) => {
                    let checked = if row.delete { " checked" } else { "" };
                    let _ = write!(html, "<td><input type=\"checkbox\" name=\"{prefix}-DELETE\"{checked}></td>");
                }
                None => html.push_str("<td></td>"),
            }
            html.push_str("</tr>\n");
        }
        html.push_str("</tbody>\n</table>\n</fieldset>\n");
        html
    }
}

impl Template for ChangeFormContext {
    fn title(&self) -> String {
        match self.question_id {
            Some(_) => "Change question".to_string(),
            None => "Add question".to_string(),
        }
    }

    fn body(&self) -> String {
        let mut body = format!("<h1>{}</h1>\n", self.title());

        if !self.errors.is_empty() {
            body.push_str("<p class=\"errornote\">Please correct the errors below.</p>\n<ul class=\"errorlist\">\n");
            for error in &self.errors {
                let _ = writeln!(body, "<li>{}</li>", escape(error));
            }
            body.push_str("</ul>\n");
        }

        let _ = writeln!(body, "<form action=\"{}\" method=\"post\">", self.action());
        for fieldset in &self.fieldsets {
            body.push_str(&self.fieldset(fieldset));
        }
        body.push_str(&self.inline());
        body.push_str("<input type=\"submit\" value=\"Save\">\n</form>\n");

        if let Some(id) = self.question_id {
            let _ = writeln!(
                body,
                "<form action=\"{}\" method=\"post\"><input type=\"submit\" value=\"Delete\"></form>",
                delete_url(id)
            );
        }
        let _ = writeln!(body, "<p><a href=\"{}\">Back to questions</a></p>", changelist_url());
        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admin::QuestionAdmin;

    fn context(question_id: Option<i64>) -> ChangeFormContext {
        ChangeFormContext {
            question_id,
            fieldsets: QuestionAdmin::default().fieldsets,
            form: QuestionForm::blank(3),
            errors: Vec::new(),
        }
    }

    #[test]
    fn date_section_is_collapsible() {
        let body = context(None).body();
        assert!(body.contains("<details>\n<summary>Date information</summary>"));
        assert!(body.contains("name=\"pub_date\""));
    }

    #[test]
    fn add_form_has_three_blank_choices() {
        let body = context(None).body();
        assert_eq!(body.matches("-choice_text\"").count(), 3);
        assert!(body.contains("name=\"choice_set-2-votes\""));
        assert!(!body.contains("Delete\"></form>"));
    }

    #[test]
    fn change_form_posts_to_change_url() {
        let body = context(Some(4)).body();
        assert!(body.contains("action=\"/admin/polls/question/4/change/\""));
        assert!(body.contains("action=\"/admin/polls/question/4/delete/\""));
    }
}
