mod common;

use axum::http::StatusCode;
use common::TestApp;
use polls::{query::QuestionQuery, store::Store};

#[tokio::test]
async fn changelist_shows_configured_columns() {
    let app = TestApp::with_admin();
    app.create_question("Fresh?", 0).await;
    app.create_question("Stale?", -400).await;

    let response = app.get("/admin/polls/question/").await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("<th>Question text</th><th>Date published</th><th>Published recently?</th>"));
    assert!(response.body.contains("<a href=\"/admin/polls/question/1/change/\">Fresh?</a>"));
    assert!(response.body.contains("2 questions"));

    let rows = app.get_json("/admin/polls/question/").await.json()["rows"].clone();
    assert_eq!(rows[0]["cells"][0], "Fresh?");
    assert_eq!(rows[0]["cells"][2], "True");
    assert_eq!(rows[1]["cells"][2], "False");
}

#[tokio::test]
async fn changelist_filters_by_date() {
    let app = TestApp::with_admin();
    app.create_question("Fresh?", 0).await;
    app.create_question("Stale?", -400).await;

    let response = app.get("/admin/polls/question/?pub_date=past_7_days").await;
    assert!(response.body.contains("Fresh?"));
    assert!(!response.body.contains("Stale?"));
    assert!(response.body.contains("<li class=\"selected\"><a href=\"/admin/polls/question/?pub_date=past_7_days\">Past 7 days</a></li>"));
}

#[tokio::test]
async fn add_form_offers_three_choice_rows() {
    let app = TestApp::with_admin();

    let response = app.get("/admin/polls/question/add/").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body.matches("-choice_text\"").count(), 3);
    assert!(response.body.contains("<summary>Date information</summary>"));
}

#[tokio::test]
async fn add_question_with_choices() {
    let app = TestApp::with_admin();

    let response = app
        .post_form(
            "/admin/polls/question/add/",
            "question_text=What%27s+up%3F&pub_date=2024-05-01T12%3A00\
             &choice_set-0-choice_text=Not+much&choice_set-0-votes=0\
             &choice_set-1-choice_text=The+sky&choice_set-1-votes=0\
             &choice_set-2-choice_text=&choice_set-2-votes=0",
        )
        .await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), Some("/admin/polls/question/"));

    let questions = app.store.questions(&QuestionQuery::new()).await.unwrap();
    assert_eq!(questions.len(), 1);
    assert_eq!(questions[0].question_text, "What's up?");

    let choices = app.choices(&questions[0]).await;
    let texts: Vec<_> = choices.iter().map(|c| c.choice_text.as_str()).collect();
    assert_eq!(texts, vec!["Not much", "The sky"]);
}

#[tokio::test]
async fn invalid_add_keeps_nothing() {
    let app = TestApp::with_admin();

    let response = app
        .post_form(
            "/admin/polls/question/add/",
            "question_text=&pub_date=soon&choice_set-0-choice_text=Orphan",
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Question text: This field is required."));
    assert!(response.body.contains("Date published: Enter a valid date/time."));
    assert!(response.body.contains("value=\"Orphan\""));

    assert!(app.store.questions(&QuestionQuery::new()).await.unwrap().is_empty());
}

#[tokio::test]
async fn change_question_and_choices() {
    let app = TestApp::with_admin();
    let question = app.create_question("Old text?", -1).await;
    let keep = app.create_choice(&question, "Keep").await;
    let drop = app.create_choice(&question, "Drop").await;

    let form = app.get(&format!("/admin/polls/question/{}/change/", question.id)).await;
    assert_eq!(form.status, StatusCode::OK);
    assert!(form.body.contains("value=\"Old text?\""));
    assert_eq!(form.body.matches("-choice_text\"").count(), 5);

    let body = format!(
        "question_text=New+text%3F&pub_date=2024-01-01T00%3A00%3A00Z\
         &choice_set-0-id={}&choice_set-0-choice_text=Kept&choice_set-0-votes=4\
         &choice_set-1-id={}&choice_set-1-choice_text=Drop&choice_set-1-votes=0&choice_set-1-DELETE=on\
         &choice_set-2-choice_text=Added&choice_set-2-votes=0",
        keep.id, drop.id
    );
    let response = app
        .post_form(&format!("/admin/polls/question/{}/change/", question.id), &body)
        .await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);

    let updated = app
        .store
        .question(&QuestionQuery::new().id(question.id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.question_text, "New text?");

    let choices = app.choices(&question).await;
    assert_eq!(choices.len(), 2);
    assert_eq!((choices[0].choice_text.as_str(), choices[0].votes), ("Kept", 4));
    assert_eq!(choices[1].choice_text, "Added");
}

#[tokio::test]
async fn change_rejects_foreign_choice_rows() {
    let app = TestApp::with_admin();
    let question = app.create_question("Mine?", -1).await;
    let other = app.create_question("Theirs?", -1).await;
    let foreign = app.create_choice(&other, "Not yours").await;

    let body = format!(
        "question_text=Mine%3F&pub_date=2024-01-01T00%3A00\
         &choice_set-0-id={}&choice_set-0-choice_text=Hijacked&choice_set-0-votes=100",
        foreign.id
    );
    let response = app
        .post_form(&format!("/admin/polls/question/{}/change/", question.id), &body)
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("does not belong to this question"));
    assert_eq!(app.choices(&other).await[0].choice_text, "Not yours");
}

#[tokio::test]
async fn change_with_repeated_choice_row_saves_nothing() {
    let app = TestApp::with_admin();
    let question = app.create_question("Original?", -1).await;
    let choice = app.create_choice(&question, "Stays").await;

    let body = format!(
        "question_text=Rewritten%3F&pub_date=2024-01-01T00%3A00\
         &choice_set-0-id={id}&choice_set-0-choice_text=Stays&choice_set-0-votes=0&choice_set-0-DELETE=on\
         &choice_set-1-id={id}&choice_set-1-choice_text=Renamed&choice_set-1-votes=0",
        id = choice.id
    );
    let response = app
        .post_form(&format!("/admin/polls/question/{}/change/", question.id), &body)
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response
        .body
        .contains(&format!("Choice 2: Choice {} appears more than once.", choice.id)));

    let stored = app
        .store
        .question(&QuestionQuery::new().id(question.id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.question_text, "Original?");
    assert_eq!(app.choices(&question).await, vec![choice]);
}

#[tokio::test]
async fn delete_question_removes_choices() {
    let app = TestApp::with_admin();
    let question = app.create_question("Doomed?", -1).await;
    app.create_choice(&question, "Yes").await;

    let response = app
        .post_form(&format!("/admin/polls/question/{}/delete/", question.id), "")
        .await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert!(app.choices(&question).await.is_empty());

    let again = app
        .post_form(&format!("/admin/polls/question/{}/delete/", question.id), "")
        .await;
    assert_eq!(again.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_question_change_form_is_not_found() {
    let app = TestApp::with_admin();

    assert_eq!(app.get("/admin/polls/question/7/change/").await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admin_sees_future_questions() {
    let app = TestApp::with_admin();
    let future = app.create_question("Scheduled?", 10).await;

    let response = app.get(&format!("/admin/polls/question/{}/change/", future.id)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(app.get("/admin/polls/question/").await.body.contains("Scheduled?"));
}
