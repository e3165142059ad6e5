#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, HeaderMap, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use polls::{
    admin::AdminSite,
    memory::MemoryStore,
    models::{Choice, NewChoice, NewQuestion, Question},
    routes::create_routes,
    state::AppState,
    store::Store,
};
use tower::ServiceExt;

pub struct TestApp {
    pub store: MemoryStore,
    pub router: Router,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    pub fn location(&self) -> Option<&str> {
        self.headers.get(header::LOCATION).and_then(|v| v.to_str().ok())
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).expect("response is not JSON")
    }
}

impl TestApp {
    pub fn new() -> Self {
        let store = MemoryStore::new();
        let router = create_routes(AppState::new(store.clone()));
        Self { store, router }
    }

    pub fn with_admin() -> Self {
        let store = MemoryStore::new();
        let router = create_routes(AppState::new(store.clone()).with_admin(AdminSite::default()));
        Self { store, router }
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        TestResponse {
            status,
            headers,
            body: String::from_utf8(bytes.to_vec()).unwrap(),
        }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.send(Request::get(uri).body(Body::empty()).unwrap()).await
    }

    pub async fn get_json(&self, uri: &str) -> TestResponse {
        let request = Request::get(uri)
            .header(header::ACCEPT, "application/json")
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    /// Posts an already url-encoded form body.
    pub async fn post_form(&self, uri: &str, body: &str) -> TestResponse {
        let request = Request::post(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    /// Creates a question published `days` from now; negative means in the past.
    pub async fn create_question(&self, text: &str, days: i64) -> Question {
        self.store
            .create_question(NewQuestion {
                question_text: text.to_string(),
                pub_date: Utc::now() + Duration::days(days),
            })
            .await
            .unwrap()
    }

    pub async fn create_choice(&self, question: &Question, text: &str) -> Choice {
        self.store
            .create_choice(question.id, NewChoice::new(text))
            .await
            .unwrap()
    }

    pub async fn choices(&self, question: &Question) -> Vec<Choice> {
        self.store.choices(question.id).await.unwrap()
    }
}
