// src/db.rs
use sqlx::postgres::PgPoolOptions;
use sqlx::postgres::PgQueryResult;
use sqlx::{Pool, Postgres};
use tracing::info;

use crate::config::Config;
use crate::error::{StoreError, StoreResult};
use crate::models::{Choice, ChoiceChange, NewChoice, NewQuestion, Question};
use crate::query::{QuestionQuery, QUESTION_COLUMNS};
use crate::store::Store;

const CHOICE_COLUMNS: &str = "id, question_id, choice_text, votes";

pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<Pool<Postgres>, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}

#[derive(Clone)]
pub struct PgStore {
    pool: Pool<Postgres>,
}

impl PgStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn connect(config: &Config, database_url: &str) -> StoreResult<Self> {
        let store = Self::new(create_pool(database_url, config.max_connections).await?);
        if config.run_migrations {
            store.migrate().await?;
        }
        Ok(store)
    }

    pub async fn migrate(&self) -> StoreResult<()> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

// SQLSTATE numeric_value_out_of_range
const OUT_OF_RANGE: &str = "22003";

fn votes_column(votes: u32) -> StoreResult<i32> {
    i32::try_from(votes).map_err(|_| StoreError::VoteOverflow)
}

fn vote_overflow(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.code().as_deref() == Some(OUT_OF_RANGE) => StoreError::VoteOverflow,
        _ => StoreError::Database(err),
    }
}

fn affected_one(result: PgQueryResult) -> StoreResult<()> {
    match result.rows_affected() {
        0 => Err(StoreError::NotFound),
        _ => Ok(()),
    }
}

fn missing_parent(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => StoreError::NotFound,
        _ => StoreError::Database(err),
    }
}

impl Store for PgStore {
    async fn questions(&self, query: &QuestionQuery) -> StoreResult<Vec<Question>> {
        let mut builder = query.to_sql();
        let questions = builder.build_query_as::<Question>().fetch_all(&self.pool).await?;
        Ok(questions)
    }

    async fn question(&self, query: &QuestionQuery) -> StoreResult<Option<Question>> {
        let mut builder = query.clone().limit(1).to_sql();
        let question = builder.build_query_as::<Question>().fetch_optional(&self.pool).await?;
        Ok(question)
    }

    async fn choices(&self, question_id: i64) -> StoreResult<Vec<Choice>> {
        let choices = sqlx::query_as::<_, Choice>(&format!(
            "SELECT {CHOICE_COLUMNS} FROM polls_choice WHERE question_id = $1 ORDER BY id"
        ))
        .bind(question_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(choices)
    }

    async fn choice(&self, question_id: i64, choice_id: i64) -> StoreResult<Option<Choice>> {
        let choice = sqlx::query_as::<_, Choice>(&format!(
            "SELECT {CHOICE_COLUMNS} FROM polls_choice WHERE question_id = $1 AND id = $2"
        ))
        .bind(question_id)
        .bind(choice_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(choice)
    }

    async fn record_vote(&self, choice_id: i64) -> StoreResult<Choice> {
        sqlx::query_as::<_, Choice>(&format!(
            "UPDATE polls_choice SET votes = votes + 1 WHERE id = $1 RETURNING {CHOICE_COLUMNS}"
        ))
        .bind(choice_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(vote_overflow)?
        .ok_or(StoreError::NotFound)
    }

    async fn create_question(&self, question: NewQuestion) -> StoreResult<Question> {
        let question = sqlx::query_as::<_, Question>(&format!(
            "INSERT INTO polls_question (question_text, pub_date) VALUES ($1, $2) RETURNING {QUESTION_COLUMNS}"
        ))
        .bind(&question.question_text)
        .bind(question.pub_date)
        .fetch_one(&self.pool)
        .await?;
        Ok(question)
    }

    async fn save_question(
        &self,
        id: Option<i64>,
        question: NewQuestion,
        choices: Vec<ChoiceChange>,
    ) -> StoreResult<Question> {
        // Dropping `tx` on any early return rolls everything back.
        let mut tx = self.pool.begin().await?;

        let question = match id {
            Some(id) => sqlx::query_as::<_, Question>(&format!(
                "UPDATE polls_question SET question_text = $2, pub_date = $3 WHERE id = $1 RETURNING {QUESTION_COLUMNS}"
            ))
            .bind(id)
            .bind(&question.question_text)
            .bind(question.pub_date)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(StoreError::NotFound)?,
            None => sqlx::query_as::<_, Question>(&format!(
                "INSERT INTO polls_question (question_text, pub_date) VALUES ($1, $2) RETURNING {QUESTION_COLUMNS}"
            ))
            .bind(&question.question_text)
            .bind(question.pub_date)
            .fetch_one(&mut *tx)
            .await?,
        };

        for change in choices {
            match change {
                ChoiceChange::Create(choice) => {
                    sqlx::query("INSERT INTO polls_choice (question_id, choice_text, votes) VALUES ($1, $2, $3)")
                        .bind(question.id)
                        .bind(&choice.choice_text)
                        .bind(votes_column(choice.votes)?)
                        .execute(&mut *tx)
                        .await?;
                }
                ChoiceChange::Update(choice_id, choice) => {
                    let result = sqlx::query(
                        "UPDATE polls_choice SET choice_text = $3, votes = $4 WHERE id = $1 AND question_id = $2",
                    )
                    .bind(choice_id)
                    .bind(question.id)
                    .bind(&choice.choice_text)
                    .bind(votes_column(choice.votes)?)
                    .execute(&mut *tx)
                    .await?;
                    affected_one(result)?;
                }
                ChoiceChange::Delete(choice_id) => {
                    let result = sqlx::query("DELETE FROM polls_choice WHERE id = $1 AND question_id = $2")
                        .bind(choice_id)
                        .bind(question.id)
                        .execute(&mut *tx)
                        .await?;
                    affected_one(result)?;
                }
            }
        }

        tx.commit().await?;
        Ok(question)
    }

    async fn delete_question(&self, id: i64) -> StoreResult<()> {
        // Choices go with it through ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM polls_question WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        affected_one(result)
    }

    async fn create_choice(&self, question_id: i64, choice: NewChoice) -> StoreResult<Choice> {
        sqlx::query_as::<_, Choice>(&format!(
            "INSERT INTO polls_choice (question_id, choice_text, votes) VALUES ($1, $2, $3) RETURNING {CHOICE_COLUMNS}"
        ))
        .bind(question_id)
        .bind(&choice.choice_text)
        .bind(votes_column(choice.votes)?)
        .fetch_one(&self.pool)
        .await
        .map_err(missing_parent)
    }
}
