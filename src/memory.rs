use std::{collections::BTreeMap, sync::Arc};

use tokio::sync::RwLock;

use crate::{
    error::{StoreError, StoreResult},
    models::{Choice, ChoiceChange, NewChoice, NewQuestion, Question, MAX_VOTES},
    query::QuestionQuery,
    store::Store,
};

#[derive(Clone, Default)]
struct Tables {
    questions: BTreeMap<i64, Question>,
    choices: BTreeMap<i64, Choice>,
    last_question_id: i64,
    last_choice_id: i64,
}

impl Tables {
    fn insert_question(&mut self, question: NewQuestion) -> Question {
        self.last_question_id += 1;
        let question = Question {
            id: self.last_question_id,
            question_text: question.question_text,
            pub_date: question.pub_date,
        };
        self.questions.insert(question.id, question.clone());
        question
    }

    fn insert_choice(&mut self, question_id: i64, choice: NewChoice) -> StoreResult<Choice> {
        if !self.questions.contains_key(&question_id) {
            return Err(StoreError::NotFound);
        }
        let votes = checked_votes(choice.votes)?;
        self.last_choice_id += 1;
        let choice = Choice {
            id: self.last_choice_id,
            question_id,
            choice_text: choice.choice_text,
            votes,
        };
        self.choices.insert(choice.id, choice.clone());
        Ok(choice)
    }

    fn apply(&mut self, question_id: i64, change: ChoiceChange) -> StoreResult<()> {
        match change {
            ChoiceChange::Create(choice) => {
                self.insert_choice(question_id, choice)?;
            }
            ChoiceChange::Update(id, choice) => {
                let votes = checked_votes(choice.votes)?;
                let stored = self
                    .choices
                    .get_mut(&id)
                    .filter(|c| c.question_id == question_id)
                    .ok_or(StoreError::NotFound)?;
                stored.choice_text = choice.choice_text;
                stored.votes = votes;
            }
            ChoiceChange::Delete(id) => match self.choices.get(&id) {
                Some(c) if c.question_id == question_id => {
                    self.choices.remove(&id);
                }
                _ => return Err(StoreError::NotFound),
            },
        }
        Ok(())
    }
}

fn checked_votes(votes: u32) -> StoreResult<u32> {
    match votes <= MAX_VOTES {
        true => Ok(votes),
        false => Err(StoreError::VoteOverflow),
    }
}

/// Process-local store used when no database is configured, and by tests.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    async fn questions(&self, query: &QuestionQuery) -> StoreResult<Vec<Question>> {
        let tables = self.tables.read().await;
        Ok(query.apply(tables.questions.values()))
    }

    async fn question(&self, query: &QuestionQuery) -> StoreResult<Option<Question>> {
        let tables = self.tables.read().await;
        Ok(query.clone().limit(1).apply(tables.questions.values()).pop())
    }

    async fn choices(&self, question_id: i64) -> StoreResult<Vec<Choice>> {
        let tables = self.tables.read().await;
        Ok(tables
            .choices
            .values()
            .filter(|c| c.question_id == question_id)
            .cloned()
            .collect())
    }

    async fn choice(&self, question_id: i64, choice_id: i64) -> StoreResult<Option<Choice>> {
        let tables = self.tables.read().await;
        Ok(tables
            .choices
            .get(&choice_id)
            .filter(|c| c.question_id == question_id)
            .cloned())
    }

    async fn record_vote(&self, choice_id: i64) -> StoreResult<Choice> {
        let mut tables = self.tables.write().await;
        let choice = tables.choices.get_mut(&choice_id).ok_or(StoreError::NotFound)?;
        choice.votes = choice
            .votes
            .checked_add(1)
            .filter(|votes| *votes <= MAX_VOTES)
            .ok_or(StoreError::VoteOverflow)?;
        Ok(choice.clone())
    }

    async fn create_question(&self, question: NewQuestion) -> StoreResult<Question> {
        let mut tables = self.tables.write().await;
        Ok(tables.insert_question(question))
    }

    async fn save_question(
        &self,
        id: Option<i64>,
        question: NewQuestion,
        choices: Vec<ChoiceChange>,
    ) -> StoreResult<Question> {
        let mut tables = self.tables.write().await;
        // Work on a copy; the live tables are only replaced once every change applied.
        let mut staged = tables.clone();

        let question = match id {
            Some(id) => {
                let stored = staged.questions.get_mut(&id).ok_or(StoreError::NotFound)?;
                stored.question_text = question.question_text;
                stored.pub_date = question.pub_date;
                stored.clone()
            }
            None => staged.insert_question(question),
        };
        for change in choices {
            staged.apply(question.id, change)?;
        }

        *tables = staged;
        Ok(question)
    }

    async fn delete_question(&self, id: i64) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        tables.questions.remove(&id).ok_or(StoreError::NotFound)?;
        tables.choices.retain(|_, c| c.question_id != id);
        Ok(())
    }

    async fn create_choice(&self, question_id: i64, choice: NewChoice) -> StoreResult<Choice> {
        let mut tables = self.tables.write().await;
        tables.insert_choice(question_id, choice)
    }
}
