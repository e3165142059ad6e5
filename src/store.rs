use std::future::Future;

use crate::{
    error::StoreResult,
    models::{Choice, ChoiceChange, NewChoice, NewQuestion, Question},
    query::QuestionQuery,
};

/// Persistence seam for questions and their choices.
///
/// Every call hits the backing storage; nothing is cached between requests.
pub trait Store: Clone + Send + Sync + 'static {
    fn questions(&self, query: &QuestionQuery) -> impl Future<Output = StoreResult<Vec<Question>>> + Send;

    /// First question matching `query`, if any.
    fn question(&self, query: &QuestionQuery) -> impl Future<Output = StoreResult<Option<Question>>> + Send;

    /// Choices of one question, in creation order.
    fn choices(&self, question_id: i64) -> impl Future<Output = StoreResult<Vec<Choice>>> + Send;

    /// Looks a choice up among the choices of `question_id` only.
    fn choice(&self, question_id: i64, choice_id: i64) -> impl Future<Output = StoreResult<Option<Choice>>> + Send;

    /// Adds exactly one vote to a choice and returns the updated row.
    /// Fails with `StoreError::VoteOverflow` once the count reaches `MAX_VOTES`.
    fn record_vote(&self, choice_id: i64) -> impl Future<Output = StoreResult<Choice>> + Send;

    fn create_question(&self, question: NewQuestion) -> impl Future<Output = StoreResult<Question>> + Send;

    /// Creates (`id` is `None`) or updates a question and applies `choices` to it
    /// as one unit. Either every write lands or none does.
    ///
    /// Updates and deletes may only name choices of that question; anything
    /// else is `StoreError::NotFound`.
    fn save_question(
        &self,
        id: Option<i64>,
        question: NewQuestion,
        choices: Vec<ChoiceChange>,
    ) -> impl Future<Output = StoreResult<Question>> + Send;

    /// Removes a question together with all of its choices.
    fn delete_question(&self, id: i64) -> impl Future<Output = StoreResult<()>> + Send;

    fn create_choice(&self, question_id: i64, choice: NewChoice) -> impl Future<Output = StoreResult<Choice>> + Send;
}
