//! Email classification: cheap sender pre-filters, then a remote model.

pub mod openai;

use log::debug;

use crate::domain::{Category, RawEmail, Record};
use crate::error::Result;

pub use openai::OpenAiModel;

/// Remote classification call. Returns the model's raw answer text.
pub trait CategoryModel {
    fn complete(&self, subject: &str, snippet: &str) -> Result<String>;
}

/// Maps one email to a category.
pub trait Classify {
    fn category(&self, sender: &str, subject: &str, snippet: &str) -> Result<Category>;

    /// Classifies `email` into a storable record (snippet truncated).
    fn classify(&self, email: &RawEmail) -> Result<Record> {
        let category = self.category(&email.sender, &email.subject, &email.snippet)?;
        Ok(Record::new(
            email.received_at.clone(),
            category,
            email.sender.clone(),
            email.subject.clone(),
            &email.snippet,
        ))
    }
}

impl<F> Classify for F
where
    F: Fn(&str, &str, &str) -> Result<Category>,
{
    fn category(&self, sender: &str, subject: &str, snippet: &str) -> Result<Category> {
        self(sender, subject, snippet)
    }
}

/// Case-insensitive substring markers of automated senders.
#[derive(Debug, Clone, Default)]
pub struct SenderFilter {
    markers: Vec<String>,
}

impl SenderFilter {
    pub fn new<I, S>(markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            markers: markers
                .into_iter()
                .map(|m| m.as_ref().trim().to_lowercase())
                .filter(|m| !m.is_empty())
                .collect(),
        }
    }

    /// True when the sender is blank or matches a marker.
    pub fn rejects(&self, sender: &str) -> bool {
        if sender.trim().is_empty() {
            return true;
        }
        let sender = sender.to_lowercase();
        self.markers.iter().any(|m| sender.contains(m.as_str()))
    }
}

pub struct Classifier<M> {
    filter: SenderFilter,
    model: M,
}

impl<M: CategoryModel> Classifier<M> {
    pub fn new(filter: SenderFilter, model: M) -> Self {
        Self { filter, model }
    }
}

impl<M: CategoryModel> Classify for Classifier<M> {
    fn category(&self, sender: &str, subject: &str, snippet: &str) -> Result<Category> {
        if self.filter.rejects(sender) {
            debug!("sender {sender:?} filtered before model call");
            return Ok(Category::Irrelevant);
        }
        let answer = self.model.complete(subject, snippet)?;
        let category = Category::from_label(&answer);
        if category == Category::Irrelevant && answer.trim() != Category::Irrelevant.label() {
            debug!("model answer {answer:?} is not a category; using Irrelevant");
        }
        Ok(category)
    }
}
