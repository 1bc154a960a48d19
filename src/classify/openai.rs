use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::classify::CategoryModel;
use crate::config::ClassifierConfig;
use crate::domain::Category;
use crate::error::Result;
use crate::http;

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatAnswer,
}

#[derive(Debug, Deserialize)]
struct ChatAnswer {
    #[serde(default)]
    content: Option<String>,
}

fn system_prompt() -> String {
    let mut s = String::from(
        "You are an email classifier. Classify each email into exactly one of the following categories:\n",
    );
    for c in Category::ALL {
        s.push_str("- ");
        s.push_str(c.label());
        s.push('\n');
    }
    s.push_str(
        "\nRules:\n\
         1. Return only the category name, with no extra words or formatting.\n\
         2. If unsure, return 'Irrelevant'.\n",
    );
    s
}

fn user_prompt(subject: &str, snippet: &str) -> String {
    format!("Email Subject: {subject}\n\nEmail Content: {snippet}\n\nWhat is the correct category?")
}

/// OpenAI Chat Completions backend.
pub struct OpenAiModel {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl OpenAiModel {
    pub fn new(cfg: &ClassifierConfig) -> Result<Self> {
        Ok(Self {
            client: http::client()?,
            endpoint: format!("{}/chat/completions", cfg.base_url.trim_end_matches('/')),
            api_key: cfg.api_key.clone(),
            model: cfg.model.clone(),
        })
    }
}

impl CategoryModel for OpenAiModel {
    fn complete(&self, subject: &str, snippet: &str) -> Result<String> {
        let system = system_prompt();
        let user = user_prompt(subject, snippet);
        let req = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &system,
                },
                ChatMessage {
                    role: "user",
                    content: &user,
                },
            ],
            temperature: 0.0,
        };

        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()?;
        let body: ChatResponse = http::check("OpenAI", resp)?.json()?;
        Ok(first_answer(body))
    }
}

// A missing answer is treated like any other unusable answer.
fn first_answer(body: ChatResponse) -> String {
    body.choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .unwrap_or_default()
}
