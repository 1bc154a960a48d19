use log::debug;
use reqwest::blocking::Client;
use serde::Deserialize;

use crate::auth::AccessTokenSource;
use crate::domain::RawEmail;
use crate::error::Result;
use crate::http;
use crate::mail::MailSource;

const GMAIL_API_BASE: &str = "https://gmail.googleapis.com/gmail/v1";

/// Messages received in the trailing 24 hours.
pub const RECENT_QUERY: &str = "newer_than:1d";

pub const NO_SUBJECT: &str = "No Subject";
pub const UNKNOWN_SENDER: &str = "Unknown Sender";
pub const UNKNOWN_DATE: &str = "Unknown Date";

#[derive(Debug, Deserialize)]
struct MessageList {
    #[serde(default)]
    messages: Vec<MessageStub>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessageStub {
    id: String,
}

#[derive(Debug, Deserialize)]
struct Message {
    #[serde(default)]
    snippet: Option<String>,
    #[serde(default)]
    payload: Option<Payload>,
}

#[derive(Debug, Deserialize)]
struct Payload {
    #[serde(default)]
    headers: Vec<Header>,
}

#[derive(Debug, Deserialize)]
struct Header {
    name: String,
    value: String,
}

pub struct GmailClient<T> {
    client: Client,
    base: String,
    tokens: T,
}

impl<T: AccessTokenSource> GmailClient<T> {
    pub fn new(tokens: T) -> Result<Self> {
        Ok(Self {
            client: http::client()?,
            base: GMAIL_API_BASE.to_string(),
            tokens,
        })
    }

    fn list_page(&self, token: &str, page_token: Option<&str>) -> Result<MessageList> {
        let mut req = self
            .client
            .get(format!("{}/users/me/messages", self.base))
            .bearer_auth(token)
            .query(&[("q", RECENT_QUERY)]);
        if let Some(pt) = page_token {
            req = req.query(&[("pageToken", pt)]);
        }
        Ok(http::check("Gmail", req.send()?)?.json()?)
    }

    fn get_message(&self, token: &str, id: &str) -> Result<Message> {
        let resp = self
            .client
            .get(format!("{}/users/me/messages/{id}", self.base))
            .bearer_auth(token)
            .query(&[
                ("format", "metadata"),
                ("metadataHeaders", "Subject"),
                ("metadataHeaders", "From"),
                ("metadataHeaders", "Date"),
            ])
            .send()?;
        Ok(http::check("Gmail", resp)?.json()?)
    }
}

impl<T: AccessTokenSource> MailSource for GmailClient<T> {
    fn fetch_recent(&self) -> Result<Vec<RawEmail>> {
        let token = self.tokens.access_token()?;

        let mut ids = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let page = self.list_page(&token, page_token.as_deref())?;
            ids.extend(page.messages.into_iter().map(|m| m.id));
            match page.next_page_token {
                Some(next) if !next.is_empty() => page_token = Some(next),
                _ => break,
            }
        }
        debug!("gmail listed {} messages for {RECENT_QUERY}", ids.len());

        let mut out = Vec::with_capacity(ids.len());
        for id in ids {
            let msg = self.get_message(&token, &id)?;
            out.push(to_raw_email(msg));
        }
        Ok(out)
    }
}

fn header<'a>(headers: &'a [Header], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case(name))
        .map(|h| h.value.as_str())
}

fn to_raw_email(msg: Message) -> RawEmail {
    let headers = msg.payload.map(|p| p.headers).unwrap_or_default();
    let pick = |name: &str, fallback: &str| header(&headers, name).unwrap_or(fallback).to_string();
    RawEmail {
        received_at: pick("Date", UNKNOWN_DATE),
        sender: pick("From", UNKNOWN_SENDER),
        subject: pick("Subject", NO_SUBJECT),
        snippet: msg.snippet.unwrap_or_default(),
    }
}
