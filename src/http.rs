use reqwest::blocking::{Client, Response};

use crate::error::{Error, Result};

const ERROR_BODY_MAX_CHARS: usize = 200;

pub fn client() -> Result<Client> {
    Ok(Client::builder()
        .user_agent(concat!("job_tracker/", env!("CARGO_PKG_VERSION")))
        .build()?)
}

/// Passes 2xx responses through; anything else becomes [`Error::Api`].
pub fn check(service: &'static str, resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().unwrap_or_default();
    Err(Error::Api {
        service,
        status: status.as_u16(),
        body: truncate_body(&body),
    })
}

fn truncate_body(body: &str) -> String {
    let trimmed = body.trim();
    let n = trimmed.chars().count();
    if n <= ERROR_BODY_MAX_CHARS {
        trimmed.to_string()
    } else {
        let head: String = trimmed.chars().take(ERROR_BODY_MAX_CHARS).collect();
        format!("{head}…[truncated {n} chars]")
    }
}
