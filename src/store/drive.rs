use log::{debug, info};
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};

use crate::auth::AccessTokenSource;
use crate::error::Result;
use crate::http;
use crate::store::repo::TableStore;
use crate::store::table::{self, LoadedTable, Table};

const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";
const DRIVE_UPLOAD_BASE: &str = "https://www.googleapis.com/upload/drive/v3";
const CSV_MIME: &str = "text/csv";

#[derive(Debug, Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<FileRef>,
}

#[derive(Debug, Deserialize)]
struct FileRef {
    id: String,
}

#[derive(Debug, Serialize)]
struct NewFile<'a> {
    name: &'a str,
    parents: [&'a str; 1],
    #[serde(rename = "mimeType")]
    mime_type: &'a str,
}

/// Table artifact stored as a CSV file inside a Drive folder.
pub struct DriveTableStore<T> {
    client: Client,
    tokens: T,
    folder_id: String,
    name: String,
}

impl<T: AccessTokenSource> DriveTableStore<T> {
    pub fn new(tokens: T, folder_id: impl Into<String>, name: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: http::client()?,
            tokens,
            folder_id: folder_id.into(),
            name: name.into(),
        })
    }

    fn find_file_id(&self, token: &str) -> Result<Option<String>> {
        let q = lookup_query(&self.name, &self.folder_id);
        let resp = self
            .client
            .get(format!("{DRIVE_API_BASE}/files"))
            .bearer_auth(token)
            .query(&[("q", q.as_str()), ("fields", "files(id)"), ("spaces", "drive")])
            .send()?;
        let list: FileList = http::check("Drive", resp)?.json()?;
        Ok(list.files.into_iter().next().map(|f| f.id))
    }

    fn download(&self, token: &str, id: &str) -> Result<Vec<u8>> {
        let resp = self
            .client
            .get(format!("{DRIVE_API_BASE}/files/{id}"))
            .bearer_auth(token)
            .query(&[("alt", "media")])
            .send()?;
        Ok(http::check("Drive", resp)?.bytes()?.to_vec())
    }

    fn overwrite(&self, token: &str, id: &str, bytes: Vec<u8>) -> Result<()> {
        let resp = self
            .client
            .patch(format!("{DRIVE_UPLOAD_BASE}/files/{id}"))
            .bearer_auth(token)
            .query(&[("uploadType", "media")])
            .header(CONTENT_TYPE, CSV_MIME)
            .body(bytes)
            .send()?;
        http::check("Drive", resp)?;
        Ok(())
    }

    fn create(&self, token: &str, bytes: &[u8]) -> Result<()> {
        let meta = serde_json::to_vec(&NewFile {
            name: &self.name,
            parents: [self.folder_id.as_str()],
            mime_type: CSV_MIME,
        })?;
        let (boundary, body) = multipart_related(&meta, bytes);
        let resp = self
            .client
            .post(format!("{DRIVE_UPLOAD_BASE}/files"))
            .bearer_auth(token)
            .query(&[("uploadType", "multipart")])
            .header(
                CONTENT_TYPE,
                format!("multipart/related; boundary={boundary}"),
            )
            .body(body)
            .send()?;
        http::check("Drive", resp)?;
        Ok(())
    }
}

impl<T: AccessTokenSource> TableStore for DriveTableStore<T> {
    fn load(&self) -> Result<LoadedTable> {
        let token = self.tokens.access_token()?;
        let Some(id) = self.find_file_id(&token)? else {
            info!("{} not found in Drive folder; starting a new table", self.name);
            return Ok(LoadedTable::default());
        };
        let bytes = self.download(&token, &id)?;
        debug!("downloaded {} bytes of {}", bytes.len(), self.name);
        Ok(table::decode(&bytes))
    }

    // Each branch is a single upload request: Drive keeps the previous
    // revision unless the whole body arrives.
    fn save(&self, table: &Table) -> Result<()> {
        let bytes = table::encode(table)?;
        let token = self.tokens.access_token()?;
        match self.find_file_id(&token)? {
            Some(id) => self.overwrite(&token, &id, bytes),
            None => self.create(&token, &bytes),
        }
    }
}

/// Drive query selecting `name` inside `folder_id`.
fn lookup_query(name: &str, folder_id: &str) -> String {
    format!(
        "name = '{}' and '{}' in parents and trashed = false",
        escape_query_literal(name),
        escape_query_literal(folder_id)
    )
}

fn escape_query_literal(s: &str) -> String {
    s.replace('\\', "\\\\").replace('\'', "\\'")
}

/// Builds a `multipart/related` body of JSON metadata plus media.
fn multipart_related(meta: &[u8], media: &[u8]) -> (String, Vec<u8>) {
    let mut boundary = String::from("job_tracker_part");
    let mut n = 0u32;
    while contains(media, boundary.as_bytes()) || contains(meta, boundary.as_bytes()) {
        n += 1;
        boundary = format!("job_tracker_part_{n}");
    }

    let mut body = Vec::with_capacity(meta.len() + media.len() + 256);
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(b"Content-Type: application/json; charset=UTF-8\r\n\r\n");
    body.extend_from_slice(meta);
    body.extend_from_slice(format!("\r\n--{boundary}\r\n").as_bytes());
    body.extend_from_slice(format!("Content-Type: {CSV_MIME}\r\n\r\n").as_bytes());
    body.extend_from_slice(media);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    (boundary, body)
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_query_escapes_quotes() {
        assert_eq!(
            lookup_query("job_applications.csv", "abc123"),
            "name = 'job_applications.csv' and 'abc123' in parents and trashed = false"
        );
        assert_eq!(
            lookup_query("bob's jobs.csv", "f"),
            "name = 'bob\\'s jobs.csv' and 'f' in parents and trashed = false"
        );
    }

    #[test]
    fn file_list_decodes() {
        let list: FileList = serde_json::from_str(r#"{"files":[{"id":"1AbC"}]}"#).unwrap();
        assert_eq!(list.files[0].id, "1AbC");
        let empty: FileList = serde_json::from_str("{}").unwrap();
        assert!(empty.files.is_empty());
    }

    #[test]
    fn new_file_metadata_shape() {
        let meta = serde_json::to_value(NewFile {
            name: "job_applications.csv",
            parents: ["folder"],
            mime_type: CSV_MIME,
        })
        .unwrap();
        assert_eq!(meta["name"], "job_applications.csv");
        assert_eq!(meta["parents"][0], "folder");
        assert_eq!(meta["mimeType"], "text/csv");
    }

    #[test]
    fn multipart_body_has_both_parts() {
        let (boundary, body) = multipart_related(b"{\"name\":\"x\"}", b"Date,Category\r\n");
        let text = String::from_utf8(body).unwrap();
        assert!(text.starts_with(&format!("--{boundary}\r\n")));
        assert!(text.contains("{\"name\":\"x\"}"));
        assert!(text.contains("Content-Type: text/csv\r\n\r\nDate,Category\r\n"));
        assert!(text.ends_with(&format!("\r\n--{boundary}--\r\n")));
    }

    #[test]
    fn boundary_avoids_media_content() {
        let (boundary, _) = multipart_related(b"{}", b"snippet mentions job_tracker_part here");
        assert_eq!(boundary, "job_tracker_part_1");
    }
}
