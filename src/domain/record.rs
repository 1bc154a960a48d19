use std::fmt;

/// Maximum stored snippet length, in characters.
pub const SNIPPET_MAX_CHARS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    ApplicationSubmitted,
    InterviewReceived,
    RejectionNotice,
    FollowUpNeeded,
    Irrelevant,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::ApplicationSubmitted,
        Category::InterviewReceived,
        Category::RejectionNotice,
        Category::FollowUpNeeded,
        Category::Irrelevant,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Category::ApplicationSubmitted => "Application Submitted",
            Category::InterviewReceived => "Interview Received",
            Category::RejectionNotice => "Rejection Notice",
            Category::FollowUpNeeded => "Follow-up Needed",
            Category::Irrelevant => "Irrelevant",
        }
    }

    /// Exact label match after trimming; anything else collapses to `Irrelevant`.
    pub fn from_label(raw: &str) -> Self {
        let raw = raw.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.label() == raw)
            .unwrap_or(Category::Irrelevant)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// An email as fetched from the mail source, before classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEmail {
    pub received_at: String,
    pub sender: String,
    pub subject: String,
    pub snippet: String,
}

/// One row of the durable table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Record {
    /// Original `Date` header, kept verbatim.
    pub received_at: String,
    pub category: Category,
    pub sender: String,
    pub subject: String,
    pub snippet: String,
}

/// `(received_at, sender, snippet)`: two records with the same key are the same email.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentityKey {
    pub received_at: String,
    pub sender: String,
    pub snippet: String,
}

impl Record {
    /// Builds a record, truncating the snippet to [`SNIPPET_MAX_CHARS`].
    pub fn new(
        received_at: impl Into<String>,
        category: Category,
        sender: impl Into<String>,
        subject: impl Into<String>,
        snippet: &str,
    ) -> Self {
        Self {
            received_at: received_at.into(),
            category,
            sender: sender.into(),
            subject: subject.into(),
            snippet: truncate_snippet(snippet),
        }
    }

    pub fn identity(&self) -> IdentityKey {
        IdentityKey {
            received_at: self.received_at.clone(),
            sender: self.sender.clone(),
            snippet: self.snippet.clone(),
        }
    }
}

pub fn truncate_snippet(s: &str) -> String {
    s.chars().take(SNIPPET_MAX_CHARS).collect()
}
