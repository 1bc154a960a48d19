//! Merges freshly classified emails into the loaded table.
//!
//! Rows are unique by `(received_at, sender, snippet)`. Existing rows are
//! never removed or rewritten; a candidate that matches one is dropped, even
//! when it classifies differently this time.

use log::debug;

use crate::classify::Classify;
use crate::domain::{Category, RawEmail, Record};
use crate::error::Result;
use crate::store::Table;

/// Outcome of one merge.
#[derive(Debug, Clone)]
pub struct Reconciliation {
    /// Existing rows followed by the accepted ones.
    pub table: Table,
    /// Rows added by this merge, in candidate order.
    pub accepted: Vec<Record>,
}

/// Classifies `candidates` in order and appends the ones that qualify.
///
/// With `had_data_rows == false` the table has never held a real row, so
/// every candidate is accepted regardless of category (the bootstrap rule);
/// duplicates within the batch are still suppressed. Otherwise a candidate
/// is accepted only if it is not `Irrelevant` and its identity is unseen.
///
/// A classifier error aborts the merge.
pub fn reconcile<C, I>(
    existing: Table,
    had_data_rows: bool,
    candidates: I,
    classifier: &C,
) -> Result<Reconciliation>
where
    C: Classify + ?Sized,
    I: IntoIterator<Item = RawEmail>,
{
    let mut table = existing;
    let mut accepted = Vec::new();

    for email in candidates {
        let record = classifier.classify(&email)?;

        if had_data_rows && record.category == Category::Irrelevant {
            debug!("skipping irrelevant email from {:?}", record.sender);
            continue;
        }
        if table.contains(&record.identity()) {
            debug!("skipping already-seen email from {:?}", record.sender);
            continue;
        }

        accepted.push(record.clone());
        table.insert(record);
    }

    Ok(Reconciliation { table, accepted })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::cell::RefCell;
    use std::collections::HashSet;

    fn email(date: &str, sender: &str, subject: &str, snippet: &str) -> RawEmail {
        RawEmail {
            received_at: date.into(),
            sender: sender.into(),
            subject: subject.into(),
            snippet: snippet.into(),
        }
    }

    // Category by keyword in the subject; deterministic.
    fn by_subject(_sender: &str, subject: &str, _snippet: &str) -> Result<Category> {
        Ok(if subject.contains("Interview") {
            Category::InterviewReceived
        } else if subject.contains("Rejected") {
            Category::RejectionNotice
        } else if subject.contains("Applied") {
            Category::ApplicationSubmitted
        } else {
            Category::Irrelevant
        })
    }

    fn always(c: Category) -> impl Fn(&str, &str, &str) -> Result<Category> {
        move |_: &str, _: &str, _: &str| Ok(c)
    }

    fn identities(t: &Table) -> HashSet<(String, String, String)> {
        t.rows()
            .iter()
            .map(|r| (r.received_at.clone(), r.sender.clone(), r.snippet.clone()))
            .collect()
    }

    #[test]
    fn bootstrap_keeps_irrelevant_candidates() {
        let out = reconcile(
            Table::new(),
            false,
            [email("d1", "s1", "su1", "sn1")],
            &always(Category::Irrelevant),
        )
        .unwrap();
        assert_eq!(out.table.len(), 1);
        assert_eq!(out.table.rows()[0].category, Category::Irrelevant);
        assert_eq!(out.accepted.len(), 1);
    }

    #[test]
    fn bootstrap_still_dedups_within_batch() {
        let out = reconcile(
            Table::new(),
            false,
            [
                email("d1", "s1", "first", "sn"),
                email("d1", "s1", "second", "sn"),
                email("d2", "s1", "third", "sn"),
            ],
            &always(Category::Irrelevant),
        )
        .unwrap();
        assert_eq!(out.table.len(), 2);
        assert_eq!(out.table.rows()[0].subject, "first");
    }

    #[test]
    fn irrelevant_is_filtered_once_table_has_data() {
        let existing: Table = [Record::new("d0", Category::ApplicationSubmitted, "a", "Applied", "x")]
            .into_iter()
            .collect();
        let out = reconcile(
            existing,
            true,
            [
                email("d1", "news@x", "Weekly digest", "n1"),
                email("d2", "hr@acme.com", "Interview", "n2"),
            ],
            &by_subject,
        )
        .unwrap();
        assert_eq!(out.table.len(), 2);
        assert_eq!(out.accepted.len(), 1);
        assert_eq!(out.accepted[0].category, Category::InterviewReceived);
        assert!(out.table.rows().iter().all(|r| r.sender != "news@x"));
    }

    #[test]
    fn existing_row_wins_over_reclassification() {
        let original = Record::new(
            "Mon, 1 Jan 2024 10:00:00",
            Category::InterviewReceived,
            "hr@acme.com",
            "Interview",
            "We'd like to schedule...",
        );
        let existing: Table = [original.clone()].into_iter().collect();

        let out = reconcile(
            existing,
            true,
            [email(
                "Mon, 1 Jan 2024 10:00:00",
                "hr@acme.com",
                "Re: Interview (updated)",
                "We'd like to schedule...",
            )],
            &always(Category::RejectionNotice),
        )
        .unwrap();

        assert_eq!(out.table.rows(), &[original]);
        assert!(out.accepted.is_empty());
    }

    #[test]
    fn never_drops_existing_rows() {
        let existing: Table = [
            Record::new("d1", Category::InterviewReceived, "a", "Interview", "x"),
            Record::new("d2", Category::RejectionNotice, "b", "Rejected", "y"),
        ]
        .into_iter()
        .collect();
        let before = existing.rows().to_vec();

        let out = reconcile(
            existing,
            true,
            [
                email("d1", "a", "Rejected", "x"),
                email("d3", "c", "Applied", "z"),
                email("d4", "d", "spam", "w"),
            ],
            &by_subject,
        )
        .unwrap();

        for r in &before {
            assert!(out.table.rows().contains(r));
        }
        assert_eq!(out.table.len(), 3);
    }

    #[test]
    fn output_identities_are_unique() {
        let existing: Table = [Record::new("d1", Category::InterviewReceived, "a", "Interview", "x")]
            .into_iter()
            .collect();
        let out = reconcile(
            existing,
            true,
            [
                email("d1", "a", "Interview again", "x"),
                email("d2", "b", "Applied", "y"),
                email("d2", "b", "Applied (dup)", "y"),
                email("d2", "b", "Interview", "y2"),
            ],
            &by_subject,
        )
        .unwrap();
        assert_eq!(identities(&out.table).len(), out.table.len());
        assert_eq!(out.table.len(), 3);
    }

    #[test]
    fn merge_is_idempotent() {
        let existing: Table = [Record::new("d0", Category::ApplicationSubmitted, "z", "Applied", "q")]
            .into_iter()
            .collect();
        let batch = vec![
            email("d1", "a", "Interview", "x"),
            email("d2", "b", "Rejected", "y"),
            email("d3", "c", "newsletter", "w"),
        ];

        let once = reconcile(existing, true, batch.clone(), &by_subject).unwrap();
        let twice = reconcile(once.table.clone(), true, batch, &by_subject).unwrap();

        assert!(twice.accepted.is_empty());
        assert_eq!(twice.table.rows(), once.table.rows());
    }

    #[test]
    fn identity_uses_truncated_snippet() {
        let long = "s".repeat(180);
        let existing: Table = [Record::new("d", Category::InterviewReceived, "a", "Interview", &long)]
            .into_iter()
            .collect();
        let out = reconcile(
            existing,
            true,
            [email("d", "a", "Interview", &long)],
            &by_subject,
        )
        .unwrap();
        assert!(out.accepted.is_empty());
    }

    #[test]
    fn classifier_sees_candidates_in_order() {
        let seen = RefCell::new(Vec::new());
        let spy = |_: &str, subject: &str, _: &str| -> Result<Category> {
            seen.borrow_mut().push(subject.to_string());
            Ok(Category::ApplicationSubmitted)
        };
        reconcile(
            Table::new(),
            true,
            [email("1", "a", "one", "x"), email("2", "a", "two", "x")],
            &spy,
        )
        .unwrap();
        assert_eq!(*seen.borrow(), vec!["one", "two"]);
    }

    #[test]
    fn classifier_error_aborts() {
        let failing = |_: &str, _: &str, _: &str| -> Result<Category> {
            Err(Error::Auth("token revoked".into()))
        };
        let err = reconcile(
            Table::new(),
            true,
            [email("1", "a", "one", "x")],
            &failing,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Auth(_)));
    }
}
