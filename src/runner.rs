use log::info;

use crate::classify::Classify;
use crate::error::Result;
use crate::mail::MailSource;
use crate::reconcile::reconcile;
use crate::store::TableStore;

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Reconcile and report, but leave the stored table alone.
    pub dry_run: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The mail source returned nothing; the table was not touched.
    NoEmails,
    /// Emails were fetched but none qualified; the table was not rewritten.
    NothingNew { fetched: usize },
    /// New rows were accepted (and saved unless dry-running).
    Updated {
        fetched: usize,
        accepted: usize,
        total_rows: usize,
        saved: bool,
    },
}

/// One fetch → classify → reconcile → save pass.
pub struct Runner<'a> {
    mail: &'a dyn MailSource,
    classifier: &'a dyn Classify,
    store: &'a dyn TableStore,
    opts: RunOptions,
}

impl<'a> Runner<'a> {
    pub fn new(
        mail: &'a dyn MailSource,
        classifier: &'a dyn Classify,
        store: &'a dyn TableStore,
        opts: RunOptions,
    ) -> Self {
        Self {
            mail,
            classifier,
            store,
            opts,
        }
    }

    /// Any error aborts before the save, leaving the stored table as it was.
    pub fn run(&self) -> Result<RunOutcome> {
        let emails = self.mail.fetch_recent()?;
        let fetched = emails.len();
        if emails.is_empty() {
            println!("No new emails in the last 24 hours.");
            return Ok(RunOutcome::NoEmails);
        }
        println!("Fetched {fetched} emails.");

        let loaded = self.store.load()?;
        info!(
            "loaded table: {} rows (had data rows: {})",
            loaded.table.len(),
            loaded.had_data_rows
        );

        let merged = reconcile(loaded.table, loaded.had_data_rows, emails, self.classifier)?;
        let accepted = merged.accepted.len();
        if accepted == 0 {
            println!("No new unique emails to record.");
            return Ok(RunOutcome::NothingNew { fetched });
        }

        for r in &merged.accepted {
            info!("accepted [{}] {} / {}", r.category, r.sender, r.subject);
        }

        let total_rows = merged.table.len();
        if self.opts.dry_run {
            println!("Dry run: {accepted} new rows ({total_rows} total) not saved.");
        } else {
            self.store.save(&merged.table)?;
            println!("Added {accepted} new rows ({total_rows} total).");
        }

        Ok(RunOutcome::Updated {
            fetched,
            accepted,
            total_rows,
            saved: !self.opts.dry_run,
        })
    }
}
