pub mod gmail;

use crate::domain::RawEmail;
use crate::error::Result;

pub use gmail::GmailClient;

/// Source of candidate emails for one run.
pub trait MailSource {
    /// Emails received in the trailing window, in provider order.
    fn fetch_recent(&self) -> Result<Vec<RawEmail>>;
}
