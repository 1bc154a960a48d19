pub mod record;

pub use record::{Category, IdentityKey, RawEmail, Record};
