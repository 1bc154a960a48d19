//! Daily job-application tracker: fetches recent mail, classifies it, and
//! merges new rows into a CSV table without duplicating existing ones.

pub mod auth;
pub mod classify;
pub mod config;
pub mod domain;
pub mod error;
pub mod http;
pub mod mail;
pub mod reconcile;
pub mod runner;
pub mod store;

pub use error::{Error, Result};
