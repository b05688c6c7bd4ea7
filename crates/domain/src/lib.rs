//! Domain entities and classification rules.

#![forbid(unsafe_code)]

mod filter;
mod user;

pub use filter::{
    UserFilter, is_stale_anonymous, is_tester, retention_cutoff, tester_local_part,
};
pub use user::{DeletionError, DeletionResult, UserPage, UserRecord};
