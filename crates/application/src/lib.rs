//! Application services and ports.

#![forbid(unsafe_code)]

mod directory_ports;
mod prune_service;

pub use directory_ports::{MAX_DELETE_BATCH_SIZE, MAX_LIST_PAGE_SIZE, UserDirectory};
pub use prune_service::{INVALID_ARGUMENT_PAUSE, PruneRequest, PruneService, PruneSummary};
