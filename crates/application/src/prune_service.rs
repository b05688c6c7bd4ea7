//! Paginated filter-and-delete driver over the user directory.

use std::sync::Arc;
use std::time::Duration;

use authsweep_core::{AppError, AppResult};
use authsweep_domain::{DeletionResult, UserFilter, UserRecord};
use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use crate::directory_ports::UserDirectory;


/// Pause after the directory rejects a delete batch as an invalid argument.
pub const INVALID_ARGUMENT_PAUSE: Duration = Duration::from_secs(60);

/// Parameters of one pruning run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PruneRequest {
    /// Anonymous accounts idle since before this instant are stale.
    pub cutoff: DateTime<Utc>,
    /// Base address whose `+` aliases are removed, when set.
    pub tester_base_address: Option<String>,
    /// Whether stale anonymous accounts are removed.
    pub prune_anonymous: bool,
    /// Log what would be removed without deleting anything.
    pub dry_run: bool,
}

impl PruneRequest {
    fn filters(&self) -> AppResult<Vec<UserFilter>> {
        let mut filters = Vec::with_capacity(2);
        if let Some(base_address) = self.tester_base_address.as_deref() {
            filters.push(UserFilter::tester(base_address)?);
        }
        if self.prune_anonymous {
            filters.push(UserFilter::stale_anonymous(self.cutoff));
        }

        Ok(filters)
    }
}

/// Totals for one pruning run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PruneSummary {
    /// Accounts the directory confirmed as deleted.
    pub total_deleted: usize,
    /// Accounts matched by any filter, deleted or not.
    pub candidates: usize,
    /// Listing pages processed.
    pub pages: usize,
}

/// Application service that prunes accounts from the user directory.
#[derive(Clone)]
pub struct PruneService {
    directory: Arc<dyn UserDirectory>,
    invalid_argument_pause: Duration,
}

impl PruneService {
    /// Creates a service using the standard invalid-argument pause.
    #[must_use]
    pub fn new(directory: Arc<dyn UserDirectory>) -> Self {
        Self {
            directory,
            invalid_argument_pause: INVALID_ARGUMENT_PAUSE,
        }
    }

    /// Overrides the pause taken after an invalid-argument delete failure.
    #[must_use]
    pub fn with_invalid_argument_pause(mut self, pause: Duration) -> Self {
        self.invalid_argument_pause = pause;
        self
    }

    /// Walks every directory page and removes the accounts selected by `request`.
    ///
    /// Each filter submits at most one delete batch per page. Pages are
    /// processed strictly in order and never concurrently.
    pub async fn prune(&self, request: &PruneRequest) -> AppResult<PruneSummary> {
        let filters = request.filters()?;
        let mut summary = PruneSummary::default();
        let mut page_token: Option<String> = None;

        loop {
            let page = self.directory.list_users(page_token.as_deref()).await?;
            summary.pages += 1;

            for filter in &filters {
                let uids: Vec<String> = page
                    .users
                    .iter()
                    .filter(|user| filter.matches(user))
                    .map(|user| user.uid().to_owned())
                    .collect();
                summary.candidates += uids.len();

                if uids.is_empty() {
                    info!(
                        kind = filter.label(),
                        page = summary.pages,
                        "no matching users in this page"
                    );
                    continue;
                }

                if request.dry_run {
                    info!(
                        kind = filter.label(),
                        count = uids.len(),
                        "dry-run: would have deleted {} {} users",
                        uids.len(),
                        filter.label()
                    );
                    continue;
                }

                if let UserFilter::Tester { base_address } = filter {
                    info!(
                        base_address = base_address.as_str(),
                        count = uids.len(),
                        "removing test users with '+' aliases"
                    );
                }
                summary.total_deleted += self.delete_batch(&uids, filter.label()).await?;
            }

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(summary)
    }

    /// Returns every account in the directory selected by `filter`.
    pub async fn list_candidates(&self, filter: &UserFilter) -> AppResult<Vec<UserRecord>> {
        let mut candidates = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page = self.directory.list_users(page_token.as_deref()).await?;
            candidates.extend(page.users.into_iter().filter(|user| filter.matches(user)));

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(candidates)
    }

    /// Deletes identifiers an operator already confirmed, as a single batch.
    pub async fn delete_confirmed(&self, uids: &[String], kind: &str) -> AppResult<usize> {
        if uids.is_empty() {
            return Ok(0);
        }

        self.delete_batch(uids, kind).await
    }

    /// Submits one delete batch and returns how many accounts were removed.
    ///
    /// An invalid-argument rejection pauses the run and counts as zero.
    /// Identifiers rejected individually are logged and excluded.
    pub async fn delete_batch(&self, uids: &[String], kind: &str) -> AppResult<usize> {
        match self.directory.delete_users(uids).await {
            Ok(result) => {
                info!(
                    kind,
                    deleted = result.success_count,
                    "successfully deleted {} {kind} users",
                    result.success_count
                );
                if result.failure_count > 0 {
                    info!(
                        kind,
                        failed = result.failure_count,
                        "failed to delete {} users",
                        result.failure_count
                    );
                }
                for failure in failed_deletions(uids, &result) {
                    error!(
                        index = failure.index,
                        uid = failure.uid,
                        reason = failure.reason,
                        "user deletion failed"
                    );
                }

                Ok(result.success_count)
            }
            Err(AppError::InvalidArgument(message)) => {
                warn!(kind, batch_size = uids.len(), error = %message, "directory rejected delete batch");
                warn!(
                    pause_seconds = self.invalid_argument_pause.as_secs(),
                    "pausing before the next batch"
                );
                tokio::time::sleep(self.invalid_argument_pause).await;
                Ok(0)
            }
            Err(error) => Err(error),
        }
    }
}

/// One refused identifier, as logged after a delete batch.
#[derive(Debug, PartialEq, Eq)]
struct FailedDeletion<'a> {
    index: usize,
    uid: &'a str,
    reason: &'a str,
}

/// Pairs each reported failure with the uid submitted at its own index.
fn failed_deletions<'a>(uids: &'a [String], result: &'a DeletionResult) -> Vec<FailedDeletion<'a>> {
    result
        .errors
        .iter()
        .map(|failure| FailedDeletion {
            index: failure.index,
            uid: uids.get(failure.index).map_or("<unknown>", String::as_str),
            reason: failure.reason.as_str(),
        })
        .collect()
}
