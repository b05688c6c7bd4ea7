use async_trait::async_trait;
use authsweep_core::AppResult;
use authsweep_domain::{DeletionResult, UserPage};

/// Largest page the directory returns from one listing call.
pub const MAX_LIST_PAGE_SIZE: usize = 1000;

/// Largest number of identifiers accepted by one bulk delete call.
pub const MAX_DELETE_BATCH_SIZE: usize = 1000;

/// Port for the external authentication directory.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Returns the page following `page_token`, or the first page when `None`.
    async fn list_users(&self, page_token: Option<&str>) -> AppResult<UserPage>;

    /// Deletes `uids` in one call.
    ///
    /// Rejected batches fail with `AppError::InvalidArgument`. Identifiers the
    /// directory refuses individually are reported in the result instead.
    async fn delete_users(&self, uids: &[String]) -> AppResult<DeletionResult>;
}
