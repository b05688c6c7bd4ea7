use std::collections::{BTreeMap, HashSet};
use std::ops::Bound;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use authsweep_application::{MAX_DELETE_BATCH_SIZE, MAX_LIST_PAGE_SIZE, UserDirectory};
use authsweep_core::{AppError, AppResult};
use authsweep_domain::{DeletionError, DeletionResult, UserPage, UserRecord};
use tokio::sync::RwLock;

/// In-memory user directory implementation.
///
/// Pages are ordered by uid and continue after the last uid of the previous
/// page, so deleting while paginating never skips records.
#[derive(Debug)]
pub struct InMemoryUserDirectory {
    users: RwLock<BTreeMap<String, UserRecord>>,
    page_size: usize,
    protected_uids: RwLock<HashSet<String>>,
    reject_deletes: AtomicBool,
    delete_calls: RwLock<Vec<Vec<String>>>,
}

impl InMemoryUserDirectory {
    /// Creates an empty directory returning at most `page_size` users per page.
    #[must_use]
    pub fn new(page_size: usize) -> Self {
        Self {
            users: RwLock::new(BTreeMap::new()),
            page_size: page_size.clamp(1, MAX_LIST_PAGE_SIZE),
            protected_uids: RwLock::new(HashSet::new()),
            reject_deletes: AtomicBool::new(false),
            delete_calls: RwLock::new(Vec::new()),
        }
    }

    /// Seeds the directory with `users`.
    #[must_use]
    pub fn with_users(self, users: impl IntoIterator<Item = UserRecord>) -> Self {
        let users = users
            .into_iter()
            .map(|user| (user.uid().to_owned(), user))
            .collect();

        Self {
            users: RwLock::new(users),
            ..self
        }
    }

    /// Makes deletes of `uid` fail individually.
    pub async fn protect_uid(&self, uid: impl Into<String>) {
        self.protected_uids.write().await.insert(uid.into());
    }

    /// Makes every delete batch fail as an invalid argument.
    pub fn reject_deletes(&self, reject: bool) {
        self.reject_deletes.store(reject, Ordering::SeqCst);
    }

    /// Returns the uids still present, in listing order.
    pub async fn uids(&self) -> Vec<String> {
        self.users.read().await.keys().cloned().collect()
    }

    /// Returns every batch submitted for deletion, in call order.
    pub async fn delete_calls(&self) -> Vec<Vec<String>> {
        self.delete_calls.read().await.clone()
    }
}

impl Default for InMemoryUserDirectory {
    fn default() -> Self {
        Self::new(MAX_LIST_PAGE_SIZE)
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn list_users(&self, page_token: Option<&str>) -> AppResult<UserPage> {
        let users = self.users.read().await;
        let lower = match page_token {
            Some(token) => Bound::Excluded(token),
            None => Bound::Unbounded,
        };

        let mut remaining = users.range::<str, _>((lower, Bound::Unbounded));
        let page: Vec<UserRecord> = remaining
            .by_ref()
            .take(self.page_size)
            .map(|(_, user)| user.clone())
            .collect();
        let next_page_token = if remaining.next().is_some() {
            page.last().map(|user| user.uid().to_owned())
        } else {
            None
        };

        Ok(UserPage {
            users: page,
            next_page_token,
        })
    }

    async fn delete_users(&self, uids: &[String]) -> AppResult<DeletionResult> {
        self.delete_calls.write().await.push(uids.to_vec());

        if self.reject_deletes.load(Ordering::SeqCst) {
            return Err(AppError::InvalidArgument(
                "delete batch rejected by directory".to_owned(),
            ));
        }

        if uids.len() > MAX_DELETE_BATCH_SIZE {
            return Err(AppError::InvalidArgument(format!(
                "a delete batch must contain at most {MAX_DELETE_BATCH_SIZE} uids, got {}",
                uids.len()
            )));
        }

        let protected_uids = self.protected_uids.read().await;
        let mut users = self.users.write().await;
        let mut errors = Vec::new();

        for (index, uid) in uids.iter().enumerate() {
            if protected_uids.contains(uid) {
                errors.push(DeletionError {
                    index,
                    reason: format!("user '{uid}' is protected"),
                });
                continue;
            }

            users.remove(uid);
        }

        Ok(DeletionResult::from_errors(uids.len(), errors))
    }
}
