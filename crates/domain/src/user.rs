//! Directory account snapshots and deletion outcomes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Read-only snapshot of one account as listed by the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    uid: String,
    email: Option<String>,
    phone_number: Option<String>,
    created_at: DateTime<Utc>,
    last_refresh_at: Option<DateTime<Utc>>,
}

impl UserRecord {
    /// Creates a record with no email, phone or refresh history.
    ///
    /// Use the `with_*` builders to fill in the optional parts.
    #[must_use]
    pub fn new(uid: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            uid: uid.into(),
            email: None,
            phone_number: None,
            created_at,
            last_refresh_at: None,
        }
    }

    /// Sets the email. Blank values are stored as absent.
    #[must_use]
    pub fn with_email(mut self, email: Option<String>) -> Self {
        self.email = email.filter(|value| !value.trim().is_empty());
        self
    }

    /// Sets the phone number. Blank values are stored as absent.
    #[must_use]
    pub fn with_phone_number(mut self, phone_number: Option<String>) -> Self {
        self.phone_number = phone_number.filter(|value| !value.trim().is_empty());
        self
    }

    /// Sets the last token refresh time.
    #[must_use]
    pub fn with_last_refresh_at(mut self, last_refresh_at: Option<DateTime<Utc>>) -> Self {
        self.last_refresh_at = last_refresh_at;
        self
    }

    /// Returns the provider-assigned identifier.
    #[must_use]
    pub fn uid(&self) -> &str {
        self.uid.as_str()
    }

    /// Returns the email, if the account has one.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Returns the phone number, if the account has one.
    #[must_use]
    pub fn phone_number(&self) -> Option<&str> {
        self.phone_number.as_deref()
    }

    /// Returns when the account was created.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns when the account last refreshed its session, if ever.
    #[must_use]
    pub fn last_refresh_at(&self) -> Option<DateTime<Utc>> {
        self.last_refresh_at
    }
}

/// One page of a directory listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPage {
    /// Records in listing order.
    pub users: Vec<UserRecord>,
    /// Continuation token for the following page, `None` on the last page.
    pub next_page_token: Option<String>,
}

impl UserPage {
    /// Returns whether another page follows this one.
    #[must_use]
    pub fn has_next_page(&self) -> bool {
        self.next_page_token.is_some()
    }
}

/// A single identifier the directory refused to delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionError {
    /// Position of the identifier within the submitted batch.
    pub index: usize,
    /// Provider-supplied reason.
    pub reason: String,
}

/// Outcome of one bulk delete call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeletionResult {
    /// Identifiers deleted.
    pub success_count: usize,
    /// Identifiers rejected.
    pub failure_count: usize,
    /// Per-identifier failures.
    pub errors: Vec<DeletionError>,
}

impl DeletionResult {
    /// Builds a result for a batch of `submitted` identifiers with the given failures.
    #[must_use]
    pub fn from_errors(submitted: usize, errors: Vec<DeletionError>) -> Self {
        let failure_count = errors.len().min(submitted);
        Self {
            success_count: submitted - failure_count,
            failure_count,
            errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn blank_contact_fields_are_treated_as_absent() {
        let created_at = Utc.timestamp_opt(1_600_000_000, 0).single();
        let record = UserRecord::new("uid-1", created_at.unwrap_or_default())
            .with_email(Some("   ".to_owned()))
            .with_phone_number(Some(String::new()));

        assert_eq!(record.email(), None);
        assert_eq!(record.phone_number(), None);
    }

    #[test]
    fn deletion_result_counts_failures_against_batch() {
        let result = DeletionResult::from_errors(
            3,
            vec![DeletionError {
                index: 1,
                reason: "user not found".to_owned(),
            }],
        );

        assert_eq!(result.success_count, 2);
        assert_eq!(result.failure_count, 1);
    }

    #[test]
    fn page_without_token_is_last() {
        assert!(!UserPage::default().has_next_page());
    }
}
