//! Account classification rules.
//!
//! Pure predicates over listed accounts.

use authsweep_core::{AppError, AppResult, NonEmptyString};
use chrono::{DateTime, TimeDelta, Utc};

use crate::UserRecord;

/// Returns whether `user` is an anonymous account idle since before `cutoff`.
///
/// Anonymous means neither email nor phone number. The account must have been
/// created before `cutoff` and must not have refreshed its session since.
#[must_use]
pub fn is_stale_anonymous(user: &UserRecord, cutoff: DateTime<Utc>) -> bool {
    user.email().is_none()
        && user.phone_number().is_none()
        && user.created_at() < cutoff
        && user
            .last_refresh_at()
            .is_none_or(|last_refresh_at| last_refresh_at < cutoff)
}

/// Returns whether `user` is a `local+marker@domain` alias of `base_address`.
#[must_use]
pub fn is_tester(user: &UserRecord, base_address: &str) -> bool {
    let local_part = tester_local_part(base_address);

    user.email().is_some_and(|email| {
        email
            .strip_prefix(local_part)
            .is_some_and(|rest| rest.starts_with('+'))
    })
}

/// Returns the part of `base_address` before the first `@`.
///
/// An address without `@` is returned whole.
#[must_use]
pub fn tester_local_part(base_address: &str) -> &str {
    base_address
        .split_once('@')
        .map_or(base_address, |(local_part, _)| local_part)
}

/// Returns the instant `shelf_life_days` days before `now`.
pub fn retention_cutoff(now: DateTime<Utc>, shelf_life_days: i64) -> AppResult<DateTime<Utc>> {
    if shelf_life_days < 0 {
        return Err(AppError::Validation(format!(
            "shelf life must not be negative, got {shelf_life_days} days"
        )));
    }

    TimeDelta::try_days(shelf_life_days)
        .and_then(|shelf_life| now.checked_sub_signed(shelf_life))
        .ok_or_else(|| {
            AppError::Validation(format!(
                "shelf life of {shelf_life_days} days is out of range"
            ))
        })
}

/// Selection policy applied to every listed page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserFilter {
    /// Email aliases of a base address.
    Tester {
        /// Address whose local part prefixes the aliases.
        base_address: NonEmptyString,
    },
    /// Anonymous accounts idle since before `cutoff`.
    StaleAnonymous {
        /// Creation and refresh times must precede this instant.
        cutoff: DateTime<Utc>,
    },
}

impl UserFilter {
    /// Creates a tester filter for `base_address`.
    pub fn tester(base_address: impl Into<String>) -> AppResult<Self> {
        Ok(Self::Tester {
            base_address: NonEmptyString::new(base_address)?,
        })
    }

    /// Creates a stale anonymous filter for `cutoff`.
    #[must_use]
    pub fn stale_anonymous(cutoff: DateTime<Utc>) -> Self {
        Self::StaleAnonymous { cutoff }
    }

    /// Returns whether `user` is selected by this filter.
    #[must_use]
    pub fn matches(&self, user: &UserRecord) -> bool {
        match self {
            Self::Tester { base_address } => is_tester(user, base_address.as_str()),
            Self::StaleAnonymous { cutoff } => is_stale_anonymous(user, *cutoff),
        }
    }

    /// Returns the account kind used in log lines.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Tester { .. } => "test",
            Self::StaleAnonymous { .. } => "stale anonymous",
        }
    }
}
