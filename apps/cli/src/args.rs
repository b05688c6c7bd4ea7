use authsweep_application::PruneRequest;
use authsweep_core::AppResult;
use authsweep_domain::retention_cutoff;
use chrono::{DateTime, Utc};
use clap::Parser;

/// Remove expired users from the Authentication database.
#[derive(Debug, Parser)]
#[command(name = "authsweep", version, arg_required_else_help = true)]
pub struct PruneArgs {
    /// Remove anonymous users who haven't been on the site in this many days.
    #[arg(short = 's', long = "shelflife", default_value_t = 90, allow_negative_numbers = true)]
    pub shelf_life_days: i64,

    /// Print results without changing the directory.
    #[arg(long)]
    pub dry_run: bool,

    /// Prune anonymous users (no email or phone number).
    #[arg(short = 'a', long = "anon")]
    pub prune_anonymous: bool,

    /// Address whose email+xxx@domain tester accounts should be pruned.
    #[arg(short = 't', long = "test-addresses", default_value = "")]
    pub test_addresses: String,
}

impl PruneArgs {
    /// Builds the pruning request relative to `now`.
    pub fn into_request(self, now: DateTime<Utc>) -> AppResult<PruneRequest> {
        let cutoff = retention_cutoff(now, self.shelf_life_days)?;
        let tester_base_address = Some(self.test_addresses).filter(|value| !value.is_empty());

        Ok(PruneRequest {
            cutoff,
            tester_base_address,
            prune_anonymous: self.prune_anonymous,
            dry_run: self.dry_run,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeDelta, TimeZone};

    use super::*;

    fn parse(arguments: &[&str]) -> PruneArgs {
        PruneArgs::try_parse_from(std::iter::once("authsweep").chain(arguments.iter().copied()))
            .unwrap_or_else(|error| panic!("failed to parse {arguments:?}: {error}"))
    }

    fn now() -> DateTime<Utc> {
        Utc.timestamp_opt(1_750_000_000, 0)
            .single()
            .unwrap_or_else(|| panic!("invalid test timestamp"))
    }

    #[test]
    fn defaults_to_ninety_day_shelf_life() {
        let args = parse(&["--anon"]);

        assert_eq!(args.shelf_life_days, 90);
        assert!(args.prune_anonymous);
        assert!(!args.dry_run);
        assert!(args.test_addresses.is_empty());
    }

    #[test]
    fn short_flags_are_accepted() {
        let args = parse(&["-s", "30", "-a", "-t", "bob@x.com", "--dry-run"]);

        assert_eq!(args.shelf_life_days, 30);
        assert!(args.prune_anonymous);
        assert!(args.dry_run);
        assert_eq!(args.test_addresses, "bob@x.com");
    }

    #[test]
    fn no_arguments_shows_help() {
        let result = PruneArgs::try_parse_from(["authsweep"]);
        assert!(result.is_err());
    }

    #[test]
    fn empty_test_address_disables_tester_pruning() {
        let request = parse(&["--anon"])
            .into_request(now())
            .unwrap_or_else(|error| panic!("request failed: {error}"));

        assert_eq!(request.tester_base_address, None);
        assert_eq!(request.cutoff, now() - TimeDelta::days(90));
    }

    #[test]
    fn test_address_is_passed_through_unchanged() {
        let request = parse(&["-t", "no-at-sign"])
            .into_request(now())
            .unwrap_or_else(|error| panic!("request failed: {error}"));

        assert_eq!(request.tester_base_address.as_deref(), Some("no-at-sign"));
        assert!(!request.prune_anonymous);
    }

    #[test]
    fn negative_shelf_life_is_rejected() {
        assert!(parse(&["-s", "-1", "-a"]).into_request(now()).is_err());
    }
}
