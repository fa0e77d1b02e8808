//! Smoke scenarios for the CMDB web application
//!
//! Each scenario starts from its own fresh browser context. Scenarios that
//! need certificate login report *skipped* when no certificate is configured.
//!
//! ```no_run
//! use cmdb_core::RunConfig;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RunConfig::from_env()?;
//!     let summary = cmdb_harness::run_suite(&config, &cmdb_scenarios::suite(), None).await?;
//!     println!("{}", summary);
//!     Ok(())
//! }
//! ```

pub mod login;
pub mod navigation;
pub mod search;
pub mod status_filter;

use cmdb_browser::BrowsingContext;
use cmdb_harness::{FnScenario, Scenario};
use status_filter::STATUS_CASES;

/// Every scenario, in execution order
pub fn suite() -> Vec<Box<dyn Scenario<BrowsingContext>>> {
    let mut scenarios: Vec<Box<dyn Scenario<BrowsingContext>>> = vec![
        Box::new(FnScenario::new("test_login_success", login::login_success)),
        Box::new(FnScenario::new("test_login_negative", login::login_negative)),
        Box::new(FnScenario::new("test_logout", login::logout)),
        Box::new(FnScenario::new("test_login_sertificate", login::login_certificate)),
        Box::new(FnScenario::new(
            "test_certificate_login_button_available",
            login::certificate_login_button_available,
        )),
        Box::new(FnScenario::new("test_open_endpoint", navigation::open_endpoint)),
        Box::new(FnScenario::new(
            "test_smoke_navigation_through_collections",
            navigation::smoke_navigation_through_collections,
        )),
        Box::new(FnScenario::new("test_session_expired", login::session_expired)),
        Box::new(FnScenario::new("test_change_language", login::change_language)),
    ];

    for case in STATUS_CASES {
        scenarios.push(Box::new(case));
    }

    scenarios.push(Box::new(FnScenario::new(
        "test_search_filters_table_by_any_column",
        search::search_filters_table_by_any_column,
    )));
    scenarios.push(Box::new(FnScenario::new(
        "test_search_no_results_shows_empty_state",
        search::search_no_results_shows_empty_state,
    )));

    scenarios
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_suite_ids_are_unique() {
        let ids: Vec<String> = suite().iter().map(|s| s.id()).collect();
        assert_eq!(ids.len(), 14);

        let unique: HashSet<&String> = ids.iter().collect();
        assert_eq!(unique.len(), ids.len());
        assert_eq!(ids[0], "test_login_success");
        assert!(ids.contains(&"test_filter_by_status[Архивный]".to_string()));
        assert_eq!(ids[13], "test_search_no_results_shows_empty_state");
    }
}
