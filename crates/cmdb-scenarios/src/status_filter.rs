//! Status column filter, one scenario per status value

use async_trait::async_trait;
use cmdb_browser::page::ACTION_TIMEOUT;
use cmdb_browser::{expect, wait_until, BrowsingContext};
use cmdb_core::{CmdbError, Result, RunConfig};
use cmdb_harness::auth::login_with_certificate;
use cmdb_harness::Scenario;
use std::fmt;
use std::sync::Mutex;
use tracing::{debug, info};

pub const STATUS_COLUMN_TITLE: &str = "span.p-datatable-column-title";
pub const COLUMN_FILTER: &str = "div[data-pc-section=\"filter\"]";
pub const FILTER_BUTTON: &str = "button.p-datatable-column-filter-button";
pub const FILTER_OVERLAY: &str = ".p-datatable-filter-overlay";
pub const FILTER_DROPDOWN: &str = ".p-datatable-filter-overlay .p-select-dropdown";
pub const APPLY_BUTTON: &str = "button[aria-label=\"Принять\"]";
pub const TABLE_ROWS: &str = "tbody tr";
pub const STATUS_CELL: &str = "td[data-column-id=\"endpoint_status\"]";

/// What the status badge class must look like for a filtered row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusExpectation {
    /// The class attribute contains this token
    ClassContains(&'static str),
    /// The class attribute is exactly this value
    ExactClass(&'static str),
}

impl StatusExpectation {
    pub fn matches(&self, class_attr: Option<&str>) -> bool {
        match (self, class_attr) {
            (_, None) => false,
            (StatusExpectation::ClassContains(token), Some(class)) => class.contains(token),
            (StatusExpectation::ExactClass(expected), Some(class)) => class == *expected,
        }
    }

    /// A non-empty result set where every status badge matches
    pub fn matches_all(&self, classes: &[Option<String>]) -> bool {
        !classes.is_empty() && classes.iter().all(|class| self.matches(class.as_deref()))
    }
}

impl fmt::Display for StatusExpectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusExpectation::ClassContains(token) => write!(f, "class containing {:?}", token),
            StatusExpectation::ExactClass(class) => write!(f, "class exactly {:?}", class),
        }
    }
}

/// Filter the endpoint table by one status and check every row
#[derive(Debug, Clone, Copy)]
pub struct StatusFilterCase {
    /// Label of the status in the filter list
    pub ui_status: &'static str,
    pub expectation: StatusExpectation,
}

pub const STATUS_CASES: [StatusFilterCase; 3] = [
    StatusFilterCase {
        ui_status: "В сети",
        expectation: StatusExpectation::ClassContains("--success"),
    },
    StatusFilterCase {
        ui_status: "Не в сети",
        expectation: StatusExpectation::ClassContains("--danger"),
    },
    StatusFilterCase {
        ui_status: "Архивный",
        expectation: StatusExpectation::ExactClass("v-status"),
    },
];

#[async_trait]
impl Scenario<BrowsingContext> for StatusFilterCase {
    fn id(&self) -> String {
        format!("test_filter_by_status[{}]", self.ui_status)
    }

    async fn run(&self, context: &BrowsingContext, config: &RunConfig) -> Result<()> {
        info!("Filtering by status: {}", self.ui_status);
        let page = context.page();
        login_with_certificate(page, config).await?;

        page.locator(STATUS_COLUMN_TITLE)
            .filter_has_text("Статус")
            .following_sibling(COLUMN_FILTER)
            .locator(FILTER_BUTTON)
            .first()
            .click()
            .await?;

        page.locator(FILTER_DROPDOWN).first().click().await?;
        page.locator(&format!("li[aria-label=\"{}\"]", self.ui_status))
            .first()
            .click()
            .await?;
        page.locator(APPLY_BUTTON).first().click().await?;

        expect(&page.locator(FILTER_OVERLAY)).to_be_hidden().await?;

        // The table is re-rendered asynchronously; poll until the rows settle
        let badges = page.locator(TABLE_ROWS).locator(STATUS_CELL).locator("div");
        let last_seen: Mutex<Vec<Option<String>>> = Mutex::new(Vec::new());
        let what = format!("every row to have {} after filtering by {}", self.expectation, self.ui_status);
        let settled = wait_until(&what, ACTION_TIMEOUT, || async {
            let classes = badges.all_attributes("class").await?;
            let done = self.expectation.matches_all(&classes);
            if let Ok(mut last) = last_seen.lock() {
                *last = classes;
            }
            Ok(done)
        })
        .await;

        let classes = last_seen.into_inner().unwrap_or_default();
        match settled {
            Ok(()) => {}
            Err(CmdbError::Timeout { .. }) if classes.is_empty() => {
                return Err(CmdbError::AssertionFailed(format!(
                    "no rows after filtering by {}",
                    self.ui_status
                )));
            }
            Err(CmdbError::Timeout { .. }) => {
                return Err(CmdbError::AssertionFailed(format!(
                    "rows filtered by {}: expected {}, got {:?}",
                    self.ui_status, self.expectation, classes
                )));
            }
            Err(e) => return Err(e),
        }
        debug!("Status classes: {:?}", classes);
        info!("{} row(s) match status {}", classes.len(), self.ui_status);
        Ok(())
    }
}
