//! Table search scenarios

use cmdb_browser::{expect, wait_until, BrowsingContext, DEFAULT_EXPECT_TIMEOUT};
use cmdb_core::{Result, RunConfig};
use cmdb_harness::auth::login_with_certificate;
use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::info;

pub const SEARCH_INPUT: &str = "input[placeholder=\"Поиск по имени\"]";
pub const EMPTY_STATE: &str = "Нет данных";

/// Term present in the demo data set
pub const EXISTING_TERM: &str = "astr";
pub const MISSING_TERM: &str = "NON_EXISTENT_VALUE_123456";

/// Searching narrows the table to rows or to the empty state
pub fn search_filters_table_by_any_column<'a>(
    context: &'a BrowsingContext,
    config: &'a RunConfig,
) -> BoxFuture<'a, Result<()>> {
    async move {
        let page = context.page();
        login_with_certificate(page, config).await?;
        expect(&page.locator("table").first()).to_be_visible().await?;

        let search = page.locator(SEARCH_INPUT).first();
        expect(&search).to_be_visible().await?;
        search.fill(EXISTING_TERM).await?;

        let first_row = page.locator("tbody tr").first();
        let empty = page.get_by_text(EMPTY_STATE).first();
        wait_until("a visible row or the empty state", DEFAULT_EXPECT_TIMEOUT, || async {
            Ok(first_row.is_visible().await? || empty.is_visible().await?)
        })
        .await?;

        info!("Search for {:?} settled", EXISTING_TERM);
        Ok(())
    }
    .boxed()
}

pub fn search_no_results_shows_empty_state<'a>(
    context: &'a BrowsingContext,
    config: &'a RunConfig,
) -> BoxFuture<'a, Result<()>> {
    async move {
        let page = context.page();
        login_with_certificate(page, config).await?;

        let search = page.locator(SEARCH_INPUT).first();
        expect(&search).to_be_visible().await?;
        search.fill(MISSING_TERM).await?;

        expect(&page.get_by_text(EMPTY_STATE).first()).to_be_visible().await?;
        info!("Search for a missing value shows the empty state");
        Ok(())
    }
    .boxed()
}
