//! Endpoint and collection navigation scenarios

use cmdb_browser::{expect, BrowsingContext};
use cmdb_core::{Result, RunConfig};
use cmdb_harness::auth::login_with_certificate;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::time::Duration;
use tracing::info;

pub const FIRST_ENDPOINT_NAME: &str =
    "tr[role=\"row\"]:nth-child(1) td[data-column-id=\"name\"] span.text-tooltip";
pub const NAME_CELL: &str = "td[data-column-id=\"name\"]";

/// Collections in the side menu, by their exact label
pub const COLLECTIONS: [&str; 5] = ["all_pc", "Core i7", "Linux", "online", "endpoint_ram"];

/// How long a collection may take to render its table
const TABLE_TIMEOUT: Duration = Duration::from_secs(5);

pub fn open_endpoint<'a>(context: &'a BrowsingContext, config: &'a RunConfig) -> BoxFuture<'a, Result<()>> {
    async move {
        let page = context.page();
        login_with_certificate(page, config).await?;
        expect(&page.get_by_text("Все СВТ").first()).to_be_visible().await?;
        page.pause(Duration::from_secs(1)).await;

        let name = page.locator(FIRST_ENDPOINT_NAME).first().text_content().await?;
        info!("First endpoint in the table: {}", name.as_deref().unwrap_or("<none>"));

        page.locator(NAME_CELL).first().dblclick().await?;
        expect(&page.get_by_text("Сводка").first()).to_be_visible().await?;
        info!("Endpoint card opened");
        page.pause(Duration::from_secs(2)).await;
        Ok(())
    }
    .boxed()
}

/// Every collection opens a table and history returns from it
pub fn smoke_navigation_through_collections<'a>(
    context: &'a BrowsingContext,
    config: &'a RunConfig,
) -> BoxFuture<'a, Result<()>> {
    async move {
        let page = context.page();
        login_with_certificate(page, config).await?;

        for collection in COLLECTIONS {
            page.get_by_text_exact(collection).first().click().await?;
            expect(&page.locator("table").first())
                .with_timeout(TABLE_TIMEOUT)
                .to_be_visible()
                .await?;
            page.pause(Duration::from_secs(1)).await;
            page.go_back().await?;
        }

        info!("All {} collections reachable", COLLECTIONS.len());
        Ok(())
    }
    .boxed()
}
