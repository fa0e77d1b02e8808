//! Login, logout, session and language scenarios

use cmdb_browser::{expect, BrowsingContext};
use cmdb_core::{Result, RunConfig};
use cmdb_harness::auth::{
    self, expect_marker, login_ui, login_with_certificate, open_login_menu, CERTIFICATE_ENTRY, MARKER_TEXT,
};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::time::Duration;
use tracing::info;

pub const SIGN_OUT_BUTTON: &str = "button[aria-label=\"Sign out\"]";
pub const LANGUAGE_BUTTON: &str = "button[aria-label=\"Change language\"]";
pub const ENGLISH_OPTION: &str = "li[aria-label=\"English\"]";

pub fn login_success<'a>(context: &'a BrowsingContext, config: &'a RunConfig) -> BoxFuture<'a, Result<()>> {
    async move {
        let page = context.page();
        login_ui(page, config).await?;
        expect(&page.get_by_text(MARKER_TEXT).first()).to_be_visible().await?;
        info!("Form login succeeded");
        Ok(())
    }
    .boxed()
}

/// Wrong credentials show a 401 and never reach the application
pub fn login_negative<'a>(context: &'a BrowsingContext, _config: &'a RunConfig) -> BoxFuture<'a, Result<()>> {
    async move {
        let page = context.page();
        auth::submit_login_form(page, "log", "pass").await?;

        expect(&page.get_by_text("401").first()).to_be_visible().await?;
        expect(&page.get_by_text(MARKER_TEXT)).to_be_hidden().await?;
        info!("Rejected login reported 401");
        Ok(())
    }
    .boxed()
}

pub fn logout<'a>(context: &'a BrowsingContext, config: &'a RunConfig) -> BoxFuture<'a, Result<()>> {
    async move {
        let page = context.page();
        login_with_certificate(page, config).await?;

        page.locator(SIGN_OUT_BUTTON).first().click().await?;
        expect(&page.get_by_text("Логин").first()).to_be_visible().await?;
        info!("Signed out");
        Ok(())
    }
    .boxed()
}

pub fn login_certificate<'a>(context: &'a BrowsingContext, config: &'a RunConfig) -> BoxFuture<'a, Result<()>> {
    async move {
        let page = context.page();
        login_with_certificate(page, config).await?;
        expect_marker(page).await?;
        info!("Certificate login succeeded");
        Ok(())
    }
    .boxed()
}

/// The certificate entry of the login menu is offered and usable
pub fn certificate_login_button_available<'a>(
    context: &'a BrowsingContext,
    _config: &'a RunConfig,
) -> BoxFuture<'a, Result<()>> {
    async move {
        let page = context.page();
        open_login_menu(page).await?;

        let entry = page.get_by_text(CERTIFICATE_ENTRY).first();
        expect(&entry).to_be_visible().await?;
        expect(&entry).to_be_enabled().await?;
        Ok(())
    }
    .boxed()
}

pub fn session_expired<'a>(context: &'a BrowsingContext, config: &'a RunConfig) -> BoxFuture<'a, Result<()>> {
    async move {
        auth::session_expired(context, config).await?;
        info!("Cleared cookies sent the session back to the login form");
        Ok(())
    }
    .boxed()
}

pub fn change_language<'a>(context: &'a BrowsingContext, config: &'a RunConfig) -> BoxFuture<'a, Result<()>> {
    async move {
        let page = context.page();
        login_with_certificate(page, config).await?;

        let language = page.locator(LANGUAGE_BUTTON).first();
        expect(&language).to_be_visible().await?;
        language.click().await?;
        page.locator(ENGLISH_OPTION).first().click().await?;

        expect(&page.get_by_text("ALL PC").first()).to_be_visible().await?;
        page.pause(Duration::from_secs(1)).await;
        Ok(())
    }
    .boxed()
}
