//! Locator engine behavior against a real Chromium
//!
//! These launch a local browser, so they are ignored by default:
//!
//! ```text
//! cargo test -p cmdb-browser --test locator_engine -- --ignored
//! ```

use cmdb_browser::{expect, BrowserOptions, BrowserProcess, BrowsingContext, CmdbError, Page};
use cmdb_core::RunConfig;
use std::time::Duration;

const SHORT: Duration = Duration::from_millis(500);

struct Fixture {
    context: BrowsingContext,
    browser: BrowserProcess,
}

impl Fixture {
    async fn with_content(html: &str) -> Self {
        let config = RunConfig::from_lookup(|_| None).unwrap();
        let browser = BrowserProcess::launch(BrowserOptions::default()).await.unwrap();
        let context = BrowsingContext::create(&browser, &config).await.unwrap();
        context.page().goto("about:blank").await.unwrap();
        context.page().set_content(html).await.unwrap();
        Self { context, browser }
    }

    fn page(&self) -> &Page {
        self.context.page()
    }

    async fn close(self) {
        self.context.close().await.unwrap();
        self.browser.close().await.unwrap();
    }
}

const LOGIN_PAGE: &str = r#"<html>
<head><title>CMDB</title><script>window.app = { name: "CMDB" };</script></head>
<body>
  <form>
    <input name="login"><input name="password" type="password">
    <button type="button">Войти</button>
  </form>
  <script>console.log("CMDB");</script>
  <noscript>CMDB</noscript>
</body>
</html>"#;

#[tokio::test(flavor = "multi_thread")]
#[ignore = "launches a local Chrome; run with --ignored"]
async fn test_text_in_head_and_scripts_is_not_matched() {
    let fixture = Fixture::with_content(LOGIN_PAGE).await;
    let page = fixture.page();

    let marker = page.get_by_text("CMDB");
    assert_eq!(marker.count().await.unwrap(), 0);
    assert!(!marker.first().is_visible().await.unwrap());
    expect(&marker).with_timeout(SHORT).to_be_hidden().await.unwrap();
    assert_eq!(page.get_by_role("button", "Войти").count().await.unwrap(), 1);

    page.set_content("<body><header><h1>CMDB</h1></header></body>").await.unwrap();
    expect(&page.get_by_text("CMDB").first()).with_timeout(SHORT).to_be_visible().await.unwrap();

    fixture.close().await;
}

#[tokio::test(flavor = "multi_thread")]
#[ignore = "launches a local Chrome; run with --ignored"]
async fn test_text_matches_innermost_element() {
    let fixture = Fixture::with_content(
        r#"<body><nav id="menu"><ul><li><a id="all" href="/endpoints">Все СВТ</a></li></ul></nav>Нет данных</body>"#,
    )
    .await;
    let page = fixture.page();

    let link = page.get_by_text("все свт");
    assert_eq!(link.count().await.unwrap(), 1);
    assert_eq!(link.get_attribute("id").await.unwrap().as_deref(), Some("all"));

    assert_eq!(page.get_by_text_exact("Все").count().await.unwrap(), 0);
    assert_eq!(page.get_by_text_exact("Все СВТ").count().await.unwrap(), 1);

    // Bare text directly under <body> still matches, through <body> itself
    let empty = page.get_by_text("Нет данных");
    assert_eq!(empty.count().await.unwrap(), 1);
    assert!(empty.is_visible().await.unwrap());

    fixture.close().await;
}

#[tokio::test(flavor = "multi_thread")]
#[ignore = "launches a local Chrome; run with --ignored"]
async fn test_has_text_following_sibling_and_nth() {
    let fixture = Fixture::with_content(
        r#"<body><table><thead><tr>
            <th><span class="title">Имя</span><div class="filter" id="name-filter"></div></th>
            <th><span class="title">Статус</span><i></i><div class="filter" id="status-filter"></div></th>
        </tr></thead></table></body>"#,
    )
    .await;
    let page = fixture.page();

    let status_filter = page
        .locator("span.title")
        .filter_has_text("Статус")
        .following_sibling("div.filter");
    assert_eq!(status_filter.count().await.unwrap(), 1);
    assert_eq!(
        status_filter.get_attribute("id").await.unwrap().as_deref(),
        Some("status-filter")
    );

    let filters = page.locator("div.filter");
    assert_eq!(
        filters.all_attributes("id").await.unwrap(),
        vec![Some("name-filter".to_string()), Some("status-filter".to_string())]
    );
    assert_eq!(
        filters.first().get_attribute("id").await.unwrap().as_deref(),
        Some("name-filter")
    );
    assert_eq!(
        filters.last().get_attribute("id").await.unwrap().as_deref(),
        Some("status-filter")
    );
    assert_eq!(filters.nth(2).count().await.unwrap(), 0);

    fixture.close().await;
}

#[tokio::test(flavor = "multi_thread")]
#[ignore = "launches a local Chrome; run with --ignored"]
async fn test_hidden_requires_every_match_hidden() {
    let fixture = Fixture::with_content(
        r#"<body>
            <span style="display:none">CMDB</span>
            <span style="visibility:hidden">CMDB</span>
            <span>CMDB</span>
        </body>"#,
    )
    .await;
    let page = fixture.page();

    let marker = page.get_by_text("CMDB");
    assert_eq!(marker.count().await.unwrap(), 3);
    assert!(!marker.first().is_visible().await.unwrap());
    assert_eq!(marker.visible_count().await.unwrap(), 1);

    let err = expect(&marker).with_timeout(SHORT).to_be_hidden().await.unwrap_err();
    assert!(matches!(err, CmdbError::Timeout { .. }));

    page.evaluate("document.querySelectorAll('span')[2].style.display = 'none'")
        .await
        .unwrap();
    expect(&marker).with_timeout(SHORT).to_be_hidden().await.unwrap();

    fixture.close().await;
}

#[tokio::test(flavor = "multi_thread")]
#[ignore = "launches a local Chrome; run with --ignored"]
async fn test_fill_fires_input_event() {
    let fixture = Fixture::with_content(
        r#"<body>
            <input name="login" value="stale">
            <output id="echo"></output>
            <script>
              document.querySelector('[name="login"]').addEventListener('input', (e) => {
                document.getElementById('echo').textContent = e.target.value;
              });
            </script>
        </body>"#,
    )
    .await;
    let page = fixture.page();

    page.locator("[name=\"login\"]").fill("admin").await.unwrap();
    assert_eq!(
        page.locator("#echo").text_content().await.unwrap().as_deref(),
        Some("admin")
    );
    assert_eq!(
        page.evaluate("document.querySelector('[name=\"login\"]').value")
            .await
            .unwrap(),
        "admin"
    );

    fixture.close().await;
}
