//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and run the full
//! crawl cycle end-to-end on every worker pool backend.

use linkcrawl::api::{crawl_with_options, CrawlOptions};
use linkcrawl::config::{Config, Mode};
use linkcrawl::{crawl, normalize_url, CrawlError, NormalizedUrl, PageStatus};
use std::path::PathBuf;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration crawling from `start_url`
fn create_test_config(start_url: &str, mode: Mode, workers: usize) -> Config {
    let mut config = Config {
        start_urls: vec![start_url.to_string()],
        ..Config::default()
    };
    config.performance.mode = mode;
    config.performance.workers = Some(workers);
    config.performance.timeout = 5;
    if mode == Mode::Process {
        config.performance.worker_program = Some(PathBuf::from(env!("CARGO_BIN_EXE_linkcrawl")));
    }
    config
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(format!("<html><body>{}</body></html>", body))
        .insert_header("content-type", "text/html")
}

fn url(s: &str) -> NormalizedUrl {
    normalize_url(s).unwrap()
}

/// Mounts a small site:
///
/// - `/` links to `/page1`, `/missing.html` and `/style.css`
/// - `/page1` links back to `/` and to `/missing.html`
/// - `/missing.html` is a 404
async fn mount_small_site(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            r#"<link rel="stylesheet" href="/style.css">
            <a href="/page1">Page 1</a>
            <a href="missing.html">Missing</a>"#,
        ))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page1"))
        .respond_with(html(r#"<a href="/">Home</a><a href="/missing.html">Missing</a>"#))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/missing.html"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/style.css"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("body { color: black; }")
                .insert_header("content-type", "text/css"),
        )
        .expect(1)
        .mount(server)
        .await;
}

async fn check_small_site(mode: Mode, workers: usize) {
    let server = MockServer::start().await;
    mount_small_site(&server).await;
    let base = server.uri();

    let site = crawl(create_test_config(&format!("{}/", base), mode, workers))
        .await
        .unwrap();

    assert_eq!(site.pages().len(), 4);
    assert!(!site.is_ok());

    let errors = site.error_pages();
    assert_eq!(errors.len(), 1);
    let missing = errors[0];
    assert_eq!(missing.url, url(&format!("{}/missing.html", base)));
    assert_eq!(missing.status, Some(404));

    let mut origins: Vec<_> = missing.sources.iter().map(|s| s.origin.path()).collect();
    origins.sort();
    assert_eq!(origins, vec!["/", "/page1"]);

    let css = &site.pages()[&url(&format!("{}/style.css", base))];
    assert!(css.is_ok());
    assert!(!css.is_html);
    // each mock's `expect(1)` is verified when the server drops
}

#[tokio::test]
async fn test_crawl_thread_mode() {
    check_small_site(Mode::Thread, 2).await;
}

#[tokio::test]
async fn test_crawl_green_mode() {
    check_small_site(Mode::Green, 20).await;
}

#[tokio::test]
async fn test_crawl_process_mode() {
    check_small_site(Mode::Process, 2).await;
}

#[tokio::test]
async fn test_redirect_merge() {
    let server = MockServer::start().await;
    let base = server.uri();

    for from in ["/a", "/b"] {
        Mock::given(method("GET"))
            .and(path(from))
            .respond_with(ResponseTemplate::new(301).insert_header("location", "/c"))
            .expect(1)
            .mount(&server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/c"))
        .respond_with(html("<p>final</p>"))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(r#"<a href="/a">A</a><a href="/b">B</a>"#))
        .expect(1)
        .mount(&server)
        .await;

    let config = create_test_config(&format!("{}/", base), Mode::Thread, 1);
    let site = crawl(config).await.unwrap();

    assert!(site.is_ok());
    assert_eq!(site.pages().len(), 2);
    let c = &site.pages()[&url(&format!("{}/c", base))];
    assert_eq!(c.sources.len(), 2);
    assert!(!site.pages().contains_key(&url(&format!("{}/a", base))));
    assert!(matches!(
        site.page_status(&url(&format!("{}/a", base))),
        Some(PageStatus::Crawled { page }) if page.path() == "/c"
    ));
}

#[tokio::test]
async fn test_redirected_start_urls_merge() {
    let server = MockServer::start().await;
    let base = server.uri();

    for from in ["/a", "/b"] {
        Mock::given(method("GET"))
            .and(path(from))
            .respond_with(ResponseTemplate::new(302).insert_header("location", "/c"))
            .mount(&server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/c"))
        .respond_with(html("<p>final</p>"))
        .mount(&server)
        .await;

    let mut config = create_test_config(&format!("{}/a", base), Mode::Green, 4);
    config.start_urls.push(format!("{}/b", base));
    let site = crawl(config).await.unwrap();

    assert_eq!(site.start_urls().len(), 2);
    assert_eq!(site.pages().len(), 1);
    assert!(site.pages().contains_key(&url(&format!("{}/c", base))));
}

#[tokio::test]
async fn test_outside_link_not_fetched() {
    let server = MockServer::start().await;
    let other = MockServer::start().await;
    let other_page = format!("{}/page", other.uri());

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(&format!(r#"<a href="{}">Other</a>"#, other_page)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(html("<p>outside</p>"))
        .expect(0)
        .mount(&other)
        .await;

    let config = create_test_config(&format!("{}/", server.uri()), Mode::Thread, 1);
    let site = crawl(config).await.unwrap();

    assert_eq!(site.pages().len(), 1);
    assert!(site.page_status(&url(&other_page)).is_none());
}

#[tokio::test]
async fn test_outside_link_checked_only() {
    let server = MockServer::start().await;
    let other = MockServer::start().await;
    let other_page = format!("{}/page", other.uri());

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(&format!(r#"<a href="{}">Other</a>"#, other_page)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(html(r#"<a href="/deeper">Deeper</a>"#))
        .expect(1)
        .mount(&other)
        .await;
    Mock::given(method("GET"))
        .and(path("/deeper"))
        .respond_with(html("<p>never</p>"))
        .expect(0)
        .mount(&other)
        .await;

    let mut config = create_test_config(&format!("{}/", server.uri()), Mode::Green, 4);
    config.crawler.test_outside = true;
    let site = crawl(config).await.unwrap();

    assert_eq!(site.pages().len(), 2);
    let outside = &site.pages()[&url(&other_page)];
    assert!(outside.is_ok());
    assert!(!outside.is_local);
}

#[tokio::test]
async fn test_each_url_fetched_once() {
    let server = MockServer::start().await;

    // every page links to every other page
    let links = r#"<a href="/">0</a><a href="/1">1</a><a href="/2">2</a><a href="/3">3</a>"#;
    for page in ["/", "/1", "/2", "/3"] {
        Mock::given(method("GET"))
            .and(path(page))
            .respond_with(html(links))
            .expect(1)
            .mount(&server)
            .await;
    }

    let config = create_test_config(&format!("{}/", server.uri()), Mode::Green, 8);
    let site = crawl(config).await.unwrap();

    assert_eq!(site.pages().len(), 4);
    for page in site.pages().values() {
        assert_eq!(page.sources.len(), 4, "sources of {}", page.url);
    }
}

#[tokio::test]
async fn test_ignored_prefix() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(r#"<a href="/private/a">A</a><a href="/public">P</a>"#))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/public"))
        .respond_with(html(""))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/private/a"))
        .respond_with(html(""))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = create_test_config(&format!("{}/", base), Mode::Thread, 2);
    config.crawler.ignored_prefixes = vec![format!("{}/private/", base)];
    let site = crawl(config).await.unwrap();

    assert_eq!(site.pages().len(), 2);
}

#[tokio::test]
async fn test_unreachable_start_url_is_an_error_page() {
    let config = create_test_config("http://127.0.0.1:1/", Mode::Thread, 1);
    let site = crawl(config).await.unwrap();

    assert!(!site.is_ok());
    let page = &site.pages()[&url("http://127.0.0.1:1/")];
    assert!(page.exception.is_some());
    assert!(page.sources.is_empty());
}

#[tokio::test]
async fn test_unsupported_type_fails_before_fetching() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(html(""))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = create_test_config(&server.uri(), Mode::Thread, 1);
    config.crawler.types = vec!["a".to_string(), "embed".to_string()];

    let result = crawl(config).await;
    assert!(matches!(result, Err(CrawlError::Config(_))));
}

#[test]
fn test_blocking_api() {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let server = runtime.block_on(async {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(html(r#"<img src="/logo.png">"#))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/logo.png"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        server
    });

    let options = CrawlOptions {
        types: Some(vec!["img".to_string()]),
        workers: Some(2),
        ..CrawlOptions::default()
    };
    let site = crawl_with_options(&[format!("{}/", server.uri())], options).unwrap();

    assert_eq!(site.pages().len(), 2);
    let errors = site.error_pages();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].status, Some(500));

    runtime.block_on(async move { drop(server) });
}
