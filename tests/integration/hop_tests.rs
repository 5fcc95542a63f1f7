//! Integration tests for multi-hop runs
//!
//! These tests use wiremock to serve a small website and drive the real HTTP
//! fetcher through the orchestrator. The model-backed collaborators are
//! replaced by scripted ones so the outcome is deterministic.

use async_trait::async_trait;
use ripple_qa::collab::{HttpPageFetcher, LinkRelevanceSelector, PageAnswerer, PageFetcher};
use ripple_qa::config::{FetcherConfig, RunBudgets};
use ripple_qa::{
    Answer, Collaborators, Link, NoopSink, Orchestrator, RippleError, RunOutcome, RunRequest,
    StopReason,
};
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Sufficient when the page mentions a price
struct PriceAnswerer;

#[async_trait]
impl PageAnswerer for PriceAnswerer {
    async fn answer(&self, text: &str, _question: &str, _url: &str) -> Result<Answer, RippleError> {
        match text.lines().find(|line| line.contains("costs")) {
            Some(line) => Ok(Answer::new(line.trim(), true, Some(90))),
            None => Ok(Answer::new("No pricing here.", false, Some(30))),
        }
    }
}

/// Picks the first `k` candidates
struct FirstK;

#[async_trait]
impl LinkRelevanceSelector for FirstK {
    async fn select(
        &self,
        _question: &str,
        candidates: &[Link],
        k: usize,
    ) -> Result<Vec<Link>, RippleError> {
        Ok(candidates.iter().take(k).cloned().collect())
    }
}

async fn mount_html(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html; charset=utf-8"),
        )
        .mount(server)
        .await;
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<html><head><title>{}</title></head><body><main>{}</main></body></html>",
        title, body
    )
}

/// Fetches the start page and runs the orchestrator from it
async fn ask(start: &str, budgets: RunBudgets) -> RunOutcome {
    let config = FetcherConfig {
        timeout_ms: 2_000,
        ..FetcherConfig::default()
    };
    let fetcher = Arc::new(HttpPageFetcher::new(&config).expect("Failed to build fetcher"));
    let initial = fetcher.fetch(start).await.expect("Failed to fetch start page");

    let collaborators = Collaborators {
        answerer: Arc::new(PriceAnswerer),
        selector: Arc::new(FirstK),
        fetcher,
        synthesizer: None,
    };
    let request = RunRequest::new(
        "How much is the Pro plan?",
        initial.final_url,
        initial.text,
        initial.links,
    );

    Orchestrator::new(collaborators, budgets)
        .run(request, Arc::new(NoopSink))
        .await
}

fn budgets(max_hops: u32, k_links: usize) -> RunBudgets {
    RunBudgets {
        max_hops,
        k_links,
        max_concurrency: 2,
        total_page_budget: 10,
        ..RunBudgets::default()
    }
}

#[tokio::test]
async fn test_answer_found_one_hop_away() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_html(
        &server,
        "/",
        page(
            "Home",
            r#"<p>Welcome to the product.</p>
            <a href="/about">About us</a>
            <a href="/pricing">Pricing</a>
            <a href="https://other.org/pricing">Partner pricing</a>"#,
        ),
    )
    .await;
    mount_html(&server, "/about", page("About", "<p>We build tools.</p>")).await;
    mount_html(
        &server,
        "/pricing",
        page("Pricing", "<p>The Pro plan costs $20 per month.</p>"),
    )
    .await;

    let outcome = ask(&format!("{}/", base), budgets(3, 2)).await;

    let pricing = format!("{}/pricing", base);
    assert!(outcome.sufficient);
    assert_eq!(outcome.answer, "The Pro plan costs $20 per month.");
    assert_eq!(outcome.sources, vec![pricing.clone()]);
    assert_eq!(outcome.visited_urls[0], format!("{}/", base));
    assert!(outcome.visited_urls.contains(&pricing));
    assert!(!outcome
        .visited_urls
        .iter()
        .any(|url| url.starts_with("https://other.org")));
    assert_eq!(outcome.stop_reason, StopReason::Sufficient);
}

#[tokio::test]
async fn test_answer_found_two_hops_away_past_dead_link() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_html(
        &server,
        "/",
        page(
            "Home",
            r#"<a href="/missing">Old docs</a> <a href="/docs">Docs</a>"#,
        ),
    )
    .await;
    mount_html(
        &server,
        "/docs",
        page("Docs", r#"<p>Start here.</p><a href="/docs/plans">Plans</a>"#),
    )
    .await;
    mount_html(
        &server,
        "/docs/plans",
        page("Plans", "<p>Pro costs $20 per seat.</p>"),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let outcome = ask(&format!("{}/", base), budgets(2, 5)).await;

    assert!(outcome.sufficient);
    assert_eq!(outcome.sources, vec![format!("{}/docs/plans", base)]);
    assert!(outcome.visited_urls.contains(&format!("{}/missing", base)));
    assert_eq!(outcome.pages_seen, 4);
}

#[tokio::test]
async fn test_hop_limit_stops_before_answer() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_html(&server, "/", page("Home", r#"<a href="/docs">Docs</a>"#)).await;
    mount_html(
        &server,
        "/docs",
        page("Docs", r#"<a href="/docs/plans">Plans</a>"#),
    )
    .await;
    mount_html(
        &server,
        "/docs/plans",
        page("Plans", "<p>Pro costs $20 per seat.</p>"),
    )
    .await;

    let outcome = ask(&format!("{}/", base), budgets(1, 5)).await;

    assert!(!outcome.sufficient);
    assert_eq!(outcome.confidence, Some(30));
    assert!(!outcome
        .visited_urls
        .contains(&format!("{}/docs/plans", base)));
}

#[tokio::test]
async fn test_redirect_off_site_is_not_followed() {
    let server = MockServer::start().await;
    let elsewhere = MockServer::start().await;
    let base = server.uri();

    mount_html(&server, "/", page("Home", r#"<a href="/partner">Partner</a>"#)).await;
    Mock::given(method("GET"))
        .and(path("/partner"))
        .respond_with(
            ResponseTemplate::new(302).insert_header("location", format!("{}/deal", elsewhere.uri())),
        )
        .mount(&server)
        .await;
    mount_html(
        &elsewhere,
        "/deal",
        page("Deal", "<p>Pro costs $5 through our partner.</p>"),
    )
    .await;

    let outcome = ask(&format!("{}/", base), budgets(3, 5)).await;

    assert!(!outcome.sufficient);
    assert_eq!(outcome.sources, vec![format!("{}/", base)]);
    assert!(outcome.visited_urls.contains(&format!("{}/partner", base)));
    assert!(!outcome
        .visited_urls
        .iter()
        .any(|url| url.starts_with(&elsewhere.uri())));
}
