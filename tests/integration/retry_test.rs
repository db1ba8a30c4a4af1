// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{comparison_page, worker, ScriptedSession, STANDARD};
use carspec::domain::models::unit::Unit;
use carspec::engines::traits::FetchError;
use carspec::utils::errors::{ScrapeError, Stage};
use carspec::utils::retry_policy::RetryPolicy;
use carspec::workers::UnitState;
use std::time::Duration;

const URL: &str = "https://example.com/spec/1";

/// 有就绪标记但没有任何列头
const NO_COLUMNS_PAGE: &str = r#"<html><body>
    <div class="table-box main-table-box"><table></table></div>
    </body></html>"#;

/// 有列头但没有参数行
const NO_ROWS_PAGE: &str = r#"<html><body>
    <div class="table-box main-table-box">
        <span class="car-style-info">2024款 标准版</span>
        <table></table>
    </div>
    </body></html>"#;

fn unit() -> Unit {
    Unit::new("比亚迪", "汉", URL)
}

#[tokio::test]
async fn test_always_failing_fetch_is_attempted_max_attempts_times() {
    let session = ScriptedSession::new().always_failing(URL);

    let outcome = worker(3).process(&session, &unit()).await;

    assert_eq!(session.fetch_count(URL), 3);
    assert_eq!(outcome.attempts, 3);
    assert!(outcome.result.is_none());
    assert_eq!(outcome.final_state(), UnitState::Exhausted);

    let failure = outcome.last_error.expect("last error recorded");
    assert_eq!(failure.stage, Stage::Fetching);
    assert_eq!(
        failure.error,
        ScrapeError::Fetch(FetchError::Navigation("transient failure #3".to_string()))
    );
}

#[tokio::test]
async fn test_recovers_after_transient_failures() {
    let session = ScriptedSession::new()
        .with_page(URL, comparison_page("4500"))
        .failing(URL, 2);

    let outcome = worker(3).process(&session, &unit()).await;

    assert!(outcome.is_success());
    assert_eq!(outcome.attempts, 3);
    assert_eq!(session.fetch_count(URL), 3);
    assert!(outcome.trail.contains(&UnitState::Failed(1)));
    assert!(outcome.trail.contains(&UnitState::Failed(2)));
    assert_eq!(outcome.final_state(), UnitState::Success);
    assert_eq!(
        outcome.result.unwrap().get(STANDARD, "长度(mm)"),
        Some("4500")
    );
}

#[tokio::test]
async fn test_missing_columns_refetches_from_fetching() {
    let session = ScriptedSession::new().with_page(URL, NO_COLUMNS_PAGE);

    let outcome = worker(2).process(&session, &unit()).await;

    assert_eq!(session.fetch_count(URL), 2);
    assert_eq!(
        outcome.trail,
        vec![
            UnitState::Init,
            UnitState::Fetching,
            UnitState::Detecting,
            UnitState::Extracting,
            UnitState::Failed(1),
            UnitState::Fetching,
            UnitState::Detecting,
            UnitState::Extracting,
            UnitState::Failed(2),
            UnitState::Exhausted,
        ]
    );
    let failure = outcome.last_error.unwrap();
    assert_eq!(failure.stage, Stage::Extracting);
    assert_eq!(failure.error, ScrapeError::SchemaEmpty);
}

#[tokio::test]
async fn test_missing_rows_refetches_and_closes_every_page() {
    let session = ScriptedSession::new().with_page(URL, NO_ROWS_PAGE);

    let outcome = worker(3).process(&session, &unit()).await;

    assert_eq!(outcome.attempts, 3);
    assert_eq!(session.fetch_count(URL), 3);
    assert_eq!(session.pages_opened(), 3);
    assert_eq!(session.pages_closed(), 3);
    assert_eq!(outcome.final_state(), UnitState::Exhausted);
    let failure = outcome.last_error.unwrap();
    assert_eq!(failure.stage, Stage::Extracting);
    assert!(matches!(failure.error, ScrapeError::ExtractionEmpty(_)));
}

#[tokio::test]
async fn test_pages_closed_on_success_after_failures() {
    let session = ScriptedSession::new()
        .with_page(URL, comparison_page("4500"))
        .failing(URL, 1);

    let outcome = worker(3).process(&session, &unit()).await;

    assert!(outcome.is_success());
    assert_eq!(session.fetch_count(URL), 2);
    // 获取失败的那次没有页面
    assert_eq!(session.pages_opened(), 1);
    assert_eq!(session.pages_closed(), 1);
}

#[tokio::test]
async fn test_single_attempt_budget_never_retries() {
    let session = ScriptedSession::new()
        .with_page(URL, comparison_page("4500"))
        .failing(URL, 1);

    let outcome = worker(1).process(&session, &unit()).await;

    assert!(!outcome.is_success());
    assert_eq!(session.fetch_count(URL), 1);
}

#[tokio::test]
async fn test_panic_during_fetch_becomes_fault() {
    let session = ScriptedSession::new().panicking(URL);

    let outcome = worker(2).process(&session, &unit()).await;

    assert_eq!(session.fetch_count(URL), 2);
    assert_eq!(outcome.final_state(), UnitState::Exhausted);
    let failure = outcome.last_error.unwrap();
    assert_eq!(failure.stage, Stage::Fetching);
    assert_eq!(
        failure.error,
        ScrapeError::Fault("renderer crashed".to_string())
    );
}

#[tokio::test(start_paused = true)]
async fn test_backoff_between_attempts_but_not_after_last() {
    let session = ScriptedSession::new().always_failing(URL);
    let policy = RetryPolicy {
        max_attempts: 3,
        backoff_min: Duration::from_secs(5),
        backoff_max: Duration::from_secs(5),
    };
    let worker = worker(3).with_policy(policy);

    let start = tokio::time::Instant::now();
    let outcome = worker.process(&session, &unit()).await;
    let elapsed = start.elapsed();

    assert_eq!(outcome.attempts, 3);
    // 三次尝试之间两次退避
    assert!(elapsed >= Duration::from_secs(10), "elapsed {:?}", elapsed);
    assert!(elapsed < Duration::from_secs(15), "elapsed {:?}", elapsed);
}

#[tokio::test(start_paused = true)]
async fn test_jittered_backoff_stays_within_bounds() {
    let session = ScriptedSession::new().failing(URL, 1).with_page(URL, comparison_page("4500"));
    let worker = worker(2).with_policy(RetryPolicy {
        max_attempts: 2,
        backoff_min: Duration::from_secs(5),
        backoff_max: Duration::from_secs(10),
    });

    let start = tokio::time::Instant::now();
    let outcome = worker.process(&session, &unit()).await;
    let elapsed = start.elapsed();

    assert!(outcome.is_success());
    assert!(elapsed >= Duration::from_secs(5), "elapsed {:?}", elapsed);
    assert!(elapsed <= Duration::from_secs(10), "elapsed {:?}", elapsed);
}
