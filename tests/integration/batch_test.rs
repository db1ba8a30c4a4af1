// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{comparison_page, worker, ScriptedSession, FLAGSHIP, STANDARD};
use carspec::domain::models::unit::Unit;
use carspec::domain::repositories::storage_repository::StorageRepository;
use carspec::infrastructure::storage::{InMemoryStorage, LocalStorage, AGGREGATE_KEY};
use carspec::workers::BatchRunner;
use std::sync::atomic::Ordering;
use std::sync::Arc;

const URL_A: &str = "https://example.com/spec/a";
const URL_B: &str = "https://example.com/spec/b";

#[tokio::test]
async fn test_failed_unit_does_not_stop_batch() {
    let session = ScriptedSession::new()
        .always_failing(URL_A)
        .with_page(URL_B, comparison_page("4800"));
    let units = vec![
        Unit::new("蔚来", "ET5", URL_A),
        Unit::new("蔚来", "ET7", URL_B),
    ];
    let runner = BatchRunner::new(worker(3), Arc::new(InMemoryStorage::new()));

    let output = runner.run(&session, &units).await;

    assert_eq!(session.fetch_count(URL_A), 3);
    assert_eq!(session.fetch_count(URL_B), 1);
    assert!(!output.dataset.contains("蔚来", "ET5"));
    assert!(output.dataset.contains("蔚来", "ET7"));
    assert_eq!(output.report.total, 2);
    assert_eq!(output.report.succeeded, 1);
    assert_eq!(output.report.exhausted, 1);
    assert_eq!(output.outcomes[0].unit, units[0]);
}

#[tokio::test]
async fn test_two_units_aggregate_to_their_results() {
    let session = ScriptedSession::new()
        .with_page(URL_A, comparison_page("4500"))
        .with_page(URL_B, comparison_page("4800"));
    let units = vec![
        Unit::new("比亚迪", "汉", URL_A),
        Unit::new("理想", "L7", URL_B),
    ];
    let runner = BatchRunner::new(worker(1), Arc::new(InMemoryStorage::new()));

    let output = runner.run(&session, &units).await;

    assert_eq!(output.dataset.len(), 2);
    assert_eq!(
        output.dataset.get("比亚迪", "汉"),
        output.outcomes[0].result.as_ref()
    );
    assert_eq!(
        output.dataset.get("理想", "L7"),
        output.outcomes[1].result.as_ref()
    );
    assert_eq!(
        output
            .dataset
            .get("理想", "L7")
            .and_then(|r| r.get(STANDARD, "长度(mm)")),
        Some("4800")
    );
}

#[tokio::test]
async fn test_duplicate_unit_last_in_input_order_wins() {
    let session = ScriptedSession::new()
        .with_page(URL_A, comparison_page("4500"))
        .with_page(URL_B, comparison_page("4800"));
    let units = vec![
        Unit::new("比亚迪", "汉", URL_A),
        Unit::new("比亚迪", "汉", URL_B),
    ];

    for workers in [1, 2] {
        let runner = BatchRunner::new(worker(1), Arc::new(InMemoryStorage::new()))
            .with_workers(workers);
        let output = runner.run(&session, &units).await;

        assert_eq!(output.dataset.len(), 1);
        assert_eq!(
            output
                .dataset
                .get("比亚迪", "汉")
                .and_then(|r| r.get(STANDARD, "长度(mm)")),
            Some("4800"),
            "workers = {}",
            workers
        );
    }
}

#[tokio::test]
async fn test_artifacts_written_and_session_closed_once() {
    let dir = tempfile::tempdir().unwrap();
    let session = ScriptedSession::new()
        .with_page(URL_A, comparison_page("4500"))
        .always_failing(URL_B);
    let closed = session.closed_flag();
    let units = vec![
        Unit::new("比亚迪", "汉/EV", URL_A),
        Unit::new("比亚迪", "唐", URL_B),
    ];
    let storage = Arc::new(LocalStorage::new(dir.path()));
    let runner = BatchRunner::new(worker(2), storage.clone());

    let output = runner
        .run_with_session(Box::new(session), &units)
        .await
        .unwrap();

    assert!(closed.load(Ordering::SeqCst));
    assert!(dir.path().join("比亚迪_汉_EV.json").is_file());
    assert!(!dir.path().join("比亚迪_唐.json").exists());

    let aggregate = storage.get(AGGREGATE_KEY).await.unwrap().unwrap();
    assert_eq!(aggregate, serde_json::to_value(&output.dataset).unwrap());
    assert_eq!(
        aggregate["比亚迪"]["汉/EV"][STANDARD]["长度(mm)"],
        serde_json::json!("4500")
    );
    assert_eq!(aggregate["比亚迪"]["汉/EV"][FLAGSHIP], serde_json::json!({}));
    assert!(aggregate["比亚迪"].get("唐").is_none());
}

#[tokio::test]
async fn test_artifact_write_failure_is_counted_not_fatal() {
    let session = ScriptedSession::new()
        .with_page(URL_A, comparison_page("4500"))
        .with_page(URL_B, comparison_page("4800"));
    let units = vec![
        Unit::new("A", "a", URL_A),
        Unit::new("B", "b", URL_B),
    ];
    let storage = Arc::new(InMemoryStorage::failing_on(&["A_a.json"]));
    let runner = BatchRunner::new(worker(1), storage.clone());

    let output = runner
        .run_with_session(Box::new(session), &units)
        .await
        .unwrap();

    assert_eq!(output.report.persist_failures, 1);
    assert!(output.dataset.contains("A", "a"));
    assert_eq!(
        storage.keys().await,
        vec!["B_b.json".to_string(), AGGREGATE_KEY.to_string()]
    );
}
