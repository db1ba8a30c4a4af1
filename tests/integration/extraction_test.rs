// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{comparison_page, worker, ScriptedSession, FLAGSHIP, LONG_RANGE, STANDARD};
use carspec::domain::models::extraction::{AlignmentMismatch, PLACEHOLDER_VALUES};
use carspec::domain::models::unit::Unit;
use carspec::engines::snapshot_engine::SnapshotPage;
use std::collections::HashSet;

const URL: &str = "https://example.com/spec/1";

#[tokio::test]
async fn test_exact_and_mismatched_rows_align_by_position() {
    let session = ScriptedSession::new().with_page(URL, comparison_page("4500"));

    let outcome = worker(1)
        .process(&session, &Unit::new("比亚迪", "汉", URL))
        .await;
    let result = outcome.result.expect("extraction succeeds");

    assert_eq!(result.get(STANDARD, "长度(mm)"), Some("4500"));
    assert_eq!(result.get(LONG_RANGE, "长度(mm)"), Some("4500"));
    assert_eq!(result.get(STANDARD, "宽度(mm)"), Some("1850"));
    assert_eq!(result.get(LONG_RANGE, "宽度(mm)"), Some("1850"));
    assert_eq!(result.column(FLAGSHIP).map(|c| c.len()), Some(0));
    assert_eq!(result.columns().count(), 3);

    assert_eq!(
        outcome.mismatches,
        vec![AlignmentMismatch {
            label: "宽度(mm)".to_string(),
            expected: 3,
            found: 2,
        }]
    );
}

#[tokio::test]
async fn test_stored_values_are_never_placeholders() {
    let session = ScriptedSession::new().with_page(URL, comparison_page("4500"));

    let outcome = worker(1)
        .process(&session, &Unit::new("比亚迪", "汉", URL))
        .await;

    for (_, label, value) in outcome.result.unwrap().entries() {
        assert!(!label.is_empty());
        assert!(!value.is_empty());
        assert!(!PLACEHOLDER_VALUES.contains(&value));
    }
}

#[tokio::test]
async fn test_same_snapshot_yields_equal_results() {
    let session = ScriptedSession::new().with_page(URL, comparison_page("4500"));
    let unit = Unit::new("比亚迪", "汉", URL);
    let worker = worker(1);

    let first = worker.process(&session, &unit).await;
    let second = worker.process(&session, &unit).await;

    assert!(first.result.is_some());
    assert_eq!(first.result, second.result);
    assert_eq!(first.mismatches, second.mismatches);
}

#[tokio::test]
async fn test_snapshot_page_columns_are_unique() {
    use carspec::config::settings::DEFAULT_COLUMN_SELECTORS;
    use carspec::domain::services::column_schema::ColumnSchemaExtractor;

    let page = SnapshotPage::new(
        r#"<span class="car-name">A</span><span class="car-name">A</span>
           <span class="car-name"> </span><span class="car-name">Column_3</span>"#,
    );

    let columns = ColumnSchemaExtractor::from_selectors(&DEFAULT_COLUMN_SELECTORS)
        .extract(&page)
        .await
        .unwrap();

    let unique: HashSet<&str> = columns.iter().collect();
    assert_eq!(unique.len(), 4);
    assert!(columns.iter().all(|c| !c.is_empty()));
}
