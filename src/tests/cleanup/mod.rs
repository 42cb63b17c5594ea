//! Every connection that was opened is closed exactly once, whatever the
//! outcome of the invocation.

use super::{Harness, KEY};

#[tokio::test]
async fn test_connection_released_on_every_outcome() {
    let cases: [(&str, Option<&str>, u16, usize); 5] = [
        ("success", Some("name,age\nAlice,30\n"), 200, 1),
        ("storage failure", None, 500, 0),
        ("parse failure", Some("name,age\nAlice\n"), 500, 0),
        ("database failure", Some("name,age\nAlice,30\nAlice,30\n"), 500, 1),
        ("header only", Some("name,age\n"), 200, 1),
    ];
    for (name, csv, status, connections) in cases {
        let objects = csv
            .map(|csv| vec![(KEY, csv.as_bytes())])
            .unwrap_or_default();
        let harness = Harness::new(&objects, &[]).await;
        let response = harness.handle_upload().await;
        assert_eq!(response.status_code, status, "{name}: {response:?}");
        assert_eq!(harness.counters.connects(), connections, "{name}");
        assert_eq!(harness.counters.closes(), connections, "{name}");
    }
}

#[tokio::test]
async fn test_connection_reusable_after_failure() {
    // the local database has a single pooled connection, so a leaked
    // connection would block the second invocation
    let harness = Harness::with_csv("name,age\nAlice,30\nAlice,30\n").await;
    assert_eq!(harness.handle_upload().await.status_code, 500);
    assert_eq!(harness.handle_upload().await.status_code, 500);
    assert_eq!(harness.counters.connects(), 2);
    assert_eq!(harness.counters.closes(), 2);
    assert!(harness.people().await.is_empty());
}
