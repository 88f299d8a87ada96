//! Batch enrichment fetcher: ordering, degradation, pipelining.

mod common;

use common::{bulk, bulk_array, starts_with, FakeTransport};
use vset_rs::{BatchFetcher, Reply};

fn ids(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn output_positions_follow_input_positions() {
    let transport = FakeTransport::new();
    transport.on(starts_with(&["VECTOR-OF", "docs", "a"]), bulk_array(&["1", "0"]));
    transport.on(starts_with(&["VECTOR-OF", "docs", "b"]), Reply::Nil);
    transport.on(starts_with(&["VECTOR-OF", "docs", "c"]), bulk_array(&["0", "1"]));

    let fetcher = BatchFetcher::new(transport.clone());

    let out = fetcher.vectors("docs", &ids(&["a", "b", "c"])).await;
    assert_eq!(
        out,
        vec![Some(vec![1.0, 0.0]), None, Some(vec![0.0, 1.0])]
    );

    // Any permutation of the same ids maps back positionally.
    let out = fetcher.vectors("docs", &ids(&["c", "a", "b"])).await;
    assert_eq!(
        out,
        vec![Some(vec![0.0, 1.0]), Some(vec![1.0, 0.0]), None]
    );
}

#[tokio::test]
async fn one_lookup_per_id_in_one_pipeline() {
    let transport = FakeTransport::new();
    transport.on(starts_with(&["VECTOR-OF"]), bulk_array(&["0", "0"]));

    let fetcher = BatchFetcher::new(transport.clone());
    fetcher.vectors("docs", &ids(&["a", "b", "c", "d"])).await;

    let sent = transport.sent();
    assert_eq!(sent.len(), 4);
    assert!(sent.iter().all(|argv| argv[0] == "VECTOR-OF" && argv[1] == "docs"));
    let looked_up: Vec<_> = sent.iter().map(|argv| argv[2].as_str()).collect();
    assert_eq!(looked_up, vec!["a", "b", "c", "d"]);
}

#[tokio::test]
async fn malformed_reply_nulls_one_position_only() {
    let transport = FakeTransport::new();
    transport.on(starts_with(&["ATTRIBUTES-OF", "docs", "a"]), bulk(r#"{"k":1}"#));
    transport.on(starts_with(&["ATTRIBUTES-OF", "docs", "b"]), bulk("{not json"));
    transport.on(starts_with(&["ATTRIBUTES-OF", "docs", "c"]), bulk(r#"{"k":3}"#));

    let fetcher = BatchFetcher::new(transport.clone());
    let out = fetcher.attributes("docs", &ids(&["a", "b", "c"])).await;

    assert_eq!(out.len(), 3);
    assert_eq!(out[0], Some(serde_json::json!({"k": 1})));
    assert_eq!(out[1], None, "malformed reply degrades to null");
    assert_eq!(out[2], Some(serde_json::json!({"k": 3})));
}

#[tokio::test]
async fn per_slot_error_replies_degrade_to_null() {
    // Concurrent deletion shows up as an error reply in one slot.
    let transport = FakeTransport::new();
    transport.on(starts_with(&["VECTOR-OF", "docs", "a"]), bulk_array(&["1", "0"]));
    transport.on(
        starts_with(&["VECTOR-OF", "docs", "gone"]),
        Reply::Error("ERR element not found in set".into()),
    );

    let fetcher = BatchFetcher::new(transport.clone());
    let out = fetcher.vectors("docs", &ids(&["a", "gone"])).await;
    assert_eq!(out, vec![Some(vec![1.0, 0.0]), None]);
}

#[tokio::test]
async fn transport_failure_degrades_the_whole_batch() {
    let transport = FakeTransport::new();
    transport.down_on(starts_with(&["VECTOR-OF"]));

    let fetcher = BatchFetcher::new(transport.clone());
    let out = fetcher.vectors("docs", &ids(&["a", "b", "c"])).await;
    assert_eq!(out, vec![None, None, None]);
}

#[tokio::test]
async fn empty_input_issues_no_traffic() {
    let transport = FakeTransport::new();
    let fetcher = BatchFetcher::new(transport.clone());

    let out = fetcher.attributes("docs", &[]).await;
    assert!(out.is_empty());
    assert!(transport.sent().is_empty());
}
