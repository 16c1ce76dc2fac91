#![cfg(unix)]

mod common;

use common::{FileRunner, Sig, wait_for};
use serde_json::json;

#[tokio::test(flavor = "multi_thread")]
async fn prediction_failure_is_reported_and_serving_continues() {
    let mut runner = FileRunner::spawn(&[("PREDICTION_FAILURE", "1")]);

    runner.wait_for_signals(&[Sig::Ready]).await;
    assert_eq!(runner.read_json("setup_result.json")["status"], "succeeded");

    runner.submit("a", &json!({"input": {"i": 1, "s": "bar"}}));
    wait_for(&runner.path("response-a.json")).await;
    runner.wait_for_signals(&[Sig::Ready, Sig::Busy, Sig::Ready]).await;
    assert!(!runner.path("request-a.json").exists());

    let response = runner.read_json("response-a.json");
    assert_eq!(response["status"], "failed");
    assert_eq!(response["error"], "prediction failed");
    assert!(response.get("output").is_none());

    // Invalid input fails the same way without stopping the worker.
    runner.submit("b", &json!({"input": {"i": "one", "s": "bar"}}));
    wait_for(&runner.path("response-b.json")).await;
    assert_eq!(runner.read_json("response-b.json")["error"], "incompatible input for: i");

    assert!(runner.is_running());
    std::fs::write(runner.path("stop"), b"").unwrap();
    assert_eq!(runner.wait().await.code(), Some(0));
}
