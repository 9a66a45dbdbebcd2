//! API integration tests
//!
//! Run against a live server with a migrated database:
//! `cargo test -- --ignored`

use reqwest::Client;
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080/api/v1";

/// Drive a session up to the terms step with the given visitors
async fn session_at_terms(client: &Client, visitors: Value, company: &str) -> String {
    let response = client
        .post(format!("{}/sessions", BASE_URL))
        .send()
        .await
        .expect("Failed to create session");
    let body: Value = response.json().await.expect("Failed to parse session");
    let id = body["id"].as_str().expect("No session ID").to_string();

    let response = client
        .post(format!("{}/sessions/{}/type", BASE_URL, id))
        .json(&json!({ "visitor_type": "regular" }))
        .send()
        .await
        .expect("Failed to select type");
    assert!(response.status().is_success());

    let response = client
        .post(format!("{}/sessions/{}/visitors", BASE_URL, id))
        .json(&json!({ "company": company, "visitors": visitors }))
        .send()
        .await
        .expect("Failed to submit visitors");
    assert!(response.status().is_success());

    let hosts: Value = client
        .get(format!("{}/hosts", BASE_URL))
        .send()
        .await
        .expect("Failed to list hosts")
        .json()
        .await
        .expect("Failed to parse hosts");
    let host_id = hosts[0]["id"].as_i64().expect("No host ID");

    let response = client
        .post(format!("{}/sessions/{}/host", BASE_URL, id))
        .json(&json!({ "host_id": host_id }))
        .send()
        .await
        .expect("Failed to select host");
    assert!(response.status().is_success());

    id
}

#[tokio::test]
#[ignore]
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_session_starts_at_type_selection() {
    let client = Client::new();

    let response = client
        .post(format!("{}/sessions", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 201);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["step"], "type-selection");
    assert!(body["id"].is_string());
}

#[tokio::test]
#[ignore]
async fn test_blank_visitor_info_is_flagged() {
    let client = Client::new();

    let response = client
        .post(format!("{}/sessions", BASE_URL))
        .send()
        .await
        .expect("Failed to create session");
    let body: Value = response.json().await.expect("Failed to parse session");
    let id = body["id"].as_str().expect("No session ID");

    client
        .post(format!("{}/sessions/{}/type", BASE_URL, id))
        .json(&json!({ "visitor_type": "regular" }))
        .send()
        .await
        .expect("Failed to select type");

    let response = client
        .post(format!("{}/sessions/{}/visitors", BASE_URL, id))
        .json(&json!({
            "company": "",
            "visitors": [{ "first_name": "Anna", "last_name": "" }]
        }))
        .send()
        .await
        .expect("Failed to submit visitors");

    assert_eq!(response.status(), 422);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["step"], "visitor-info");
    let flags = body["field_errors"].as_array().expect("No field errors");
    assert_eq!(flags.len(), 2);
}

#[tokio::test]
#[ignore]
async fn test_two_visitor_check_in_and_single_check_out() {
    let client = Client::new();

    let id = session_at_terms(
        &client,
        json!([
            { "first_name": "Anna", "last_name": "Svensson" },
            { "first_name": "Per", "last_name": "Svensson" }
        ]),
        "Acme",
    )
    .await;

    let response = client
        .post(format!("{}/sessions/{}/terms", BASE_URL, id))
        .send()
        .await
        .expect("Failed to accept terms");
    assert_eq!(response.status(), 201);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["session"]["step"], "confirmation");
    let records = body["records"].as_array().expect("No records");
    assert_eq!(records.len(), 2);
    for record in records {
        assert_eq!(record["company"], "Acme");
        assert_eq!(record["is_service_personnel"], false);
        assert_eq!(record["checked_out"], false);
    }

    // Check out Anna only; Per stays active.
    let anna_id = records
        .iter()
        .find(|r| r["name"] == "Anna Svensson")
        .expect("Anna not created")["id"]
        .as_str()
        .expect("No record ID")
        .to_string();

    let response = client
        .post(format!("{}/visitors/{}/check-out", BASE_URL, anna_id))
        .send()
        .await
        .expect("Failed to check out");
    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["checked_out"], true);
    assert!(body["check_out_time"].is_string());

    let active: Value = client
        .get(format!("{}/visitors/active", BASE_URL))
        .send()
        .await
        .expect("Failed to list active")
        .json()
        .await
        .expect("Failed to parse active");
    let visitors = active["visitors"].as_array().expect("No visitors array");
    assert!(visitors.iter().all(|v| v["checked_out"] == false));
    assert!(visitors.iter().any(|v| v["name"] == "Per Svensson"));
    assert!(visitors.iter().all(|v| v["name"] != "Anna Svensson"));

    // A second checkout of the same record is a conflict.
    let response = client
        .post(format!("{}/visitors/{}/check-out", BASE_URL, anna_id))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 409);
}

#[tokio::test]
#[ignore]
async fn test_active_list_is_newest_first() {
    let client = Client::new();

    let response = client
        .get(format!("{}/visitors/active", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    let visitors = body["visitors"].as_array().expect("No visitors array");
    let times: Vec<chrono::DateTime<chrono::Utc>> = visitors
        .iter()
        .filter_map(|v| v["check_in_time"].as_str())
        .map(|t| t.parse().expect("Bad check_in_time"))
        .collect();
    assert!(times.windows(2).all(|w| w[0] >= w[1]));
}

#[tokio::test]
#[ignore]
async fn test_direct_check_in_validates_body() {
    let client = Client::new();

    let response = client
        .post(format!("{}/visitors", BASE_URL))
        .json(&json!({
            "name": "",
            "company": "Acme",
            "visiting": "Per Falk"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 422);
}

#[tokio::test]
#[ignore]
async fn test_list_hosts() {
    let client = Client::new();

    let response = client
        .get(format!("{}/hosts", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    let hosts = body.as_array().expect("No hosts array");
    assert!(!hosts.is_empty());
    assert!(hosts[0]["name"].is_string());
    assert!(hosts[0]["department"].is_string());
}

#[tokio::test]
#[ignore]
async fn test_get_stats() {
    let client = Client::new();

    let response = client
        .get(format!("{}/stats", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["visits"]["total"].is_number());
    assert!(body["visits"]["today"].is_number());
    assert!(body["on_site"].is_number());
    assert!(body["companies"].is_array());
    assert!(body["daily"].is_array());
    assert!(body["visitor_types"].is_array());
}

#[tokio::test]
#[ignore]
async fn test_unknown_session_is_404() {
    let client = Client::new();

    let response = client
        .get(format!(
            "{}/sessions/00000000-0000-0000-0000-000000000000",
            BASE_URL
        ))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 404);
}
