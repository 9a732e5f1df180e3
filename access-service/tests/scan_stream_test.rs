mod common;

use common::TestApp;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn stream_reports_direct_collaborator() {
    let app = TestApp::spawn().await;
    app.mock_user("bob").await;
    app.mock_repositories("owner1", &["A", "B"]).await;

    Mock::given(method("GET"))
        .and(path("/repos/owner1/A/collaborators/bob"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&app.github)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/owner1/A/collaborators/bob/permission"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "permission": "write" })))
        .mount(&app.github)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/owner1/B/collaborators/bob"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&app.github)
        .await;
    app.mock_no_invitations("owner1", "B").await;

    let events = app.scan("bob").await;

    let kinds: Vec<_> = events.iter().map(|e| e["type"].as_str().unwrap()).collect();
    assert_eq!(kinds, vec!["start", "scanning", "found", "scanning", "done"]);

    assert_eq!(events[0]["total"], 2);
    assert_eq!(events[0]["username"], "bob");
    assert_eq!(events[0]["is_owner"], false);
    assert_eq!(events[1]["repo"], "owner1/A");
    assert_eq!(events[1]["scanned"], 1);

    let finding = &events[2]["repo"];
    assert_eq!(finding["owner"], "owner1");
    assert_eq!(finding["repo"], "A");
    assert_eq!(finding["status"], "active");
    assert_eq!(finding["permission"], "write");
    assert!(finding["invitation_id"].is_null());

    assert_eq!(events[3]["repo"], "owner1/B");
    assert_eq!(events[3]["scanned"], 2);
    assert_eq!(events[4]["total"], 1);
}

#[tokio::test]
async fn stream_reports_pending_invitation() {
    let app = TestApp::spawn().await;
    app.mock_user("carol").await;
    app.mock_repositories("owner1", &["C"]).await;

    Mock::given(method("GET"))
        .and(path("/repos/owner1/C/collaborators/carol"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&app.github)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/owner1/C/invitations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 41, "invitee": { "login": "dave" }, "permissions": "read" },
            { "id": 42, "invitee": { "login": "Carol" }, "permissions": "admin" },
        ])))
        .mount(&app.github)
        .await;

    let events = app.scan("carol").await;

    let found: Vec<_> = events.iter().filter(|e| e["type"] == "found").collect();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0]["repo"]["status"], "invited");
    assert_eq!(found[0]["repo"]["invitation_id"], 42);
    assert_eq!(found[0]["repo"]["permission"], "admin");
    assert_eq!(events.last().unwrap()["type"], "done");
}

#[tokio::test]
async fn unknown_user_yields_single_error_event() {
    let app = TestApp::spawn().await;

    Mock::given(method("GET"))
        .and(path("/users/ghost"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&app.github)
        .await;

    let events = app.scan("ghost").await;

    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["type"], "error");
    assert!(events[0]["message"].as_str().unwrap().contains("not found"));
}

#[tokio::test]
async fn inventory_failure_yields_error_event() {
    let app = TestApp::spawn().await;
    app.mock_user("bob").await;

    Mock::given(method("GET"))
        .and(path("/user/repos"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&app.github)
        .await;

    let events = app.scan("bob").await;

    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["type"], "error");
    assert!(events[0]["message"]
        .as_str()
        .unwrap()
        .starts_with("Failed to fetch repositories"));
}

#[tokio::test]
async fn stream_sets_no_buffering_headers() {
    let app = TestApp::spawn().await;

    Mock::given(method("GET"))
        .and(path("/users/ghost"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&app.github)
        .await;

    let response = app
        .client
        .get(format!("{}/user-access/stream?username=ghost", app.address))
        .send()
        .await
        .expect("Failed to execute request");

    assert!(response.status().is_success());
    let headers = response.headers();
    assert!(headers["content-type"]
        .to_str()
        .unwrap()
        .starts_with("text/event-stream"));
    assert_eq!(headers["cache-control"], "no-cache");
    assert_eq!(headers["x-accel-buffering"], "no");
}

#[tokio::test]
async fn blank_username_is_rejected() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .get(format!("{}/user-access/stream?username=%20%20", app.address))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn missing_username_is_rejected() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .get(format!("{}/user-access/stream", app.address))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 400);
}
