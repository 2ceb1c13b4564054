mod common;

#[tokio::test]
async fn deploy_triggers_hook() {
    let app = common::TestApp::new();
    let server = app.server();
    common::login(&server).await;

    let response = server.post("/api/admin/deploy").await;

    response.assert_json(&serde_json::json!({ "success": true }));
    assert_eq!(app.deploy_hook.count(), 1);
}

#[tokio::test]
async fn deploy_failure_is_reported() {
    let app = common::TestApp::with_failing_deploy_hook();
    let server = app.server_permissive();
    common::login(&server).await;

    let response = server.post("/api/admin/deploy").await;

    response.assert_status_internal_server_error();
    response.assert_json(&serde_json::json!({
        "success": false,
        "message": "Failed to trigger deployment"
    }));
}

#[tokio::test]
async fn deploy_requires_session() {
    let app = common::TestApp::new();
    let server = app.server_permissive();

    server.post("/api/admin/deploy").await.assert_status_unauthorized();
    assert_eq!(app.deploy_hook.count(), 0);
}
