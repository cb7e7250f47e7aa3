use silica_test_utils::{assert_api_ok, create_test_router_and_store, send_request};

#[tokio::test]
async fn test_health_check() {
    let (router, _store) = create_test_router_and_store().await;

    let (status, resp) = send_request(&router, "GET", "/health", None, None).await;
    let resp = assert_api_ok(status, &resp);
    assert_eq!(resp["status"], "ok");
    assert!(resp["timestamp"].is_string());
}

#[tokio::test]
async fn test_root_names_the_service() {
    let (router, _store) = create_test_router_and_store().await;

    let (status, resp) = send_request(&router, "GET", "/", None, None).await;
    let resp = assert_api_ok(status, &resp);
    assert_eq!(resp["service"], "Silica License Authority");
    assert_eq!(resp["status"], "ok");
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let (router, _store) = create_test_router_and_store().await;

    let (status, _resp) = send_request(&router, "GET", "/nope", None, None).await;
    assert_eq!(status, 404);
}
