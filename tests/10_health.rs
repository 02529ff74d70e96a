mod common;

use anyhow::Result;
use reqwest::StatusCode;

#[tokio::test]
async fn healthcheck_responds_with_envelope() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/api/v1/healthcheck", server.base_url))
        .send()
        .await?;

    // Liveness never depends on the database
    assert_eq!(res.status(), StatusCode::OK);

    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["status_code"], 200, "unexpected envelope: {}", body);
    assert_eq!(body["data"]["status"], "ok");
    assert!(body.get("message").is_some());

    Ok(())
}

#[tokio::test]
async fn unknown_route_is_404() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/api/v1/nope", server.base_url))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}
