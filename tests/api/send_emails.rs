use rate_notifier::configuration::EmailBackendKind;

use crate::helpers::mock_body;
use crate::helpers::mock_status;
use crate::helpers::spawn_app;
use crate::helpers::spawn_app_with;

const COINGECKO_BODY: &str = r#"{"bitcoin":{"uah":1500000.5}}"#;

#[tokio::test]
async fn send_emails_200() {
    let app = spawn_app().await;
    mock_status(app.binance(), 503).await;
    mock_body(app.coingecko(), COINGECKO_BODY).await;
    app.post_subscribe("email=a%40x.com").await;
    app.post_subscribe("email=b%40x.com").await;

    let resp = app.post_send_emails().await;

    assert_eq!(resp.status().as_u16(), 200);
}

#[tokio::test]
async fn send_emails_without_subscribers_200() {
    let app = spawn_app().await;
    mock_body(app.coingecko(), COINGECKO_BODY).await;
    mock_status(app.binance(), 503).await;

    let resp = app.post_send_emails().await;

    assert_eq!(resp.status().as_u16(), 200);
}

#[tokio::test]
async fn send_emails_without_rate_400() {
    let app = spawn_app().await;
    for server in &app.rate_servers {
        mock_status(server, 500).await;
    }
    app.post_subscribe("email=a%40x.com").await;

    let resp = app.post_send_emails().await;

    assert_eq!(resp.status().as_u16(), 400);
}

#[tokio::test]
async fn send_emails_unreachable_smtp_500() {
    let app = spawn_app_with(|cfg| {
        cfg.email.backend = EmailBackendKind::Smtp;
        cfg.smtp.host = "127.0.0.1".to_string();
        // nothing listens here
        cfg.smtp.port = 1;
        cfg.smtp.timeout_milliseconds = 1000;
    })
    .await;
    mock_body(app.coingecko(), COINGECKO_BODY).await;
    mock_status(app.binance(), 503).await;
    app.post_subscribe("email=a%40x.com").await;

    let resp = app.post_send_emails().await;

    assert_eq!(resp.status().as_u16(), 500);
}

#[tokio::test]
async fn send_emails_unreadable_store_500() {
    let app = spawn_app().await;
    mock_body(app.binance(), r#"[[0,"1","1","1","100.00","1"]]"#).await;
    std::fs::remove_file(app.storage_dir.path().join("subscribers.csv")).unwrap();

    let resp = app.post_send_emails().await;

    assert_eq!(resp.status().as_u16(), 500);
}
