use crate::helpers::mock_body;
use crate::helpers::mock_status;
use crate::helpers::spawn_app;

const BINANCE_BODY: &str = r#"[[1700000000000,"1500000.00","1500100.00","1499900.00","1500050.25","0.01",1700000000999,"15000.5",3,"0.005","7500.2","0"]]"#;

#[tokio::test]
async fn rate_from_first_source() {
    let app = spawn_app().await;
    mock_body(app.binance(), BINANCE_BODY).await;

    let resp = app.get_rate().await;

    assert_eq!(resp.status().as_u16(), 200);
    let rate: f64 = resp.json().await.unwrap();
    assert_eq!(rate, 1500050.25);
    // fallbacks never asked
    assert!(app.coingecko().received_requests().await.unwrap().is_empty());
    assert!(app.kuna().received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn rate_falls_back_in_order() {
    let app = spawn_app().await;
    mock_status(app.binance(), 500).await;
    mock_body(app.coingecko(), "not json").await;
    mock_body(
        app.kuna(),
        r#"[["btcuah",1.0,1.0,2.0,1.0,0.0,0.0,1234.5,10.0]]"#,
    )
    .await;

    let resp = app.get_rate().await;

    assert_eq!(resp.status().as_u16(), 200);
    let rate: f64 = resp.json().await.unwrap();
    assert_eq!(rate, 1234.5);
    for server in &app.rate_servers {
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }
}

#[tokio::test]
async fn all_sources_failing_is_400() {
    let app = spawn_app().await;
    for server in &app.rate_servers {
        mock_status(server, 403).await;
    }

    let resp = app.get_rate().await;

    assert_eq!(resp.status().as_u16(), 400);
    assert_eq!(resp.text().await.unwrap(), "Failed to get exchange rate");
}
