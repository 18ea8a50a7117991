use crate::helpers::spawn_app;

#[tokio::test]
async fn subscribe_valid_form_200() {
    let app = spawn_app().await;

    let resp = app.post_subscribe("email=john%40foo.com").await;

    assert_eq!(resp.status().as_u16(), 200);
    assert_eq!(app.subscriber_file(), "john@foo.com\n");
}

#[tokio::test]
async fn subscribe_twice_409() {
    let app = spawn_app().await;

    assert_eq!(
        app.post_subscribe("email=john%40foo.com")
            .await
            .status()
            .as_u16(),
        200
    );
    let resp = app.post_subscribe("email=john%40foo.com").await;

    assert_eq!(resp.status().as_u16(), 409);
    assert_eq!(app.subscriber_file(), "john@foo.com\n");
}

#[tokio::test]
async fn subscribe_invalid_form_400() {
    let app = spawn_app().await;

    for (body, msg) in [
        ("", "missing email"),
        ("name=john", "wrong field"),
        ("email=", "empty email"),
        ("email=%20%20", "whitespace email"),
    ] {
        let resp = app.post_subscribe(body).await;
        assert_eq!(
            resp.status().as_u16(),
            400,
            "did not fail with 400 when the payload was {msg}"
        );
    }
    assert_eq!(app.subscriber_file(), "");
}

#[tokio::test]
async fn subscribe_unreadable_store_500() {
    let app = spawn_app().await;
    std::fs::remove_file(app.storage_dir.path().join("subscribers.csv")).unwrap();

    let resp = app.post_subscribe("email=john%40foo.com").await;

    assert_eq!(resp.status().as_u16(), 500);
}
