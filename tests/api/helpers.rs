use once_cell::sync::Lazy;
use rate_notifier::configuration::get_configuration;
use rate_notifier::configuration::EmailBackendKind;
use rate_notifier::configuration::RateSourceSettings;
use rate_notifier::configuration::Settings;
use rate_notifier::rate::RateProvider;
use rate_notifier::startup::Application;
use rate_notifier::telemetry::get_subscriber;
use rate_notifier::telemetry::init_subscriber;
use tempfile::TempDir;
use wiremock::matchers::method;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;

// `init_subscriber` may only be called once per binary; logs are swallowed
// unless TEST_LOG is set, e.g. `TEST_LOG=1 cargo test | bunyan`
static TRACING: Lazy<()> = Lazy::new(|| {
    match std::env::var("TEST_LOG") {
        Ok(_) => {
            let subscriber = get_subscriber("test", "debug", std::io::stdout);
            init_subscriber(subscriber).unwrap();
        }
        Err(_) => {
            let subscriber = get_subscriber("test", "debug", std::io::sink);
            init_subscriber(subscriber).unwrap();
        }
    };
});

pub struct TestApp {
    pub addr: String,
    /// One mock per provider, in fallback order: binance, coingecko, kuna
    pub rate_servers: Vec<MockServer>,
    /// Subscriber file lives here; dropped (and deleted) with the app
    pub storage_dir: TempDir,
    pub api_client: reqwest::Client,
}

impl TestApp {
    pub async fn get_rate(&self) -> reqwest::Response {
        self.api_client
            .get(format!("{}/api/rate", self.addr))
            .send()
            .await
            .expect("execute request")
    }

    pub async fn post_subscribe(
        &self,
        body: &str,
    ) -> reqwest::Response {
        self.api_client
            .post(format!("{}/api/subscribe", self.addr))
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(body.to_string())
            .send()
            .await
            .expect("execute request")
    }

    pub async fn post_send_emails(&self) -> reqwest::Response {
        self.api_client
            .post(format!("{}/api/sendEmails", self.addr))
            .send()
            .await
            .expect("execute request")
    }

    /// Raw contents of the subscriber file
    pub fn subscriber_file(&self) -> String {
        std::fs::read_to_string(self.storage_dir.path().join("subscribers.csv")).unwrap()
    }

    pub fn binance(&self) -> &MockServer { &self.rate_servers[0] }

    pub fn coingecko(&self) -> &MockServer { &self.rate_servers[1] }

    pub fn kuna(&self) -> &MockServer { &self.rate_servers[2] }
}

/// Respond to any request on `server` with `status`
pub async fn mock_status(
    server: &MockServer,
    status: u16,
) {
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// Respond to any request on `server` with a 200 and `body`
pub async fn mock_body(
    server: &MockServer,
    body: &str,
) {
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

/// Local config, with everything external replaced: rate sources point at
/// fresh mock servers, the subscriber file at a temp dir, and mail is logged
/// rather than sent.
pub async fn spawn_app() -> TestApp { spawn_app_with(|_| {}).await }

/// Like `spawn_app`, with a final chance to edit the configuration
pub async fn spawn_app_with(edit: impl FnOnce(&mut Settings)) -> TestApp {
    Lazy::force(&TRACING);

    let mut rate_servers = vec![];
    for _ in 0..3 {
        rate_servers.push(MockServer::start().await);
    }
    let storage_dir = TempDir::new().unwrap();

    let cfg = {
        let mut cfg = get_configuration().expect("read configuration");
        // random port
        cfg.application.port = 0;
        cfg.storage.path = storage_dir.path().join("subscribers.csv");
        cfg.email.backend = EmailBackendKind::Log;
        cfg.http_client.timeout_milliseconds = 2000;
        cfg.rate_sources = [
            RateProvider::Binance,
            RateProvider::Coingecko,
            RateProvider::Kuna,
        ]
        .into_iter()
        .zip(&rate_servers)
        .map(|(provider, server)| RateSourceSettings {
            provider,
            url: server.uri(),
            default_rate: 0.0,
        })
        .collect();
        edit(&mut cfg);
        cfg
    };

    let app = Application::build(cfg).await.expect("build app");
    let addr = format!("http://127.0.0.1:{}", app.get_port());
    tokio::spawn(app.run_until_stopped());

    TestApp {
        addr,
        rate_servers,
        storage_dir,
        api_client: reqwest::Client::new(),
    }
}
