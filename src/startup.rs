use std::net::TcpListener;

use actix_web::dev::Server;
use actix_web::web;
use actix_web::App;
use actix_web::HttpServer;
use anyhow::anyhow;
use anyhow::Context;
use tracing_actix_web::TracingLogger;

use crate::configuration::Settings;
use crate::email_client::EmailClient;
use crate::rate::RateAggregator;
use crate::registry::SubscriptionRegistry;
use crate::routes::get_rate;
use crate::routes::health_check;
use crate::routes::send_emails;
use crate::routes::subscribe;

/// Wrapper for actix's `Server` with access to the bound port. Not to be
/// confused with actix's `App`!
pub struct Application {
    /// Left private; use `get_port` to access
    port: u16,
    server: Server,
}

impl Application {
    /// Build every component from `cfg`, then bind the listener. Fails
    /// (without serving anything) if the rate source list is empty, the sender
    /// address is blank, or the subscriber file cannot be created.
    pub async fn build(cfg: Settings) -> Result<Self, anyhow::Error> {
        let aggregator = RateAggregator::new(
            cfg.rate_sources()
                .context("Failed to build http client")?,
        )
        .map_err(|e| anyhow!(e))?;

        let storage = cfg.storage.storage();
        storage
            .ensure_exists()
            .context("Failed to create subscriber file")?;
        let registry = SubscriptionRegistry::new(storage);

        let email_client = cfg.email_client().map_err(|e| anyhow!(e))?;

        // port 0 means the OS picks one; read it back before handing the listener
        // to actix
        let addr = format!("{}:{}", cfg.application.host, cfg.application.port);
        let listener = TcpListener::bind(addr)?;
        let port = listener.local_addr()?.port();

        let server = run(listener, aggregator, registry, email_client)?;

        Ok(Self { port, server })
    }

    pub fn get_port(&self) -> u16 { self.port }

    /// Because this consumes `self`, this should be the final function call (or
    /// passed to `tokio::spawn`)
    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> { self.server.await }
}

/// The server is not responsible for binding to an address, it only listens to
/// an already bound address.
///
/// Declares all API endpoints.
pub fn run(
    listener: TcpListener,
    aggregator: RateAggregator,
    registry: SubscriptionRegistry,
    email_client: EmailClient,
) -> Result<Server, anyhow::Error> {
    // `Data` is an `Arc`; every worker gets a clone of the same components
    let aggregator = web::Data::new(aggregator);
    let registry = web::Data::new(registry);
    let email_client = web::Data::new(email_client);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .route("/health_check", web::get().to(health_check))
            .service(
                web::scope("/api")
                    .route("/rate", web::get().to(get_rate))
                    .route("/subscribe", web::post().to(subscribe))
                    .route("/sendEmails", web::post().to(send_emails)),
            )
            .app_data(aggregator.clone())
            .app_data(registry.clone())
            .app_data(email_client.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}
