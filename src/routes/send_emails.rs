use std::fmt::Debug;

use actix_web::http::StatusCode;
use actix_web::web;
use actix_web::HttpResponse;
use actix_web::ResponseError;
use anyhow::Context;

use crate::email_client::EmailClient;
use crate::rate::FetchFailure;
use crate::rate::RateAggregator;
use crate::registry::SubscriptionRegistry;
use crate::utils::error_chain_fmt;
use crate::utils::spawn_blocking_with_tracing;

#[derive(thiserror::Error)]
pub enum SendEmailsError {
    #[error("Failed to get exchange rate")]
    RateUnavailable(#[source] FetchFailure),
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl Debug for SendEmailsError {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for SendEmailsError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::RateUnavailable(_) => StatusCode::BAD_REQUEST,
            Self::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// `POST /api/sendEmails`
///
/// Fetch the current rate and send it, in a single email, to every
/// subscriber. Delivery happens before the response is returned; there is no
/// queue.
///
/// ```sh
///     curl -v -X POST http://127.0.0.1:8000/api/sendEmails
/// ```
#[tracing::instrument(name = "Sending rate to subscribers", skip_all)]
pub async fn send_emails(
    aggregator: web::Data<RateAggregator>,
    registry: web::Data<SubscriptionRegistry>,
    email_client: web::Data<EmailClient>,
) -> Result<HttpResponse, SendEmailsError> {
    let rate = aggregator
        .exchange_rate()
        .await
        .map_err(SendEmailsError::RateUnavailable)?;

    let registry = registry.into_inner();
    let subscribers = spawn_blocking_with_tracing(move || registry.subscriptions())
        .await
        .context("Failed to spawn blocking task")?
        .context("Failed to read subscribers")?;

    email_client
        .send_exchange_rate(rate, subscribers)
        .await
        .context("Failed to send exchange rate")?;

    Ok(HttpResponse::Ok().finish())
}
