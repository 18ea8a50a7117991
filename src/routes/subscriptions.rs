use std::fmt::Debug;

use actix_web::http::StatusCode;
use actix_web::web;
use actix_web::HttpResponse;
use actix_web::ResponseError;
use anyhow::Context;
use serde::Deserialize;

use crate::domain::SubscriberEmail;
use crate::registry::SubscribeError;
use crate::registry::SubscriptionRegistry;
use crate::utils::error_chain_fmt;
use crate::utils::spawn_blocking_with_tracing;

#[derive(Deserialize)]
pub struct FormData {
    email: String,
}

#[derive(thiserror::Error)]
pub enum SubscriptionError {
    #[error("{0}")]
    ValidationError(String),
    #[error("Email is already subscribed")]
    AlreadySubscribed(#[source] SubscribeError),
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl Debug for SubscriptionError {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for SubscriptionError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::AlreadySubscribed(_) => StatusCode::CONFLICT,
            Self::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// `POST /api/subscribe`
///
/// ```sh
///     curl -v --data 'email=john@foo.com' http://127.0.0.1:8000/api/subscribe
/// ```
///
/// A missing `email` field is rejected by the `Form` extractor (400) before
/// this runs; an empty one is rejected here (400). Subscribing an address
/// that is already in the file is 409, and nothing is written.
#[tracing::instrument(
    name = "Adding new subscriber",
    skip(form, registry),
    fields(subscriber_email = %form.email)
)]
pub async fn subscribe(
    form: web::Form<FormData>,
    registry: web::Data<SubscriptionRegistry>,
) -> Result<HttpResponse, SubscriptionError> {
    let email = SubscriberEmail::parse(form.0.email).map_err(SubscriptionError::ValidationError)?;

    // file i/o is blocking
    let registry = registry.into_inner();
    spawn_blocking_with_tracing(move || registry.subscribe(&email))
        .await
        .context("Failed to spawn blocking task")?
        .map_err(|e| match e {
            SubscribeError::AlreadySubscribed(_) => SubscriptionError::AlreadySubscribed(e),
            e => SubscriptionError::UnexpectedError(
                anyhow::Error::new(e).context("Failed to store subscriber"),
            ),
        })?;

    Ok(HttpResponse::Ok().finish())
}
