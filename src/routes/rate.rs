use std::fmt::Debug;

use actix_web::http::StatusCode;
use actix_web::web;
use actix_web::HttpResponse;
use actix_web::ResponseError;

use crate::rate::FetchFailure;
use crate::rate::RateAggregator;
use crate::utils::error_chain_fmt;

#[derive(thiserror::Error)]
pub enum GetRateError {
    // every configured source failed; the cause chain only goes to the logs
    #[error("Failed to get exchange rate")]
    Unavailable(#[from] FetchFailure),
}

impl Debug for GetRateError {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for GetRateError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Unavailable(_) => StatusCode::BAD_REQUEST,
        }
    }
}

/// `GET /api/rate`
///
/// Current BTC to UAH rate, as a bare json number (e.g. `1234567.89`).
///
/// ```sh
///     curl http://127.0.0.1:8000/api/rate
/// ```
#[tracing::instrument(name = "Getting current rate", skip(aggregator))]
pub async fn get_rate(
    aggregator: web::Data<RateAggregator>
) -> Result<HttpResponse, GetRateError> {
    let rate = aggregator.exchange_rate().await?;
    Ok(HttpResponse::Ok().json(rate))
}
