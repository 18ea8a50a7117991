use super::FetchFailure;
use super::RateSource;
use crate::domain::Rate;

/// Ordered fallback over several rate sources. There is exactly one pass over
/// the list; no retries, no backoff.
#[derive(Clone, Debug)]
pub struct RateAggregator {
    primary: RateSource,
    fallbacks: Vec<RateSource>,
}

impl RateAggregator {
    /// `sources` are tried in the given order; at least one is required
    pub fn new(sources: Vec<RateSource>) -> Result<Self, String> {
        let mut sources = sources.into_iter();
        let primary = sources
            .next()
            .ok_or("At least one rate source must be configured")?;
        Ok(Self {
            primary,
            fallbacks: sources.collect(),
        })
    }

    pub fn sources(&self) -> impl Iterator<Item = &RateSource> {
        std::iter::once(&self.primary).chain(&self.fallbacks)
    }

    /// Return the first successful rate. Each failure is logged (with the
    /// source's name) and swallowed; if every source fails, the failure of the
    /// last source is returned.
    #[tracing::instrument(name = "Getting exchange rate", skip(self))]
    pub async fn exchange_rate(&self) -> Result<Rate, FetchFailure> {
        let mut result = self.primary.fetch_rate().await;
        for source in &self.fallbacks {
            let Err(failure) = &result else {
                break;
            };
            log_failure(failure);
            result = source.fetch_rate().await;
        }
        if let Err(failure) = &result {
            log_failure(failure);
        }
        result
    }
}

fn log_failure(failure: &FetchFailure) {
    tracing::warn!(
        attempted_rate = %failure.default_rate,
        "{}: {}",
        failure.source_name,
        failure.error,
    );
}
