mod aggregator;
mod source;
pub use aggregator::RateAggregator;
pub use source::FetchFailure;
pub use source::RateError;
pub use source::RateProvider;
pub use source::RateSource;
