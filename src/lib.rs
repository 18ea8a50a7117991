//! Notifies subscribers of the current BTC to UAH exchange rate.
//!
//! The rate is taken from the first of several public exchanges that answers
//! (see `rate`), subscribers are kept in a csv file (see `registry`), and
//! the rate is delivered over implicit-TLS smtp (see `email_client`).

pub mod configuration;
pub mod domain;
pub mod email_client;
pub mod rate;
pub mod registry;
pub mod routes;
pub mod startup;
pub mod storage;
pub mod telemetry;
pub mod utils;
