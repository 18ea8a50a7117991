use std::fmt::Display;

use serde::Serialize;

/// Price of 1 BTC in UAH, as reported by one of the rate sources. Fetched
/// fresh for every request, so it carries no timestamp.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize)]
#[serde(transparent)]
pub struct Rate(f64);

impl Rate {
    pub fn new(value: f64) -> Self { Self(value) }

    pub fn value(&self) -> f64 { self.0 }
}

impl From<f64> for Rate {
    fn from(value: f64) -> Self { Self(value) }
}

/// Always exactly two fractional digits. `{:.2}` rounds the exact binary value
/// of the float, so `1.005` (really `1.00499999...`) renders as `1.00`.
impl Display for Rate {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}
