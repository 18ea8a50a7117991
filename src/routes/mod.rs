mod health_check;
mod rate;
mod send_emails;
mod subscriptions;
pub use health_check::*;
pub use rate::*;
pub use send_emails::*;
pub use subscriptions::*;
