// one binary for all black-box tests; see helpers.rs for `spawn_app`
mod health_check;
mod helpers;
mod rate;
mod send_emails;
mod subscriptions;
