mod rate;
mod subscriber_email;
// allow external `use` statements to skip `rate` etc
pub use rate::Rate;
pub use subscriber_email::SubscriberEmail;
