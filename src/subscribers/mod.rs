pub mod set;
pub mod subscriber;

pub use set::{SubscriberSet, Subscription};
pub use subscriber::Subscribe;
