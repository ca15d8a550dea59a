mod controller;
mod trigger;

pub use controller::{Category, FeedController, FeedEvent, FeedPhase, FeedQuery};
pub use trigger::ViewportTrigger;
