//! Delivery of finished artifacts.
//!
//! Routes by payload size: small files go straight through the chat
//! channel, oversized ones are offloaded to the expiring file store.

mod caption;
mod router;

pub use caption::build_caption;
pub use router::{DeliveryError, DeliveryResult, DeliveryRouter};
