mod apns;
mod error;
mod message;
mod traits;

pub use apns::{ApnsClient, ApnsCredentials};
pub use error::PushError;
pub use message::{DeliveryStatus, PushMessage, PushType, push_type_for};
pub use traits::PushSender;
