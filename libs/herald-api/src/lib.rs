pub mod delivery;
pub mod error;
pub mod event;
pub mod name;
pub mod registration;

pub use delivery::{Delivery, DeliveryReceipt};
pub use error::{DeliveryError, DeliveryErrorKind, RegistrationError};
pub use event::{CORRELATION_HEADER, Event, Headers};
