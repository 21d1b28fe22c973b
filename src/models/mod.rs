pub mod enums;
pub mod message;
pub mod profile;

pub use message::Message;
pub use profile::{MissingField, PastSession, ProfileContext};
