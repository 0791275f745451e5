pub mod document;
pub mod message;

pub use document::*;
pub use message::*;
