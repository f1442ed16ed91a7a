pub mod ed25519;
pub mod message;
pub mod token;

pub use ed25519::*;
pub use message::*;
pub use token::*;
