//! Client protocol definitions
//!
//! The join handshake frame and the close codes the relay sends.

mod close_codes;
mod join;

pub use close_codes::CloseCode;
pub use join::JoinRequest;
