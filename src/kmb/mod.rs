pub mod client;
pub mod entities;
pub mod error;
pub mod serde_helpers;
