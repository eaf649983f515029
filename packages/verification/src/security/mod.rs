//! Credential handling for knowledge source backends.

pub mod credentials;

pub use credentials::{ApiKey, SecretString};
