//! Data types for the verification library.

pub mod analysis;
pub mod claim;
pub mod config;
pub mod evidence;
pub mod options;
pub mod source;
