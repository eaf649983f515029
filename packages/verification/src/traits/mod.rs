//! Core trait abstractions for the verification library.
//!
//! These traits define the interfaces that applications implement
//! to provide evidence to the verifier.

pub mod knowledge;
