//! HEALCHAIN Cryptography Module
//!
//! Provides the one-way transforms used by the fund module:
//! - SHA-256 credential digests
//! - BLAKE3 record content digests

pub mod hashing;

pub use hashing::*;
