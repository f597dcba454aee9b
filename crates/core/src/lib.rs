//! Core of the cachesync project.
//!
//! Everything in this crate is either pure (codec, key derivation, apply
//! planning) or an async trait describing an I/O seam (`Cache`, `Transport`,
//! `UserRepository`). Concrete backends live in the `cachesync` crate.

pub mod apply;
pub mod cache;
pub mod event;
pub mod storage;
pub mod transport;
pub mod user;
