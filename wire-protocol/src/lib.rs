//! Codecs for the two external wire formats: a line-oriented CSV text
//! protocol and a big-endian, length-prefixed binary frame protocol, plus
//! the UDP multicast packet framing built on top of the binary codec.
//!
//! This crate is pure encode/decode: no sockets, no async runtime. The
//! `transport` crate owns the actual TCP/UDP I/O and calls into these
//! functions per line or per frame.

pub mod binary;
pub mod csv;
pub mod error;
pub mod multicast;

pub use error::DecodeError;
