//! Pinion core utilities
//!
//! Board-agnostic building blocks shared by the Pinion HAL crates. Nothing
//! in this crate touches hardware or allocates.
//!
//! # Modules
//!
//! - [`bits`] - register bit manipulation
//! - [`serializer`] - scalar to byte-buffer marshalling
//! - [`containers`] - fixed-capacity array, ring buffer and vector
//!
//! # Features
//!
//! - `defmt` - derive `defmt::Format` on public types
//! - `sync` - `containers::Shared`, a critical-section lock for containers
//!   touched from interrupt handlers

#![no_std]
#![deny(unsafe_code)]

pub mod bits;
pub mod containers;
pub mod serializer;

pub use containers::{Array, BoundedVector, CapacityExceeded, IndexOutOfRange, RingBuffer};
pub use serializer::{TypeSerializer, ValueSerializer};
