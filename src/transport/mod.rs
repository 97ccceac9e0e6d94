//! Transport client handles.
//!
//! [`HttpClient`] is the seam descriptors execute through; [`RetryClient`] is
//! the stock implementation used whenever a descriptor has no client of its own.

mod client;
mod retry;

pub use client::{HttpClient, RetryOverride};
pub use retry::{
    DEFAULT_MAX_RETRIES, DEFAULT_MAX_WAIT, DEFAULT_MIN_WAIT, RetryClient, RetryClientBuilder,
};
