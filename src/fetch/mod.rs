//! Concurrent fan-out/fan-in fetch engine

mod aggregate;
mod client;

pub use aggregate::fetch_all;
pub use client::{FetchError, http_get};
