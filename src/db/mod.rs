pub mod client;

pub use client::{HelixClient, HelixClientError};
