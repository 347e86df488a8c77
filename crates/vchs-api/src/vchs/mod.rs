// vCHS public API: login, service discovery and the VDC session exchange.

pub mod auth;
pub mod client;

pub use client::{VchsClient, VchsSession};
