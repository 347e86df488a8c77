// vchs-api: Async Rust client for the vCHS public API and per-VDC vCloud API

pub mod auth;
pub mod codec;
pub mod edit;
pub mod error;
mod response;
pub mod transport;
pub mod types;
pub mod vchs;
pub mod vcloud;

pub use auth::{ApiSurface, Credentials};
pub use error::Error;
pub use reqwest::StatusCode;
pub use transport::{TlsVerification, http_client};
pub use vchs::{VchsClient, VchsSession};
pub use vcloud::VcloudClient;
