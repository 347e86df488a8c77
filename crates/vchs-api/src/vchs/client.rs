// vCHS public API client
//
// `VchsClient` is the unauthenticated entry point; `login` (see auth.rs)
// turns it into a `VchsSession` that carries the `x-vchs-authorization`
// token on every request for the rest of the run.

use reqwest::StatusCode;
use reqwest::header::ACCEPT;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::auth::ApiSurface;
use crate::error::Error;
use crate::response;
use crate::types::{Compute, Link, ServiceList, Session, VCloudSession};

/// Entry point for the vCHS public API.
pub struct VchsClient {
    http: reqwest::Client,
    base_url: Url,
    version: String,
}

impl VchsClient {
    /// Create a client for the vCHS service at `base_url`
    /// (e.g. `https://vchs.vmware.com`), sending requests through `http`.
    pub fn new(http: reqwest::Client, base_url: Url, version: impl Into<String>) -> Self {
        Self {
            http,
            base_url,
            version: version.into(),
        }
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// `{base_url}{path}`, tolerating a trailing slash on the base.
    pub(crate) fn endpoint(&self, path: &str) -> Result<Url, Error> {
        let full = format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path);
        Ok(Url::parse(&full)?)
    }
}

/// An authenticated vCHS session.
///
/// Created once by [`VchsClient::login`] and never refreshed; there is no
/// logout call.
pub struct VchsSession {
    http: reqwest::Client,
    version: String,
    token: SecretString,
    session: Session,
}

impl VchsSession {
    pub(crate) fn new(
        http: reqwest::Client,
        version: String,
        token: SecretString,
        session: Session,
    ) -> Self {
        Self {
            http,
            version,
            token,
            session,
        }
    }

    /// Links advertised by the login response.
    pub fn links(&self) -> &[Link] {
        &self.session.links
    }

    /// The shared HTTP client, reused for the vCloud side.
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    // ── Request helpers ──────────────────────────────────────────────

    fn request(&self, method: reqwest::Method, href: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, href)
            .header(ACCEPT, ApiSurface::Vchs.accept(&self.version))
            .header(
                ApiSurface::Vchs.token_header(),
                self.token.expose_secret(),
            )
    }

    /// GET `href` and decode the 200 response.
    pub async fn get<T: DeserializeOwned>(&self, href: &str) -> Result<T, Error> {
        debug!("GET {}", href);
        let resp = self.request(reqwest::Method::GET, href).send().await?;
        response::expect(resp, StatusCode::OK).await
    }

    // ── Endpoints ────────────────────────────────────────────────────

    /// `GET` the service list the login response pointed at.
    pub async fn service_list(&self, href: &str) -> Result<ServiceList, Error> {
        self.get(href).await
    }

    /// `GET` a compute service and the VDCs it hosts.
    pub async fn compute(&self, href: &str) -> Result<Compute, Error> {
        self.get(href).await
    }

    /// Exchange the vCHS token for a vCloud token scoped to one VDC.
    ///
    /// `POST {vcloudsession href}`, expects 201.
    pub async fn create_vcloud_session(&self, href: &str) -> Result<VCloudSession, Error> {
        debug!("POST {}", href);
        let resp = self.request(reqwest::Method::POST, href).send().await?;
        response::expect(resp, StatusCode::CREATED).await
    }
}
