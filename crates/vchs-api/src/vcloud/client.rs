// vCloud Director HTTP client
//
// One client per VDC session. Requests follow absolute hrefs taken from
// previously fetched documents; only the query service is addressed by a
// path built here.

use reqwest::StatusCode;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::auth::{ApiSurface, QUERY_PATH};
use crate::codec;
use crate::error::Error;
use crate::response;
use crate::types::{QueryResultRecords, Task, VdcLink};

/// Raw HTTP client for the vCloud API behind one VDC.
pub struct VcloudClient {
    http: reqwest::Client,
    base_url: Url,
    vdc_href: String,
    version: String,
    token: SecretString,
}

impl VcloudClient {
    /// Build a client from the `VdcLink` of a vCloud session.
    ///
    /// The API root is the scheme, host and port of the VDC href.
    pub fn from_vdc_link(
        http: reqwest::Client,
        link: &VdcLink,
        version: impl Into<String>,
    ) -> Result<Self, Error> {
        let vdc_url = Url::parse(&link.href)?;
        let base_url = Url::parse(&vdc_url.origin().ascii_serialization())?;
        Ok(Self {
            http,
            base_url,
            vdc_href: link.href.clone(),
            version: version.into(),
            token: SecretString::from(link.authorization_token.clone()),
        })
    }

    /// The vCloud cell root, e.g. `https://p1v1-vcd.vchs.vmware.com`.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The href of the VDC this session is scoped to.
    pub fn vdc_href(&self) -> &str {
        &self.vdc_href
    }

    // ── Request helpers ──────────────────────────────────────────────

    fn request(&self, method: reqwest::Method, url: impl reqwest::IntoUrl) -> reqwest::RequestBuilder {
        self.http
            .request(method, url)
            .header(ACCEPT, ApiSurface::Vcloud.accept(&self.version))
            .header(
                ApiSurface::Vcloud.token_header(),
                self.token.expose_secret(),
            )
    }

    /// GET `href` and decode the 200 response.
    pub async fn get<T: DeserializeOwned>(&self, href: &str) -> Result<T, Error> {
        debug!("GET {}", href);
        let resp = self.request(reqwest::Method::GET, href).send().await?;
        response::expect(resp, StatusCode::OK).await
    }

    /// POST `body` (encoded under `root`) and decode the `expected` response.
    pub async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        href: &str,
        media_type: &str,
        root: &str,
        body: &B,
        expected: StatusCode,
    ) -> Result<T, Error> {
        debug!("POST {}", href);
        let payload = codec::encode(root, body)?;
        let resp = self
            .request(reqwest::Method::POST, href)
            .header(CONTENT_TYPE, media_type)
            .body(payload)
            .send()
            .await?;
        response::expect(resp, expected).await
    }

    /// GET `href` and return the 200 body as served, for edits that must
    /// send back everything they do not touch.
    pub async fn get_document(&self, href: &str) -> Result<String, Error> {
        debug!("GET {}", href);
        let resp = self.request(reqwest::Method::GET, href).send().await?;
        response::expect_body(resp, StatusCode::OK).await
    }

    /// PUT an already serialized `document` and decode the `expected`
    /// response.
    pub async fn put_document<T: DeserializeOwned>(
        &self,
        href: &str,
        media_type: &str,
        document: String,
        expected: StatusCode,
    ) -> Result<T, Error> {
        debug!("PUT {}", href);
        let resp = self
            .request(reqwest::Method::PUT, href)
            .header(CONTENT_TYPE, media_type)
            .body(document)
            .send()
            .await?;
        response::expect(resp, expected).await
    }

    // ── Endpoints ────────────────────────────────────────────────────

    /// Run the typed query service.
    ///
    /// `GET {base}/api/query?type={record_type}[&filter=name=={name}]`
    pub async fn query(
        &self,
        record_type: &str,
        name: Option<&str>,
    ) -> Result<QueryResultRecords, Error> {
        let mut url = self.base_url.join(QUERY_PATH)?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("type", record_type);
            if let Some(name) = name {
                pairs.append_pair("filter", &format!("name=={name}"));
            }
        }
        debug!("GET {}", url);
        let resp = self.request(reqwest::Method::GET, url).send().await?;
        response::expect(resp, StatusCode::OK).await
    }

    /// Fetch a fresh snapshot of a task.
    pub async fn get_task(&self, href: &str) -> Result<Task, Error> {
        self.get(href).await
    }
}
