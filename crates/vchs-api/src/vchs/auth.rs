// vCHS login
//
// Basic-auth POST to `/api/vchs/sessions`. The token comes back in the
// `x-vchs-authorization` response header, not in the body.

use reqwest::StatusCode;
use reqwest::header::ACCEPT;
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use crate::auth::{ApiSurface, SESSIONS_PATH};
use crate::codec;
use crate::error::Error;
use crate::types::Session;
use crate::vchs::client::{VchsClient, VchsSession};

impl VchsClient {
    /// Authenticate with username/password.
    ///
    /// The server must answer 201; any other status is an
    /// [`Error::Authentication`] carrying the status and body.
    pub async fn login(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<VchsSession, Error> {
        let url = self.endpoint(SESSIONS_PATH)?;
        debug!("logging in at {}", url);

        let resp = self
            .http()
            .post(url)
            .basic_auth(username, Some(password.expose_secret()))
            .header(ACCEPT, ApiSurface::Vchs.accept(self.version()))
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        if status != StatusCode::CREATED {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Authentication {
                message: format!("login failed (HTTP {status}): {body}"),
            });
        }

        let token = resp
            .headers()
            .get(ApiSurface::Vchs.token_header())
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
            .ok_or_else(|| Error::Authentication {
                message: format!(
                    "login response carried no {} header",
                    ApiSurface::Vchs.token_header()
                ),
            })?;

        let body = resp.text().await.map_err(Error::Transport)?;
        let session: Session = codec::decode(&body)?;

        debug!("login successful");
        Ok(VchsSession::new(
            self.http().clone(),
            self.version().to_owned(),
            SecretString::from(token),
            session,
        ))
    }
}
