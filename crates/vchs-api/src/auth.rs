use secrecy::SecretString;

/// Path of the vCHS login endpoint, relative to the service URL.
pub const SESSIONS_PATH: &str = "/api/vchs/sessions";

/// Path of the vCloud query service, relative to the vCloud cell root.
pub const QUERY_PATH: &str = "/api/query";

/// Which API surface a request targets.
///
/// Determines the `Accept` header family and the header that carries the
/// session token. The two surfaces issue independent tokens: vCHS hands one
/// out at login, vCloud hands one out per VDC session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiSurface {
    /// vCHS public API (`/api/vchs/...`).
    Vchs,
    /// Per-VDC vCloud Director API.
    Vcloud,
}

impl ApiSurface {
    /// The request header that carries the session token.
    pub fn token_header(self) -> &'static str {
        match self {
            Self::Vchs => "x-vchs-authorization",
            Self::Vcloud => "x-vcloud-authorization",
        }
    }

    /// The `Accept` header value for the given API version.
    ///
    /// vCHS: `application/xml;version=5.6`
    /// vCloud: `application/*+xml;version=5.6`
    pub fn accept(self, version: &str) -> String {
        match self {
            Self::Vchs => format!("application/xml;version={version}"),
            Self::Vcloud => format!("application/*+xml;version={version}"),
        }
    }
}

/// Username/password pair used for the vCHS Basic-auth login.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accept_headers_carry_version() {
        assert_eq!(ApiSurface::Vchs.accept("5.6"), "application/xml;version=5.6");
        assert_eq!(ApiSurface::Vcloud.accept("5.7"), "application/*+xml;version=5.7");
    }

    #[test]
    fn token_headers_differ_per_surface() {
        assert_ne!(
            ApiSurface::Vchs.token_header(),
            ApiSurface::Vcloud.token_header()
        );
    }
}
