// HTTP client construction.
//
// One `reqwest::Client` serves both API surfaces for a whole run, so
// certificate trust and the request timeout are decided once, here.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::Error;

/// How server certificates are checked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    SystemDefaults,
    /// System store plus the PEM certificate at this path.
    CustomCa(PathBuf),
    /// Skip verification (self-signed vCloud cells).
    #[default]
    DangerAcceptInvalid,
}

impl TlsVerification {
    fn apply(&self, builder: reqwest::ClientBuilder) -> Result<reqwest::ClientBuilder, Error> {
        match self {
            Self::SystemDefaults => Ok(builder),
            Self::CustomCa(path) => {
                let pem = std::fs::read(path).map_err(|e| {
                    Error::Tls(format!("cannot read CA certificate {}: {e}", path.display()))
                })?;
                let cert = reqwest::Certificate::from_pem(&pem).map_err(|e| {
                    Error::Tls(format!("{} is not a PEM certificate: {e}", path.display()))
                })?;
                Ok(builder.add_root_certificate(cert))
            }
            Self::DangerAcceptInvalid => Ok(builder.danger_accept_invalid_certs(true)),
        }
    }
}

/// The client every request of a run goes through.
pub fn http_client(tls: &TlsVerification, timeout: Duration) -> Result<reqwest::Client, Error> {
    let builder = reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("vchs/", env!("CARGO_PKG_VERSION")));
    tls.apply(builder)?
        .build()
        .map_err(|e| Error::Tls(format!("cannot build HTTP client: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_ca_file_is_a_tls_error() {
        let tls = TlsVerification::CustomCa(PathBuf::from("/nonexistent/vchs-ca.pem"));
        match http_client(&tls, Duration::from_secs(5)) {
            Err(Error::Tls(reason)) => assert!(reason.contains("vchs-ca.pem"), "got: {reason}"),
            other => panic!("expected Tls error, got: {other:?}"),
        }
    }

    #[test]
    fn self_signed_cells_are_accepted_by_default() {
        assert_eq!(TlsVerification::default(), TlsVerification::DangerAcceptInvalid);
        assert!(http_client(&TlsVerification::default(), Duration::from_secs(5)).is_ok());
    }
}
