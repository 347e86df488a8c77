// Status-code contract shared by both clients.
//
// Every call names the one status it accepts (200, 201 or 202). Anything
// else becomes an error: 401 maps to `Authentication`, an `<Error>` body to
// `Remote`, and the rest to `UnexpectedStatus` with the raw body attached.

use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use crate::codec;
use crate::error::Error;
use crate::types::ErrorDocument;

/// Check `resp` against `expected` and decode its body into `T`.
pub(crate) async fn expect<T: DeserializeOwned>(
    resp: reqwest::Response,
    expected: StatusCode,
) -> Result<T, Error> {
    let body = expect_body(resp, expected).await?;
    codec::decode(&body)
}

/// Check `resp` against `expected` and return the raw body.
pub(crate) async fn expect_body(
    resp: reqwest::Response,
    expected: StatusCode,
) -> Result<String, Error> {
    let status = resp.status();
    let url = resp.url().to_string();

    if status == StatusCode::UNAUTHORIZED {
        return Err(Error::Authentication {
            message: "session expired or invalid credentials".into(),
        });
    }

    let body = resp.text().await.map_err(Error::Transport)?;

    if status == expected {
        return Ok(body);
    }

    Err(parse_error(status, expected, url, body))
}

fn parse_error(status: StatusCode, expected: StatusCode, url: String, body: String) -> Error {
    if let Ok(doc) = quick_xml::de::from_str::<ErrorDocument>(&body) {
        if let Some(message) = doc.message {
            return Error::Remote {
                status: status.as_u16(),
                message,
                code: doc.minor_error_code.or(doc.major_error_code),
            };
        }
    }

    Error::UnexpectedStatus {
        status: status.as_u16(),
        expected: expected.as_u16(),
        url,
        body,
    }
}
