//! Retrieval of the signed ledger from the certificate provisioning API.
//!
//! The endpoint answers a form POST with a JSON body whose `signedList`
//! element holds the binary ledger as URL-safe base64.

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Default list endpoint.
pub const DEFAULT_LIST_URL: &str =
    "https://www.googleapis.com/certificateprovisioning/v1/devicecertificatestatus/list";

/// URL-safe alphabet; producers are inconsistent about trailing padding.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("List endpoint returned HTTP {0}")]
    Status(reqwest::StatusCode),

    #[error("Invalid JSON response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no \"{0}\" element in JSON response")]
    MissingField(&'static str),

    #[error("Invalid base64 in signedList: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// Typed view of the endpoint's JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct DcslResponse {
    /// Response metadata, carried through untouched.
    pub list_response_header: Option<Value>,
    /// The ledger, URL-safe base64 encoded.
    pub signed_list: String,
}

impl DcslResponse {
    /// Build from the untyped body, requiring a non-empty `signedList` string.
    pub fn from_json(body: &Value) -> Result<Self, FetchError> {
        let signed_list = body
            .get("signedList")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .ok_or(FetchError::MissingField("signedList"))?;

        Ok(Self {
            list_response_header: body.get("listResponseHeader").cloned(),
            signed_list: signed_list.to_string(),
        })
    }

    /// Raw ledger bytes.
    pub fn ledger_bytes(&self) -> Result<Vec<u8>, FetchError> {
        Ok(URL_SAFE_LENIENT.decode(self.signed_list.trim())?)
    }
}

/// POST to the list endpoint and return the decoded ledger bytes.
pub async fn fetch_signed_list(
    client: &Client,
    url: &str,
    api_key: &str,
) -> Result<Vec<u8>, FetchError> {
    debug!("Sending POST request to {url}");
    let response = client
        .post(url)
        .query(&[("key", api_key)])
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .send()
        .await?;

    let status = response.status();
    debug!("Response status code: {status}");
    debug!("Response headers: {:?}", response.headers());

    let text = response.text().await?;
    debug!("Response body: {text}");

    if !status.is_success() {
        return Err(FetchError::Status(status));
    }

    let body: Value = serde_json::from_str(&text)?;
    DcslResponse::from_json(&body)?.ledger_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;

    #[test]
    fn response_requires_signed_list() {
        let err = DcslResponse::from_json(&json!({ "listResponseHeader": {} })).unwrap_err();
        assert!(matches!(err, FetchError::MissingField("signedList")));

        let err = DcslResponse::from_json(&json!({ "signedList": "" })).unwrap_err();
        assert!(matches!(err, FetchError::MissingField("signedList")));

        let err = DcslResponse::from_json(&json!({ "signedList": 12 })).unwrap_err();
        assert!(matches!(err, FetchError::MissingField("signedList")));
    }

    #[test]
    fn response_keeps_header_opaque() {
        let body = json!({
            "listResponseHeader": { "serviceVersion": "1" },
            "signedList": "CAE"
        });
        let response = DcslResponse::from_json(&body).unwrap();
        assert_eq!(
            response.list_response_header,
            Some(json!({ "serviceVersion": "1" }))
        );
        assert_eq!(response.signed_list, "CAE");
    }

    #[test]
    fn ledger_bytes_accepts_padded_and_unpadded() {
        let unpadded = DcslResponse {
            list_response_header: None,
            signed_list: "-_8".to_string(),
        };
        let padded = DcslResponse {
            list_response_header: None,
            signed_list: "-_8=".to_string(),
        };
        assert_eq!(unpadded.ledger_bytes().unwrap(), vec![0xfb, 0xff]);
        assert_eq!(padded.ledger_bytes().unwrap(), vec![0xfb, 0xff]);
    }

    #[test]
    fn ledger_bytes_rejects_standard_alphabet() {
        let response = DcslResponse {
            list_response_header: None,
            signed_list: "+/8=".to_string(),
        };
        assert!(matches!(
            response.ledger_bytes(),
            Err(FetchError::Base64(_))
        ));
    }

    #[tokio::test]
    async fn fetch_decodes_signed_list() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", Matcher::Regex("^/list".to_string()))
            .match_query(Matcher::UrlEncoded("key".into(), "secret".into()))
            .match_header("content-type", "application/x-www-form-urlencoded")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"listResponseHeader": {}, "signedList": "CgIIAQ"}"#)
            .create_async()
            .await;

        let url = format!("{}/list", server.url());
        let bytes = fetch_signed_list(&Client::new(), &url, "secret")
            .await
            .unwrap();

        assert_eq!(bytes, vec![0x0a, 0x02, 0x08, 0x01]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn fetch_surfaces_http_status() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", Matcher::Regex("^/list".to_string()))
            .with_status(403)
            .with_body(r#"{"error": "forbidden"}"#)
            .create_async()
            .await;

        let url = format!("{}/list", server.url());
        let err = fetch_signed_list(&Client::new(), &url, "bad")
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Status(status) if status.as_u16() == 403));
    }

    #[tokio::test]
    async fn fetch_requires_signed_list() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", Matcher::Regex("^/list".to_string()))
            .with_status(200)
            .with_body(r#"{"listResponseHeader": {}}"#)
            .create_async()
            .await;

        let url = format!("{}/list", server.url());
        let err = fetch_signed_list(&Client::new(), &url, "secret")
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::MissingField("signedList")));
    }
}
