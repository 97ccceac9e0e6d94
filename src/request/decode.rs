use serde::de::DeserializeOwned;

use super::{ActionResponse, HttpRequest};
use crate::error::{Error, Result};

/// The only status accepted when a request lists no expected codes.
pub const DEFAULT_EXPECTED_STATUS: u16 = 200;

impl HttpRequest {
    /// Whether `status` is in this request's acceptance set.
    pub fn accepts(&self, status: u16) -> bool {
        if self.expected_status_codes.is_empty() {
            status == DEFAULT_EXPECTED_STATUS
        } else {
            self.expected_status_codes.contains(&status)
        }
    }

    /// Runs the request, checks the status, and decodes the JSON body into `T`.
    ///
    /// # Errors
    ///
    /// Everything [`do_http_action`](Self::do_http_action) returns, plus
    /// [`Error::UnexpectedStatus`] when the status is not accepted and
    /// [`Error::Decode`] when the body is not valid JSON for `T` (an empty
    /// body included).
    pub async fn get_body<T: DeserializeOwned>(&self) -> Result<T> {
        let response = self.do_http_action().await?;
        self.decode_response(response)
    }

    /// [`get_body`](Self::get_body) into a dynamic JSON value.
    pub async fn get_body_value(&self) -> Result<serde_json::Value> {
        self.get_body().await
    }

    pub(crate) fn decode_response<T: DeserializeOwned>(&self, response: ActionResponse) -> Result<T> {
        if !self.accepts(response.status) {
            return Err(Error::UnexpectedStatus {
                status: response.status,
                body: response.body,
            });
        }
        serde_json::from_slice(&response.body).map_err(Error::Decode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Payload {
        #[serde(rename = "Field1")]
        field1: String,
        #[serde(rename = "Field2")]
        field2: i64,
    }

    fn response(status: u16, body: &'static str) -> ActionResponse {
        ActionResponse {
            status,
            body: Bytes::from_static(body.as_bytes()),
        }
    }

    #[test]
    fn test_empty_expected_set_accepts_only_200() {
        let req = HttpRequest::new("http://localhost");
        assert!(req.accepts(200));
        assert!(!req.accepts(201));
        assert!(!req.accepts(204));
        assert!(!req.accepts(404));
    }

    #[test]
    fn test_explicit_expected_set() {
        let mut req = HttpRequest::new("http://localhost");
        req.expected_status_codes = vec![400, 404];
        assert!(req.accepts(404));
        assert!(!req.accepts(200));
    }

    #[test]
    fn test_decode_accepted_body() {
        let req = HttpRequest::new("http://localhost");
        let payload: Payload = req
            .decode_response(response(200, r#"{"Field1":"MyField1","Field2":1234}"#))
            .unwrap();
        assert_eq!(
            payload,
            Payload {
                field1: "MyField1".into(),
                field2: 1234,
            }
        );
    }

    #[test]
    fn test_rejected_status_keeps_body() {
        let mut req = HttpRequest::new("http://localhost");
        req.expected_status_codes = vec![400, 404];
        let err = req
            .decode_response::<Payload>(response(200, r#"{"Field1":"x","Field2":1}"#))
            .unwrap_err();
        assert_eq!(err.status(), Some(200));
        assert_eq!(err.body().unwrap().as_ref(), br#"{"Field1":"x","Field2":1}"#);
    }

    #[test]
    fn test_empty_body_is_decode_error() {
        let mut req = HttpRequest::new("http://localhost");
        req.expected_status_codes = vec![200, 204];
        let err = req.decode_response::<Payload>(response(204, "")).unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[test]
    fn test_malformed_json_is_decode_error() {
        let req = HttpRequest::new("http://localhost");
        let err = req
            .decode_response::<serde_json::Value>(response(200, "{not json"))
            .unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }
}
