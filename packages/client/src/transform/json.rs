//! Default JSON transforms

use bytes::Bytes;
use http::{HeaderMap, StatusCode};

use crate::config::TransitionalOptions;
use crate::config::request::RequestBody;
use crate::error::{self, Result};
use crate::http::{ResponseData, is_json_content_type, set_content_type_if_absent};

use super::{RequestTransform, ResponseTransform};

/// Encodes `Json` and `Form` bodies, setting the matching content type.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRequest;

impl RequestTransform for JsonRequest {
    fn transform(&self, body: RequestBody, headers: &mut HeaderMap) -> Result<RequestBody> {
        match body {
            RequestBody::Json(value) => {
                let encoded = serde_json::to_vec(&value).map_err(|e| {
                    error::bad_option(format!("request body is not serializable: {e}")).with(e)
                })?;
                set_content_type_if_absent(headers, "application/json");
                Ok(RequestBody::Bytes(Bytes::from(encoded)))
            }
            RequestBody::Form(pairs) => {
                let encoded = serde_urlencoded::to_string(&pairs).map_err(|e| {
                    error::bad_option(format!("form body is not encodable: {e}")).with(e)
                })?;
                set_content_type_if_absent(headers, "application/x-www-form-urlencoded");
                Ok(RequestBody::Text(encoded))
            }
            other => Ok(other),
        }
    }
}

/// Parses textual response data as JSON.
///
/// Parsing is attempted when `forced_json_parsing` is set or the response
/// declares a JSON content type. A payload that does not parse is kept as
/// text when `silent_json_parsing` is set and rejected with `BadResponse`
/// otherwise.
#[derive(Debug, Clone, Copy)]
pub struct JsonResponse {
    pub forced: bool,
    pub silent: bool,
}

impl Default for JsonResponse {
    fn default() -> Self {
        Self::from(&TransitionalOptions::default())
    }
}

impl From<&TransitionalOptions> for JsonResponse {
    fn from(options: &TransitionalOptions) -> Self {
        Self {
            forced: options.forced_json_parsing,
            silent: options.silent_json_parsing,
        }
    }
}

impl ResponseTransform for JsonResponse {
    fn transform(
        &self,
        data: ResponseData,
        headers: &HeaderMap,
        _status: Option<StatusCode>,
    ) -> Result<ResponseData> {
        let declared_json = is_json_content_type(headers);
        if !(self.forced || declared_json) {
            return Ok(data);
        }

        let text = match data {
            ResponseData::Text(text) => text,
            ResponseData::Bytes(bytes) => match String::from_utf8(bytes.to_vec()) {
                Ok(text) => text,
                Err(_) => return Ok(ResponseData::Bytes(bytes)),
            },
            other => return Ok(other),
        };

        if text.trim().is_empty() {
            return Ok(ResponseData::Text(text));
        }

        match serde_json::from_str(&text) {
            Ok(value) => Ok(ResponseData::Json(value)),
            Err(e) if self.silent => {
                tracing::trace!(error = %e, "response is not JSON, keeping text");
                Ok(ResponseData::Text(text))
            }
            Err(e) => Err(error::bad_response(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use http::header::{CONTENT_TYPE, HeaderValue};
    use serde_json::json;

    use super::*;
    use crate::error::Kind;

    #[test]
    fn parses_json_text() {
        let data = JsonResponse::default()
            .transform(ResponseData::from(r#"{"ok":true}"#), &HeaderMap::new(), None)
            .expect("valid json");
        assert_eq!(data, ResponseData::Json(json!({ "ok": true })));
    }

    #[test]
    fn silent_parsing_keeps_text() {
        let data = JsonResponse::default()
            .transform(ResponseData::from("plain words"), &HeaderMap::new(), None)
            .expect("silent parsing");
        assert_eq!(data, ResponseData::from("plain words"));
    }

    #[test]
    fn strict_parsing_rejects_invalid_json() {
        let strict = JsonResponse {
            forced: false,
            silent: false,
        };
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let err = strict
            .transform(ResponseData::from("{oops"), &headers, Some(StatusCode::OK))
            .expect_err("strict parsing");
        assert_eq!(err.kind(), Kind::BadResponse);
    }

    #[test]
    fn encodes_json_and_form_bodies() {
        let mut headers = HeaderMap::new();
        let body = JsonRequest
            .transform(RequestBody::Json(json!({ "a": 1 })), &mut headers)
            .expect("json encodes");
        assert!(matches!(body, RequestBody::Bytes(ref bytes) if bytes.as_ref() == br#"{"a":1}"#));
        assert_eq!(headers[CONTENT_TYPE], "application/json");

        let mut headers = HeaderMap::new();
        let body = JsonRequest
            .transform(
                RequestBody::Form(vec![("q".into(), "a b".into())]),
                &mut headers,
            )
            .expect("form encodes");
        assert!(matches!(body, RequestBody::Text(ref text) if text == "q=a+b"));
        assert_eq!(headers[CONTENT_TYPE], "application/x-www-form-urlencoded");
    }
}
