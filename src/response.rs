use mime::Mime;
use reqwest::{header, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Error, Result};

/// Items per page the platform serves by default.
pub const PAGE_SIZE: usize = 20;

pub fn get_content_type(resp: &Response) -> Option<Mime> {
    resp.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
}

fn is_json(m: &Mime) -> bool {
    m.subtype() == mime::JSON || m.suffix() == Some(mime::JSON)
}

/// Reads a response into JSON, turning non-2xx answers into [`Error::Api`].
pub async fn read_json(resp: Response) -> Result<Value> {
    let status = resp.status();
    let mime = get_content_type(&resp);
    let body = resp.text().await?;

    if !status.is_success() {
        return Err(status_error(status.as_u16(), &body));
    }
    decode_body(mime.as_ref(), &body)
}

/// JSON bodies are parsed; anything else comes back as a JSON string.
///
/// A single-record decode then fails with [`Error::Decode`], while
/// [`decode_list`] treats the string like any other unknown shape and yields
/// an empty page.
pub fn decode_body(mime: Option<&Mime>, body: &str) -> Result<Value> {
    match mime {
        Some(m) if !is_json(m) => Ok(Value::String(body.to_string())),
        _ => Ok(serde_json::from_str(body)?),
    }
}

pub fn status_error(status: u16, body: &str) -> Error {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let message = parsed
        .as_ref()
        .and_then(|v| v.get("error"))
        .and_then(|e| match e {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        })
        .unwrap_or_else(|| body.trim().to_string());

    let message = if message.is_empty() {
        reqwest::StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("request failed")
            .to_string()
    } else {
        message
    };

    Error::Api {
        status,
        message,
        body: parsed,
    }
}

pub fn decode<T: DeserializeOwned>(value: Value) -> Result<T> {
    Ok(serde_json::from_value(value)?)
}

fn truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(a)) => !a.is_empty(),
        Some(Value::Object(o)) => !o.is_empty(),
    }
}

/// Pulls the items out of a list response.
///
/// The API answers either with a bare array, or with an object carrying the
/// items under `key`, `results` or `data` plus `next`/`has_more` hints.
/// Returns the decoded items and whether another page exists.
pub fn decode_list<T: DeserializeOwned>(value: Value, key: &str) -> Result<(Vec<T>, bool)> {
    match value {
        Value::Array(items) => {
            let has_more = items.len() >= PAGE_SIZE;
            let items = items
                .into_iter()
                .map(decode)
                .collect::<Result<Vec<T>>>()?;
            Ok((items, has_more))
        }
        Value::Object(mut map) => {
            let has_more = truthy(map.get("next")) || truthy(map.get("has_more"));
            let items = [key, "results", "data"]
                .iter()
                .find_map(|k| map.remove(*k));
            let items = match items {
                Some(Value::Array(items)) => items
                    .into_iter()
                    .map(decode)
                    .collect::<Result<Vec<T>>>()?,
                _ => Vec::new(),
            };
            Ok((items, has_more))
        }
        _ => Ok((Vec::new(), false)),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Item {
        id: u64,
    }

    #[test]
    fn bare_array_uses_page_size_for_has_more() {
        let (items, more): (Vec<Item>, bool) =
            decode_list(json!([{"id": 1}, {"id": 2}]), "questions").unwrap();
        assert_eq!(items, vec![Item { id: 1 }, Item { id: 2 }]);
        assert!(!more);

        let full: Vec<Value> = (1..=20).map(|i| json!({"id": i})).collect();
        let (items, more): (Vec<Item>, bool) = decode_list(Value::Array(full), "questions").unwrap();
        assert_eq!(items.len(), 20);
        assert!(more);
    }

    #[test]
    fn object_envelope_keys() {
        let (items, more): (Vec<Item>, bool) =
            decode_list(json!({"questions": [{"id": 1}], "next": "/page/2"}), "questions").unwrap();
        assert_eq!(items.len(), 1);
        assert!(more);

        let (items, more): (Vec<Item>, bool) =
            decode_list(json!({"results": [{"id": 3}], "has_more": false}), "questions").unwrap();
        assert_eq!(items, vec![Item { id: 3 }]);
        assert!(!more);

        let (items, _): (Vec<Item>, bool) =
            decode_list(json!({"data": [{"id": 4}]}), "comments").unwrap();
        assert_eq!(items, vec![Item { id: 4 }]);
    }

    #[test]
    fn resource_key_wins_even_when_not_a_list() {
        let (items, _): (Vec<Item>, bool) =
            decode_list(json!({"questions": null, "results": [{"id": 1}]}), "questions").unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn unexpected_shapes_are_empty() {
        let (items, more): (Vec<Item>, bool) = decode_list(json!("oops"), "questions").unwrap();
        assert!(items.is_empty());
        assert!(!more);
    }

    #[test]
    fn bad_item_is_decode_error() {
        let err = decode_list::<Item>(json!([{"id": "x"}]), "questions").unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[test]
    fn status_error_prefers_error_field() {
        match status_error(404, r#"{"error": "Question not found"}"#) {
            Error::Api { status, message, body } => {
                assert_eq!(status, 404);
                assert_eq!(message, "Question not found");
                assert!(body.is_some());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn status_error_falls_back_to_text_then_reason() {
        match status_error(502, "upstream down") {
            Error::Api { message, body, .. } => {
                assert_eq!(message, "upstream down");
                assert!(body.is_none());
            }
            other => panic!("unexpected {:?}", other),
        }
        match status_error(503, "") {
            Error::Api { message, .. } => assert_eq!(message, "Service Unavailable"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn non_json_body_becomes_string() {
        let html: Mime = "text/html".parse().unwrap();
        assert_eq!(
            decode_body(Some(&html), "<html></html>").unwrap(),
            Value::String("<html></html>".into())
        );

        let json_utf8: Mime = "application/json; charset=utf-8".parse().unwrap();
        assert_eq!(decode_body(Some(&json_utf8), "[1]").unwrap(), json!([1]));
        assert!(decode_body(None, "{bad").is_err());
    }

    #[test]
    fn html_page_is_empty_list_but_bad_record() {
        let html: Mime = "text/html".parse().unwrap();
        let body = decode_body(Some(&html), "<html>maintenance</html>").unwrap();

        let (items, more): (Vec<Item>, bool) = decode_list(body.clone(), "questions").unwrap();
        assert!(items.is_empty());
        assert!(!more);
        assert!(matches!(decode::<Item>(body), Err(Error::Decode(_))));
    }
}
