//! Envelope types and the inbound message classifier.
//!
//! Three shapes travel over a duplex channel:
//!
//! | shape        | `id` | `method` | `params` | `error` |
//! |--------------|------|----------|----------|---------|
//! | Request      | yes  | yes      | optional | no      |
//! | Response     | yes  | no       | one of   | one of  |
//! | Notification | no   | yes      | optional | no      |
//!
//! Anything else is malformed. [`classify`] logs and drops it instead of
//! surfacing an error to the transport.

use serde_json::{Map, Value};
use tracing::warn;

/// A request awaiting exactly one [`Response`] with the same id.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    /// Correlation id chosen by the sender.
    pub id: String,
    /// `"<namespace>/<action>"` or a bare command name.
    pub method: String,
    /// Optional params, passed through untouched.
    pub params: Option<Value>,
}

impl Request {
    /// Create a request.
    #[must_use]
    pub fn new(id: impl Into<String>, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            id: id.into(),
            method: method.into(),
            params,
        }
    }

    /// Substring of the method before the first `/`.
    ///
    /// A method without `/` is its own namespace.
    #[must_use]
    pub fn namespace(&self) -> &str {
        self.method
            .split_once('/')
            .map_or(self.method.as_str(), |(ns, _)| ns)
    }
}

/// Outcome carried by a [`Response`].
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    /// Success result, sent as `params`.
    Params(Value),
    /// Failure message, sent as `error`.
    Error(String),
}

/// The answer to a [`Request`].
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// Id of the request being answered.
    pub id: String,
    /// Exactly one of `params` or `error`.
    pub body: ResponseBody,
}

impl Response {
    /// Successful response.
    #[must_use]
    pub fn success(id: impl Into<String>, params: Value) -> Self {
        Self {
            id: id.into(),
            body: ResponseBody::Params(params),
        }
    }

    /// Failed response.
    #[must_use]
    pub fn error(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            body: ResponseBody::Error(message.into()),
        }
    }

    /// Convert into a `Result`, mapping `error` to `Err`.
    ///
    /// # Errors
    ///
    /// Returns the error message when the body is [`ResponseBody::Error`].
    pub fn into_result(self) -> Result<Value, String> {
        match self.body {
            ResponseBody::Params(v) => Ok(v),
            ResponseBody::Error(e) => Err(e),
        }
    }
}

/// A one-way message.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    /// Method name.
    pub method: String,
    /// Optional params, passed through untouched.
    pub params: Option<Value>,
}

impl Notification {
    /// Create a notification.
    #[must_use]
    pub fn new(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            method: method.into(),
            params,
        }
    }
}

/// Any well-formed message.
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    /// See [`Request`].
    Request(Request),
    /// See [`Response`].
    Response(Response),
    /// See [`Notification`].
    Notification(Notification),
}

impl Envelope {
    /// Encode as a JSON object.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut obj = Map::new();
        match self {
            Self::Request(r) => {
                obj.insert("id".to_owned(), Value::String(r.id.clone()));
                obj.insert("method".to_owned(), Value::String(r.method.clone()));
                if let Some(params) = &r.params {
                    obj.insert("params".to_owned(), params.clone());
                }
            },
            Self::Response(r) => {
                obj.insert("id".to_owned(), Value::String(r.id.clone()));
                match &r.body {
                    ResponseBody::Params(params) => {
                        obj.insert("params".to_owned(), params.clone());
                    },
                    ResponseBody::Error(message) => {
                        obj.insert("error".to_owned(), Value::String(message.clone()));
                    },
                }
            },
            Self::Notification(n) => {
                obj.insert("method".to_owned(), Value::String(n.method.clone()));
                if let Some(params) = &n.params {
                    obj.insert("params".to_owned(), params.clone());
                }
            },
        }
        Value::Object(obj)
    }
}

impl From<Request> for Envelope {
    fn from(r: Request) -> Self {
        Self::Request(r)
    }
}

impl From<Response> for Envelope {
    fn from(r: Response) -> Self {
        Self::Response(r)
    }
}

impl From<Notification> for Envelope {
    fn from(n: Notification) -> Self {
        Self::Notification(n)
    }
}

/// Classify a raw inbound message.
///
/// Returns `None` (after logging) for anything malformed: non-objects,
/// non-string `id`/`method`, non-string `error`, responses carrying both
/// `params` and `error` or neither, and objects with neither `id` nor
/// `method`.
#[must_use]
pub fn classify(raw: &Value) -> Option<Envelope> {
    let Some(obj) = raw.as_object() else {
        warn!(kind = json_kind(raw), "dropping non-object message");
        return None;
    };

    let id = match obj.get("id") {
        None => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => {
            warn!(kind = json_kind(other), "dropping message with non-string id");
            return None;
        },
    };
    let method = match obj.get("method") {
        None => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => {
            warn!(kind = json_kind(other), "dropping message with non-string method");
            return None;
        },
    };
    let params = obj.get("params").cloned();

    match (id, method) {
        (Some(id), Some(method)) => Some(Envelope::Request(Request { id, method, params })),
        (None, Some(method)) => Some(Envelope::Notification(Notification { method, params })),
        (Some(id), None) => classify_response(id, params, obj.get("error")),
        (None, None) => {
            warn!("dropping message with neither id nor method");
            None
        },
    }
}

fn classify_response(id: String, params: Option<Value>, error: Option<&Value>) -> Option<Envelope> {
    match (params, error) {
        (Some(params), None) => Some(Envelope::Response(Response::success(id, params))),
        (None, Some(Value::String(message))) => {
            Some(Envelope::Response(Response::error(id, message.clone())))
        },
        (None, Some(other)) => {
            warn!(id = %id, kind = json_kind(other), "dropping response with non-string error");
            None
        },
        (Some(_), Some(_)) => {
            warn!(id = %id, "dropping response carrying both params and error");
            None
        },
        (None, None) => {
            warn!(id = %id, "dropping response with neither params nor error");
            None
        },
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classify_request() {
        let env = classify(&json!({"id": "1", "method": "codeStream/posts", "params": {"a": 1}}));
        let Some(Envelope::Request(req)) = env else {
            panic!("expected request");
        };
        assert_eq!(req.id, "1");
        assert_eq!(req.namespace(), "codeStream");
        assert_eq!(req.params, Some(json!({"a": 1})));
    }

    #[test]
    fn test_namespace_without_slash() {
        let req = Request::new("1", "bootstrap", None);
        assert_eq!(req.namespace(), "bootstrap");
        let req = Request::new("2", "a/b/c", None);
        assert_eq!(req.namespace(), "a");
    }

    #[test]
    fn test_classify_responses() {
        assert_eq!(
            classify(&json!({"id": "1", "params": null})),
            Some(Envelope::Response(Response::success("1", Value::Null)))
        );
        assert_eq!(
            classify(&json!({"id": "1", "error": "boom"})),
            Some(Envelope::Response(Response::error("1", "boom")))
        );
    }

    #[test]
    fn test_classify_notification() {
        let env = classify(&json!({"method": "webview/didInitialize"}));
        assert_eq!(
            env,
            Some(Envelope::Notification(Notification::new(
                "webview/didInitialize",
                None
            )))
        );
    }

    #[test]
    fn test_malformed_messages_are_dropped() {
        for raw in [
            json!("hello"),
            json!(42),
            json!([1, 2]),
            json!({}),
            json!({"id": 1, "method": "x"}),
            json!({"id": "1", "method": 5}),
            json!({"id": "1"}),
            json!({"id": "1", "params": {}, "error": "x"}),
            json!({"id": "1", "error": {"code": 1}}),
            json!({"params": {}}),
        ] {
            assert!(classify(&raw).is_none(), "should drop {raw}");
        }
    }

    #[test]
    fn test_to_value_shapes() {
        let resp: Envelope = Response::error("9", "Not signed in").into();
        assert_eq!(resp.to_value(), json!({"id": "9", "error": "Not signed in"}));

        let note: Envelope = Notification::new("host/didLogout", Some(json!({}))).into();
        assert_eq!(note.to_value(), json!({"method": "host/didLogout", "params": {}}));

        let req: Envelope = Request::new("3", "bootstrap", None).into();
        assert_eq!(req.to_value(), json!({"id": "3", "method": "bootstrap"}));
    }

    #[test]
    fn test_into_result() {
        assert_eq!(Response::success("1", json!(true)).into_result(), Ok(json!(true)));
        assert_eq!(
            Response::error("1", "nope").into_result(),
            Err("nope".to_owned())
        );
    }
}
