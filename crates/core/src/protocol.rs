//! Cross-frame message protocol between the embedded widget and the host page.
//!
//! # Wire format
//!
//! ```text
//! request:  { "id": "<uuid>", "type": "addCart", "parameters": { ... } }
//! response: { "responseTo": "<uuid>", "payload": ..., "isError": true }
//! ```
//!
//! `parameters` and `payload` are free-form JSON on the wire. Inside the
//! workspace a request is decoded into a [`Command`], one variant per message
//! type, so handlers match exhaustively instead of poking at dictionaries.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::types::VariantId;

/// Locale reported when the host page does not expose one.
pub const DEFAULT_LOCALE: &str = "en";

/// Protocol errors.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The `type` field names no known operation.
    #[error("Unknown message type: {0}")]
    UnknownType(String),

    /// The `parameters` did not match the operation's shape.
    #[error("Invalid parameters for {kind}: {source}")]
    InvalidParameters {
        kind: MessageType,
        #[source]
        source: serde_json::Error,
    },

    /// Encoding a value to JSON failed.
    #[error("Encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Operation kinds understood by the host page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MessageType {
    Close,
    AddCart,
    GetCustomer,
    GetCurrency,
    Checkout,
    GaPageView,
    GaEvent,
}

impl MessageType {
    /// Wire name of this message type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Close => "close",
            Self::AddCart => "addCart",
            Self::GetCustomer => "getCustomer",
            Self::GetCurrency => "getCurrency",
            Self::Checkout => "checkout",
            Self::GaPageView => "gaPageView",
            Self::GaEvent => "gaEvent",
        }
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MessageType {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "close" => Ok(Self::Close),
            "addCart" => Ok(Self::AddCart),
            "getCustomer" => Ok(Self::GetCustomer),
            "getCurrency" => Ok(Self::GetCurrency),
            "checkout" => Ok(Self::Checkout),
            "gaPageView" => Ok(Self::GaPageView),
            "gaEvent" => Ok(Self::GaEvent),
            _ => Err(ProtocolError::UnknownType(s.to_owned())),
        }
    }
}

// =============================================================================
// Envelopes
// =============================================================================

/// A request posted from the widget to the host page.
///
/// `kind` stays a raw string so requests with types this build does not know
/// can still be answered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub parameters: Value,
}

impl Request {
    /// Decode the typed command.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::UnknownType` for unrecognised types and
    /// `ProtocolError::InvalidParameters` when the parameters do not fit.
    pub fn command(&self) -> Result<Command, ProtocolError> {
        let kind: MessageType = self.kind.parse()?;
        Command::decode(kind, self.parameters.clone())
    }
}

/// The host page's answer to a [`Request`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub response_to: Uuid,
    #[serde(default)]
    pub payload: Value,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

impl Response {
    /// Successful response carrying `payload`.
    #[must_use]
    pub const fn ok(response_to: Uuid, payload: Value) -> Self {
        Self {
            response_to,
            payload,
            is_error: false,
        }
    }

    /// Error response carrying the host's error body.
    #[must_use]
    pub const fn error(response_to: Uuid, payload: Value) -> Self {
        Self {
            response_to,
            payload,
            is_error: true,
        }
    }
}

/// Any frame travelling between the two windows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Frame {
    Response(Response),
    Request(Request),
}

impl From<Request> for Frame {
    fn from(request: Request) -> Self {
        Self::Request(request)
    }
}

impl From<Response> for Frame {
    fn from(response: Response) -> Self {
        Self::Response(response)
    }
}

/// A frame together with the origin of the window that posted it.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub origin: String,
    pub frame: Frame,
}

impl Envelope {
    #[must_use]
    pub fn new(origin: impl Into<String>, frame: impl Into<Frame>) -> Self {
        Self {
            origin: origin.into(),
            frame: frame.into(),
        }
    }
}

// =============================================================================
// Commands
// =============================================================================

/// A decoded request.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Close,
    AddCart(AddCart),
    GetCustomer,
    GetCurrency,
    Checkout,
    PageView(PageView),
    Event(AnalyticsEvent),
}

impl Command {
    /// Message type of this command.
    #[must_use]
    pub const fn message_type(&self) -> MessageType {
        match self {
            Self::Close => MessageType::Close,
            Self::AddCart(_) => MessageType::AddCart,
            Self::GetCustomer => MessageType::GetCustomer,
            Self::GetCurrency => MessageType::GetCurrency,
            Self::Checkout => MessageType::Checkout,
            Self::PageView(_) => MessageType::GaPageView,
            Self::Event(_) => MessageType::GaEvent,
        }
    }

    /// Decode parameters for `kind`.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::InvalidParameters` when the parameters do not
    /// match the operation's shape.
    pub fn decode(kind: MessageType, parameters: Value) -> Result<Self, ProtocolError> {
        let invalid = |source| ProtocolError::InvalidParameters { kind, source };

        Ok(match kind {
            MessageType::Close => Self::Close,
            MessageType::GetCustomer => Self::GetCustomer,
            MessageType::GetCurrency => Self::GetCurrency,
            MessageType::Checkout => Self::Checkout,
            MessageType::AddCart => Self::AddCart(serde_json::from_value(parameters).map_err(invalid)?),
            MessageType::GaPageView => {
                Self::PageView(serde_json::from_value(parameters).map_err(invalid)?)
            }
            MessageType::GaEvent => Self::Event(serde_json::from_value(parameters).map_err(invalid)?),
        })
    }

    /// Parameters as wire JSON (`null` for parameterless commands).
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::Encode` if serialization fails.
    pub fn parameters(&self) -> Result<Value, ProtocolError> {
        Ok(match self {
            Self::Close | Self::GetCustomer | Self::GetCurrency | Self::Checkout => Value::Null,
            Self::AddCart(params) => serde_json::to_value(params)?,
            Self::PageView(params) => serde_json::to_value(params)?,
            Self::Event(params) => serde_json::to_value(params)?,
        })
    }

    /// Wrap this command in a request envelope with the given correlation id.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::Encode` if serialization fails.
    pub fn into_request(self, id: Uuid) -> Result<Request, ProtocolError> {
        Ok(Request {
            id,
            kind: self.message_type().as_str().to_owned(),
            parameters: self.parameters()?,
        })
    }
}

/// Parameters of [`MessageType::AddCart`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddCart {
    pub items: Vec<LineItem>,
}

/// A variant and quantity to add to the host cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: VariantId,
    pub quantity: u32,
}

/// Parameters of [`MessageType::GaPageView`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageView {
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
}

/// Parameters of [`MessageType::GaEvent`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticsEvent {
    pub category: String,
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<i64>,
}

/// Shopper identity exposed by the host page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerData {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default = "default_locale")]
    pub locale: String,
}

impl Default for CustomerData {
    fn default() -> Self {
        Self {
            id: None,
            email: None,
            locale: default_locale(),
        }
    }
}

fn default_locale() -> String {
    DEFAULT_LOCALE.to_owned()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_request_wire_shape() {
        let id = Uuid::new_v4();
        let request = Command::AddCart(AddCart {
            items: vec![LineItem {
                id: VariantId::new(42),
                quantity: 2,
            }],
        })
        .into_request(id)
        .expect("encode");

        let wire = serde_json::to_value(&request).expect("serialize");
        assert_eq!(
            wire,
            json!({
                "id": id.to_string(),
                "type": "addCart",
                "parameters": { "items": [{ "id": 42, "quantity": 2 }] }
            })
        );
    }

    #[test]
    fn test_parameterless_request_omits_parameters() {
        let request = Command::Close.into_request(Uuid::new_v4()).expect("encode");
        let wire = serde_json::to_value(&request).expect("serialize");
        assert!(wire.get("parameters").is_none());
        assert_eq!(wire["type"], "close");
    }

    #[test]
    fn test_decode_event() {
        let request: Request = serde_json::from_value(json!({
            "id": Uuid::new_v4(),
            "type": "gaEvent",
            "parameters": { "category": "Fitting", "action": "Viewed" }
        }))
        .expect("decode");

        let command = request.command().expect("command");
        assert_eq!(
            command,
            Command::Event(AnalyticsEvent {
                category: "Fitting".to_owned(),
                action: "Viewed".to_owned(),
                label: None,
                value: None,
            })
        );
    }

    #[test]
    fn test_unknown_type() {
        let request = Request {
            id: Uuid::new_v4(),
            kind: "teleport".to_owned(),
            parameters: Value::Null,
        };
        assert!(matches!(
            request.command(),
            Err(ProtocolError::UnknownType(kind)) if kind == "teleport"
        ));
    }

    #[test]
    fn test_invalid_parameters() {
        let result = Command::decode(MessageType::AddCart, json!({ "items": "nope" }));
        assert!(matches!(
            result,
            Err(ProtocolError::InvalidParameters {
                kind: MessageType::AddCart,
                ..
            })
        ));
    }

    #[test]
    fn test_response_wire_shape() {
        let id = Uuid::new_v4();
        let ok = serde_json::to_value(Response::ok(id, json!({ "locale": "de" }))).expect("ok");
        assert_eq!(ok, json!({ "responseTo": id.to_string(), "payload": { "locale": "de" } }));

        let err = serde_json::to_value(Response::error(id, json!({ "status": 422 }))).expect("err");
        assert_eq!(err["isError"], true);
    }

    #[test]
    fn test_frame_distinguishes_requests_and_responses() {
        let id = Uuid::new_v4();
        let response: Frame =
            serde_json::from_value(json!({ "responseTo": id, "payload": null })).expect("frame");
        assert!(matches!(response, Frame::Response(r) if r.response_to == id));

        let request: Frame =
            serde_json::from_value(json!({ "id": id, "type": "close" })).expect("frame");
        assert!(matches!(request, Frame::Request(r) if r.kind == "close"));
    }

    #[test]
    fn test_customer_defaults_locale() {
        let customer: CustomerData = serde_json::from_value(json!({})).expect("decode");
        assert_eq!(customer.locale, DEFAULT_LOCALE);
    }

    #[test]
    fn test_message_type_names() {
        for kind in [
            MessageType::Close,
            MessageType::AddCart,
            MessageType::GetCustomer,
            MessageType::GetCurrency,
            MessageType::Checkout,
            MessageType::GaPageView,
            MessageType::GaEvent,
        ] {
            let encoded = serde_json::to_value(kind).expect("encode");
            assert_eq!(encoded, kind.as_str());
            assert_eq!(kind.as_str().parse::<MessageType>().ok(), Some(kind));
        }
    }
}
