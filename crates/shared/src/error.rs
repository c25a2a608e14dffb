use serde::{Deserialize, Serialize};

/// One entry of the `errors` list the form endpoint returns on rejection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl RemoteError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            field: None,
            message: Some(message.into()),
        }
    }
}

/// JSON body of an endpoint reply. Every key is optional; unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteReplyBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ok: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<RemoteError>,
}

impl RemoteReplyBody {
    /// `None` when the body is not a JSON object of the expected shape.
    pub fn parse(body: &str) -> Option<Self> {
        serde_json::from_str(body).ok()
    }

    /// Message of the first reported error, if it carries readable text.
    pub fn detail_message(&self) -> Option<String> {
        self.errors
            .first()
            .and_then(|error| error.message.as_deref())
            .map(str::trim)
            .filter(|message| !message.is_empty())
            .map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_comes_from_first_error_only() {
        let body = RemoteReplyBody::parse(
            r#"{"errors":[{"field":"email","message":"Invalid email domain"},{"message":"second"}]}"#,
        )
        .expect("body");
        assert_eq!(body.detail_message().as_deref(), Some("Invalid email domain"));
    }

    #[test]
    fn blank_or_missing_messages_yield_no_detail() {
        let blank = RemoteReplyBody::parse(r#"{"errors":[{"message":"   "}]}"#).expect("body");
        assert_eq!(blank.detail_message(), None);

        let missing = RemoteReplyBody::parse(r#"{"errors":[{"code":"TYPE_EMAIL"}]}"#).expect("body");
        assert_eq!(missing.detail_message(), None);

        let empty = RemoteReplyBody::parse(r#"{"error":"nope"}"#).expect("body");
        assert_eq!(empty.detail_message(), None);
    }

    #[test]
    fn non_json_body_is_not_parsed() {
        assert_eq!(RemoteReplyBody::parse("<html>502</html>"), None);
        assert_eq!(RemoteReplyBody::parse(""), None);
    }
}
