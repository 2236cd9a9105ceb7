use serde::{Deserialize, Serialize};

/// Normalized projection of a remote message: just the fields the rule
/// engine consumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemMetadata {
    pub id: String,
    pub sender: String,
    pub subject: String,
    pub has_non_downloadable_parts: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct LabelView {
    pub id: String,
    pub name: String,
    pub kind: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MessageListResource {
    pub messages: Option<Vec<MessageListEntry>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MessageListEntry {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MessageResource {
    pub id: String,
    pub payload: Option<MessagePayload>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MessagePayload {
    pub headers: Option<Vec<MessageHeader>>,
    pub parts: Option<Vec<MessagePart>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MessageHeader {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MessagePart {
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(rename = "mimeType")]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub parts: Option<Vec<MessagePart>>,
}

impl MessageResource {
    /// Header fields are matched case-insensitively and default to the
    /// empty string when absent. Non-text parts only set a flag; their
    /// content is never inspected.
    pub(crate) fn into_metadata(self) -> ItemMetadata {
        let (headers, parts) = match self.payload {
            Some(payload) => (
                payload.headers.unwrap_or_default(),
                payload.parts.unwrap_or_default(),
            ),
            None => (Vec::new(), Vec::new()),
        };

        ItemMetadata {
            id: self.id,
            sender: header_value(&headers, "From"),
            subject: header_value(&headers, "Subject"),
            has_non_downloadable_parts: parts.iter().any(is_non_downloadable),
        }
    }
}

fn header_value(headers: &[MessageHeader], target: &str) -> String {
    headers
        .iter()
        .find(|header| header.name.eq_ignore_ascii_case(target))
        .map(|header| header.value.trim().to_string())
        .unwrap_or_default()
}

fn is_non_downloadable(part: &MessagePart) -> bool {
    if part.filename.as_deref().is_some_and(|name| !name.is_empty()) {
        return true;
    }

    match part.mime_type.as_deref() {
        Some(mime) if mime.starts_with("multipart/") => part
            .parts
            .as_deref()
            .unwrap_or_default()
            .iter()
            .any(is_non_downloadable),
        Some(mime) => !mime.starts_with("text/"),
        None => false,
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct LabelListResource {
    pub labels: Option<Vec<LabelResource>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LabelResource {
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

impl LabelResource {
    pub(crate) fn into_view(self) -> LabelView {
        LabelView {
            id: self.id,
            name: self.name,
            kind: self.kind.unwrap_or_else(|| "user".to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ModifyMessageRequest {
    #[serde(rename = "addLabelIds")]
    pub add_label_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ModifyMessageResponse {}

#[derive(Debug, Serialize)]
pub(crate) struct CreateLabelRequest {
    pub name: String,
    #[serde(rename = "labelListVisibility")]
    pub label_list_visibility: String,
    #[serde(rename = "messageListVisibility")]
    pub message_list_visibility: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(name: &str, value: &str) -> MessageHeader {
        MessageHeader {
            name: name.to_string(),
            value: value.to_string(),
        }
    }

    #[test]
    fn normalizes_headers_into_metadata() {
        let resource = MessageResource {
            id: "msg-1".to_string(),
            payload: Some(MessagePayload {
                headers: Some(vec![
                    header("From", "alice@example.com"),
                    header("Subject", "weekly report"),
                ]),
                parts: None,
            }),
        };

        let metadata = resource.into_metadata();
        assert_eq!(metadata.id, "msg-1");
        assert_eq!(metadata.sender, "alice@example.com");
        assert_eq!(metadata.subject, "weekly report");
        assert!(!metadata.has_non_downloadable_parts);
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let headers = vec![header("fRoM", "bob@example.com")];
        assert_eq!(header_value(&headers, "From"), "bob@example.com");
    }

    #[test]
    fn missing_headers_default_to_empty_string() {
        let resource = MessageResource {
            id: "msg-2".to_string(),
            payload: None,
        };

        let metadata = resource.into_metadata();
        assert_eq!(metadata.sender, "");
        assert_eq!(metadata.subject, "");
    }

    #[test]
    fn attachment_parts_set_the_flag() {
        let resource = MessageResource {
            id: "msg-3".to_string(),
            payload: Some(MessagePayload {
                headers: None,
                parts: Some(vec![
                    MessagePart {
                        filename: Some(String::new()),
                        mime_type: Some("text/plain".to_string()),
                        parts: None,
                    },
                    MessagePart {
                        filename: Some("invoice.pdf".to_string()),
                        mime_type: Some("application/pdf".to_string()),
                        parts: None,
                    },
                ]),
            }),
        };

        assert!(resource.into_metadata().has_non_downloadable_parts);
    }

    #[test]
    fn nested_multipart_is_walked() {
        let resource = MessageResource {
            id: "msg-4".to_string(),
            payload: Some(MessagePayload {
                headers: None,
                parts: Some(vec![MessagePart {
                    filename: None,
                    mime_type: Some("multipart/mixed".to_string()),
                    parts: Some(vec![MessagePart {
                        filename: None,
                        mime_type: Some("image/png".to_string()),
                        parts: None,
                    }]),
                }]),
            }),
        };

        assert!(resource.into_metadata().has_non_downloadable_parts);
    }

    #[test]
    fn plain_text_parts_leave_the_flag_unset() {
        let resource = MessageResource {
            id: "msg-5".to_string(),
            payload: Some(MessagePayload {
                headers: None,
                parts: Some(vec![MessagePart {
                    filename: None,
                    mime_type: Some("text/html".to_string()),
                    parts: None,
                }]),
            }),
        };

        assert!(!resource.into_metadata().has_non_downloadable_parts);
    }
}
