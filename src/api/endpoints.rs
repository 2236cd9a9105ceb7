pub fn list_messages_endpoint() -> &'static str {
    "/gmail/v1/users/me/messages"
}

pub fn message_endpoint(id: &str) -> String {
    format!("/gmail/v1/users/me/messages/{id}")
}

pub fn modify_message_endpoint(id: &str) -> String {
    format!("/gmail/v1/users/me/messages/{id}/modify")
}

pub fn labels_endpoint() -> &'static str {
    "/gmail/v1/users/me/labels"
}

pub fn metadata_query() -> Vec<(String, String)> {
    let mut query = vec![("format".to_string(), "metadata".to_string())];

    for header in ["From", "Subject"] {
        query.push(("metadataHeaders".to_string(), header.to_string()));
    }

    query
}

pub fn list_query(limit: u32, search: Option<&str>) -> Vec<(String, String)> {
    let mut params = vec![("maxResults".to_string(), limit.to_string())];
    if let Some(search) = search {
        params.push(("q".to_string(), search.to_string()));
    }
    params
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_message_paths() {
        assert_eq!(message_endpoint("m1"), "/gmail/v1/users/me/messages/m1");
        assert_eq!(
            modify_message_endpoint("m1"),
            "/gmail/v1/users/me/messages/m1/modify"
        );
    }

    #[test]
    fn metadata_query_requests_matching_headers() {
        let query = metadata_query();
        assert!(query.contains(&("metadataHeaders".to_string(), "From".to_string())));
        assert!(query.contains(&("metadataHeaders".to_string(), "Subject".to_string())));
    }

    #[test]
    fn list_query_includes_search_only_when_present() {
        assert_eq!(list_query(5, None).len(), 1);
        let with_search = list_query(5, Some("in:inbox"));
        assert!(with_search.contains(&("q".to_string(), "in:inbox".to_string())));
    }
}
