use serde::Deserialize;

/// Inbound WebSocket events from client to server.
///
/// The real-time channel is push-only apart from an explicit logout, which
/// tears the connection down server-side instead of waiting for the
/// transport to notice.
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum WsClientEvent {
    #[serde(rename = "logout")]
    Logout,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logout_event_parses() {
        let evt: WsClientEvent = serde_json::from_str(r#"{"type":"logout"}"#).unwrap();
        assert!(matches!(evt, WsClientEvent::Logout));
    }

    #[test]
    fn test_unknown_event_is_rejected() {
        assert!(serde_json::from_str::<WsClientEvent>(r#"{"type":"typing"}"#).is_err());
    }
}
