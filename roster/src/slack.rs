//! Slack Web API roster source.
//!
//! Uses `conversations.members` (cursor paginated), `conversations.kick`,
//! `conversations.invite`, and `conversations.join`. Slack reports most failures as HTTP 200 with
//! `{"ok": false, "error": "..."}`; rate limiting is HTTP 429 with a
//! `Retry-After` header in seconds.

use crate::error::RosterError;
use crate::roster::Roster;

use async_trait::async_trait;
use blam_types::{ChannelId, MemberId};
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://slack.com/api";

const MEMBERS: &str = "conversations.members";
const KICK: &str = "conversations.kick";
const INVITE: &str = "conversations.invite";
const JOIN: &str = "conversations.join";

/// Page size for `conversations.members`.
const PAGE_LIMIT: &str = "1000";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

pub struct SlackRoster {
    http_client: reqwest::Client,
    api_base: String,
    token: String,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    members: Vec<String>,
    #[serde(default)]
    response_metadata: Option<ResponseMetadata>,
}

#[derive(Debug, Deserialize)]
struct ResponseMetadata {
    #[serde(default)]
    next_cursor: String,
}

/// Map a Slack `error` string from `method` onto the roster taxonomy.
///
/// `not_in_channel` is benign for a kick but means the bot itself is not a
/// member when it comes back from an invite.
fn classify(method: &str, error: &str) -> RosterError {
    match (method, error) {
        (KICK, "not_in_channel" | "user_not_found") => RosterError::AlreadyAbsent,
        (_, "already_in_channel") => RosterError::AlreadyPresent,
        (_, "ratelimited") => RosterError::RateLimited { retry_after: None },
        (
            _,
            "not_in_channel"
            | "restricted_action"
            | "not_authorized"
            | "missing_scope"
            | "cant_kick_self"
            | "cant_kick_from_general"
            | "cant_invite"
            | "cant_invite_self"
            | "user_is_restricted"
            | "method_not_supported_for_channel_type",
        ) => RosterError::PermissionDenied(error.to_string()),
        (_, other) => RosterError::Unavailable(other.to_string()),
    }
}

impl SlackRoster {
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_api_base(token, DEFAULT_API_BASE, DEFAULT_TIMEOUT)
    }

    pub fn with_api_base(token: impl Into<String>, api_base: impl Into<String>, timeout: Duration) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT.min(timeout))
            .build()
            .unwrap_or_default();
        Self {
            http_client,
            api_base: api_base.into(),
            token: token.into(),
        }
    }

    async fn call(&self, method: &str, params: &[(&str, &str)]) -> Result<ApiResponse, RosterError> {
        let url = format!("{}/{}", self.api_base.trim_end_matches('/'), method);
        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.token)
            .form(params)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RosterError::Unavailable(format!("{method} timed out"))
                } else if e.is_connect() {
                    RosterError::Unavailable(format!("{method} connection failed"))
                } else {
                    RosterError::Unavailable(format!("{method} request failed"))
                }
            })?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_secs);
            return Err(RosterError::RateLimited { retry_after });
        }
        if !response.status().is_success() {
            return Err(RosterError::Unavailable(format!(
                "{method} returned HTTP {}",
                response.status()
            )));
        }

        let body: ApiResponse = response
            .json()
            .await
            .map_err(|e| RosterError::Unavailable(format!("{method} returned invalid JSON: {e}")))?;
        if !body.ok {
            let error = body.error.as_deref().unwrap_or("unknown_error");
            tracing::debug!(method, error, "Slack API call failed");
            return Err(classify(method, error));
        }
        Ok(body)
    }
}

#[async_trait]
impl Roster for SlackRoster {
    async fn list(&self, channel: &ChannelId) -> Result<Vec<MemberId>, RosterError> {
        let mut members = Vec::new();
        let mut cursor = String::new();
        loop {
            let page = {
                let mut params = vec![("channel", channel.as_str()), ("limit", PAGE_LIMIT)];
                if !cursor.is_empty() {
                    params.push(("cursor", cursor.as_str()));
                }
                self.call(MEMBERS, &params)
                    .await
                    .map_err(|e| match e {
                        RosterError::Unavailable(_) => e,
                        other => RosterError::Unavailable(format!("{MEMBERS}: {other}")),
                    })?
            };
            members.extend(page.members.into_iter().map(MemberId::new));

            match page.response_metadata {
                Some(meta) if !meta.next_cursor.is_empty() => cursor = meta.next_cursor,
                _ => break,
            }
        }
        Ok(members)
    }

    async fn remove(&self, channel: &ChannelId, member: &MemberId) -> Result<(), RosterError> {
        self.call(
            KICK,
            &[("channel", channel.as_str()), ("user", member.as_str())],
        )
        .await?;
        Ok(())
    }

    async fn add(&self, channel: &ChannelId, member: &MemberId) -> Result<(), RosterError> {
        self.call(
            INVITE,
            &[("channel", channel.as_str()), ("users", member.as_str())],
        )
        .await?;
        Ok(())
    }

    async fn join(&self, channel: &ChannelId) -> Result<(), RosterError> {
        // Only public channels can be joined; private ones need an invite.
        if !channel.as_str().starts_with('C') {
            return Ok(());
        }
        match self.call(JOIN, &[("channel", channel.as_str())]).await {
            Ok(_) | Err(RosterError::AlreadyPresent) => Ok(()),
            Err(RosterError::PermissionDenied(error))
                if error == "method_not_supported_for_channel_type" =>
            {
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blam_types::ErrorKind;

    #[test]
    fn slack_errors_map_onto_the_taxonomy() {
        assert_eq!(classify(KICK, "not_in_channel").kind(), ErrorKind::AlreadyAbsent);
        assert_eq!(classify(INVITE, "already_in_channel").kind(), ErrorKind::AlreadyPresent);
        assert_eq!(classify(KICK, "ratelimited").kind(), ErrorKind::RateLimited);
        assert_eq!(classify(KICK, "restricted_action").kind(), ErrorKind::PermissionDenied);
        assert_eq!(classify(KICK, "cant_kick_self").kind(), ErrorKind::PermissionDenied);
        assert_eq!(classify(MEMBERS, "channel_not_found").kind(), ErrorKind::RosterUnavailable);
    }

    #[test]
    fn bot_outside_the_channel_cannot_invite() {
        assert_eq!(classify(INVITE, "not_in_channel").kind(), ErrorKind::PermissionDenied);
        assert_eq!(classify(INVITE, "user_not_found").kind(), ErrorKind::RosterUnavailable);
    }

    #[tokio::test]
    async fn list_failures_are_always_unavailable() {
        let roster = SlackRoster::with_api_base("xoxb-test", "http://127.0.0.1:9", Duration::from_millis(500));
        let err = roster.list(&ChannelId::from("C1")).await.unwrap_err();
        assert!(matches!(err, RosterError::Unavailable(_)));
    }

    #[tokio::test]
    async fn private_channels_are_not_joined() {
        // No request is made, so the unreachable API base is never touched.
        let roster = SlackRoster::with_api_base("xoxb-test", "http://127.0.0.1:9", Duration::from_millis(500));
        roster.join(&ChannelId::from("G1")).await.unwrap();
    }

    #[test]
    fn members_page_deserialization() {
        let json = r#"{
            "ok": true,
            "members": ["U1AA", "U2BB"],
            "response_metadata": {"next_cursor": "dXNlcjpVMEc5V0ZYTlo="}
        }"#;
        let resp: ApiResponse = serde_json::from_str(json).unwrap();
        assert!(resp.ok);
        assert_eq!(resp.members, vec!["U1AA", "U2BB"]);
        assert_eq!(resp.response_metadata.unwrap().next_cursor, "dXNlcjpVMEc5V0ZYTlo=");
    }

    #[test]
    fn error_response_deserialization() {
        let resp: ApiResponse =
            serde_json::from_str(r#"{"ok": false, "error": "not_in_channel"}"#).unwrap();
        assert!(!resp.ok);
        assert_eq!(resp.error.as_deref(), Some("not_in_channel"));
        assert!(resp.members.is_empty());
    }
}
