use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    domain::{ChannelId, MessageId, UserId},
    lenient::{self, ids_of, is_truthy, text_of, timestamp_of},
};

static NULL: Value = Value::Null;

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub email: String,
    pub name: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    #[serde(default, deserialize_with = "lenient::text")]
    pub token: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_id")]
    pub user_id: Option<UserId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateChannelRequest {
    pub name: String,
    pub description: String,
    pub private: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateChannelRequest {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteRequest {
    pub user_id: UserId,
}

/// Id of a freshly created channel: `channelId`, `channel.id`, then `id`.
pub fn created_channel_id(body: &Value) -> Option<ChannelId> {
    [
        body.get("channelId"),
        body.get("channel").and_then(|channel| channel.get("id")),
        body.get("id"),
    ]
    .into_iter()
    .flatten()
    .find(|candidate| is_truthy(candidate))
    .and_then(ChannelId::from_value)
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChannelSummary {
    pub id: ChannelId,
    pub name: Option<String>,
    pub private: bool,
}

impl ChannelSummary {
    /// `None` for entries that carry no usable id.
    pub fn from_value(value: &Value) -> Option<Self> {
        let id = ChannelId::from_value(value)?;
        Some(Self {
            id,
            name: value.get("name").and_then(text_of),
            private: value.get("private").is_some_and(is_truthy),
        })
    }
}

/// The channel list body is either `{channels: [...]}` or a bare array.
pub fn channels_from_body(body: &Value) -> Vec<ChannelSummary> {
    let entries: &[Value] = match body.get("channels") {
        Some(Value::Array(entries)) => entries.as_slice(),
        _ => match body {
            Value::Array(entries) => entries.as_slice(),
            _ => &[],
        },
    };
    entries.iter().filter_map(ChannelSummary::from_value).collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChannelDetails {
    pub id: ChannelId,
    pub name: Option<String>,
    pub description: Option<String>,
    pub private: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub creator_id: Option<UserId>,
    /// Display name the server may send alongside (or instead of) a creator id.
    pub creator_name: Option<String>,
    pub members: Vec<UserId>,
    /// Union of the `member`, `isMember` and `joined` flags.
    pub member_flag: bool,
}

impl ChannelDetails {
    /// Reads a detail body, unwrapping a `{channel: {...}}` envelope. The id falls back
    /// to `channelId` and then to the id the caller asked for.
    pub fn from_body(body: &Value, requested: &ChannelId) -> Self {
        let info = match body.get("channel") {
            Some(channel @ Value::Object(_)) => channel,
            _ => body,
        };
        let field = |key: &str| info.get(key).unwrap_or(&NULL);

        let id = [field("id"), field("channelId")]
            .into_iter()
            .find(|candidate| is_truthy(candidate))
            .and_then(ChannelId::from_value)
            .unwrap_or_else(|| requested.clone());

        let numeric = |value: &Value| value.is_number().then(|| value.clone());
        let creator_id = [
            Some(field("creatorId").clone()),
            Some(field("ownerId").clone()),
            numeric(field("creator")),
            numeric(field("owner")),
        ]
        .into_iter()
        .flatten()
        .find(is_truthy)
        .and_then(|raw| UserId::from_value(&raw));

        let creator_name = text_of(field("creatorName")).or_else(|| match field("creator") {
            Value::String(name) if !name.is_empty() => Some(name.clone()),
            _ => None,
        });

        Self {
            id,
            name: text_of(field("name")),
            description: text_of(field("description")),
            private: is_truthy(field("private")),
            created_at: timestamp_of(field("createdAt")),
            creator_id,
            creator_name,
            members: ids_of(field("members")),
            member_flag: ["member", "isMember", "joined"]
                .iter()
                .any(|key| is_truthy(field(key))),
        }
    }

    pub fn lists_member(&self, user_id: &UserId) -> bool {
        self.members.iter().any(|member| member == user_id)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Reaction {
    #[serde(default, deserialize_with = "lenient::optional_id")]
    pub user: Option<UserId>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub react: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePayload {
    pub id: MessageId,
    #[serde(default, deserialize_with = "lenient::optional_id")]
    pub sender: Option<UserId>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub sender_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub sender_image: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub message: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub image: Option<String>,
    #[serde(default, deserialize_with = "lenient::timestamp")]
    pub sent_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient::truthy")]
    pub edited: bool,
    #[serde(default, deserialize_with = "lenient::timestamp")]
    pub edited_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient::truthy")]
    pub pinned: bool,
    #[serde(default, deserialize_with = "lenient::list")]
    pub reacts: Vec<Reaction>,
}

impl MessagePayload {
    pub fn reacted_by(&self, user_id: &UserId, emoji: &str) -> bool {
        self.reacts.iter().any(|reaction| {
            reaction.user.as_ref() == Some(user_id) && reaction.react.as_deref() == Some(emoji)
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageListResponse {
    #[serde(default, deserialize_with = "lenient::list")]
    pub messages: Vec<MessagePayload>,
}

/// Outgoing message body; carries text or an image data URL, never both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SendMessageRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl SendMessageRequest {
    pub fn text(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            image: None,
        }
    }

    pub fn image(data_url: impl Into<String>) -> Self {
        Self {
            message: None,
            image: Some(data_url.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EditMessageRequest {
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReactRequest {
    pub react: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UserSummary {
    #[serde(default, deserialize_with = "lenient::optional_id")]
    pub id: Option<UserId>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserListResponse {
    #[serde(default, deserialize_with = "lenient::list")]
    pub users: Vec<UserSummary>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct UserDetails {
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub bio: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub image: Option<String>,
}

impl UserDetails {
    /// `name`, else `email`, else nothing.
    pub fn display_name(&self) -> Option<&str> {
        self.name.as_deref().or(self.email.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpdateProfileRequest {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
