//! One method per server resource-action pair. Ids reach this layer already normalized.

use std::sync::Arc;

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use shared::{
    domain::{ChannelId, MessageId, UserId},
    protocol::{
        channels_from_body, created_channel_id, AuthResponse, ChannelDetails, ChannelSummary,
        CreateChannelRequest, EditMessageRequest, InviteRequest, LoginRequest, MessageListResponse,
        MessagePayload, ReactRequest, RegisterRequest, SendMessageRequest, UpdateChannelRequest,
        UpdateProfileRequest, UserDetails, UserListResponse, UserSummary,
    },
};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::{
    error::ClientError,
    session::{Session, SessionStore},
    transport::{HttpTransport, NO_BODY},
};

fn decode<T: DeserializeOwned + Default>(body: Value, what: &'static str) -> T {
    serde_json::from_value(body).unwrap_or_else(|err| {
        warn!(%err, what, "unexpected response shape; using defaults");
        T::default()
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MessageAction {
    React,
    Unreact,
    Pin,
    Unpin,
}

impl MessageAction {
    fn segment(self) -> &'static str {
        match self {
            Self::React => "react",
            Self::Unreact => "unreact",
            Self::Pin => "pin",
            Self::Unpin => "unpin",
        }
    }

    fn fallback(self) -> &'static str {
        match self {
            Self::React | Self::Unreact => "Failed to react",
            Self::Pin | Self::Unpin => "Failed to pin/unpin message",
        }
    }
}

pub struct ApiGateway {
    transport: HttpTransport,
    session: Arc<RwLock<Session>>,
    store: Arc<dyn SessionStore>,
}

impl ApiGateway {
    pub fn new(server_url: &str, store: Arc<dyn SessionStore>) -> Result<Self, ClientError> {
        let session = Arc::new(RwLock::new(Session::default()));
        Ok(Self {
            transport: HttpTransport::new(server_url, Arc::clone(&session))?,
            session,
            store,
        })
    }

    pub async fn session(&self) -> Session {
        self.session.read().await.clone()
    }

    pub async fn current_user(&self) -> Option<UserId> {
        self.session.read().await.user_id.clone()
    }

    /// Pulls the persisted session into memory.
    pub async fn restore_session(&self) -> Result<Session, ClientError> {
        let stored = self.store.load().await?;
        *self.session.write().await = stored.clone();
        Ok(stored)
    }

    /// Drops the session from memory and from the store.
    pub async fn clear_session(&self) -> Result<(), ClientError> {
        *self.session.write().await = Session::default();
        self.store.clear().await?;
        info!("session cleared");
        Ok(())
    }

    async fn remember(&self, auth: &AuthResponse) -> Result<(), ClientError> {
        let snapshot = {
            let mut session = self.session.write().await;
            if let Some(token) = &auth.token {
                session.token = Some(token.clone());
            }
            if let Some(user_id) = &auth.user_id {
                session.user_id = Some(user_id.clone());
            }
            session.clone()
        };
        self.store.save(&snapshot).await?;
        info!(user_id = ?snapshot.user_id, "session stored");
        Ok(())
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, ClientError> {
        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let body = self
            .transport
            .call_auth("/auth/login", &request, "Login failed")
            .await?;
        let auth: AuthResponse = decode(body, "login");
        self.remember(&auth).await?;
        Ok(auth)
    }

    pub async fn register(
        &self,
        email: &str,
        name: &str,
        password: &str,
    ) -> Result<AuthResponse, ClientError> {
        let request = RegisterRequest {
            email: email.to_string(),
            name: name.to_string(),
            password: password.to_string(),
        };
        let body = self
            .transport
            .call_auth("/auth/register", &request, "Registration failed")
            .await?;
        let auth: AuthResponse = decode(body, "register");
        self.remember(&auth).await?;
        Ok(auth)
    }

    pub async fn list_channels(&self) -> Result<Vec<ChannelSummary>, ClientError> {
        let body = self
            .transport
            .call(Method::GET, "/channel", &[], NO_BODY, "Failed to load channels")
            .await?;
        let channels = channels_from_body(&body);
        let listed = body
            .get("channels")
            .unwrap_or(&body)
            .as_array()
            .map_or(0, Vec::len);
        if channels.len() < listed {
            warn!(skipped = listed - channels.len(), "channel entries without an id");
        }
        Ok(channels)
    }

    /// Returns the new channel's id when the server reports one.
    pub async fn create_channel(
        &self,
        request: &CreateChannelRequest,
    ) -> Result<Option<ChannelId>, ClientError> {
        let body = self
            .transport
            .call(Method::POST, "/channel", &[], Some(request), "Failed to create channel")
            .await?;
        Ok(created_channel_id(&body))
    }

    pub async fn get_channel(&self, channel_id: &ChannelId) -> Result<ChannelDetails, ClientError> {
        let body = self
            .transport
            .call(
                Method::GET,
                &format!("/channel/{channel_id}"),
                &[],
                NO_BODY,
                "Failed to get channel",
            )
            .await?;
        Ok(ChannelDetails::from_body(&body, channel_id))
    }

    pub async fn update_channel(
        &self,
        channel_id: &ChannelId,
        request: &UpdateChannelRequest,
    ) -> Result<(), ClientError> {
        self.transport
            .call(
                Method::PUT,
                &format!("/channel/{channel_id}"),
                &[],
                Some(request),
                "Failed to update channel",
            )
            .await?;
        Ok(())
    }

    pub async fn join_channel(&self, channel_id: &ChannelId) -> Result<(), ClientError> {
        self.transport
            .call(
                Method::POST,
                &format!("/channel/{channel_id}/join"),
                &[],
                NO_BODY,
                "Failed to join channel",
            )
            .await?;
        Ok(())
    }

    pub async fn leave_channel(&self, channel_id: &ChannelId) -> Result<(), ClientError> {
        self.transport
            .call(
                Method::POST,
                &format!("/channel/{channel_id}/leave"),
                &[],
                NO_BODY,
                "Failed to leave channel",
            )
            .await?;
        Ok(())
    }

    pub async fn invite_to_channel(
        &self,
        channel_id: &ChannelId,
        user_id: &UserId,
    ) -> Result<(), ClientError> {
        let request = InviteRequest {
            user_id: user_id.clone(),
        };
        self.transport
            .call(
                Method::POST,
                &format!("/channel/{channel_id}/invite"),
                &[],
                Some(&request),
                "Failed to invite user",
            )
            .await?;
        Ok(())
    }

    pub async fn list_users(&self) -> Result<Vec<UserSummary>, ClientError> {
        let body = self
            .transport
            .call(Method::GET, "/user", &[], NO_BODY, "Failed to load users")
            .await?;
        Ok(decode::<UserListResponse>(body, "user list").users)
    }

    pub async fn get_user(&self, user_id: &UserId) -> Result<UserDetails, ClientError> {
        let body = self
            .transport
            .call(
                Method::GET,
                &format!("/user/{user_id}"),
                &[],
                NO_BODY,
                "Failed to load profile",
            )
            .await?;
        Ok(decode(body, "user details"))
    }

    pub async fn update_profile(&self, request: &UpdateProfileRequest) -> Result<(), ClientError> {
        self.transport
            .call(Method::PUT, "/user", &[], Some(request), "Failed to update profile")
            .await?;
        Ok(())
    }

    /// `start` is handed to the server untouched.
    pub async fn list_messages(
        &self,
        channel_id: &ChannelId,
        start: u64,
    ) -> Result<Vec<MessagePayload>, ClientError> {
        let body = self
            .transport
            .call(
                Method::GET,
                &format!("/message/{channel_id}"),
                &[("start", start.to_string())],
                NO_BODY,
                "Failed to load messages",
            )
            .await?;
        Ok(decode::<MessageListResponse>(body, "message list").messages)
    }

    pub async fn send_message(
        &self,
        channel_id: &ChannelId,
        request: &SendMessageRequest,
    ) -> Result<(), ClientError> {
        self.transport
            .call(
                Method::POST,
                &format!("/message/{channel_id}"),
                &[],
                Some(request),
                "Failed to send message",
            )
            .await?;
        Ok(())
    }

    pub async fn edit_message(
        &self,
        channel_id: &ChannelId,
        message_id: &MessageId,
        text: &str,
    ) -> Result<(), ClientError> {
        let request = EditMessageRequest {
            message: text.to_string(),
        };
        self.transport
            .call(
                Method::PUT,
                &format!("/message/{channel_id}/{message_id}"),
                &[],
                Some(&request),
                "Failed to edit message",
            )
            .await?;
        Ok(())
    }

    pub async fn delete_message(
        &self,
        channel_id: &ChannelId,
        message_id: &MessageId,
    ) -> Result<(), ClientError> {
        self.transport
            .call(
                Method::DELETE,
                &format!("/message/{channel_id}/{message_id}"),
                &[],
                NO_BODY,
                "Failed to delete message",
            )
            .await?;
        Ok(())
    }

    pub async fn react(
        &self,
        channel_id: &ChannelId,
        message_id: &MessageId,
        emoji: &str,
    ) -> Result<(), ClientError> {
        self.message_action(MessageAction::React, channel_id, message_id, Some(emoji))
            .await
    }

    pub async fn unreact(
        &self,
        channel_id: &ChannelId,
        message_id: &MessageId,
        emoji: &str,
    ) -> Result<(), ClientError> {
        self.message_action(MessageAction::Unreact, channel_id, message_id, Some(emoji))
            .await
    }

    pub async fn pin(&self, channel_id: &ChannelId, message_id: &MessageId) -> Result<(), ClientError> {
        self.message_action(MessageAction::Pin, channel_id, message_id, None)
            .await
    }

    pub async fn unpin(
        &self,
        channel_id: &ChannelId,
        message_id: &MessageId,
    ) -> Result<(), ClientError> {
        self.message_action(MessageAction::Unpin, channel_id, message_id, None)
            .await
    }

    async fn message_action(
        &self,
        action: MessageAction,
        channel_id: &ChannelId,
        message_id: &MessageId,
        emoji: Option<&str>,
    ) -> Result<(), ClientError> {
        let path = format!("/message/{}/{channel_id}/{message_id}", action.segment());
        let body = emoji.map(|react| ReactRequest {
            react: react.to_string(),
        });
        self.transport
            .call(Method::POST, &path, &[], body.as_ref(), action.fallback())
            .await?;
        Ok(())
    }
}
