use std::sync::Arc;

use futures::future::join_all;
use shared::{
    domain::{ChannelId, MessageId, UserId},
    protocol::{
        ChannelDetails, ChannelSummary, CreateChannelRequest, SendMessageRequest,
        UpdateChannelRequest, UpdateProfileRequest,
    },
};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

pub mod api;
pub mod error;
pub mod render;
pub mod session;
pub mod state;
pub mod transport;

pub use api::ApiGateway;
pub use error::{ClientError, ErrorKind};
pub use render::View;
pub use session::{FileSessionStore, MemorySessionStore, Session, SessionStore};
pub use state::{LocalState, ProfileEntry};

const NO_DESCRIPTION: &str = "(no description)";

#[derive(Debug, Clone)]
pub enum ClientEvent {
    SessionChanged { authenticated: bool },
    Rendered(View),
}

/// Which way a reaction or pin toggle went.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    Added,
    Removed,
}

/// Builds the outgoing body. An attached image wins over text, and the text is dropped.
pub fn outgoing_message(
    text: &str,
    image: Option<&str>,
) -> Result<SendMessageRequest, ClientError> {
    let text = text.trim();
    match image.filter(|image| !image.is_empty()) {
        Some(image) => Ok(SendMessageRequest::image(image)),
        None if !text.is_empty() => Ok(SendMessageRequest::text(text)),
        None => Err(ClientError::validation("Message or image required")),
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

pub struct ChatClient {
    api: ApiGateway,
    inner: Mutex<LocalState>,
    events: broadcast::Sender<ClientEvent>,
}

impl ChatClient {
    pub fn new(server_url: &str, store: Arc<dyn SessionStore>) -> Result<Arc<Self>, ClientError> {
        let (events, _) = broadcast::channel(256);
        Ok(Arc::new(Self {
            api: ApiGateway::new(server_url, store)?,
            inner: Mutex::new(LocalState::default()),
            events,
        }))
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }

    pub async fn session(&self) -> Session {
        self.api.session().await
    }

    pub async fn selected_channel(&self) -> Option<ChannelId> {
        self.inner.lock().await.selected_channel().cloned()
    }

    fn render(&self, view: View) {
        let _ = self.events.send(ClientEvent::Rendered(view));
    }

    fn announce_session(&self, authenticated: bool) {
        let _ = self.events.send(ClientEvent::SessionChanged { authenticated });
    }

    /// An explicit id wins over the selected channel.
    async fn channel_target(&self, raw: Option<&str>) -> Result<ChannelId, ClientError> {
        let target = match raw {
            Some(raw) => ChannelId::parse(raw),
            None => self.selected_channel().await,
        };
        target.ok_or(ClientError::InvalidId("channel"))
    }

    async fn require_user(&self) -> Result<UserId, ClientError> {
        self.api.current_user().await.ok_or(ClientError::NotLoggedIn)
    }

    /// Reads the stored session at startup and, when a token is present, loads the
    /// signed-in views.
    pub async fn restore(&self) -> Result<bool, ClientError> {
        let session = self.api.restore_session().await?;
        let authenticated = session.is_authenticated();
        self.announce_session(authenticated);
        if authenticated {
            info!(user_id = ?session.user_id, "restored stored session");
            self.load_own_profile().await;
            self.load_channels().await?;
        }
        Ok(authenticated)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<(), ClientError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(ClientError::validation("Please enter email and password"));
        }
        self.api.login(email, password).await?;
        self.signed_in().await
    }

    pub async fn register(
        &self,
        email: &str,
        name: &str,
        password: &str,
        confirm: &str,
    ) -> Result<(), ClientError> {
        let email = email.trim();
        let name = name.trim();
        if email.is_empty() || name.is_empty() || password.is_empty() || confirm.is_empty() {
            return Err(ClientError::validation("Please fill in all fields"));
        }
        if password != confirm {
            return Err(ClientError::validation("Passwords do not match"));
        }
        self.api.register(email, name, password).await?;
        if !self.api.session().await.is_authenticated() {
            info!("registration returned no token; logging in");
            self.api.login(email, password).await?;
        }
        self.signed_in().await
    }

    async fn signed_in(&self) -> Result<(), ClientError> {
        self.announce_session(true);
        self.load_own_profile().await;
        self.load_channels().await?;
        Ok(())
    }

    /// Forgets the session. Local caches stay until the client is dropped.
    pub async fn logout(&self) -> Result<(), ClientError> {
        self.api.clear_session().await?;
        self.announce_session(false);
        Ok(())
    }

    pub async fn create_channel(
        &self,
        name: &str,
        description: &str,
        private: bool,
    ) -> Result<Option<ChannelId>, ClientError> {
        let name = non_empty(name).ok_or_else(|| ClientError::validation("Channel name is required"))?;
        let request = CreateChannelRequest {
            name,
            description: non_empty(description).unwrap_or_else(|| NO_DESCRIPTION.to_string()),
            private,
        };
        let created = self.api.create_channel(&request).await?;
        if let Some(channel_id) = &created {
            let mut state = self.inner.lock().await;
            state.mark_joined(channel_id.clone());
            state.select_channel(channel_id.clone());
        }
        self.load_channels().await?;
        Ok(created)
    }

    pub async fn load_channels(&self) -> Result<Vec<ChannelSummary>, ClientError> {
        if !self.api.session().await.is_authenticated() {
            return Err(ClientError::NotLoggedIn);
        }
        let channels = self.api.list_channels().await?;
        self.inner.lock().await.record_channel_list(&channels);
        self.render(render::channel_list(&channels));
        Ok(channels)
    }

    /// Opens a channel. A membership denial on a channel believed public triggers one join
    /// and one more open; private channels go straight to the non-member view.
    ///
    /// Without an explicit hint, privacy comes from the last channel list; unlisted
    /// channels are treated as public.
    pub async fn open_channel(&self, raw_id: &str, private_hint: Option<bool>) -> Result<(), ClientError> {
        let channel_id = ChannelId::parse(raw_id).ok_or(ClientError::InvalidId("channel"))?;
        let private_hint = match private_hint {
            Some(hint) => hint,
            None => self
                .inner
                .lock()
                .await
                .listed_private(&channel_id)
                .unwrap_or(false),
        };
        if self.open_once(&channel_id).await? {
            return Ok(());
        }
        if private_hint {
            self.render(render::non_member(channel_id, true));
            return Ok(());
        }

        info!(%channel_id, "not a member; joining before reopening");
        if let Err(err) = self.enter_channel(&channel_id).await {
            self.render(render::non_member(channel_id, false));
            return Err(err);
        }
        if !self.open_once(&channel_id).await? {
            warn!(%channel_id, "still denied after joining");
            self.render(render::non_member(channel_id, false));
        }
        self.load_channels().await?;
        Ok(())
    }

    /// Returns `false` when the server denies access for lack of membership.
    async fn open_once(&self, channel_id: &ChannelId) -> Result<bool, ClientError> {
        self.inner.lock().await.select_channel(channel_id.clone());
        self.load_users().await;
        match self.api.get_channel(channel_id).await {
            Ok(details) => {
                self.show_channel(details).await?;
                Ok(true)
            }
            Err(err) if err.denies_membership() => {
                debug!(%channel_id, %err, "channel access denied");
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }

    async fn show_channel(&self, details: ChannelDetails) -> Result<(), ClientError> {
        let current_user = self.api.current_user().await;
        let member = {
            let mut state = self.inner.lock().await;
            state.select_channel(details.id.clone());
            render::is_member(&details, current_user.as_ref(), state.is_joined(&details.id))
        };
        let creator = self.creator_name(&details).await;
        self.render(render::channel_detail(&details, creator, member));
        if member {
            self.show_messages(&details.id, 0).await?;
        }
        Ok(())
    }

    /// Cache, then a fail-open user lookup, then whatever name the channel carries.
    async fn creator_name(&self, details: &ChannelDetails) -> String {
        let fallback = || {
            details
                .creator_name
                .clone()
                .unwrap_or_else(|| "Unknown".to_string())
        };
        let Some(creator_id) = &details.creator_id else {
            return fallback();
        };
        if let Some(profile) = self.inner.lock().await.profile(creator_id) {
            if !profile.name.is_empty() {
                return profile.name.clone();
            }
        }
        match self.api.get_user(creator_id).await {
            Ok(user) => {
                let name = user.display_name().unwrap_or("Unknown").to_string();
                self.inner
                    .lock()
                    .await
                    .store_profile(creator_id.clone(), ProfileEntry::new(name.clone(), user.image));
                name
            }
            Err(err) => {
                warn!(%creator_id, %err, "creator lookup failed");
                fallback()
            }
        }
    }

    /// Joins and records membership. "Already a member" counts as success.
    async fn enter_channel(&self, channel_id: &ChannelId) -> Result<(), ClientError> {
        match self.api.join_channel(channel_id).await {
            Ok(()) => {}
            Err(err) if err.reports_already_member() => {
                info!(%channel_id, "already a member; treating join as done");
            }
            Err(err) if err.requires_invite() => return Err(ClientError::InvitationRequired),
            Err(err) => return Err(err),
        }
        self.inner.lock().await.mark_joined(channel_id.clone());
        Ok(())
    }

    pub async fn join_channel(&self, raw_id: Option<&str>) -> Result<(), ClientError> {
        let channel_id = self.channel_target(raw_id).await?;
        self.enter_channel(&channel_id).await?;
        self.reload_details(&channel_id).await?;
        self.load_channels().await?;
        Ok(())
    }

    async fn reload_details(&self, channel_id: &ChannelId) -> Result<(), ClientError> {
        if !self.open_once(channel_id).await? {
            self.render(render::non_member(channel_id.clone(), false));
        }
        Ok(())
    }

    pub async fn leave_channel(&self, raw_id: Option<&str>) -> Result<(), ClientError> {
        let channel_id = self.channel_target(raw_id).await?;
        self.api.leave_channel(&channel_id).await?;
        self.render(View::Placeholder(render::SELECT_CHANNEL));
        self.inner.lock().await.mark_left(&channel_id);
        self.load_channels().await?;
        Ok(())
    }

    pub async fn update_channel(
        &self,
        raw_id: Option<&str>,
        name: &str,
        description: &str,
    ) -> Result<(), ClientError> {
        let name = non_empty(name).ok_or_else(|| ClientError::validation("Channel name is required"))?;
        let channel_id = self.channel_target(raw_id).await?;
        let request = UpdateChannelRequest {
            name,
            description: non_empty(description).unwrap_or_else(|| NO_DESCRIPTION.to_string()),
        };
        self.api.update_channel(&channel_id, &request).await?;
        self.reload_details(&channel_id).await?;
        self.load_channels().await?;
        Ok(())
    }

    /// Warms the profile cache from the user list plus one detail fetch per user, all in
    /// parallel. Fails open: on any error the cache keeps what it had.
    pub async fn load_users(&self) {
        if !self.api.session().await.is_authenticated() {
            return;
        }
        let users = match self.api.list_users().await {
            Ok(users) => users,
            Err(err) => {
                warn!(%err, "user list refresh failed");
                return;
            }
        };

        let listed: Vec<UserId> = {
            let mut state = self.inner.lock().await;
            users
                .into_iter()
                .filter_map(|user| {
                    let id = user.id?;
                    let name = user.email.unwrap_or_else(|| "Unknown".to_string());
                    state.seed_profile(id.clone(), ProfileEntry::new(name, None));
                    Some(id)
                })
                .collect()
        };

        let details = join_all(listed.iter().map(|user_id| self.api.get_user(user_id))).await;

        let mut state = self.inner.lock().await;
        for (user_id, result) in listed.into_iter().zip(details) {
            match result {
                Ok(user) => {
                    let name = user
                        .name
                        .clone()
                        .or_else(|| state.profile(&user_id).map(|p| p.name.clone()))
                        .or_else(|| user.email.clone())
                        .unwrap_or_else(|| "Unknown".to_string());
                    state.store_profile(user_id, ProfileEntry::new(name, user.image));
                }
                Err(err) => debug!(%user_id, %err, "user detail refresh failed"),
            }
        }
    }

    /// Users, then messages starting at `start`, then the pinned panel.
    pub async fn load_messages(&self, raw_id: Option<&str>, start: u64) -> Result<(), ClientError> {
        let channel_id = self.channel_target(raw_id).await?;
        self.show_messages(&channel_id, start).await
    }

    async fn show_messages(&self, channel_id: &ChannelId, start: u64) -> Result<(), ClientError> {
        self.load_users().await;
        let messages = self.api.list_messages(channel_id, start).await?;
        let current_user = self.api.current_user().await;
        let view = {
            let mut state = self.inner.lock().await;
            let view = render::message_list(channel_id, &messages, state.profiles(), current_user.as_ref());
            state.set_rendered_images(view.images());
            state.record_messages(channel_id.clone(), messages);
            view
        };
        self.render(View::Messages(view));
        self.show_pinned(channel_id).await;
        Ok(())
    }

    pub async fn load_pinned(&self, raw_id: Option<&str>) -> Result<(), ClientError> {
        let channel_id = self.channel_target(raw_id).await?;
        self.show_pinned(&channel_id).await;
        Ok(())
    }

    /// Always reads from the first page. Fails open.
    async fn show_pinned(&self, channel_id: &ChannelId) {
        match self.api.list_messages(channel_id, 0).await {
            Ok(messages) => {
                let view = {
                    let state = self.inner.lock().await;
                    render::pinned_panel(channel_id, &messages, state.profiles())
                };
                self.render(view);
            }
            Err(err) => warn!(%channel_id, %err, "pinned refresh failed"),
        }
    }

    pub async fn send_message(
        &self,
        raw_id: Option<&str>,
        text: &str,
        image: Option<&str>,
    ) -> Result<(), ClientError> {
        let channel_id = self.channel_target(raw_id).await?;
        let request = outgoing_message(text, image)?;
        self.api.send_message(&channel_id, &request).await?;
        self.show_messages(&channel_id, 0).await
    }

    pub async fn edit_message(
        &self,
        raw_id: Option<&str>,
        raw_message_id: &str,
        text: &str,
    ) -> Result<(), ClientError> {
        let channel_id = self.channel_target(raw_id).await?;
        let message_id = MessageId::parse(raw_message_id).ok_or(ClientError::InvalidId("message"))?;
        let text = non_empty(text).ok_or_else(|| ClientError::validation("Message cannot be empty"))?;
        let unchanged = self
            .inner
            .lock()
            .await
            .message(&channel_id, &message_id)
            .and_then(|message| message.message.as_deref())
            .is_some_and(|current| current.trim() == text);
        if unchanged {
            return Err(ClientError::validation("Message unchanged"));
        }
        self.api.edit_message(&channel_id, &message_id, &text).await?;
        self.show_messages(&channel_id, 0).await
    }

    pub async fn delete_message(
        &self,
        raw_id: Option<&str>,
        raw_message_id: &str,
    ) -> Result<(), ClientError> {
        let channel_id = self.channel_target(raw_id).await?;
        let message_id = MessageId::parse(raw_message_id).ok_or(ClientError::InvalidId("message"))?;
        self.api.delete_message(&channel_id, &message_id).await?;
        self.show_messages(&channel_id, 0).await
    }

    /// Reacts or unreacts in the selected channel, decided from the last fetched copy of
    /// the message.
    pub async fn toggle_reaction(&self, raw_message_id: &str, emoji: &str) -> Result<Toggle, ClientError> {
        let channel_id = self.channel_target(None).await?;
        let message_id = MessageId::parse(raw_message_id).ok_or(ClientError::InvalidId("message"))?;
        let user_id = self.require_user().await?;
        let reacted = self
            .inner
            .lock()
            .await
            .message(&channel_id, &message_id)
            .is_some_and(|message| message.reacted_by(&user_id, emoji));

        let toggle = if reacted {
            self.api.unreact(&channel_id, &message_id, emoji).await?;
            Toggle::Removed
        } else {
            self.api.react(&channel_id, &message_id, emoji).await?;
            Toggle::Added
        };
        self.show_messages(&channel_id, 0).await?;
        Ok(toggle)
    }

    pub async fn toggle_pin(&self, raw_message_id: &str) -> Result<Toggle, ClientError> {
        let channel_id = self.channel_target(None).await?;
        let message_id = MessageId::parse(raw_message_id).ok_or(ClientError::InvalidId("message"))?;
        let pinned = self
            .inner
            .lock()
            .await
            .message(&channel_id, &message_id)
            .is_some_and(|message| message.pinned);

        let toggle = if pinned {
            self.api.unpin(&channel_id, &message_id).await?;
            Toggle::Removed
        } else {
            self.api.pin(&channel_id, &message_id).await?;
            Toggle::Added
        };
        self.show_messages(&channel_id, 0).await?;
        Ok(toggle)
    }

    /// Channel details, then users, then the checklist of everyone not yet in the channel.
    pub async fn show_invite_list(&self, raw_id: Option<&str>) -> Result<(), ClientError> {
        let channel_id = self.channel_target(raw_id).await?;
        let details = self.api.get_channel(&channel_id).await?;
        self.load_users().await;
        let current_user = self.api.current_user().await;
        let view = {
            let state = self.inner.lock().await;
            render::invite_checklist(&channel_id, state.profiles(), current_user.as_ref(), &details.members)
        };
        self.render(view);
        Ok(())
    }

    /// Sends every invite in parallel and waits for all of them. The first failure is
    /// returned; otherwise the channel details are reloaded.
    pub async fn submit_invites(&self, raw_id: Option<&str>, raw_user_ids: &[&str]) -> Result<(), ClientError> {
        if raw_user_ids.is_empty() {
            return Err(ClientError::validation("Please select at least one user"));
        }
        let channel_id = self.channel_target(raw_id).await?;
        let user_ids = raw_user_ids
            .iter()
            .map(|raw| UserId::parse(raw).ok_or(ClientError::InvalidId("user")))
            .collect::<Result<Vec<_>, _>>()?;

        let outcomes = join_all(
            user_ids
                .iter()
                .map(|user_id| self.api.invite_to_channel(&channel_id, user_id)),
        )
        .await;
        if let Some(err) = outcomes.into_iter().find_map(Result::err) {
            return Err(err);
        }
        info!(%channel_id, invited = user_ids.len(), "invites sent");
        self.reload_details(&channel_id).await
    }

    pub async fn show_user_profile(&self, raw_user_id: &str) -> Result<(), ClientError> {
        let user_id = UserId::parse(raw_user_id).ok_or(ClientError::InvalidId("user"))?;
        let user = self.api.get_user(&user_id).await?;
        self.inner.lock().await.store_profile(
            user_id.clone(),
            ProfileEntry::new(user.display_name().unwrap_or("Unknown"), user.image.clone()),
        );
        self.render(render::profile_card(&user_id, &user));
        Ok(())
    }

    /// Renders the signed-in user's avatar. Fails open to the default avatar.
    pub async fn load_own_profile(&self) {
        let session = self.api.session().await;
        let Some(user_id) = session.user_id.filter(|_| session.token.is_some()) else {
            self.render(render::avatar(None));
            return;
        };
        match self.api.get_user(&user_id).await {
            Ok(user) => {
                self.inner.lock().await.store_profile(
                    user_id,
                    ProfileEntry::new(user.display_name().unwrap_or("Unknown"), user.image.clone()),
                );
                self.render(render::avatar(Some(&user)));
            }
            Err(err) => {
                warn!(%user_id, %err, "own profile refresh failed");
                self.render(render::avatar(None));
            }
        }
    }

    pub async fn show_own_profile(&self) -> Result<(), ClientError> {
        let user_id = self.require_user().await?;
        let user = self.api.get_user(&user_id).await?;
        self.render(render::own_profile_form(&user));
        Ok(())
    }

    /// Optional fields are only sent when non-blank.
    pub async fn save_own_profile(&self, update: UpdateProfileRequest) -> Result<(), ClientError> {
        self.require_user().await?;
        let (Some(name), Some(email)) = (non_empty(&update.name), non_empty(&update.email)) else {
            return Err(ClientError::validation("Name and email are required"));
        };
        let request = UpdateProfileRequest {
            name,
            email,
            bio: update.bio.as_deref().and_then(non_empty),
            password: update.password.as_deref().and_then(non_empty),
            image: update.image.filter(|image| !image.is_empty()),
        };
        self.api.update_profile(&request).await?;

        self.load_own_profile().await;
        self.load_users().await;
        if let Some(channel_id) = self.selected_channel().await {
            self.show_messages(&channel_id, 0).await?;
        }
        Ok(())
    }

    /// Opens the viewer over the images of the last rendered message list.
    pub async fn open_image_viewer(&self, url: &str) -> Result<(), ClientError> {
        let frame = {
            let mut state = self.inner.lock().await;
            let viewer = render::ImageViewer::open(state.rendered_images().to_vec(), url);
            let frame = viewer.frame();
            state.set_viewer(viewer);
            frame
        };
        self.render(frame);
        Ok(())
    }

    pub async fn next_image(&self) -> Result<(), ClientError> {
        self.step_viewer(render::ImageViewer::show_next).await
    }

    pub async fn previous_image(&self) -> Result<(), ClientError> {
        self.step_viewer(render::ImageViewer::show_previous).await
    }

    async fn step_viewer(&self, step: fn(&mut render::ImageViewer)) -> Result<(), ClientError> {
        let frame = {
            let mut state = self.inner.lock().await;
            let viewer = state
                .viewer_mut()
                .ok_or_else(|| ClientError::validation("No image is open"))?;
            step(viewer);
            viewer.frame()
        };
        self.render(frame);
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/mock_backend.rs"]
mod mock_backend;

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
