use std::collections::{HashMap, HashSet};

use shared::{
    domain::{ChannelId, MessageId, UserId},
    protocol::{ChannelSummary, MessagePayload},
};

use crate::render::ImageViewer;

/// Cached display data for one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileEntry {
    pub name: String,
    pub image: Option<String>,
}

impl ProfileEntry {
    pub fn new(name: impl Into<String>, image: Option<String>) -> Self {
        Self {
            name: name.into(),
            image,
        }
    }
}

/// Client-side memory that lives as long as the [`crate::ChatClient`] that owns it.
///
/// The joined set is optimistic and may disagree with the server until the next reload.
/// Profiles are never expired, only overwritten.
#[derive(Debug, Default)]
pub struct LocalState {
    joined: HashSet<ChannelId>,
    selected: Option<ChannelId>,
    listed_private: HashMap<ChannelId, bool>,
    profiles: HashMap<UserId, ProfileEntry>,
    messages: HashMap<ChannelId, Vec<MessagePayload>>,
    rendered_images: Vec<String>,
    viewer: Option<ImageViewer>,
}

impl LocalState {
    pub fn mark_joined(&mut self, channel_id: ChannelId) {
        self.joined.insert(channel_id);
    }

    pub fn mark_left(&mut self, channel_id: &ChannelId) {
        self.joined.remove(channel_id);
    }

    pub fn is_joined(&self, channel_id: &ChannelId) -> bool {
        self.joined.contains(channel_id)
    }

    /// Replaces the privacy flags with those of the latest channel list.
    pub fn record_channel_list(&mut self, channels: &[ChannelSummary]) {
        self.listed_private = channels
            .iter()
            .map(|channel| (channel.id.clone(), channel.private))
            .collect();
    }

    /// `None` when the channel was not in the last list.
    pub fn listed_private(&self, channel_id: &ChannelId) -> Option<bool> {
        self.listed_private.get(channel_id).copied()
    }

    pub fn select_channel(&mut self, channel_id: ChannelId) {
        self.selected = Some(channel_id);
    }

    pub fn selected_channel(&self) -> Option<&ChannelId> {
        self.selected.as_ref()
    }

    /// Inserts only when nothing is cached for the user yet.
    pub fn seed_profile(&mut self, user_id: UserId, entry: ProfileEntry) {
        self.profiles.entry(user_id).or_insert(entry);
    }

    pub fn store_profile(&mut self, user_id: UserId, entry: ProfileEntry) {
        self.profiles.insert(user_id, entry);
    }

    pub fn profile(&self, user_id: &UserId) -> Option<&ProfileEntry> {
        self.profiles.get(user_id)
    }

    pub fn profiles(&self) -> &HashMap<UserId, ProfileEntry> {
        &self.profiles
    }

    /// Replaces the last-fetched messages for a channel.
    pub fn record_messages(&mut self, channel_id: ChannelId, messages: Vec<MessagePayload>) {
        self.messages.insert(channel_id, messages);
    }

    pub fn messages(&self, channel_id: &ChannelId) -> &[MessagePayload] {
        self.messages
            .get(channel_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn message(&self, channel_id: &ChannelId, message_id: &MessageId) -> Option<&MessagePayload> {
        self.messages(channel_id)
            .iter()
            .find(|message| &message.id == message_id)
    }

    pub fn set_rendered_images(&mut self, images: Vec<String>) {
        self.rendered_images = images;
    }

    pub fn rendered_images(&self) -> &[String] {
        &self.rendered_images
    }

    pub fn set_viewer(&mut self, viewer: ImageViewer) {
        self.viewer = Some(viewer);
    }

    pub fn viewer_mut(&mut self) -> Option<&mut ImageViewer> {
        self.viewer.as_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(raw: &str) -> UserId {
        UserId::parse(raw).expect("user id")
    }

    #[test]
    fn seeding_keeps_existing_profiles() {
        let mut state = LocalState::default();
        state.store_profile(user("4"), ProfileEntry::new("Ada", None));
        state.seed_profile(user("4"), ProfileEntry::new("ada@example.com", None));
        state.seed_profile(user("5"), ProfileEntry::new("bob@example.com", None));

        assert_eq!(state.profile(&user("4")).map(|p| p.name.as_str()), Some("Ada"));
        assert_eq!(
            state.profile(&user("5")).map(|p| p.name.as_str()),
            Some("bob@example.com")
        );
    }

    #[test]
    fn joined_set_follows_join_and_leave() {
        let mut state = LocalState::default();
        let channel = ChannelId::parse("3").expect("channel id");
        state.mark_joined(channel.clone());
        assert!(state.is_joined(&channel));
        state.mark_left(&channel);
        assert!(!state.is_joined(&channel));
        assert!(state.messages(&channel).is_empty());
    }

    #[test]
    fn channel_list_privacy_is_replaced_on_each_record() {
        let mut state = LocalState::default();
        let listed: Vec<ChannelSummary> = [
            serde_json::json!({"id": 10, "private": false}),
            serde_json::json!({"id": 11, "private": true}),
        ]
        .iter()
        .filter_map(ChannelSummary::from_value)
        .collect();
        let public = ChannelId::parse("10").expect("channel id");
        let private = ChannelId::parse("11").expect("channel id");

        state.record_channel_list(&listed);
        assert_eq!(state.listed_private(&public), Some(false));
        assert_eq!(state.listed_private(&private), Some(true));

        state.record_channel_list(&listed[..1]);
        assert_eq!(state.listed_private(&private), None);
    }
}
