//! Pure functions from fetched data and cached state to displayable views.
//!
//! Every refresh rebuilds its view from scratch; nothing here patches an earlier view.

use std::{collections::HashMap, fmt};

use chrono::{DateTime, Local, Utc};
use shared::{
    domain::{ChannelId, MessageId, UserId},
    protocol::{ChannelDetails, ChannelSummary, MessagePayload, Reaction, UserDetails},
};

use crate::state::ProfileEntry;

pub const REACTION_EMOJIS: [&str; 6] = ["👍", "❤️", "😂", "😮", "😢", "🔥"];

pub const DEFAULT_AVATAR: &str = "data:image/svg+xml;base64,PHN2ZyB3aWR0aD0iNDAiIGhlaWdodD0iNDAiIHZpZXdCb3g9IjAgMCAyNCAyNCIgZmlsbD0ibm9uZSIgeG1sbnM9Imh0dHA6Ly93d3cudzMub3JnLzIwMDAvc3ZnIj4KPHBhdGggZD0iTTEyIDEyQzE0Ljc2MTQgMTIgMTcgOS43NjE0MiAxNyA3QzE3IDQuMjM4NTggMTQuNzYxNCAyIDEyIDJDOS4yMzg1OCAyIDcgNC4yMzg1OCA3IDdDNyA5Ljc2MTQyIDkuMjM4NTggMTIgMTIgMTJaIiBmaWxsPSIjNjY2NjY2Ii8+CjxwYXRoIGQ9Ik0xMiAxNEMxNS4zMzEzIDE0IDE4IDE1LjIzMjIgMTggMTdWMTlIMFYxN0MwIDE1LjIzMjIgMi42ODg2NyAxNCA2IDE0SDEyWiIgZmlsbD0iIzY2NjY2NiIvPgo8L3N2Zz4K";

pub const NO_PUBLIC_CHANNELS: &str = "No public channels";
pub const NO_PRIVATE_CHANNELS: &str = "No private channels";
pub const NO_MESSAGES: &str = "No messages yet";
pub const NO_INVITE_CANDIDATES: &str = "No users available to invite";
pub const SELECT_CHANNEL: &str = "Select a channel to view details and messages.";
pub const NOT_A_MEMBER: &str = "You are not a member of this channel.";
pub const PRIVATE_NOT_A_MEMBER: &str =
    "This is a private channel. You need to be invited to join.";
pub const ASK_FOR_INVITE: &str = "Ask a channel member to invite you.";

const UNKNOWN: &str = "Unknown";
const UNTITLED: &str = "Untitled";
const NO_DESCRIPTION: &str = "(none)";
const NO_BIO: &str = "(no bio)";

#[derive(Debug, Clone, PartialEq)]
pub enum View {
    ChannelList(ChannelListView),
    ChannelDetail(ChannelDetailView),
    NonMember(NonMemberView),
    Placeholder(&'static str),
    Messages(MessageListView),
    /// Hidden when `entries` is empty.
    Pinned(PinnedView),
    InviteList(InviteListView),
    Profile(ProfileCard),
    OwnProfile(OwnProfileForm),
    Avatar(AvatarView),
    ImageViewer(ImageFrame),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelEntry {
    pub id: ChannelId,
    pub name: String,
    pub private: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelListView {
    pub public: Vec<ChannelEntry>,
    pub private: Vec<ChannelEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelAction {
    Edit,
    Invite,
    Leave,
    Join,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditForm {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChannelDetailView {
    pub id: ChannelId,
    pub name: String,
    pub private: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub creator: String,
    pub description: String,
    pub member: bool,
    /// Prefilled edit form; members only.
    pub edit_form: Option<EditForm>,
    pub actions: Vec<ChannelAction>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonMemberView {
    pub id: ChannelId,
    pub private: bool,
    pub notice: &'static str,
    pub hint: Option<&'static str>,
    pub can_join: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactionBadge {
    pub emoji: String,
    pub count: usize,
    /// The current user is among the reactors.
    pub reacted: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MessageView {
    pub id: MessageId,
    pub sender: Option<UserId>,
    pub sender_name: String,
    pub avatar: String,
    pub text: String,
    pub image: Option<String>,
    pub sent_at: Option<DateTime<Utc>>,
    /// Present only for edited messages that report when.
    pub edited_at: Option<DateTime<Utc>>,
    pub edited: bool,
    pub own: bool,
    pub pinned: bool,
    pub reactions: Vec<ReactionBadge>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MessageListView {
    pub channel_id: ChannelId,
    pub messages: Vec<MessageView>,
}

impl MessageListView {
    /// Image URLs in display order; the image viewer cycles over these.
    pub fn images(&self) -> Vec<String> {
        self.messages
            .iter()
            .filter_map(|message| message.image.clone())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PinnedEntry {
    pub id: MessageId,
    pub sender_name: String,
    pub sent_at: Option<DateTime<Utc>>,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PinnedView {
    pub channel_id: ChannelId,
    pub entries: Vec<PinnedEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InviteCandidate {
    pub id: UserId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InviteListView {
    pub channel_id: ChannelId,
    pub candidates: Vec<InviteCandidate>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileCard {
    pub user_id: UserId,
    pub image: String,
    pub name: String,
    pub email: String,
    pub bio: String,
}

/// Prefill for the own-profile editor. The password field always starts empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnProfileForm {
    pub image: String,
    pub name: String,
    pub email: String,
    pub bio: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvatarView {
    pub image: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFrame {
    pub url: String,
    pub position: usize,
    pub total: usize,
    /// Prev/next controls are only offered for more than one image.
    pub can_cycle: bool,
}

/// Splits channels into public and private lists, keeping server order.
pub fn channel_list(channels: &[ChannelSummary]) -> View {
    let (private, public): (Vec<_>, Vec<_>) = channels
        .iter()
        .map(|channel| ChannelEntry {
            id: channel.id.clone(),
            name: channel.name.clone().unwrap_or_else(|| UNTITLED.to_string()),
            private: channel.private,
        })
        .partition(|entry| entry.private);
    View::ChannelList(ChannelListView { public, private })
}

/// Membership is the union of the server flags, the members list and the local joined set.
pub fn is_member(details: &ChannelDetails, current_user: Option<&UserId>, locally_joined: bool) -> bool {
    details.member_flag
        || locally_joined
        || current_user.is_some_and(|user_id| details.lists_member(user_id))
}

pub fn channel_detail(details: &ChannelDetails, creator: String, member: bool) -> View {
    let name = details.name.clone().unwrap_or_default();
    let description = details.description.clone().unwrap_or_default();
    let (edit_form, actions) = if member {
        (
            Some(EditForm {
                name: name.clone(),
                description: description.clone(),
            }),
            vec![ChannelAction::Edit, ChannelAction::Invite, ChannelAction::Leave],
        )
    } else {
        (None, vec![ChannelAction::Join])
    };

    View::ChannelDetail(ChannelDetailView {
        id: details.id.clone(),
        name: if name.is_empty() {
            UNTITLED.to_string()
        } else {
            name
        },
        private: details.private,
        created_at: details.created_at,
        creator,
        description: if description.is_empty() {
            NO_DESCRIPTION.to_string()
        } else {
            description
        },
        member,
        edit_form,
        actions,
    })
}

pub fn non_member(channel_id: ChannelId, private: bool) -> View {
    View::NonMember(if private {
        NonMemberView {
            id: channel_id,
            private,
            notice: PRIVATE_NOT_A_MEMBER,
            hint: Some(ASK_FOR_INVITE),
            can_join: false,
        }
    } else {
        NonMemberView {
            id: channel_id,
            private,
            notice: NOT_A_MEMBER,
            hint: None,
            can_join: true,
        }
    })
}

fn sender_name(message: &MessagePayload, profiles: &HashMap<UserId, ProfileEntry>) -> String {
    message
        .sender
        .as_ref()
        .and_then(|sender| profiles.get(sender))
        .map(|profile| profile.name.clone())
        .filter(|name| !name.is_empty())
        .or_else(|| message.sender_name.clone())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

fn sort_key(message: &MessagePayload) -> i64 {
    message.sent_at.map_or(0, |sent_at| sent_at.timestamp_millis())
}

/// Oldest first. Messages without a send time sort as the epoch; ties keep server order.
pub fn message_list(
    channel_id: &ChannelId,
    messages: &[MessagePayload],
    profiles: &HashMap<UserId, ProfileEntry>,
    current_user: Option<&UserId>,
) -> MessageListView {
    let mut sorted: Vec<&MessagePayload> = messages.iter().collect();
    sorted.sort_by_key(|message| sort_key(message));

    let messages = sorted
        .into_iter()
        .map(|message| {
            let cached = message.sender.as_ref().and_then(|sender| profiles.get(sender));
            MessageView {
                id: message.id.clone(),
                sender: message.sender.clone(),
                sender_name: sender_name(message, profiles),
                avatar: cached
                    .and_then(|profile| profile.image.clone())
                    .or_else(|| message.sender_image.clone())
                    .unwrap_or_else(|| DEFAULT_AVATAR.to_string()),
                text: message.message.clone().unwrap_or_default(),
                image: message.image.clone(),
                sent_at: message.sent_at,
                edited_at: message.edited.then_some(message.edited_at).flatten(),
                edited: message.edited,
                own: current_user.is_some() && message.sender.as_ref() == current_user,
                pinned: message.pinned,
                reactions: reaction_badges(&message.reacts, current_user),
            }
        })
        .collect();

    MessageListView {
        channel_id: channel_id.clone(),
        messages,
    }
}

/// One badge per emoji, in order of first appearance.
pub fn reaction_badges(reacts: &[Reaction], current_user: Option<&UserId>) -> Vec<ReactionBadge> {
    let mut badges: Vec<ReactionBadge> = Vec::new();
    for reaction in reacts {
        let emoji = reaction.react.clone().unwrap_or_default();
        let mine = current_user.is_some() && reaction.user.as_ref() == current_user;
        match badges.iter_mut().find(|badge| badge.emoji == emoji) {
            Some(badge) => {
                badge.count += 1;
                badge.reacted |= mine;
            }
            None => badges.push(ReactionBadge {
                emoji,
                count: 1,
                reacted: mine,
            }),
        }
    }
    badges
}

pub fn pinned_panel(
    channel_id: &ChannelId,
    messages: &[MessagePayload],
    profiles: &HashMap<UserId, ProfileEntry>,
) -> View {
    let entries = messages
        .iter()
        .filter(|message| message.pinned)
        .map(|message| PinnedEntry {
            id: message.id.clone(),
            sender_name: sender_name(message, profiles),
            sent_at: message.sent_at,
            text: message.message.clone().unwrap_or_default(),
        })
        .collect();
    View::Pinned(PinnedView {
        channel_id: channel_id.clone(),
        entries,
    })
}

/// Every cached user except the current user and existing members, by lower-cased name.
pub fn invite_checklist(
    channel_id: &ChannelId,
    profiles: &HashMap<UserId, ProfileEntry>,
    current_user: Option<&UserId>,
    members: &[UserId],
) -> View {
    let mut candidates: Vec<InviteCandidate> = profiles
        .iter()
        .filter(|(user_id, _)| Some(*user_id) != current_user && !members.contains(*user_id))
        .map(|(user_id, profile)| InviteCandidate {
            id: user_id.clone(),
            name: if profile.name.is_empty() {
                UNKNOWN.to_string()
            } else {
                profile.name.clone()
            },
        })
        .collect();
    candidates.sort_by(|a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.id.cmp(&b.id))
    });
    View::InviteList(InviteListView {
        channel_id: channel_id.clone(),
        candidates,
    })
}

pub fn profile_card(user_id: &UserId, details: &UserDetails) -> View {
    View::Profile(ProfileCard {
        user_id: user_id.clone(),
        image: image_or_default(details.image.as_deref()),
        name: details.name.clone().unwrap_or_else(|| UNKNOWN.to_string()),
        email: details.email.clone().unwrap_or_default(),
        bio: details.bio.clone().unwrap_or_else(|| NO_BIO.to_string()),
    })
}

pub fn own_profile_form(details: &UserDetails) -> View {
    View::OwnProfile(OwnProfileForm {
        image: image_or_default(details.image.as_deref()),
        name: details.name.clone().unwrap_or_default(),
        email: details.email.clone().unwrap_or_default(),
        bio: details.bio.clone().unwrap_or_default(),
    })
}

/// `None` renders the default avatar labelled "User".
pub fn avatar(details: Option<&UserDetails>) -> View {
    View::Avatar(AvatarView {
        image: image_or_default(details.and_then(|d| d.image.as_deref())),
        label: details
            .and_then(UserDetails::display_name)
            .unwrap_or("User")
            .to_string(),
    })
}

fn image_or_default(image: Option<&str>) -> String {
    image.unwrap_or(DEFAULT_AVATAR).to_string()
}

/// Cursor over the images of the last rendered message list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageViewer {
    images: Vec<String>,
    index: usize,
    requested: String,
}

impl ImageViewer {
    /// Starts at `url`, or at the first image when `url` is not in the set.
    pub fn open(images: Vec<String>, url: &str) -> Self {
        let index = images.iter().position(|image| image == url).unwrap_or(0);
        Self {
            images,
            index,
            requested: url.to_string(),
        }
    }

    pub fn show_next(&mut self) {
        if !self.images.is_empty() {
            self.index = (self.index + 1) % self.images.len();
        }
    }

    pub fn show_previous(&mut self) {
        if !self.images.is_empty() {
            self.index = (self.index + self.images.len() - 1) % self.images.len();
        }
    }

    pub fn current(&self) -> &str {
        self.images
            .get(self.index)
            .map(String::as_str)
            .unwrap_or(&self.requested)
    }

    pub fn frame(&self) -> View {
        View::ImageViewer(ImageFrame {
            url: self.current().to_string(),
            position: self.index + 1,
            total: self.images.len().max(1),
            can_cycle: self.images.len() > 1,
        })
    }
}

fn when(timestamp: Option<DateTime<Utc>>) -> String {
    timestamp
        .map(|at| at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default()
}

fn image_label(url: &str) -> &str {
    if url.starts_with("data:") {
        url.split(';').next().unwrap_or("data:")
    } else {
        url
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            View::ChannelList(view) => fmt::Display::fmt(view, f),
            View::ChannelDetail(view) => fmt::Display::fmt(view, f),
            View::NonMember(view) => fmt::Display::fmt(view, f),
            View::Placeholder(text) => writeln!(f, "{text}"),
            View::Messages(view) => fmt::Display::fmt(view, f),
            View::Pinned(view) => fmt::Display::fmt(view, f),
            View::InviteList(view) => fmt::Display::fmt(view, f),
            View::Profile(card) => fmt::Display::fmt(card, f),
            View::OwnProfile(form) => fmt::Display::fmt(form, f),
            View::Avatar(view) => writeln!(f, "[{}] {}", image_label(&view.image), view.label),
            View::ImageViewer(frame) => fmt::Display::fmt(frame, f),
        }
    }
}

impl fmt::Display for ChannelListView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (title, entries, empty) in [
            ("Public channels", &self.public, NO_PUBLIC_CHANNELS),
            ("Private channels", &self.private, NO_PRIVATE_CHANNELS),
        ] {
            writeln!(f, "{title}")?;
            if entries.is_empty() {
                writeln!(f, "  {empty}")?;
            }
            for entry in entries {
                let badge = if entry.private { "Private" } else { "Public" };
                writeln!(f, "  #{:<6} {} [{badge}]", entry.id, entry.name)?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for ChannelDetailView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} (#{})", self.name, self.id)?;
        writeln!(
            f,
            "Privacy: {}",
            if self.private { "Private" } else { "Public" }
        )?;
        writeln!(f, "Created: {}", when(self.created_at))?;
        writeln!(f, "Creator: {}", self.creator)?;
        writeln!(f, "Description: {}", self.description)?;
        let actions: Vec<&str> = self
            .actions
            .iter()
            .map(|action| match action {
                ChannelAction::Edit => "Edit Channel",
                ChannelAction::Invite => "Invite Users",
                ChannelAction::Leave => "Leave",
                ChannelAction::Join => "Join Channel",
            })
            .collect();
        writeln!(f, "Actions: {}", actions.join(" | "))
    }
}

impl fmt::Display for NonMemberView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.notice)?;
        if let Some(hint) = self.hint {
            writeln!(f, "{hint}")?;
        }
        if self.can_join {
            writeln!(f, "Actions: Join Channel")?;
        }
        Ok(())
    }
}

impl fmt::Display for MessageListView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.messages.is_empty() {
            return writeln!(f, "{NO_MESSAGES}");
        }
        for message in &self.messages {
            write!(f, "[{}] {} {}", message.id, message.sender_name, when(message.sent_at))?;
            if message.edited {
                write!(f, " (edited {})", when(message.edited_at))?;
            }
            if message.pinned {
                write!(f, " 📌")?;
            }
            writeln!(f)?;
            if !message.text.is_empty() {
                writeln!(f, "    {}", message.text)?;
            }
            if let Some(image) = &message.image {
                writeln!(f, "    <image {}>", image_label(image))?;
            }
            if !message.reactions.is_empty() {
                let badges: Vec<String> = message
                    .reactions
                    .iter()
                    .map(|badge| {
                        let marker = if badge.reacted { "*" } else { "" };
                        format!("{}{} {}", marker, badge.emoji, badge.count)
                    })
                    .collect();
                writeln!(f, "    {}", badges.join("  "))?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for PinnedView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.entries.is_empty() {
            return Ok(());
        }
        writeln!(f, "Pinned")?;
        for entry in &self.entries {
            writeln!(f, "  {} {}: {}", entry.sender_name, when(entry.sent_at), entry.text)?;
        }
        Ok(())
    }
}

impl fmt::Display for InviteListView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.candidates.is_empty() {
            return writeln!(f, "{NO_INVITE_CANDIDATES}");
        }
        for candidate in &self.candidates {
            writeln!(f, "  [ ] {} ({})", candidate.name, candidate.id)?;
        }
        Ok(())
    }
}

impl fmt::Display for ProfileCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} <{}>", self.name, self.email)?;
        writeln!(f, "{}", self.bio)?;
        writeln!(f, "Image: {}", image_label(&self.image))
    }
}

impl fmt::Display for OwnProfileForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Name:  {}", self.name)?;
        writeln!(f, "Email: {}", self.email)?;
        writeln!(f, "Bio:   {}", self.bio)?;
        writeln!(f, "Image: {}", image_label(&self.image))
    }
}

impl fmt::Display for ImageFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Image {}/{}: {}", self.position, self.total, image_label(&self.url))?;
        if self.can_cycle {
            write!(f, "  (prev | next)")?;
        }
        writeln!(f)
    }
}

#[cfg(test)]
#[path = "tests/render_tests.rs"]
mod tests;
