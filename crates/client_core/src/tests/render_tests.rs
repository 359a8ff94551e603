use super::*;
use serde_json::json;

fn channel(raw: &str) -> ChannelId {
    ChannelId::parse(raw).expect("channel id")
}

fn user(raw: &str) -> UserId {
    UserId::parse(raw).expect("user id")
}

fn message(body: serde_json::Value) -> MessagePayload {
    serde_json::from_value(body).expect("message payload")
}

#[test]
fn channel_list_splits_public_and_private() {
    let channels: Vec<ChannelSummary> = [json!({"id": 1, "private": false}), json!({"id": 2, "private": true})]
        .iter()
        .filter_map(ChannelSummary::from_value)
        .collect();

    let View::ChannelList(view) = channel_list(&channels) else {
        panic!("expected channel list");
    };
    assert_eq!(view.public.len(), 1);
    assert_eq!(view.private.len(), 1);
    assert_eq!(view.public[0].id, channel("1"));
    assert_eq!(view.public[0].name, "Untitled");
    assert_eq!(view.private[0].id, channel("2"));
}

#[test]
fn empty_channel_list_shows_both_placeholders() {
    let view = channel_list(&[]);
    let text = view.to_string();
    assert!(text.contains(NO_PUBLIC_CHANNELS));
    assert!(text.contains(NO_PRIVATE_CHANNELS));
}

#[test]
fn members_array_alone_makes_the_user_a_member() {
    let details = ChannelDetails::from_body(&json!({"id": 3, "members": [7]}), &channel("3"));
    assert!(is_member(&details, Some(&user("7")), false));
    assert!(!is_member(&details, Some(&user("8")), false));
    assert!(is_member(&details, Some(&user("8")), true));
    assert!(!is_member(&details, None, false));

    let flagged = ChannelDetails::from_body(&json!({"id": 3, "isMember": true}), &channel("3"));
    assert!(is_member(&flagged, None, false));
}

#[test]
fn member_detail_offers_edit_invite_and_leave() {
    let details = ChannelDetails::from_body(
        &json!({"id": 3, "name": "general", "description": "", "private": false}),
        &channel("3"),
    );

    let View::ChannelDetail(member) = channel_detail(&details, "Ada".into(), true) else {
        panic!("expected channel detail");
    };
    assert_eq!(member.description, "(none)");
    assert_eq!(
        member.actions,
        vec![ChannelAction::Edit, ChannelAction::Invite, ChannelAction::Leave]
    );
    assert_eq!(
        member.edit_form,
        Some(EditForm {
            name: "general".into(),
            description: String::new()
        })
    );

    let View::ChannelDetail(outsider) = channel_detail(&details, "Ada".into(), false) else {
        panic!("expected channel detail");
    };
    assert_eq!(outsider.actions, vec![ChannelAction::Join]);
    assert!(outsider.edit_form.is_none());
}

#[test]
fn unnamed_channel_detail_is_titled_but_edits_blank() {
    let details = ChannelDetails::from_body(&json!({"id": 6}), &channel("6"));

    let View::ChannelDetail(view) = channel_detail(&details, "Ada".into(), true) else {
        panic!("expected channel detail");
    };
    assert_eq!(view.name, "Untitled");
    assert_eq!(view.edit_form.map(|form| form.name), Some(String::new()));
}

#[test]
fn non_member_wording_depends_on_privacy() {
    let View::NonMember(public) = non_member(channel("4"), false) else {
        panic!("expected non-member view");
    };
    assert_eq!(public.notice, NOT_A_MEMBER);
    assert!(public.can_join);

    let View::NonMember(private) = non_member(channel("4"), true) else {
        panic!("expected non-member view");
    };
    assert_eq!(private.notice, PRIVATE_NOT_A_MEMBER);
    assert_eq!(private.hint, Some(ASK_FOR_INVITE));
    assert!(!private.can_join);
}

#[test]
fn messages_render_oldest_first_with_cached_names() {
    let messages = vec![
        message(json!({"id": 3, "sender": 2, "message": "third", "sentAt": "2024-05-01T10:02:00Z"})),
        message(json!({"id": 1, "sender": 1, "message": "first", "sentAt": "2024-05-01T10:00:00Z"})),
        message(json!({"id": 2, "sender": 9, "senderName": "Ghost", "message": "second", "sentAt": "2024-05-01T10:01:00Z"})),
        message(json!({"id": 4, "message": "undated"})),
    ];
    let mut profiles = HashMap::new();
    profiles.insert(user("1"), ProfileEntry::new("Ada", Some("data:image/png;base64,AAA".into())));

    let view = message_list(&channel("5"), &messages, &profiles, Some(&user("1")));
    let order: Vec<&str> = view.messages.iter().map(|m| m.text.as_str()).collect();
    assert_eq!(order, ["undated", "first", "second", "third"]);

    assert_eq!(view.messages[1].sender_name, "Ada");
    assert_eq!(view.messages[1].avatar, "data:image/png;base64,AAA");
    assert!(view.messages[1].own);
    assert_eq!(view.messages[2].sender_name, "Ghost");
    assert_eq!(view.messages[3].sender_name, "Unknown");
    assert_eq!(view.messages[3].avatar, DEFAULT_AVATAR);
    assert!(!view.messages[3].own);
}

#[test]
fn empty_message_list_shows_placeholder() {
    let view = message_list(&channel("5"), &[], &HashMap::new(), None);
    assert_eq!(view.to_string().trim(), NO_MESSAGES);
}

#[test]
fn reactions_group_by_emoji_and_flag_own() {
    let payload = message(json!({
        "id": 1,
        "reacts": [
            {"user": 2, "react": "🔥"},
            {"user": 1, "react": "👍"},
            {"user": 3, "react": "🔥"},
        ]
    }));

    let badges = reaction_badges(&payload.reacts, Some(&user("1")));
    assert_eq!(
        badges,
        vec![
            ReactionBadge {
                emoji: "🔥".into(),
                count: 2,
                reacted: false
            },
            ReactionBadge {
                emoji: "👍".into(),
                count: 1,
                reacted: true
            },
        ]
    );
}

#[test]
fn pinned_panel_only_lists_pinned_messages() {
    let messages = vec![
        message(json!({"id": 1, "message": "plain"})),
        message(json!({"id": 2, "message": "keep", "pinned": true})),
    ];
    let View::Pinned(panel) = pinned_panel(&channel("5"), &messages, &HashMap::new()) else {
        panic!("expected pinned panel");
    };
    assert_eq!(panel.entries.len(), 1);
    assert_eq!(panel.entries[0].text, "keep");

    let View::Pinned(empty) = pinned_panel(&channel("5"), &messages[..1], &HashMap::new()) else {
        panic!("expected pinned panel");
    };
    assert!(empty.entries.is_empty());
    assert_eq!(View::Pinned(empty).to_string(), "");
}

#[test]
fn invite_checklist_skips_self_and_members_and_sorts_by_name() {
    let mut profiles = HashMap::new();
    profiles.insert(user("1"), ProfileEntry::new("Me", None));
    profiles.insert(user("2"), ProfileEntry::new("zed", None));
    profiles.insert(user("3"), ProfileEntry::new("Bob", None));
    profiles.insert(user("4"), ProfileEntry::new("alice", None));

    let View::InviteList(list) =
        invite_checklist(&channel("9"), &profiles, Some(&user("1")), &[user("3")])
    else {
        panic!("expected invite list");
    };
    let names: Vec<&str> = list.candidates.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["alice", "zed"]);

    let View::InviteList(none) =
        invite_checklist(&channel("9"), &profiles, Some(&user("1")), &[user("2"), user("3"), user("4")])
    else {
        panic!("expected invite list");
    };
    assert!(none.candidates.is_empty());
    assert_eq!(View::InviteList(none).to_string().trim(), NO_INVITE_CANDIDATES);
}

#[test]
fn profile_views_fill_in_defaults() {
    let bare = UserDetails::default();
    let View::Profile(card) = profile_card(&user("2"), &bare) else {
        panic!("expected profile card");
    };
    assert_eq!(card.name, "Unknown");
    assert_eq!(card.bio, "(no bio)");
    assert_eq!(card.image, DEFAULT_AVATAR);

    let View::Avatar(fallback) = avatar(None) else {
        panic!("expected avatar");
    };
    assert_eq!(fallback.label, "User");

    let emailed = UserDetails {
        email: Some("ada@example.com".into()),
        ..UserDetails::default()
    };
    let View::Avatar(labelled) = avatar(Some(&emailed)) else {
        panic!("expected avatar");
    };
    assert_eq!(labelled.label, "ada@example.com");
}

#[test]
fn image_viewer_cycles_in_both_directions() {
    let images = vec!["a".to_string(), "b".to_string(), "c".to_string()];
    let mut viewer = ImageViewer::open(images, "b");
    assert_eq!(viewer.current(), "b");
    viewer.show_next();
    viewer.show_next();
    assert_eq!(viewer.current(), "a");
    viewer.show_previous();
    assert_eq!(viewer.current(), "c");

    let View::ImageViewer(frame) = viewer.frame() else {
        panic!("expected image frame");
    };
    assert_eq!((frame.position, frame.total), (3, 3));
    assert!(frame.can_cycle);
}

#[test]
fn image_viewer_falls_back_to_the_requested_url() {
    let mut viewer = ImageViewer::open(Vec::new(), "solo");
    viewer.show_next();
    assert_eq!(viewer.current(), "solo");

    let unknown = ImageViewer::open(vec!["x".to_string()], "missing");
    assert_eq!(unknown.current(), "x");
    let View::ImageViewer(frame) = unknown.frame() else {
        panic!("expected image frame");
    };
    assert!(!frame.can_cycle);
}
