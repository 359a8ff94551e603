use super::*;
use serde_json::json;

fn channel(raw: &str) -> ChannelId {
    ChannelId::parse(raw).expect("channel id")
}

fn user(raw: &str) -> UserId {
    UserId::parse(raw).expect("user id")
}

#[test]
fn channel_list_accepts_wrapped_or_bare_arrays_and_skips_bad_ids() {
    let wrapped = json!({ "channels": [
        { "id": 1, "name": "general", "private": false },
        { "id": 0, "name": "broken" },
        { "id": "2", "private": true },
    ]});
    let channels = channels_from_body(&wrapped);
    assert_eq!(channels.len(), 2);
    assert_eq!(channels[0].name.as_deref(), Some("general"));
    assert!(channels[1].private);

    let bare = json!([{ "channelId": 5, "name": "bare" }]);
    assert_eq!(channels_from_body(&bare)[0].id, channel("5"));
    assert!(channels_from_body(&json!({})).is_empty());
}

#[test]
fn channel_details_unwrap_envelope_and_fall_back_to_requested_id() {
    let body = json!({ "channel": {
        "name": "ops",
        "private": true,
        "createdAt": "2024-03-01T12:00:00.000Z",
        "ownerId": 9,
        "members": [9, "4", null, -1],
        "isMember": true,
    }});
    let details = ChannelDetails::from_body(&body, &channel("33"));

    assert_eq!(details.id, channel("33"));
    assert_eq!(details.creator_id, Some(user("9")));
    assert_eq!(details.members, vec![user("9"), user("4")]);
    assert!(details.member_flag);
    assert!(details.private);
    assert!(details.created_at.is_some());
}

#[test]
fn channel_creator_reads_numeric_creator_or_name() {
    let numeric = ChannelDetails::from_body(&json!({ "id": 2, "creator": 5 }), &channel("2"));
    assert_eq!(numeric.creator_id, Some(user("5")));
    assert_eq!(numeric.creator_name, None);

    let named = ChannelDetails::from_body(&json!({ "creator": "alice" }), &channel("2"));
    assert_eq!(named.creator_id, None);
    assert_eq!(named.creator_name.as_deref(), Some("alice"));
    assert!(!named.member_flag);
}

#[test]
fn created_channel_id_checks_every_known_field() {
    assert_eq!(created_channel_id(&json!({ "channelId": 3 })), Some(channel("3")));
    assert_eq!(
        created_channel_id(&json!({ "channel": { "id": "4" } })),
        Some(channel("4"))
    );
    assert_eq!(created_channel_id(&json!({ "id": 5 })), Some(channel("5")));
    assert_eq!(created_channel_id(&json!({})), None);
}

#[test]
fn message_list_skips_entries_without_ids_and_tolerates_odd_fields() {
    let body = json!({ "messages": [
        {
            "id": 1,
            "sender": "7",
            "message": "hi",
            "sentAt": 1_700_000_000_000_i64,
            "pinned": 1,
            "reacts": [{ "user": 7, "react": "👍" }, "junk"],
        },
        { "message": "lost" },
        { "id": 2, "image": "data:image/png;base64,AAAA", "sentAt": "not a date", "reacts": {} },
    ]});
    let decoded: MessageListResponse = serde_json::from_value(body).expect("decode");

    assert_eq!(decoded.messages.len(), 2);
    let first = &decoded.messages[0];
    assert!(first.pinned);
    assert!(first.sent_at.is_some());
    assert!(first.reacted_by(&user("7"), "👍"));
    assert!(!first.reacted_by(&user("7"), "🔥"));

    let second = &decoded.messages[1];
    assert_eq!(second.sent_at, None);
    assert!(second.reacts.is_empty());
    assert_eq!(second.message, None);
}

#[test]
fn send_request_serializes_only_the_chosen_content() {
    let image = serde_json::to_value(SendMessageRequest::image("data:x")).expect("encode");
    assert_eq!(image, json!({ "image": "data:x" }));
    let text = serde_json::to_value(SendMessageRequest::text("hello")).expect("encode");
    assert_eq!(text, json!({ "message": "hello" }));
}
