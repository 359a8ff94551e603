use super::*;
use serde_json::json;

#[test]
fn normalizer_rejects_non_positive_and_missing_ids() {
    assert_eq!(normalize_id(&json!(0)), "");
    assert_eq!(normalize_id(&json!(-5)), "");
    assert_eq!(normalize_id(&Value::Null), "");
    assert_eq!(normalize_id(&json!("   ")), "");
    assert_eq!(normalize_id(&json!("NaN")), "");
    assert_eq!(normalize_id(&json!("Infinity")), "");
    assert_eq!(normalize_id(&json!("0.4")), "");
    assert_eq!(normalize_id(&json!(true)), "");
    assert_eq!(normalize_id(&json!([1])), "");
}

#[test]
fn normalizer_truncates_numeric_text_and_passes_other_text_through() {
    assert_eq!(normalize_id(&json!("7.9")), "7");
    assert_eq!(normalize_id(&json!(" 12 ")), "12");
    assert_eq!(normalize_id(&json!(5.9)), "5");
    assert_eq!(normalize_id(&json!(42)), "42");
    assert_eq!(normalize_id(&json!("abc")), "abc");
    assert_eq!(normalize_id(&json!(" chan-x ")), "chan-x");
}

#[test]
fn normalizer_reads_ids_out_of_objects() {
    assert_eq!(normalize_id(&json!({ "id": "3" })), "3");
    assert_eq!(normalize_id(&json!({ "id": null, "channelId": 8 })), "8");
    assert_eq!(normalize_id(&json!({ "channelid": "9.2" })), "9");
    assert_eq!(normalize_id(&json!({ "channel": { "id": 11 } })), "11");
    assert_eq!(normalize_id(&json!({ "name": "general" })), "");
}

#[test]
fn typed_ids_are_only_built_from_valid_input() {
    assert_eq!(ChannelId::parse("4").map(|id| id.to_string()), Some("4".into()));
    assert!(ChannelId::parse("-1").is_none());
    assert!(UserId::from_value(&json!(0)).is_none());

    let decoded: MessageId = serde_json::from_value(json!(" 15 ")).expect("decode");
    assert_eq!(decoded.as_str(), "15");
    assert!(serde_json::from_value::<MessageId>(json!(-2)).is_err());
}

#[test]
fn numeric_ids_serialize_as_numbers() {
    let numeric = UserId::parse("7").expect("id");
    let textual = UserId::parse("u-7").expect("id");
    assert_eq!(serde_json::to_value(&numeric).expect("encode"), json!(7));
    assert_eq!(serde_json::to_value(&textual).expect("encode"), json!("u-7"));
}
