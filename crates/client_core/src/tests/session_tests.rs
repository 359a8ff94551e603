use super::*;

fn signed_in() -> Session {
    Session {
        token: Some("token-7".to_string()),
        user_id: UserId::parse("7"),
    }
}

#[tokio::test]
async fn file_store_treats_missing_file_as_signed_out() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = FileSessionStore::new(dir.path().join("nested").join("session.json"));

    let session = store.load().await.expect("load");
    assert_eq!(session, Session::default());
    assert!(!session.is_authenticated());
}

#[tokio::test]
async fn file_store_persists_token_and_user_id_as_key_value_json() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("nested").join("session.json");
    let store = FileSessionStore::new(&path);

    store.save(&signed_in()).await.expect("save");
    let raw: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&path).expect("read")).expect("json");
    assert_eq!(raw, serde_json::json!({ "token": "token-7", "userId": 7 }));

    let reopened = FileSessionStore::new(&path);
    assert_eq!(reopened.load().await.expect("load"), signed_in());

    reopened.clear().await.expect("clear");
    assert!(!path.exists());
    reopened.clear().await.expect("clearing twice is fine");
}

#[tokio::test]
async fn file_store_reports_corrupt_documents() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("session.json");
    std::fs::write(&path, b"{not json").expect("write");

    let err = FileSessionStore::new(&path).load().await.expect_err("corrupt");
    assert!(matches!(err, SessionStoreError::Format(_)));
}

#[tokio::test]
async fn memory_store_round_trips_and_clears() {
    let store = MemorySessionStore::with_session(signed_in());
    assert!(store.load().await.expect("load").is_authenticated());
    store.clear().await.expect("clear");
    assert_eq!(store.load().await.expect("load"), Session::default());
}
