#[cfg(test)]
mod test {

    use crate::credential::{Credential, Scopes, SigningKey, SourceKind};
    use crate::error::AuthError;
    use crate::tests::common::{temp_store, TEST_PRIVATE_KEY};
    use chrono::{Duration, TimeZone, Utc};

    fn credential(identity: &str, token: &str) -> Credential {
        let mut credential = Credential::new(identity, SourceKind::ParsedKey, Scopes::parse("s1"));
        credential.access_token = token.to_owned();
        credential.expiry = Some(Utc::now() + Duration::hours(1));
        credential
    }

    #[tokio::test]
    async fn round_trip_keeps_every_field() {
        let (_dir, store) = temp_store().await;

        let mut full = Credential::new(
            "svc@project.iam",
            SourceKind::FileKey,
            Scopes::from(vec!["z-scope".to_owned(), "a-scope".to_owned(), "m-scope".to_owned()]),
        );
        full.access_token = "tok".into();
        // empty and absent are different things and must stay different
        full.refresh_token = Some(String::new());
        full.token_uri = Some("https://oauth2.example/token".into());
        full.client_id = None;
        full.client_secret = Some("secret".into());
        full.expiry = Some(Utc.with_ymd_and_hms(2030, 1, 2, 3, 4, 5).unwrap() + Duration::nanoseconds(123_456_789));
        full.signing_key = Some(SigningKey::new(TEST_PRIVATE_KEY));

        store.put("svc@project.iam", &full).await.unwrap();
        let got = store.get("svc@project.iam").await.unwrap();

        assert_eq!(got, full);
        assert_eq!(got.refresh_token.as_deref(), Some(""));
        assert!(got.client_id.is_none());
        assert_eq!(got.scopes.iter().collect::<Vec<_>>(), vec!["z-scope", "a-scope", "m-scope"]);

        let mut bare = Credential::new("", SourceKind::RawToken, Scopes::new());
        bare.access_token = "raw".into();
        store.put("bare", &bare).await.unwrap();
        assert_eq!(store.get("bare").await.unwrap(), bare);
    }

    #[tokio::test]
    async fn get_of_absent_record_is_not_found() {
        let (_dir, store) = temp_store().await;
        let err = store.get("nobody@project.iam").await.unwrap_err();
        assert!(matches!(err, AuthError::NotFound(ref id) if id == "nobody@project.iam"));
        assert!(store.find("nobody@project.iam").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn put_replaces_the_whole_record() {
        let (_dir, store) = temp_store().await;
        let mut first = credential("a@x", "first");
        first.refresh_token = Some("rt".into());
        store.put("a@x", &first).await.unwrap();

        let second = credential("a@x", "second");
        store.put("a@x", &second).await.unwrap();

        let got = store.get("a@x").await.unwrap();
        assert_eq!(got.access_token, "second");
        assert!(got.refresh_token.is_none());
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn list_is_a_restartable_snapshot_in_first_insert_order() {
        let (_dir, store) = temp_store().await;
        for id in ["c@x", "a@x", "b@x"] {
            store.put(id, &credential(id, "v1")).await.unwrap();
        }
        // an update keeps the original position
        store.put("c@x", &credential("c@x", "v2")).await.unwrap();

        let mut listing = store.list().await.unwrap();
        assert_eq!(listing.len(), 3);

        // writes after the snapshot are not observed
        store.put("d@x", &credential("d@x", "v1")).await.unwrap();

        let first_pass: Vec<(String, String)> = listing
            .by_ref()
            .map(|entry| entry.map(|(id, c)| (id, c.access_token)).unwrap())
            .collect();
        assert_eq!(
            first_pass,
            vec![
                ("c@x".to_owned(), "v2".to_owned()),
                ("a@x".to_owned(), "v1".to_owned()),
                ("b@x".to_owned(), "v1".to_owned()),
            ]
        );
        assert!(listing.next().is_none());

        listing.restart();
        assert_eq!(listing.account_ids().collect::<Vec<_>>(), vec!["c@x", "a@x", "b@x"]);
        assert_eq!(listing.count(), 3);

        let fresh = store.list().await.unwrap();
        assert_eq!(fresh.account_ids().last(), Some("d@x"));
    }

    #[tokio::test]
    async fn delete_reports_whether_a_record_existed() {
        let (_dir, store) = temp_store().await;
        store.put("a@x", &credential("a@x", "v1")).await.unwrap();

        assert!(store.delete("a@x").await.unwrap());
        assert!(!store.delete("a@x").await.unwrap());
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn reopened_store_sees_committed_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.db");
        {
            let store = crate::store::CredentialStore::open(&path).await.unwrap();
            store.put("a@x", &credential("a@x", "persisted")).await.unwrap();
        }
        let store = crate::store::CredentialStore::open(&path).await.unwrap();
        assert_eq!(store.get("a@x").await.unwrap().access_token, "persisted");
    }

    #[tokio::test]
    async fn concurrent_writers_are_serialized() {
        let (_dir, store) = temp_store().await;
        let mut tasks = tokio::task::JoinSet::new();
        for i in 0..16 {
            let store = store.clone();
            tasks.spawn(async move {
                let id = format!("user{}@x", i % 4);
                store.put(&id, &credential(&id, &format!("v{}", i))).await
            });
        }
        while let Some(res) = tasks.join_next().await {
            res.unwrap().unwrap();
        }
        assert_eq!(store.count().await.unwrap(), 4);
    }
}
