use chrono::Utc;

use gatehouse_server::{
    repositories::{refresh_tokens, users},
    services::registry,
    utils::{hashing, jwt},
};

mod support;

async fn seed_user(pool: &sqlx::SqlitePool, email: &str) -> String {
    let hash = hashing::hash_secret("secret1").expect("hash password");
    let user = users::create(pool, email, "Test User", &hash)
        .await
        .expect("create user");
    user.id
}

#[tokio::test]
async fn stored_token_validates_to_its_owner() {
    let pool = support::test_pool().await;
    let config = support::test_config();
    let user_id = seed_user(&pool, "a@x.com").await;

    let pair = registry::issue_session(&pool, &config, &user_id)
        .await
        .expect("issue session");

    let matched = registry::validate(&pool, &config, &pair.refresh_token)
        .await
        .expect("validate")
        .expect("token should match a record");
    assert_eq!(matched.user_id, user_id);
}

#[tokio::test]
async fn validate_rejects_foreign_and_unregistered_tokens() {
    let pool = support::test_pool().await;
    let config = support::test_config();
    let user_id = seed_user(&pool, "a@x.com").await;
    registry::issue_session(&pool, &config, &user_id)
        .await
        .expect("issue session");

    // Signed with a different key: signature check fails before any scan.
    let foreign = jwt::issue_refresh_token("other-secret", 7).unwrap();
    assert!(registry::validate(&pool, &config, &foreign.token)
        .await
        .unwrap()
        .is_none());

    // Correct key, but never stored in the registry: possession of valid
    // bytes without a matching record is useless.
    let unregistered = jwt::issue_refresh_token(&config.jwt_secret, 7).unwrap();
    assert!(registry::validate(&pool, &config, &unregistered.token)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn rotation_is_single_use() {
    let pool = support::test_pool().await;
    let config = support::test_config();
    let user_id = seed_user(&pool, "a@x.com").await;
    let pair = registry::issue_session(&pool, &config, &user_id)
        .await
        .expect("issue session");

    let (rotated_user, new_pair) = registry::rotate(&pool, &config, &pair.refresh_token)
        .await
        .expect("first rotation succeeds");
    assert_eq!(rotated_user, user_id);
    assert_ne!(new_pair.refresh_token, pair.refresh_token);

    // The presented record was revoked before the replacement was issued, so
    // exactly one record stays active.
    let active = refresh_tokens::count_active_for_user(&pool, &user_id, Utc::now())
        .await
        .unwrap();
    assert_eq!(active, 1);

    // Replay of the rotated token fails.
    let replay = registry::rotate(&pool, &config, &pair.refresh_token).await;
    assert!(replay.is_err());
}

#[tokio::test]
async fn revoke_all_clears_every_active_session() {
    let pool = support::test_pool().await;
    let config = support::test_config();
    let user_id = seed_user(&pool, "a@x.com").await;
    let other_id = seed_user(&pool, "b@x.com").await;

    registry::issue_session(&pool, &config, &user_id).await.unwrap();
    registry::issue_session(&pool, &config, &user_id).await.unwrap();
    let other_pair = registry::issue_session(&pool, &config, &other_id).await.unwrap();

    let revoked = registry::revoke_all_for_user(&pool, &user_id).await.unwrap();
    assert_eq!(revoked, 2);

    let active = refresh_tokens::count_active_for_user(&pool, &user_id, Utc::now())
        .await
        .unwrap();
    assert_eq!(active, 0);

    // Other users' sessions are untouched.
    assert!(registry::validate(&pool, &config, &other_pair.refresh_token)
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn revoke_presented_is_a_noop_for_unknown_tokens() {
    let pool = support::test_pool().await;
    let config = support::test_config();
    let user_id = seed_user(&pool, "a@x.com").await;
    let pair = registry::issue_session(&pool, &config, &user_id).await.unwrap();

    assert!(registry::revoke_presented(&pool, &config, &pair.refresh_token)
        .await
        .unwrap());
    // Second revoke of the same token: no match, no error.
    assert!(!registry::revoke_presented(&pool, &config, &pair.refresh_token)
        .await
        .unwrap());
    assert!(!registry::revoke_presented(&pool, &config, "garbage")
        .await
        .unwrap());
}

#[tokio::test]
async fn purge_deletes_only_dead_rows() {
    let pool = support::test_pool().await;
    let config = support::test_config();
    let user_id = seed_user(&pool, "a@x.com").await;

    let live = registry::issue_session(&pool, &config, &user_id).await.unwrap();
    let revoked = registry::issue_session(&pool, &config, &user_id).await.unwrap();
    registry::revoke_presented(&pool, &config, &revoked.refresh_token)
        .await
        .unwrap();

    let purged = refresh_tokens::purge_stale(&pool, Utc::now()).await.unwrap();
    assert_eq!(purged, 1);

    assert!(registry::validate(&pool, &config, &live.refresh_token)
        .await
        .unwrap()
        .is_some());
}
