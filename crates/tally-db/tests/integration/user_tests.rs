use tally_core::error::AppError;
use tally_core::models::{NewUser, UserUpdate};
use tally_db::UserRepository;

use crate::common::{seed_user, setup_test_db};

#[tokio::test]
async fn create_and_get_user() {
    let (pool, _container) = setup_test_db().await;
    let repo = UserRepository::new(pool);

    let user = repo
        .create(&NewUser {
            name: "Ada".into(),
            email: "ada@example.com".into(),
            avatar: Some("owl".into()),
        })
        .await
        .unwrap();

    assert_eq!(user.name, "Ada");
    assert_eq!(user.points, 0);

    let fetched = repo.get(user.id).await.unwrap().expect("Should find user");
    assert_eq!(fetched.email, "ada@example.com");
    assert_eq!(fetched.avatar.as_deref(), Some("owl"));
}

#[tokio::test]
async fn duplicate_email_is_conflict() {
    let (pool, _container) = setup_test_db().await;
    let repo = UserRepository::new(pool);

    let new_user = NewUser {
        name: "Ada".into(),
        email: "ada@example.com".into(),
        avatar: None,
    };
    repo.create(&new_user).await.unwrap();

    let err = repo.create(&new_user).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)), "got {err:?}");
}

#[tokio::test]
async fn update_leaves_unset_fields_alone() {
    let (pool, _container) = setup_test_db().await;
    let repo = UserRepository::new(pool.clone());
    let user = seed_user(&pool, "ada@example.com", 0).await;

    let updated = repo
        .update(
            user.id,
            &UserUpdate {
                name: Some("Ada Lovelace".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .expect("Should find user");

    assert_eq!(updated.name, "Ada Lovelace");
    assert_eq!(updated.email, "ada@example.com");
}

#[tokio::test]
async fn update_can_clear_avatar() {
    let (pool, _container) = setup_test_db().await;
    let repo = UserRepository::new(pool);

    let user = repo
        .create(&NewUser {
            name: "Ada".into(),
            email: "ada@example.com".into(),
            avatar: Some("owl".into()),
        })
        .await
        .unwrap();

    // Omitted Option<Option<_>> field leaves the avatar alone
    let untouched = repo
        .update(
            user.id,
            &UserUpdate {
                name: Some("Ada Lovelace".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .expect("Should find user");
    assert_eq!(untouched.avatar.as_deref(), Some("owl"));

    let cleared = repo
        .update(
            user.id,
            &UserUpdate {
                avatar: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .expect("Should find user");
    assert!(cleared.avatar.is_none());
}

#[tokio::test]
async fn adjust_points_clamps_at_zero() {
    let (pool, _container) = setup_test_db().await;
    let repo = UserRepository::new(pool.clone());
    let user = seed_user(&pool, "ada@example.com", 10).await;
    assert_eq!(user.points, 10);

    let balance = repo.adjust_points(user.id, -25).await.unwrap();
    assert_eq!(balance, Some(0));

    let balance = repo.adjust_points(user.id, 7).await.unwrap();
    assert_eq!(balance, Some(7));
}

#[tokio::test]
async fn adjust_points_unknown_user_returns_none() {
    let (pool, _container) = setup_test_db().await;
    let repo = UserRepository::new(pool);

    let balance = repo.adjust_points(uuid::Uuid::new_v4(), 5).await.unwrap();
    assert!(balance.is_none());
}

#[tokio::test]
async fn delete_user() {
    let (pool, _container) = setup_test_db().await;
    let repo = UserRepository::new(pool.clone());
    let user = seed_user(&pool, "ada@example.com", 0).await;

    assert!(repo.delete(user.id).await.unwrap());
    assert!(repo.get(user.id).await.unwrap().is_none());
    assert!(!repo.delete(user.id).await.unwrap());
}
