use tally_core::error::AppError;
use tally_core::models::{NewReward, RewardUpdate};
use tally_db::{PrizeFilter, PrizeRepository, UserRepository};
use uuid::Uuid;

use crate::common::{seed_user, setup_test_db};

fn movie_night() -> NewReward {
    NewReward {
        title: "Movie night".into(),
        description: "Pick the film".into(),
        points: 30,
        image_url: None,
        owner_id: None,
    }
}

#[tokio::test]
async fn reward_crud() {
    let (pool, _container) = setup_test_db().await;
    let repo = PrizeRepository::new(pool);

    let reward = repo.create_reward(&movie_night()).await.unwrap();
    assert_eq!(reward.points, 30);
    assert!(reward.owner_id.is_none());

    let updated = repo
        .update_reward(
            reward.id,
            &RewardUpdate {
                points: Some(25),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .expect("Should find reward");
    assert_eq!(updated.points, 25);
    assert_eq!(updated.title, "Movie night");

    assert!(repo.delete_reward(reward.id).await.unwrap());
    assert!(repo.get_reward(reward.id).await.unwrap().is_none());
}

#[tokio::test]
async fn reward_update_can_clear_image() {
    let (pool, _container) = setup_test_db().await;
    let repo = PrizeRepository::new(pool);

    let reward = repo
        .create_reward(&NewReward {
            image_url: Some("https://cdn.example.com/popcorn.png".into()),
            ..movie_night()
        })
        .await
        .unwrap();

    // Omitted Option<Option<_>> field leaves the image alone
    let untouched = repo
        .update_reward(
            reward.id,
            &RewardUpdate {
                points: Some(25),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .expect("Should find reward");
    assert!(untouched.image_url.is_some());

    let cleared = repo
        .update_reward(
            reward.id,
            &RewardUpdate {
                image_url: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .expect("Should find reward");
    assert!(cleared.image_url.is_none());
}

#[tokio::test]
async fn reward_with_unknown_owner_is_not_found() {
    let (pool, _container) = setup_test_db().await;
    let repo = PrizeRepository::new(pool);

    let err = repo
        .create_reward(&NewReward {
            owner_id: Some(Uuid::new_v4()),
            ..movie_night()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound { ref resource, .. } if resource == "user"), "got {err:?}");
}

#[tokio::test]
async fn redeem_deducts_points_and_snapshots_reward() {
    let (pool, _container) = setup_test_db().await;
    let prizes = PrizeRepository::new(pool.clone());
    let users = UserRepository::new(pool.clone());
    let user = seed_user(&pool, "ada@example.com", 50).await;

    let reward = prizes.create_reward(&movie_night()).await.unwrap();
    let prize = prizes.redeem(reward.id, user.id).await.unwrap();

    assert_eq!(prize.title, "Movie night");
    assert_eq!(prize.points, 30);
    assert_eq!(prize.owner_id, user.id);
    assert_eq!(prize.reward_id, Some(reward.id));
    assert!(!prize.completed);

    let user = users.get(user.id).await.unwrap().unwrap();
    assert_eq!(user.points, 20);

    // Later catalog edits leave the snapshot untouched
    prizes
        .update_reward(
            reward.id,
            &RewardUpdate {
                title: Some("Renamed".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let prize = prizes.get_prize(prize.id).await.unwrap().unwrap();
    assert_eq!(prize.title, "Movie night");
}

#[tokio::test]
async fn redeem_without_enough_points_fails() {
    let (pool, _container) = setup_test_db().await;
    let prizes = PrizeRepository::new(pool.clone());
    let users = UserRepository::new(pool.clone());
    let user = seed_user(&pool, "ada@example.com", 10).await;

    let reward = prizes.create_reward(&movie_night()).await.unwrap();
    let err = prizes.redeem(reward.id, user.id).await.unwrap_err();

    assert!(
        matches!(
            err,
            AppError::InsufficientPoints {
                required: 30,
                available: 10
            }
        ),
        "got {err:?}"
    );

    // Balance untouched on failure
    let user = users.get(user.id).await.unwrap().unwrap();
    assert_eq!(user.points, 10);
}

#[tokio::test]
async fn redeem_unknown_reward_or_user_is_not_found() {
    let (pool, _container) = setup_test_db().await;
    let prizes = PrizeRepository::new(pool.clone());
    let user = seed_user(&pool, "ada@example.com", 100).await;

    let err = prizes.redeem(Uuid::new_v4(), user.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound { ref resource, .. } if resource == "reward"), "got {err:?}");

    let reward = prizes.create_reward(&movie_night()).await.unwrap();
    let err = prizes.redeem(reward.id, Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound { ref resource, .. } if resource == "user"), "got {err:?}");
}

#[tokio::test]
async fn share_is_idempotent_and_feeds_inventory() {
    let (pool, _container) = setup_test_db().await;
    let prizes = PrizeRepository::new(pool.clone());
    let owner = seed_user(&pool, "owner@example.com", 50).await;
    let friend = seed_user(&pool, "friend@example.com", 0).await;

    let reward = prizes.create_reward(&movie_night()).await.unwrap();
    let prize = prizes.redeem(reward.id, owner.id).await.unwrap();

    let shared = prizes.share(prize.id, friend.id).await.unwrap().unwrap();
    assert_eq!(shared.shared_with, vec![friend.id]);

    let shared = prizes.share(prize.id, friend.id).await.unwrap().unwrap();
    assert_eq!(shared.shared_with, vec![friend.id]);

    assert!(shared.is_visible_to(friend.id));

    let inventory = prizes.inventory(friend.id).await.unwrap();
    assert_eq!(inventory.len(), 1);
    assert_eq!(inventory[0].id, prize.id);

    let unshared = prizes.unshare(prize.id, friend.id).await.unwrap().unwrap();
    assert!(unshared.shared_with.is_empty());
    assert!(prizes.inventory(friend.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn share_with_unknown_user_is_not_found() {
    let (pool, _container) = setup_test_db().await;
    let prizes = PrizeRepository::new(pool.clone());
    let owner = seed_user(&pool, "owner@example.com", 50).await;

    let reward = prizes.create_reward(&movie_night()).await.unwrap();
    let prize = prizes.redeem(reward.id, owner.id).await.unwrap();

    let err = prizes.share(prize.id, Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound { ref resource, .. } if resource == "user"), "got {err:?}");
}

#[tokio::test]
async fn complete_prize_only_once() {
    let (pool, _container) = setup_test_db().await;
    let prizes = PrizeRepository::new(pool.clone());
    let owner = seed_user(&pool, "owner@example.com", 50).await;

    let reward = prizes.create_reward(&movie_night()).await.unwrap();
    let prize = prizes.redeem(reward.id, owner.id).await.unwrap();

    let consumed = prizes.complete_prize(prize.id).await.unwrap();
    assert!(consumed.completed);

    let err = prizes.complete_prize(prize.id).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)), "got {err:?}");
}

#[tokio::test]
async fn list_prizes_hides_consumed_by_default() {
    let (pool, _container) = setup_test_db().await;
    let prizes = PrizeRepository::new(pool.clone());
    let owner = seed_user(&pool, "owner@example.com", 100).await;

    let reward = prizes.create_reward(&movie_night()).await.unwrap();
    let p1 = prizes.redeem(reward.id, owner.id).await.unwrap();
    let p2 = prizes.redeem(reward.id, owner.id).await.unwrap();
    prizes.complete_prize(p1.id).await.unwrap();

    let open = prizes
        .list_prizes(&PrizeFilter {
            owner_id: Some(owner.id),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].id, p2.id);

    let all = prizes
        .list_prizes(&PrizeFilter {
            owner_id: Some(owner.id),
            include_completed: true,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(all.len(), 2);
}

#[tokio::test]
async fn deleting_reward_keeps_prizes() {
    let (pool, _container) = setup_test_db().await;
    let prizes = PrizeRepository::new(pool.clone());
    let owner = seed_user(&pool, "owner@example.com", 50).await;

    let reward = prizes.create_reward(&movie_night()).await.unwrap();
    let prize = prizes.redeem(reward.id, owner.id).await.unwrap();

    prizes.delete_reward(reward.id).await.unwrap();

    let prize = prizes.get_prize(prize.id).await.unwrap().unwrap();
    assert!(prize.reward_id.is_none());
    assert_eq!(prize.title, "Movie night");
}
