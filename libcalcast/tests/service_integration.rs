//! Integration tests for CalcastService
//!
//! Exercises the services together over both storage backends, with the
//! remote collaborators replaced by in-process mocks.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use libcalcast::generation::mock::MockGenerator;
use libcalcast::publishing::mock::MockPoster;
use libcalcast::service::posts::aggregate_stats;
use libcalcast::service::publish::SyncOutcome;
use libcalcast::service::CalcastService;
use libcalcast::{
    CalcastError, Config, Post, PostStats, PostStatus, RemoteError, SocialPlatform, Store,
};
use tempfile::TempDir;

fn at(year: i32, month: u32, day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
}

fn post(id: &str, when: NaiveDateTime) -> Post {
    let mut post = Post::new(format!("content of {}", id), when);
    post.id = id.to_string();
    post
}

fn memory_service(poster: MockPoster) -> CalcastService {
    CalcastService::with_parts(
        Store::in_memory(),
        Arc::new(MockGenerator::default()),
        Arc::new(poster),
        Config::default_config(),
    )
}

fn file_service(dir: &TempDir, poster: MockPoster) -> CalcastService {
    CalcastService::with_parts(
        Store::open(dir.path()).unwrap(),
        Arc::new(MockGenerator::default()),
        Arc::new(poster),
        Config::default_config(),
    )
}

#[test]
fn test_posts_on_day_selects_calendar_day() {
    let service = memory_service(MockPoster::success());
    service
        .posts()
        .create_many(vec![
            post("a", at(2024, 6, 1, 9)),
            post("b", at(2024, 6, 2, 9)),
            post("c", at(2024, 6, 1, 23)),
        ])
        .unwrap();

    let day = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
    let ids: Vec<_> = service
        .posts()
        .posts_on_day(day)
        .unwrap()
        .into_iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(ids, vec!["a", "c"]);

    let empty_day = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
    assert!(service.posts().posts_on_day(empty_day).unwrap().is_empty());
}

#[test]
fn test_aggregate_stats_over_published_posts() {
    let posts = vec![
        post("a", at(2024, 6, 1, 9))
            .with_status(PostStatus::Published)
            .with_stats(PostStats {
                likes: 5,
                shares: 1,
                comments: 0,
            }),
        post("b", at(2024, 6, 2, 9))
            .with_status(PostStatus::Published)
            .with_stats(PostStats {
                likes: 3,
                shares: 2,
                comments: 0,
            }),
    ];

    let totals = aggregate_stats(&posts);
    assert_eq!(totals.total_likes, 8);
    assert_eq!(totals.total_shares, 3);

    let service = memory_service(MockPoster::success());
    service.posts().create_many(posts).unwrap();
    let dashboard = service.posts().dashboard().unwrap();
    assert_eq!(dashboard.published, 2);
    assert_eq!(dashboard.total_likes, 8);
    assert_eq!(dashboard.total_shares, 3);
}

#[tokio::test]
async fn test_publish_without_key_keeps_draft() {
    let poster = MockPoster::success();
    let service = memory_service(poster.clone());
    service
        .posts()
        .create_many(vec![post("p1", at(2024, 6, 1, 9))])
        .unwrap();

    let err = service.publisher().publish_by_id("p1").await.unwrap_err();
    assert!(matches!(
        err,
        CalcastError::Remote(RemoteError::MissingCredential(_))
    ));
    assert_eq!(err.exit_code(), 2);
    assert_eq!(poster.publish_call_count(), 0);
    assert_eq!(
        service.posts().require("p1").unwrap().status,
        PostStatus::Draft
    );
}

#[tokio::test]
async fn test_rejected_publish_keeps_status() {
    let poster = MockPoster::publish_failure(RemoteError::Rejected(
        "Error posting to social networks".to_string(),
    ));
    let service = memory_service(poster);
    service.accounts().set_api_key("ayr-key").unwrap();
    let scheduled = post("p1", at(2024, 6, 1, 9)).with_status(PostStatus::Scheduled);
    service.posts().create_many(vec![scheduled.clone()]).unwrap();

    let err = service.publisher().publish_by_id("p1").await.unwrap_err();
    assert!(err.to_string().contains("Error posting to social networks"));
    assert_eq!(service.posts().require("p1").unwrap(), scheduled);
}

#[tokio::test]
async fn test_publish_persists_to_file_store() {
    let dir = TempDir::new().unwrap();
    {
        let service = file_service(&dir, MockPoster::success());
        service.accounts().set_api_key("ayr-key").unwrap();
        service
            .posts()
            .create_many(vec![post("p1", at(2024, 6, 1, 9))
                .with_platforms(vec![SocialPlatform::GoogleBusiness])])
            .unwrap();
        let report = service.publisher().publish_by_id("p1").await.unwrap();
        assert!(report.persisted);
    }

    let reopened = file_service(&dir, MockPoster::success());
    let stored = reopened.posts().require("p1").unwrap();
    assert_eq!(stored.status, PostStatus::Published);
    assert_eq!(stored.platforms, vec![SocialPlatform::GoogleBusiness]);
    assert!(reopened.accounts().has_api_key().unwrap());
    assert!(dir.path().join("posts.json").exists());
}

#[tokio::test]
async fn test_edit_then_sync_workflow() {
    let poster = MockPoster::success();
    let service = memory_service(poster.clone());
    service
        .posts()
        .create_many(vec![post("p1", at(2024, 6, 1, 9))])
        .unwrap();

    let mut edited = service.posts().require("p1").unwrap();
    edited.content = "Weekend special".to_string();
    edited.status = PostStatus::Scheduled;

    // No key yet: the edit is saved locally only
    let outcome = service.publisher().save_and_sync(edited.clone()).await.unwrap();
    assert_eq!(outcome, SyncOutcome::LocalOnly);
    assert_eq!(service.posts().require("p1").unwrap(), edited);

    service.accounts().set_api_key("ayr-key").unwrap();
    let outcome = service.publisher().save_and_sync(edited).await.unwrap();
    match outcome {
        SyncOutcome::Published(report) => {
            assert_eq!(report.post.content, "Weekend special");
            assert_eq!(report.post.status, PostStatus::Published);
        }
        other => panic!("expected Published, got {:?}", other),
    }
    assert_eq!(poster.published_ids(), vec!["p1"]);
}

#[test]
fn test_update_and_delete_missing_leave_store_untouched() {
    let dir = TempDir::new().unwrap();
    let service = file_service(&dir, MockPoster::success());
    service
        .posts()
        .create_many(vec![post("a", at(2024, 6, 1, 9))])
        .unwrap();
    let before = std::fs::read_to_string(dir.path().join("posts.json")).unwrap();

    assert!(!service
        .posts()
        .update(post("ghost", at(2024, 6, 1, 9)))
        .unwrap()
        .is_applied());
    assert!(!service.posts().delete("ghost").unwrap().is_applied());

    let after = std::fs::read_to_string(dir.path().join("posts.json")).unwrap();
    assert_eq!(before, after);
}

#[test]
fn test_concurrent_creates_are_not_lost() {
    let service = Arc::new(memory_service(MockPoster::success()));

    let handles: Vec<_> = (0..8)
        .map(|worker| {
            let service = Arc::clone(&service);
            std::thread::spawn(move || {
                for i in 0..10 {
                    let id = format!("w{}-{}", worker, i);
                    service
                        .posts()
                        .create_many(vec![post(&id, at(2024, 6, 1, 9))])
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(service.posts().all().unwrap().len(), 80);
}

#[test]
fn test_corrupt_posts_file_is_reported() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("posts.json"), "{not json").unwrap();
    let service = file_service(&dir, MockPoster::success());

    let err = service.posts().all().unwrap_err();
    assert!(matches!(err, CalcastError::Store(_)));
    assert!(err.to_string().contains("posts"));
}
