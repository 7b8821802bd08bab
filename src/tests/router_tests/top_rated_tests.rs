use crate::errors::ServerError;
use crate::router::handle;
use crate::tests::utils::{
    get_json, init_test_db, insert_listing, insert_review, insert_user, ListingFixture,
};
use astra::Body;
use http::{Method, Request};

fn ids(body: &serde_json::Value, key: &str) -> Vec<i64> {
    body[key]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["id"].as_i64().unwrap())
        .collect()
}

#[test]
fn host_average_is_rounded_and_threshold_applies() {
    let db = init_test_db();
    insert_user(&db, 1, "Hema", "host", Some("Dehradun"));
    insert_user(&db, 2, "Gopal", "host", Some("Manali"));
    for guest in 10..14 {
        insert_user(&db, guest, "Guest", "guest", None);
    }
    insert_review(&db, 1, 10, None, 5);
    insert_review(&db, 1, 11, None, 5);
    insert_review(&db, 1, 12, None, 4);
    insert_review(&db, 2, 13, None, 2);

    let (status, body) = get_json(&db, "/api/users/top-rated/hosts?minRating=3");
    assert_eq!(status, 200);
    assert_eq!(body["count"], 1);

    let host = &body["hosts"][0];
    assert_eq!(host["id"], 1);
    assert_eq!(host["averageRating"], 4.7);
    assert_eq!(host["reviewCount"], 3);
    assert_eq!(host["location"]["city"], "Dehradun");
    assert!(host.get("password_hash").is_none());
}

#[test]
fn hosts_carry_post_counts() {
    let db = init_test_db();
    insert_user(&db, 1, "Hema", "host", None);
    insert_user(&db, 10, "Guest", "guest", None);
    insert_listing(&db, &ListingFixture::trek(1, 1, "Kedarkantha"));
    insert_listing(&db, &ListingFixture { status: "inactive", ..ListingFixture::trek(2, 1, "Old Trek") });
    insert_listing(&db, &ListingFixture { kind: "service", ..ListingFixture::trek(3, 1, "Guide") });
    insert_review(&db, 1, 10, Some(1), 5);

    let (_, body) = get_json(&db, "/top-rated-hosts");
    let host = &body["hosts"][0];
    assert_eq!(host["totalPosts"], 3);
    assert_eq!(host["activePosts"], 2);
    assert_eq!(host["postsByType"]["trek"], 2);
    assert_eq!(host["postsByType"]["service"], 1);
    assert_eq!(host["postsByType"]["experience"], 0);
}

#[test]
fn reviews_of_non_hosts_are_dropped() {
    let db = init_test_db();
    insert_user(&db, 1, "Hema", "host", None);
    insert_user(&db, 2, "Gita", "guest", None);
    insert_user(&db, 10, "Guest", "guest", None);
    insert_review(&db, 1, 10, None, 3);
    insert_review(&db, 2, 10, None, 5);

    let (_, body) = get_json(&db, "/api/users/top-rated/hosts");
    assert_eq!(ids(&body, "hosts"), vec![1]);
}

#[test]
fn location_filter_runs_after_the_limit() {
    let db = init_test_db();
    insert_user(&db, 1, "Hema", "host", Some("Dehradun"));
    insert_user(&db, 2, "Gopal", "host", Some("Manali"));
    insert_user(&db, 3, "Ishaan", "host", Some("Dehradun"));
    insert_user(&db, 10, "Guest", "guest", None);
    insert_review(&db, 1, 10, None, 5);
    insert_review(&db, 2, 10, None, 4);
    insert_review(&db, 3, 10, None, 3);

    let (_, body) = get_json(&db, "/api/users/top-rated/hosts?location=dehradun");
    assert_eq!(ids(&body, "hosts"), vec![1, 3]);

    // Host 3 matches the location but ranks below the cap.
    let (_, body) = get_json(&db, "/api/users/top-rated/hosts?location=dehradun&limit=2");
    assert_eq!(ids(&body, "hosts"), vec![1]);

    let (_, body) = get_json(&db, "/api/users/top-rated/hosts?location=manali&limit=1");
    assert_eq!(body["count"], 0);
}

#[test]
fn top_treks_skip_inactive_and_other_kinds() {
    let db = init_test_db();
    insert_user(&db, 1, "Hema", "host", None);
    insert_user(&db, 10, "Guest A", "guest", None);
    insert_user(&db, 11, "Guest B", "guest", None);
    insert_listing(&db, &ListingFixture::trek(1, 1, "Kedarkantha"));
    insert_listing(&db, &ListingFixture::trek(2, 1, "Nag Tibba"));
    insert_listing(&db, &ListingFixture { status: "inactive", ..ListingFixture::trek(3, 1, "Closed") });
    insert_listing(&db, &ListingFixture { kind: "experience", ..ListingFixture::trek(4, 1, "Cafe Walk") });

    insert_review(&db, 1, 10, Some(1), 4);
    insert_review(&db, 1, 11, Some(1), 5);
    insert_review(&db, 1, 10, Some(2), 4);
    insert_review(&db, 1, 10, Some(3), 5);
    insert_review(&db, 1, 10, Some(4), 5);

    let (status, body) = get_json(&db, "/api/posts/top-rated/treks");
    assert_eq!(status, 200);
    assert_eq!(ids(&body, "treks"), vec![1, 2]);
    assert_eq!(body["treks"][0]["averageRating"], 4.5);
    assert_eq!(body["treks"][0]["reviewCount"], 2);
    assert_eq!(body["treks"][0]["user"]["firstname"], "Hema");
}

#[test]
fn equal_averages_rank_by_review_count() {
    let db = init_test_db();
    insert_user(&db, 1, "Hema", "host", None);
    for guest in 10..13 {
        insert_user(&db, guest, "Guest", "guest", None);
    }
    insert_listing(&db, &ListingFixture::trek(1, 1, "One review"));
    insert_listing(&db, &ListingFixture::trek(2, 1, "Three reviews"));
    insert_review(&db, 1, 10, Some(1), 4);
    for guest in 10..13 {
        insert_review(&db, 1, guest, Some(2), 4);
    }

    let (_, body) = get_json(&db, "/top-rated-treks");
    assert_eq!(ids(&body, "treks"), vec![2, 1]);
}

#[test]
fn empty_review_table_gives_empty_lists() {
    let db = init_test_db();
    insert_user(&db, 1, "Hema", "host", None);
    insert_listing(&db, &ListingFixture::trek(1, 1, "Kedarkantha"));

    let (status, body) = get_json(&db, "/api/posts/top-rated/treks");
    assert_eq!(status, 200);
    assert_eq!(body["count"], 0);
    assert_eq!(body["treks"], serde_json::json!([]));

    let (_, body) = get_json(&db, "/api/users/top-rated/hosts");
    assert_eq!(body["hosts"], serde_json::json!([]));
}

#[test]
fn repeated_calls_return_the_same_ranking() {
    let db = init_test_db();
    for host in 1..4 {
        insert_user(&db, host, "Host", "host", None);
    }
    insert_user(&db, 10, "Guest", "guest", None);
    insert_review(&db, 1, 10, None, 4);
    insert_review(&db, 2, 10, None, 4);
    insert_review(&db, 3, 10, None, 5);

    let (_, first) = get_json(&db, "/api/users/top-rated/hosts");
    let (_, second) = get_json(&db, "/api/users/top-rated/hosts");
    assert_eq!(first, second);
    assert_eq!(ids(&first, "hosts"), vec![3, 1, 2]);
}

#[test]
fn invalid_min_rating_and_limit_are_rejected() {
    let db = init_test_db();

    for uri in [
        "/api/users/top-rated/hosts?minRating=6",
        "/api/users/top-rated/hosts?minRating=-1",
        "/api/posts/top-rated/treks?minRating=high",
    ] {
        let req = Request::builder()
            .method(Method::GET)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let err = handle(req, &db).expect_err("should reject");
        assert!(matches!(err, ServerError::InvalidMinRating), "{uri}: {err:?}");
    }

    let (status, body) = get_json(&db, "/api/posts/top-rated/treks?limit=0");
    assert_eq!(status, 400);
    assert_eq!(body["message"], "Invalid limit value. Must be a positive number");
}
