use crate::db::connection::seed_demo_data;
use crate::tests::utils::{get_json, init_test_db, insert_listing, insert_user, ListingFixture};

fn titles(body: &serde_json::Value, key: &str) -> Vec<String> {
    body[key]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["title"].as_str().unwrap().to_string())
        .collect()
}

fn seed_catalog(db: &crate::db::connection::Database) {
    insert_user(db, 1, "Rajesh", "host", None);
    insert_listing(
        db,
        &ListingFixture {
            price: Some(7999.0),
            is_featured: true,
            city: Some("Sankri"),
            created_at: "2025-02-01 10:00:00",
            ..ListingFixture::trek(1, 1, "Kedarkantha")
        },
    );
    insert_listing(
        db,
        &ListingFixture {
            price: Some(2499.0),
            city: Some("McLeod Ganj"),
            created_at: "2025-02-03 10:00:00",
            ..ListingFixture::trek(2, 1, "Triund")
        },
    );
    insert_listing(
        db,
        &ListingFixture {
            price: Some(12999.0),
            duration_days: Some(7),
            city: Some("Sankri"),
            created_at: "2025-02-02 10:00:00",
            ..ListingFixture::trek(3, 1, "Har Ki Dun")
        },
    );
    insert_listing(
        db,
        &ListingFixture {
            kind: "service",
            created_at: "2025-02-04 10:00:00",
            ..ListingFixture::trek(4, 1, "Rafting Guide")
        },
    );
    insert_listing(
        db,
        &ListingFixture {
            status: "inactive",
            ..ListingFixture::trek(5, 1, "Closed Trek")
        },
    );
}

#[test]
fn posts_are_featured_first_then_newest() {
    let db = init_test_db();
    seed_catalog(&db);

    let (status, body) = get_json(&db, "/api/posts");
    assert_eq!(status, 200);
    assert_eq!(body["total"], 4);
    assert_eq!(
        titles(&body, "posts"),
        vec!["Kedarkantha", "Rafting Guide", "Triund", "Har Ki Dun"]
    );
}

#[test]
fn posts_are_paginated() {
    let db = init_test_db();
    seed_catalog(&db);

    let (_, body) = get_json(&db, "/api/posts?postType=trek&limit=2&page=2");
    assert_eq!(body["total"], 3);
    assert_eq!(body["totalPages"], 2);
    assert_eq!(body["page"], 2);
    assert_eq!(body["count"], 1);
    assert_eq!(titles(&body, "posts"), vec!["Har Ki Dun"]);

    let (status, _) = get_json(&db, "/api/posts?page=0");
    assert_eq!(status, 400);
}

#[test]
fn post_filters_combine() {
    let db = init_test_db();
    seed_catalog(&db);

    let (_, body) = get_json(&db, "/api/posts?city=sankri&minDays=5");
    assert_eq!(titles(&body, "posts"), vec!["Har Ki Dun"]);

    let (_, body) = get_json(&db, "/api/posts?status=inactive");
    assert_eq!(titles(&body, "posts"), vec!["Closed Trek"]);

    let (status, _) = get_json(&db, "/api/posts?postType=hotel");
    assert_eq!(status, 400);
}

#[test]
fn treks_sort_by_requested_field() {
    let db = init_test_db();
    seed_catalog(&db);

    let (_, body) = get_json(&db, "/api/posts/treks?sortBy=price.perPerson&order=asc");
    assert_eq!(titles(&body, "treks"), vec!["Triund", "Kedarkantha", "Har Ki Dun"]);

    let (_, body) = get_json(&db, "/api/posts/treks");
    assert_eq!(titles(&body, "treks"), vec!["Triund", "Har Ki Dun", "Kedarkantha"]);

    let (_, body) = get_json(&db, "/api/posts/treks?order=asc");
    assert_eq!(titles(&body, "treks"), vec!["Kedarkantha", "Har Ki Dun", "Triund"]);

    // Unknown sort fields fall back to newest first.
    let (_, body) = get_json(&db, "/api/posts/treks?sortBy=popularity&order=asc");
    assert_eq!(titles(&body, "treks"), vec!["Triund", "Har Ki Dun", "Kedarkantha"]);
}

#[test]
fn featured_treks_only() {
    let db = init_test_db();
    seed_catalog(&db);

    let (_, body) = get_json(&db, "/api/posts/featured/treks");
    assert_eq!(body["count"], 1);
    assert_eq!(titles(&body, "posts"), vec!["Kedarkantha"]);
}

#[test]
fn single_post_or_404() {
    let db = init_test_db();
    seed_catalog(&db);

    let (status, body) = get_json(&db, "/api/posts/3");
    assert_eq!(status, 200);
    assert_eq!(body["post"]["title"], "Har Ki Dun");
    assert_eq!(body["post"]["duration"]["days"], 7);

    let (status, body) = get_json(&db, "/api/posts/999");
    assert_eq!(status, 404);
    assert_eq!(body["success"], false);

    let (status, _) = get_json(&db, "/api/posts/abc");
    assert_eq!(status, 400);
}

#[test]
fn unknown_routes_are_404_and_health_is_ok() {
    let db = init_test_db();

    let (status, _) = get_json(&db, "/api/nothing-here");
    assert_eq!(status, 404);

    let (status, body) = get_json(&db, "/health");
    assert_eq!(status, 200);
    assert_eq!(body["status"], "ok");
}

#[test]
fn demo_data_loads_and_can_be_reapplied() {
    let db = init_test_db();
    seed_demo_data(&db).expect("seed");
    seed_demo_data(&db).expect("reseed");

    let (_, body) = get_json(&db, "/api/posts?postType=trek&limit=50");
    assert_eq!(body["total"], 8);

    let (_, body) = get_json(&db, "/api/posts/top-rated/treks?limit=2");
    assert_eq!(titles(&body, "treks"), vec!["Hampta Pass Trek", "Kedarkantha Summit Trek"]);
    assert_eq!(body["treks"][1]["averageRating"], 4.7);
    assert_eq!(body["treks"][1]["reviewCount"], 3);
}

#[test]
fn oversized_page_or_limit_is_rejected() {
    let db = init_test_db();
    seed_catalog(&db);

    for uri in [
        "/api/posts?page=18446744073709551615&limit=20",
        "/api/posts?limit=18446744073709551615",
        "/api/posts/treks?page=9223372036854775807&limit=2",
        "/api/reviews/host/1?page=18446744073709551615",
        "/api/posts/top-rated/treks?limit=18446744073709551615",
    ] {
        let (status, body) = get_json(&db, uri);
        assert_eq!(status, 400, "{uri}");
        assert_eq!(body["success"], false);
    }

    let (status, body) = get_json(&db, "/api/posts?limit=9223372036854775807");
    assert_eq!(status, 200);
    assert_eq!(body["total"], 4);
    assert_eq!(body["totalPages"], 1);
}

#[test]
fn single_trek_is_kind_restricted() {
    let db = init_test_db();
    seed_catalog(&db);

    let (status, body) = get_json(&db, "/api/posts/treks/5");
    assert_eq!(status, 200);
    assert_eq!(body["trek"]["title"], "Closed Trek");

    let (status, body) = get_json(&db, "/api/posts/treks/4");
    assert_eq!(status, 404);
    assert_eq!(body["message"], "Trek not found");

    let (status, _) = get_json(&db, "/api/posts/treks/nope");
    assert_eq!(status, 400);
}

#[test]
fn all_treks_are_paged_with_a_wider_default() {
    let db = init_test_db();
    insert_user(&db, 1, "Rajesh", "host", None);
    for id in 1..=55 {
        insert_listing(&db, &ListingFixture::trek(id, 1, "Trek"));
    }
    insert_listing(
        &db,
        &ListingFixture {
            is_featured: true,
            ..ListingFixture::trek(56, 1, "Featured Trek")
        },
    );

    let (status, body) = get_json(&db, "/api/posts/all/treks?postType=service");
    assert_eq!(status, 200);
    assert_eq!(body["total"], 56);
    assert_eq!(body["count"], 50);
    assert_eq!(body["totalPages"], 2);
    assert_eq!(body["posts"][0]["title"], "Featured Trek");

    let (_, body) = get_json(&db, "/api/posts/all/treks?page=2");
    assert_eq!(body["count"], 6);
}

#[test]
fn user_posts_include_every_status() {
    let db = init_test_db();
    seed_catalog(&db);
    insert_user(&db, 2, "Priya", "host", None);
    insert_listing(&db, &ListingFixture::trek(6, 2, "Someone Else's Trek"));

    let (status, body) = get_json(&db, "/api/posts/user/1");
    assert_eq!(status, 200);
    assert_eq!(body["count"], 5);
    assert!(titles(&body, "posts").contains(&"Closed Trek".to_string()));
    assert!(!titles(&body, "posts").contains(&"Someone Else's Trek".to_string()));
    assert_eq!(titles(&body, "posts")[0], "Rafting Guide");

    let (_, body) = get_json(&db, "/api/posts/user/99");
    assert_eq!(body["count"], 0);
}
