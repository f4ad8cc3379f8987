//! Behavioural coverage for the recipe endpoints.

use actix_web::http::StatusCode;
use actix_web::test as actix_test;
use serde_json::{Value, json};

use crate::inbound::http::test_utils::{self, read_json};

/// Magic bytes sufficient for PNG format detection.
const PNG_BYTES: &[u8] = &[
    0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, b'I', b'H', b'D',
    b'R',
];

#[actix_web::test]
async fn create_returns_detail_with_reconciled_labels() {
    let app = test_utils::init_app().await;
    let token = test_utils::register_and_login(&app, "create@example.com", "pw123").await;

    let response = actix_test::call_service(
        &app,
        test_utils::authed(actix_test::TestRequest::post().uri("/api/recipe/recipes"), &token)
            .set_json(json!({
                "title": "Thai curry",
                "time_minutes": 30,
                "price": "12.50",
                "link": "https://example.com/curry",
                "description": "Fragrant and quick.",
                "tags": [{ "name": "Thai" }, { "name": "Dinner" }],
                "ingredients": [{ "name": "Coconut milk" }],
            }))
            .to_request(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = read_json(response).await;
    assert_eq!(body["title"], "Thai curry");
    assert_eq!(body["price"], "12.50");
    assert_eq!(body["description"], "Fragrant and quick.");
    assert_eq!(body["image"], Value::Null);
    let tag_names: Vec<&str> = body["tags"]
        .as_array()
        .expect("tags array")
        .iter()
        .map(|tag| tag["name"].as_str().expect("name"))
        .collect();
    assert_eq!(tag_names.len(), 2);
    assert!(tag_names.contains(&"Thai") && tag_names.contains(&"Dinner"));
    assert_eq!(body["ingredients"][0]["name"], "Coconut milk");
}

#[actix_web::test]
async fn create_reuses_existing_labels_instead_of_duplicating() {
    let app = test_utils::init_app().await;
    let token = test_utils::register_and_login(&app, "reuse@example.com", "pw123").await;

    let first = test_utils::create_recipe(
        &app,
        &token,
        json!({ "title": "One", "time_minutes": 5, "price": "1.00",
                "tags": [{ "name": "Dinner" }] }),
    )
    .await;
    let second = test_utils::create_recipe(
        &app,
        &token,
        json!({ "title": "Two", "time_minutes": 5, "price": "1.00",
                "tags": [{ "name": "Dinner" }] }),
    )
    .await;

    assert_eq!(first["tags"][0]["id"], second["tags"][0]["id"]);

    let tags = test_utils::fetch_json(&app, &token, "/api/recipe/tags").await;
    assert_eq!(tags.as_array().expect("array").len(), 1);
}

#[actix_web::test]
async fn list_is_newest_first_and_omits_detail_fields() {
    let app = test_utils::init_app().await;
    let token = test_utils::register_and_login(&app, "list@example.com", "pw123").await;

    test_utils::create_recipe(
        &app,
        &token,
        json!({ "title": "First", "time_minutes": 5, "price": "1.00" }),
    )
    .await;
    test_utils::create_recipe(
        &app,
        &token,
        json!({ "title": "Second", "time_minutes": 5, "price": "1.00" }),
    )
    .await;

    let body = test_utils::fetch_json(&app, &token, "/api/recipe/recipes").await;
    let items = body.as_array().expect("array body");
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["title"], "Second");
    assert_eq!(items[1]["title"], "First");
    assert!(items[0].get("description").is_none());
    assert!(items[0].get("image").is_none());
}

#[actix_web::test]
async fn list_filters_by_tag_and_ingredient_ids() {
    let app = test_utils::init_app().await;
    let token = test_utils::register_and_login(&app, "filter@example.com", "pw123").await;

    let curry = test_utils::create_recipe(
        &app,
        &token,
        json!({ "title": "Curry", "time_minutes": 30, "price": "8.00",
                "tags": [{ "name": "Vegan" }] }),
    )
    .await;
    let stew = test_utils::create_recipe(
        &app,
        &token,
        json!({ "title": "Stew", "time_minutes": 60, "price": "9.00",
                "tags": [{ "name": "Hearty" }] }),
    )
    .await;
    test_utils::create_recipe(
        &app,
        &token,
        json!({ "title": "Plain", "time_minutes": 10, "price": "2.00" }),
    )
    .await;

    let vegan_id = curry["tags"][0]["id"].as_i64().expect("id");
    let hearty_id = stew["tags"][0]["id"].as_i64().expect("id");

    let body = test_utils::fetch_json(
        &app,
        &token,
        &format!("/api/recipe/recipes?tags={vegan_id},{hearty_id}"),
    )
    .await;
    let titles: Vec<&str> = body
        .as_array()
        .expect("array body")
        .iter()
        .map(|item| item["title"].as_str().expect("title"))
        .collect();
    assert_eq!(titles, vec!["Stew", "Curry"]);

    let body = test_utils::fetch_json(
        &app,
        &token,
        &format!("/api/recipe/recipes?tags={vegan_id}"),
    )
    .await;
    let titles: Vec<&str> = body
        .as_array()
        .expect("array body")
        .iter()
        .map(|item| item["title"].as_str().expect("title"))
        .collect();
    assert_eq!(titles, vec!["Curry"]);
}

#[actix_web::test]
async fn list_returns_each_recipe_once_even_with_multiple_matching_labels() {
    let app = test_utils::init_app().await;
    let token = test_utils::register_and_login(&app, "dedup@example.com", "pw123").await;

    let recipe = test_utils::create_recipe(
        &app,
        &token,
        json!({ "title": "Both", "time_minutes": 15, "price": "5.00",
                "tags": [{ "name": "A" }, { "name": "B" }] }),
    )
    .await;
    let a = recipe["tags"][0]["id"].as_i64().expect("id");
    let b = recipe["tags"][1]["id"].as_i64().expect("id");

    let body = test_utils::fetch_json(
        &app,
        &token,
        &format!("/api/recipe/recipes?tags={a},{b}"),
    )
    .await;
    assert_eq!(body.as_array().expect("array body").len(), 1);
}

#[actix_web::test]
async fn list_rejects_malformed_filter_ids() {
    let app = test_utils::init_app().await;
    let token = test_utils::register_and_login(&app, "badfilter@example.com", "pw123").await;

    let response = actix_test::call_service(
        &app,
        test_utils::authed(
            actix_test::TestRequest::get().uri("/api/recipe/recipes?tags=1,abc"),
            &token,
        )
        .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn patch_with_empty_tag_list_clears_associations() {
    let app = test_utils::init_app().await;
    let token = test_utils::register_and_login(&app, "clear@example.com", "pw123").await;

    let recipe = test_utils::create_recipe(
        &app,
        &token,
        json!({ "title": "Tagged", "time_minutes": 10, "price": "3.00",
                "tags": [{ "name": "Gone" }] }),
    )
    .await;
    let id = recipe["id"].as_i64().expect("id");

    let response = actix_test::call_service(
        &app,
        test_utils::authed(
            actix_test::TestRequest::patch().uri(&format!("/api/recipe/recipes/{id}")),
            &token,
        )
        .set_json(json!({ "tags": [] }))
        .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = read_json(response).await;
    assert_eq!(body["tags"], json!([]));
}

#[actix_web::test]
async fn patch_omitting_tags_leaves_associations_untouched() {
    let app = test_utils::init_app().await;
    let token = test_utils::register_and_login(&app, "keep@example.com", "pw123").await;

    let recipe = test_utils::create_recipe(
        &app,
        &token,
        json!({ "title": "Kept", "time_minutes": 10, "price": "3.00",
                "tags": [{ "name": "Sticky" }] }),
    )
    .await;
    let id = recipe["id"].as_i64().expect("id");

    let response = actix_test::call_service(
        &app,
        test_utils::authed(
            actix_test::TestRequest::patch().uri(&format!("/api/recipe/recipes/{id}")),
            &token,
        )
        .set_json(json!({ "title": "Renamed" }))
        .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = read_json(response).await;
    assert_eq!(body["title"], "Renamed");
    assert_eq!(body["tags"][0]["name"], "Sticky");
}

#[actix_web::test]
async fn patch_replaces_label_set_via_get_or_create() {
    let app = test_utils::init_app().await;
    let token = test_utils::register_and_login(&app, "swap@example.com", "pw123").await;

    // "Lunch" already exists from another recipe and must be reused.
    test_utils::create_recipe(
        &app,
        &token,
        json!({ "title": "Other", "time_minutes": 5, "price": "2.00",
                "tags": [{ "name": "Lunch" }] }),
    )
    .await;
    let recipe = test_utils::create_recipe(
        &app,
        &token,
        json!({ "title": "Main", "time_minutes": 10, "price": "4.00",
                "tags": [{ "name": "Breakfast" }] }),
    )
    .await;
    let id = recipe["id"].as_i64().expect("id");

    let response = actix_test::call_service(
        &app,
        test_utils::authed(
            actix_test::TestRequest::patch().uri(&format!("/api/recipe/recipes/{id}")),
            &token,
        )
        .set_json(json!({ "tags": [{ "name": "Lunch" }] }))
        .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = read_json(response).await;
    let names: Vec<&str> = body["tags"]
        .as_array()
        .expect("tags array")
        .iter()
        .map(|tag| tag["name"].as_str().expect("name"))
        .collect();
    assert_eq!(names, vec!["Lunch"]);

    // No duplicate "Lunch" label was created.
    let tags = test_utils::fetch_json(&app, &token, "/api/recipe/tags").await;
    let lunch_count = tags
        .as_array()
        .expect("array")
        .iter()
        .filter(|tag| tag["name"] == "Lunch")
        .count();
    assert_eq!(lunch_count, 1);
}

#[actix_web::test]
async fn put_replaces_scalar_fields() {
    let app = test_utils::init_app().await;
    let token = test_utils::register_and_login(&app, "put@example.com", "pw123").await;

    let recipe = test_utils::create_recipe(
        &app,
        &token,
        json!({ "title": "Before", "time_minutes": 10, "price": "3.00" }),
    )
    .await;
    let id = recipe["id"].as_i64().expect("id");

    let response = actix_test::call_service(
        &app,
        test_utils::authed(
            actix_test::TestRequest::put().uri(&format!("/api/recipe/recipes/{id}")),
            &token,
        )
        .set_json(json!({ "title": "After", "time_minutes": 20, "price": 6.5 }))
        .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = read_json(response).await;
    assert_eq!(body["title"], "After");
    assert_eq!(body["time_minutes"], 20);
    assert_eq!(body["price"], "6.50");
}

#[actix_web::test]
async fn foreign_recipes_are_not_found_for_every_verb() {
    let app = test_utils::init_app().await;
    let owner = test_utils::register_and_login(&app, "mine@example.com", "pw123").await;
    let intruder = test_utils::register_and_login(&app, "thief@example.com", "pw123").await;

    let recipe = test_utils::create_recipe(
        &app,
        &owner,
        json!({ "title": "Secret", "time_minutes": 10, "price": "3.00" }),
    )
    .await;
    let id = recipe["id"].as_i64().expect("id");
    let uri = format!("/api/recipe/recipes/{id}");

    for request in [
        actix_test::TestRequest::get().uri(&uri),
        actix_test::TestRequest::patch()
            .uri(&uri)
            .set_json(json!({ "title": "Hacked" })),
        actix_test::TestRequest::delete().uri(&uri),
    ] {
        let response =
            actix_test::call_service(&app, test_utils::authed(request, &intruder).to_request())
                .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    // The record is untouched for its owner.
    let response = actix_test::call_service(
        &app,
        test_utils::authed(actix_test::TestRequest::get().uri(&uri), &owner).to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = read_json(response).await;
    assert_eq!(body["title"], "Secret");
}

#[actix_web::test]
async fn delete_removes_the_recipe() {
    let app = test_utils::init_app().await;
    let token = test_utils::register_and_login(&app, "del@example.com", "pw123").await;

    let recipe = test_utils::create_recipe(
        &app,
        &token,
        json!({ "title": "Doomed", "time_minutes": 5, "price": "1.00" }),
    )
    .await;
    let id = recipe["id"].as_i64().expect("id");

    let response = actix_test::call_service(
        &app,
        test_utils::authed(
            actix_test::TestRequest::delete().uri(&format!("/api/recipe/recipes/{id}")),
            &token,
        )
        .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = actix_test::call_service(
        &app,
        test_utils::authed(
            actix_test::TestRequest::get().uri(&format!("/api/recipe/recipes/{id}")),
            &token,
        )
        .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn uploading_a_non_image_fails_without_mutating_the_record() {
    let app = test_utils::init_app().await;
    let token = test_utils::register_and_login(&app, "noimg@example.com", "pw123").await;

    let recipe = test_utils::create_recipe(
        &app,
        &token,
        json!({ "title": "Plain", "time_minutes": 5, "price": "1.00" }),
    )
    .await;
    let id = recipe["id"].as_i64().expect("id");

    let response = actix_test::call_service(
        &app,
        test_utils::authed(
            actix_test::TestRequest::post()
                .uri(&format!("/api/recipe/recipes/{id}/upload-image")),
            &token,
        )
        .set_payload("definitely not an image")
        .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = actix_test::call_service(
        &app,
        test_utils::authed(
            actix_test::TestRequest::get().uri(&format!("/api/recipe/recipes/{id}")),
            &token,
        )
        .to_request(),
    )
    .await;
    let body: Value = read_json(response).await;
    assert_eq!(body["image"], Value::Null);
}

#[actix_web::test]
async fn uploading_an_image_stores_it_and_replaces_the_previous_file() {
    let app = test_utils::init_app().await;
    let token = test_utils::register_and_login(&app, "img@example.com", "pw123").await;

    let recipe = test_utils::create_recipe(
        &app,
        &token,
        json!({ "title": "Pretty", "time_minutes": 5, "price": "1.00" }),
    )
    .await;
    let id = recipe["id"].as_i64().expect("id");
    let uri = format!("/api/recipe/recipes/{id}/upload-image");

    let first = actix_test::call_service(
        &app,
        test_utils::authed(actix_test::TestRequest::post().uri(&uri), &token)
            .set_payload(PNG_BYTES)
            .to_request(),
    )
    .await;
    assert_eq!(first.status(), StatusCode::OK);
    let first_body: Value = read_json(first).await;
    let first_path = first_body["image"].as_str().expect("path").to_owned();
    assert!(first_path.ends_with(".png"));

    let second = actix_test::call_service(
        &app,
        test_utils::authed(actix_test::TestRequest::post().uri(&uri), &token)
            .set_payload(PNG_BYTES)
            .to_request(),
    )
    .await;
    assert_eq!(second.status(), StatusCode::OK);
    let second_body: Value = read_json(second).await;
    let second_path = second_body["image"].as_str().expect("path").to_owned();
    assert_ne!(first_path, second_path);

    // Detail view reflects the replacement.
    let detail = actix_test::call_service(
        &app,
        test_utils::authed(
            actix_test::TestRequest::get().uri(&format!("/api/recipe/recipes/{id}")),
            &token,
        )
        .to_request(),
    )
    .await;
    let body: Value = read_json(detail).await;
    assert_eq!(body["image"], second_path.as_str());
}

#[actix_web::test]
async fn unauthenticated_access_is_rejected() {
    let app = test_utils::init_app().await;

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri("/api/recipe/recipes")
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
