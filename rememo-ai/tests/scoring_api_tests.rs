//! /score and /score_clip end to end, with in-memory photo host and model

mod helpers;

use std::collections::HashSet;

use axum::http::StatusCode;
use serde_json::{json, Value};
use tower::ServiceExt;

use helpers::fakes::ScriptedModel;
use helpers::{body_json, offline_app_state, post_json, test_app_state};
use rememo_ai::build_router;
use rememo_ai::services::ContentPart;

fn photos(ids: std::ops::RangeInclusive<i64>) -> Vec<Value> {
    ids.map(|i| json!({"id": i, "photoUrl": format!("https://photos.test/{}.png", i)}))
        .collect()
}

fn id_list(json: &Value) -> Vec<i64> {
    json["recommendedPhotoIds"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_i64().unwrap())
        .collect()
}

#[tokio::test]
async fn test_empty_batch_recommends_nothing() {
    let model = ScriptedModel::silent();
    let app = build_router(test_app_state(model.clone()));

    for uri in ["/score", "/score_clip"] {
        let response = app
            .clone()
            .oneshot(post_json(uri, &json!({"images": [], "reference_images": []})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({"recommendedPhotoIds": []}));
    }
    assert_eq!(model.call_count(), 0);
}

#[tokio::test]
async fn test_collage_vote_returns_exactly_nine() {
    let model = ScriptedModel::replying(&["12, 3, 5, 99, 3, 1"]);
    let app = build_router(test_app_state(model.clone()));
    let body = json!({"images": photos(1..=12), "reference_images": photos(101..=102)});

    let response = app.oneshot(post_json("/score", &body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let ids = id_list(&body_json(response).await);
    assert_eq!(ids.len(), 9);

    let unique: HashSet<i64> = ids.iter().copied().collect();
    assert_eq!(unique.len(), 9);
    for required in [12, 3, 5, 1, 101, 102] {
        assert!(unique.contains(&required), "missing {}", required);
    }
    assert!(ids.iter().all(|id| (1..=12).contains(id) || *id == 101 || *id == 102));

    let calls = model.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    let (_, content) = &calls[0];
    let images = content
        .iter()
        .filter(|part| matches!(part, ContentPart::InputImage { .. }))
        .count();
    // one reference collage, one 4x4 candidate collage
    assert_eq!(images, 2);
}

#[tokio::test]
async fn test_collage_vote_survives_judge_failure() {
    let app = build_router(test_app_state(ScriptedModel::silent()));
    let body = json!({"images": photos(1..=12), "reference_images": photos(101..=101)});

    let response = app.oneshot(post_json("/score", &body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let ids = id_list(&body_json(response).await);
    assert_eq!(ids.len(), 9);
    assert!(ids.contains(&101));
    assert_eq!(ids.iter().collect::<HashSet<_>>().len(), 9);
}

#[tokio::test]
async fn test_collage_vote_with_small_pool() {
    let model = ScriptedModel::replying(&["2"]);
    let app = build_router(test_app_state(model));
    let body = json!({"images": photos(1..=3)});

    let response = app.oneshot(post_json("/score", &body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let mut ids = id_list(&body_json(response).await);
    assert_eq!(ids[0], 2);
    ids.sort_unstable();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_aesthetic_ranking_with_explanation() {
    let app = build_router(test_app_state(ScriptedModel::silent()));
    let body = json!({"images": photos(1..=14)});

    let response = app.oneshot(post_json("/score_clip?explain=true", &body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let ids = id_list(&json);
    assert_eq!(ids.len(), 10);
    assert_eq!(ids.iter().collect::<HashSet<_>>().len(), 10);

    let ranking = json["ranking"].as_array().unwrap();
    assert_eq!(ranking.len(), 10);
    let ranked_ids: Vec<i64> = ranking.iter().map(|r| r["id"].as_i64().unwrap()).collect();
    assert_eq!(ranked_ids, ids);

    let scores: Vec<f64> = ranking
        .iter()
        .map(|r| r["adjusted_score"].as_f64().unwrap())
        .collect();
    assert!(scores.windows(2).all(|w| w[0] >= w[1]));
    assert!(ranking.iter().all(|r| r["penalty_applied"].as_f64().unwrap() >= 0.0));
}

#[tokio::test]
async fn test_aesthetic_ranking_hides_explanation_by_default() {
    let app = build_router(test_app_state(ScriptedModel::silent()));
    let body = json!({"images": [
        {"id": "beach", "photoUrl": "https://photos.test/4.png"},
        {"id": "dinner", "photoUrl": "https://photos.test/9.png"},
    ]});

    let response = app.oneshot(post_json("/score_clip", &body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert!(json.get("ranking").is_none());
    let mut ids: Vec<&str> = json["recommendedPhotoIds"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect();
    ids.sort_unstable();
    assert_eq!(ids, vec!["beach", "dinner"]);
}

#[tokio::test]
async fn test_aesthetic_ranking_skips_failed_downloads() {
    let app = build_router(test_app_state(ScriptedModel::silent()));
    let body = json!({"images": [
        {"id": 1, "photoUrl": "https://photos.test/1.png"},
        {"id": 2, "photoUrl": "https://photos.test/missing.png"},
        {"id": 3, "photoUrl": "https://photos.test/3.png"},
    ]});

    let response = app.oneshot(post_json("/score_clip", &body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let mut ids = id_list(&body_json(response).await);
    ids.sort_unstable();
    assert_eq!(ids, vec![1, 3]);
}

#[tokio::test]
async fn test_invalid_photo_url_is_rejected() {
    let app = build_router(test_app_state(ScriptedModel::silent()));
    let body = json!({"images": [{"id": 1, "photoUrl": "file:///etc/passwd"}]});

    let response = app.oneshot(post_json("/score", &body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_total_outage_answers_502_with_empty_list() {
    for uri in ["/score", "/score_clip"] {
        let app = build_router(offline_app_state());
        let body = json!({"images": photos(1..=4)});

        let response = app.oneshot(post_json(uri, &body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY, "{}", uri);

        let json = body_json(response).await;
        assert_eq!(json["recommendedPhotoIds"], json!([]));
        assert_eq!(json["error"]["code"], "SCORING_UNAVAILABLE");
    }
}
