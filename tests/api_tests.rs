use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use serde_json::json;

use movie_rating_predictor::{
    api::{create_router, AppState},
    models::EntityKind,
    store::{FactorTable, ModelStore, MovieCatalog, SimilarityMatrix},
};

const USER_FACTORS: &str = "id,features\n\
                            1,\"[1.0, 0.0]\"\n\
                            2,\"[2.0, 1.0]\"\n\
                            3,\"[0.5, 0.5]\"\n";

const MOVIE_FACTORS: &str = "id,features\n\
                             10,\"[1.0, 0.0]\"\n\
                             20,\"[2.0, 2.0]\"\n\
                             30,\"[0.1, 0.1]\"\n";

// user 4 has no factors but is an exact match of user 2
const USER_SIMILARITY: &str = ",1,2,3,4\n\
                               1,1.0,0.3,0.2,0.3\n\
                               2,0.3,1.0,0.1,1.0\n\
                               3,0.2,0.1,1.0,0.1\n\
                               4,0.3,1.0,0.1,1.0\n";

const MOVIE_TITLES: &str = "movieId,title,genres\n\
                            10,Heat (1995),Action\n\
                            20,Casino (1995),Crime\n";

fn create_test_server(max_batch_size: usize) -> TestServer {
    let store = ModelStore::new(
        FactorTable::from_reader(EntityKind::User, USER_FACTORS.as_bytes()).unwrap(),
        FactorTable::from_reader(EntityKind::Movie, MOVIE_FACTORS.as_bytes()).unwrap(),
    )
    .with_similarity(
        EntityKind::User,
        SimilarityMatrix::from_reader(USER_SIMILARITY.as_bytes()).unwrap(),
    )
    .with_catalog(MovieCatalog::from_reader(MOVIE_TITLES.as_bytes()).unwrap());

    let state = AppState::with_batch_limit(store, max_batch_size);
    TestServer::new(create_router(state)).unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let server = create_test_server(100);
    let response = server.get("/health").await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_model_info() {
    let server = create_test_server(100);
    let response = server.get("/api/v1/model").await;
    response.assert_status_ok();

    let info: serde_json::Value = response.json();
    assert_eq!(info["users"]["entries"], 3);
    assert_eq!(info["users"]["dimension"], 2);
    assert_eq!(info["users"]["similarity_entities"], 4);
    assert_eq!(info["movies"]["entries"], 3);
    assert!(info["movies"]["similarity_entities"].is_null());
    assert_eq!(info["catalog_titles"], 2);
}

#[tokio::test]
async fn test_get_factors() {
    let server = create_test_server(100);
    let response = server.get("/api/v1/factors/movie/20").await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    assert_eq!(body["kind"], "movie");
    assert_eq!(body["id"], 20);
    assert_eq!(body["features"], json!([2.0, 2.0]));
}

#[tokio::test]
async fn test_get_factors_not_found() {
    let server = create_test_server(100);
    let response = server.get("/api/v1/factors/user/4").await;
    response.assert_status(StatusCode::NOT_FOUND);

    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "user 4 has no stored factors");
}

#[tokio::test]
async fn test_get_factors_unknown_kind() {
    let server = create_test_server(100);
    let response = server.get("/api/v1/factors/actor/1").await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_predict() {
    let server = create_test_server(100);
    let response = server
        .post("/api/v1/predict")
        .json(&json!({ "user": 2, "movie": 10 }))
        .await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    assert_eq!(body["user"], 2);
    assert_eq!(body["movie"], 10);
    assert_eq!(body["rating"], 2.0);
    assert_eq!(body["title"], "Heat (1995)");
    assert!(body.get("unavailable").is_none());
}

#[tokio::test]
async fn test_predict_clamps_high_ratings() {
    let server = create_test_server(100);
    let response = server
        .post("/api/v1/predict")
        .json(&json!({ "user": 2, "movie": 20 }))
        .await;

    let body: serde_json::Value = response.json();
    assert_eq!(body["rating"], 5.0);
}

#[tokio::test]
async fn test_predict_unknown_user_uses_similar_user() {
    let server = create_test_server(100);
    let response = server
        .post("/api/v1/predict")
        .json(&json!({ "user": 4, "movie": 10 }))
        .await;
    response.assert_status_ok();

    // same factors as user 2
    let body: serde_json::Value = response.json();
    assert_eq!(body["rating"], 2.0);
}

#[tokio::test]
async fn test_predict_unavailable_is_not_a_rating() {
    let server = create_test_server(100);
    let response = server
        .post("/api/v1/predict")
        .json(&json!({ "user": 1, "movie": 99 }))
        .await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    assert!(body["rating"].is_null());
    assert_eq!(body["unavailable"], "no_fallback_available");
}

#[tokio::test]
async fn test_batch_prediction_ordering() {
    let server = create_test_server(100);
    let response = server
        .post("/api/v1/predictions")
        .json(&json!([
            { "user": 3, "movie": 20 },
            { "user": 1, "movie": 30 },
            { "user": 1, "movie": 99 },
            { "user": 2, "movie": 10 },
            { "user": 1, "movie": 20 },
            { "user": 2, "movie": 20 }
        ]))
        .await;
    response.assert_status_ok();

    let predictions: Vec<serde_json::Value> = response.json();
    let order: Vec<(i64, i64)> = predictions
        .iter()
        .map(|p| (p["user"].as_i64().unwrap(), p["movie"].as_i64().unwrap()))
        .collect();

    assert_eq!(
        order,
        vec![(1, 20), (1, 30), (1, 99), (2, 20), (2, 10), (3, 20)]
    );
    assert_eq!(predictions[0]["rating"], 2.0);
    assert_eq!(predictions[1]["rating"], 1.0);
    assert!(predictions[2]["rating"].is_null());
    assert_eq!(predictions[3]["rating"], 5.0);
}

#[tokio::test]
async fn test_batch_prediction_rejects_empty_batch() {
    let server = create_test_server(100);
    let response = server.post("/api/v1/predictions").json(&json!([])).await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_batch_prediction_rejects_oversized_batch() {
    let server = create_test_server(2);
    let response = server
        .post("/api/v1/predictions")
        .json(&json!([
            { "user": 1, "movie": 10 },
            { "user": 2, "movie": 10 },
            { "user": 3, "movie": 10 }
        ]))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_request_id_echoed() {
    let server = create_test_server(100);
    let response = server
        .get("/health")
        .add_header(
            HeaderName::from_static("x-request-id"),
            HeaderValue::from_static("batch-42"),
        )
        .await;

    assert_eq!(
        response.headers().get("x-request-id").unwrap(),
        "batch-42"
    );
}

#[tokio::test]
async fn test_request_id_generated() {
    let server = create_test_server(100);
    let response = server.get("/health").await;
    assert!(response.headers().get("x-request-id").is_some());
}
