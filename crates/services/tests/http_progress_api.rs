use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use learn_core::model::{ProgressSnapshot, Tutorial, TutorialId, UserId};
use serde::Deserialize;
use services::{
    HttpProgressApi, ProgressApi, ProgressApiConfig, ProgressError, ProgressStore,
    StaticIdentity, SyncOutcome, TutorialCatalog,
};

type Db = Arc<Mutex<HashMap<String, Vec<u64>>>>;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompletionBody {
    user_id: String,
    tutorial_id: u64,
}

fn snapshot(user_id: &str, completed: &[u64]) -> ProgressSnapshot {
    ProgressSnapshot::new(
        UserId::new(user_id),
        completed.iter().copied().map(TutorialId::new).collect(),
    )
}

async fn fetch(
    State(db): State<Db>,
    Path(user_id): Path<String>,
) -> Result<Json<ProgressSnapshot>, StatusCode> {
    if user_id == "missing" {
        return Err(StatusCode::NOT_FOUND);
    }
    let db = db.lock().unwrap();
    let completed = db.get(&user_id).cloned().unwrap_or_default();
    Ok(Json(snapshot(&user_id, &completed)))
}

async fn complete(State(db): State<Db>, Json(body): Json<CompletionBody>) -> Json<ProgressSnapshot> {
    let mut db = db.lock().unwrap();
    let completed = db.entry(body.user_id.clone()).or_default();
    if !completed.contains(&body.tutorial_id) {
        completed.push(body.tutorial_id);
    }
    Json(snapshot(&body.user_id, completed))
}

async fn remove_completion(State(db): State<Db>, Json(body): Json<CompletionBody>) -> StatusCode {
    let mut db = db.lock().unwrap();
    if let Some(completed) = db.get_mut(&body.user_id) {
        completed.retain(|id| *id != body.tutorial_id);
    }
    StatusCode::NO_CONTENT
}

async fn remove_all(State(db): State<Db>, Path(user_id): Path<String>) -> StatusCode {
    db.lock().unwrap().remove(&user_id);
    StatusCode::NO_CONTENT
}

async fn spawn_backend(db: Db) -> HttpProgressApi {
    let app = Router::new()
        .route("/api/progress/complete-tutorial", post(complete))
        .route("/api/progress/remove-completion", delete(remove_completion))
        .route("/api/progress/remove-all/{user_id}", delete(remove_all))
        .route("/api/progress/{user_id}", get(fetch))
        .with_state(db);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let config = ProgressApiConfig::new(&format!("http://{addr}/api/progress")).unwrap();
    HttpProgressApi::new(config)
}

#[tokio::test]
async fn fetch_reads_stored_progress() {
    let db = Db::default();
    db.lock().unwrap().insert("u-1".into(), vec![3, 1]);
    let api = spawn_backend(db).await;

    let progress = api.fetch(&UserId::new("u-1")).await.unwrap();
    assert_eq!(progress, snapshot("u-1", &[3, 1]));
}

#[tokio::test]
async fn non_success_status_is_an_error() {
    let api = spawn_backend(Db::default()).await;

    let err = api.fetch(&UserId::new("missing")).await.unwrap_err();
    assert!(matches!(err, ProgressError::HttpStatus(status) if status == StatusCode::NOT_FOUND));
}

#[tokio::test]
async fn mutations_reach_the_backend() {
    let db = Db::default();
    let api = spawn_backend(db.clone()).await;
    let user = UserId::new("u-2");

    let progress = api.complete(&user, TutorialId::new(5)).await.unwrap();
    assert_eq!(progress, snapshot("u-2", &[5]));
    api.complete(&user, TutorialId::new(6)).await.unwrap();

    api.remove_completion(&user, TutorialId::new(5)).await.unwrap();
    assert_eq!(db.lock().unwrap().get("u-2").cloned(), Some(vec![6]));

    api.remove_all(&user).await.unwrap();
    assert!(db.lock().unwrap().get("u-2").is_none());
}

#[tokio::test]
async fn unreachable_backend_is_a_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let api = HttpProgressApi::new(
        ProgressApiConfig::new(&format!("http://{addr}/api/progress")).unwrap(),
    );

    let err = api.fetch(&UserId::new("u")).await.unwrap_err();
    assert!(matches!(err, ProgressError::Http(_)));
}

#[tokio::test]
async fn store_round_trips_through_http() {
    let db = Db::default();
    db.lock().unwrap().insert("u-3".into(), vec![1]);
    let api = spawn_backend(db.clone()).await;
    let catalog = TutorialCatalog::new(vec![
        Tutorial::titled(1, 1, "A"),
        Tutorial::titled(2, 2, "B"),
    ]);

    let store = ProgressStore::connect(
        Arc::new(api),
        Arc::new(StaticIdentity::signed_in("u-3")),
        catalog,
    )
    .await;
    assert!(store.is_completed(TutorialId::new(1)));

    assert_eq!(store.mark_completed(TutorialId::new(2)).await, SyncOutcome::Applied);
    assert_eq!(store.percentage_stream().current(), 100.0);
    assert!(store.progress_card_view().current().is_path_finished());

    assert_eq!(store.mark_not_completed(TutorialId::new(1)).await, SyncOutcome::Applied);
    assert_eq!(db.lock().unwrap().get("u-3").cloned(), Some(vec![2]));

    assert_eq!(store.reset_all().await, SyncOutcome::Applied);
    assert_eq!(store.current_progress(), snapshot("u-3", &[]));
}
