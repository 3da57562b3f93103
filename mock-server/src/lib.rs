//! In-memory REST peer for exercising resources over real HTTP.
//!
//! Serves a `notes` collection, an `/echo` endpoint that reflects the
//! request back as JSON, and `/status/{code}` which answers with any status.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::{Method, StatusCode, Uri},
    routing::{any, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Note {
    pub id: Uuid,
    pub author: String,
    pub text: String,
}

#[derive(Deserialize)]
pub struct CreateNote {
    pub author: String,
    #[serde(default)]
    pub text: String,
}

/// Only the text of a note is editable; other fields in the body are ignored.
#[derive(Deserialize)]
pub struct UpdateNote {
    pub text: String,
}

#[derive(Deserialize)]
pub struct NoteFilter {
    pub author: Option<String>,
}

/// What `/echo` saw.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Echo {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub body: String,
}

pub type Db = Arc<RwLock<HashMap<Uuid, Note>>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(HashMap::new()));
    Router::new()
        .route("/notes", get(list_notes).post(create_note))
        .route("/notes/{id}", get(get_note).put(update_note).delete(delete_note))
        .route("/echo", any(echo))
        .route("/echo/{*rest}", any(echo))
        .route("/status/{code}", any(status))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn list_notes(State(db): State<Db>, Query(filter): Query<NoteFilter>) -> Json<Vec<Note>> {
    let notes = db.read().await;
    let mut found: Vec<Note> = notes
        .values()
        .filter(|note| filter.author.as_ref().map_or(true, |author| &note.author == author))
        .cloned()
        .collect();
    found.sort_by(|a, b| a.text.cmp(&b.text));
    Json(found)
}

async fn create_note(
    State(db): State<Db>,
    Json(input): Json<CreateNote>,
) -> (StatusCode, Json<Note>) {
    let note = Note {
        id: Uuid::new_v4(),
        author: input.author,
        text: input.text,
    };
    tracing::debug!(id = %note.id, "created note");
    db.write().await.insert(note.id, note.clone());
    (StatusCode::CREATED, Json(note))
}

async fn get_note(State(db): State<Db>, Path(id): Path<Uuid>) -> Result<Json<Note>, StatusCode> {
    let notes = db.read().await;
    notes.get(&id).cloned().map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn update_note(
    State(db): State<Db>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateNote>,
) -> Result<Json<Note>, StatusCode> {
    let mut notes = db.write().await;
    let note = notes.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    note.text = input.text;
    Ok(Json(note.clone()))
}

async fn delete_note(State(db): State<Db>, Path(id): Path<Uuid>) -> Result<StatusCode, StatusCode> {
    let mut notes = db.write().await;
    notes.remove(&id).map(|_| StatusCode::NO_CONTENT).ok_or(StatusCode::NOT_FOUND)
}

async fn echo(method: Method, uri: Uri, body: String) -> Json<Echo> {
    Json(Echo {
        method: method.to_string(),
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        body,
    })
}

async fn status(Path(code): Path<u16>) -> (StatusCode, String) {
    let status = StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_REQUEST);
    (status, format!("status {}", status.as_u16()))
}
