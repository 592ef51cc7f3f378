//! Free-text notes attached to friends. Plain CRUD; the only integrity
//! rule is that mutations must come from the note's owner, enforced as a
//! filter so "not owned" and "not found" are the same outcome.

use anyhow::anyhow;
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use uuid::Uuid;

use flock_db::models::NoteRow;
use flock_types::api::{CreateNoteRequest, NoteResponse, UpdateNoteRequest};

use crate::error::AppError;
use crate::session::Session;
use crate::state::AppState;

/// GET /friends/{friend_id}/notes
pub async fn list_notes(
    State(state): State<AppState>,
    session: Session,
    Path(friend_id): Path<String>,
) -> Result<Json<Vec<NoteResponse>>, AppError> {
    let db = state.store.db().ok_or(AppError::StorageUnavailable)?;
    let rows = db.get_notes(&session.user_id, &friend_id)?;
    let notes = rows
        .into_iter()
        .map(note_response)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(notes))
}

/// POST /friends/{friend_id}/notes
pub async fn create_note(
    State(state): State<AppState>,
    session: Session,
    Path(friend_id): Path<String>,
    Json(req): Json<CreateNoteRequest>,
) -> Result<(StatusCode, Json<NoteResponse>), AppError> {
    let db = state.store.db().ok_or(AppError::StorageUnavailable)?;

    let id = Uuid::new_v4();
    db.insert_note(&id.to_string(), &session.user_id, &friend_id, &req.content)?;

    Ok((
        StatusCode::CREATED,
        Json(NoteResponse {
            id,
            content: req.content,
        }),
    ))
}

/// PUT /friends/{friend_id}/notes/{note_id}
pub async fn update_note(
    State(state): State<AppState>,
    session: Session,
    Path((_friend_id, note_id)): Path<(String, String)>,
    Json(req): Json<UpdateNoteRequest>,
) -> Result<Json<NoteResponse>, AppError> {
    let db = state.store.db().ok_or(AppError::StorageUnavailable)?;

    let updated = db
        .update_note(&note_id, &session.user_id, &req.content)?
        .ok_or(AppError::NotFound)?;
    Ok(Json(note_response(updated)?))
}

/// DELETE /friends/{friend_id}/notes/{note_id}
pub async fn delete_note(
    State(state): State<AppState>,
    session: Session,
    Path((_friend_id, note_id)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    let db = state.store.db().ok_or(AppError::StorageUnavailable)?;

    if db.delete_note(&note_id, &session.user_id)? {
        Ok(StatusCode::OK)
    } else {
        Err(AppError::NotFound)
    }
}

fn note_response(row: NoteRow) -> Result<NoteResponse, AppError> {
    let id = Uuid::parse_str(&row.id)
        .map_err(|e| AppError::Storage(anyhow!("malformed note id {}: {}", row.id, e)))?;
    Ok(NoteResponse {
        id,
        content: row.content,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Store, test_state};
    use axum::Router;
    use axum::body::Body;
    use axum::http::{Request, header};
    use axum::routing::get;
    use flock_db::Database;
    use http_body_util::BodyExt;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn notes_router() -> Router {
        let db = Database::open_in_memory().unwrap();
        let state = test_state(Store::Connected(Arc::new(db)));
        Router::new()
            .route("/friends/{friend_id}/notes", get(list_notes).post(create_note))
            .route(
                "/friends/{friend_id}/notes/{note_id}",
                axum::routing::put(update_note).delete(delete_note),
            )
            .with_state(state)
    }

    fn cookies(user: &str) -> String {
        format!("access_token=at; access_token_secret=ats; twitter_id={user}")
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_create_then_list_roundtrip() {
        let app = notes_router();

        let response = app
            .clone()
            .oneshot(
                Request::post("/friends/42/notes")
                    .header(header::COOKIE, cookies("U"))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"content":"met at conf"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = body_json(response).await;
        assert_eq!(created["content"], "met at conf");

        let response = app
            .oneshot(
                Request::get("/friends/42/notes")
                    .header(header::COOKIE, cookies("U"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let listed = body_json(response).await;
        assert_eq!(listed.as_array().unwrap().len(), 1);
        assert_eq!(listed[0]["content"], "met at conf");
        assert_eq!(listed[0]["id"], created["id"]);
    }

    #[tokio::test]
    async fn test_notes_require_authentication() {
        let app = notes_router();
        let response = app
            .oneshot(
                Request::get("/friends/42/notes")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_cross_owner_mutation_reads_as_not_found() {
        let app = notes_router();

        let response = app
            .clone()
            .oneshot(
                Request::post("/friends/42/notes")
                    .header(header::COOKIE, cookies("owner"))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"content":"mine"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        let note_id = body_json(response).await["id"].as_str().unwrap().to_string();

        // A different user cannot update or delete it, and cannot tell the
        // note exists at all
        let response = app
            .clone()
            .oneshot(
                Request::put(format!("/friends/42/notes/{note_id}"))
                    .header(header::COOKIE, cookies("intruder"))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"content":"hijacked"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app
            .clone()
            .oneshot(
                Request::delete(format!("/friends/42/notes/{note_id}"))
                    .header(header::COOKIE, cookies("intruder"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        // The owner still sees the original content and can delete it
        let response = app
            .clone()
            .oneshot(
                Request::get("/friends/42/notes")
                    .header(header::COOKIE, cookies("owner"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let listed = body_json(response).await;
        assert_eq!(listed[0]["content"], "mine");

        let response = app
            .oneshot(
                Request::delete(format!("/friends/42/notes/{note_id}"))
                    .header(header::COOKIE, cookies("owner"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
