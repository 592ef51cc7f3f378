use serde::{Deserialize, Serialize};
use uuid::Uuid;

// -- Notes --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateNoteRequest {
    pub content: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateNoteRequest {
    pub content: String,
}

/// What note routes return: id + content only, the owner/friend ids are
/// implied by the request path and session.
#[derive(Debug, Serialize, Deserialize)]
pub struct NoteResponse {
    pub id: Uuid,
    pub content: String,
}
