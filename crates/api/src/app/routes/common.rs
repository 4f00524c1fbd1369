use axum::Json;

use crate::app::dto::MessageResponse;

/// `{"message": "<Kind> deleted successfully"}`.
pub fn deleted(kind: &str) -> Json<MessageResponse> {
    Json(MessageResponse::new(format!("{kind} deleted successfully")))
}
