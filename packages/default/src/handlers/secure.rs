use crate::auth::AuthenticatedUser;
use axum::Json;
use serde_json::{Value, json};

pub async fn root() -> Json<Value> {
    Json(json!({ "message": "Stack Catalogue backend is running" }))
}

/// Echoes the verified caller back; a cheap way to check a token end to end.
pub async fn secure_data(AuthenticatedUser(user): AuthenticatedUser) -> Json<Value> {
    Json(json!({
        "message": format!("Hello {}, this is secure data.", user.email)
    }))
}
