//! Request handlers for the control API

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::application::services::connection_service::ConnectionState;
use crate::domain::entities::chat_id_for_phone;
use crate::domain::traits::BotStatus;
use super::server::ControlState;

/// Manual send request from the panel
#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct SendMessageResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct MessagesResponse {
    pub messages: Vec<serde_json::Value>,
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

fn error(status: StatusCode, message: &str, details: Option<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.to_string(),
            details,
        }),
    )
        .into_response()
}

/// GET /api/status
pub async fn get_status(State(state): State<ControlState>) -> Json<BotStatus> {
    let snapshot = state.status.borrow().clone();
    Json(BotStatus {
        connected: snapshot.connected(),
        qr_code: snapshot.pairing_code().map(str::to_string),
    })
}

/// POST /api/send-message
pub async fn post_send_message(
    State(state): State<ControlState>,
    body: Result<Json<SendMessageRequest>, JsonRejection>,
) -> Response {
    let snapshot = state.status.borrow().clone();

    if !snapshot.initialized || snapshot.state == ConnectionState::Disabled {
        return error(
            StatusCode::SERVICE_UNAVAILABLE,
            "WhatsApp no inicializado. Reintentando...",
            None,
        );
    }

    if !snapshot.connected() {
        return error(StatusCode::BAD_REQUEST, "WhatsApp no esta conectado", None);
    }

    let body = match body {
        Ok(Json(body)) => body,
        Err(rejection) => {
            return error(
                StatusCode::BAD_REQUEST,
                "Telefono y mensaje son requeridos",
                Some(rejection.body_text()),
            );
        }
    };

    let phone = body.phone.trim();
    if phone.is_empty() || body.message.trim().is_empty() {
        return error(StatusCode::BAD_REQUEST, "Telefono y mensaje son requeridos", None);
    }

    let chat_id = chat_id_for_phone(phone);
    match state.provider.send_message(&chat_id, &body.message).await {
        Ok(_) => {
            tracing::info!("Manual message sent to {}", chat_id);
            (
                StatusCode::OK,
                Json(SendMessageResponse {
                    success: true,
                    message: "Mensaje enviado".to_string(),
                }),
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!("Error sending message to {}: {}", chat_id, e);
            error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error al enviar mensaje",
                Some(e.to_string()),
            )
        }
    }
}

/// GET /api/messages
///
/// Messages are not persisted, so the list is always empty.
pub async fn get_messages() -> Json<MessagesResponse> {
    Json(MessagesResponse { messages: Vec::new() })
}
