/**
 * Contact Routes
 * Contact details and the contact form
 */
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};

use super::{is_valid_email, non_blank, AppState};
use crate::backend::{
    create,
    models::{ContactMessage, MessageStatus, NewContactMessage},
    Table,
};

const SEND_FAILED: &str = "Failed to send message. Please try again.";

const REQUIRED_FIELDS: &str = "Please fill in all required fields";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub subject: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ContactResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Cleared after a successful send, otherwise the submitted values.
    pub form: ContactForm,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContactCard {
    pub title: &'static str,
    pub details: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct ContactInfoResponse {
    pub cards: Vec<ContactCard>,
    pub emergency_phone: &'static str,
}

fn validate(form: &ContactForm) -> Result<NewContactMessage, &'static str> {
    let required = [&form.name, &form.email, &form.subject, &form.message];
    // A malformed email counts as a missing one.
    if required.iter().any(|field| field.trim().is_empty()) || !is_valid_email(&form.email) {
        return Err(REQUIRED_FIELDS);
    }
    Ok(NewContactMessage {
        name: form.name.clone(),
        email: form.email.clone(),
        phone: non_blank(&form.phone),
        subject: form.subject.clone(),
        message: form.message.clone(),
        status: MessageStatus::New,
    })
}

/// GET /api/contact/info
pub async fn contact_info() -> impl IntoResponse {
    Json(ContactInfoResponse {
        cards: vec![
            ContactCard {
                title: "Phone",
                details: vec!["+1 (555) 123-4567", "Emergency: +1 (555) 911-0000"],
            },
            ContactCard {
                title: "Email",
                details: vec!["info@healthcareplus.com", "appointments@healthcareplus.com"],
            },
            ContactCard {
                title: "Address",
                details: vec!["123 Medical Center Drive", "Healthcare City, HC 12345"],
            },
            ContactCard {
                title: "Hours",
                details: vec!["Emergency: 24/7", "Outpatient: Mon-Sat 8AM-8PM"],
            },
        ],
        emergency_phone: "+15559110000",
    })
}

/// POST /api/contact
pub async fn submit_message(
    State(state): State<AppState>,
    Json(form): Json<ContactForm>,
) -> impl IntoResponse {
    let new_message = match validate(&form) {
        Ok(message) => message,
        Err(error) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ContactResponse {
                    success: false,
                    message: None,
                    error: Some(error.to_string()),
                    form,
                }),
            );
        }
    };

    match create::<_, ContactMessage>(
        state.backend.as_ref(),
        Table::ContactMessages,
        &new_message,
        None,
    )
    .await
    {
        Ok(saved) => {
            tracing::info!(message_id = %saved.id, "contact message received");
            (
                StatusCode::CREATED,
                Json(ContactResponse {
                    success: true,
                    message: Some("Message Sent Successfully!".to_string()),
                    error: None,
                    form: ContactForm::default(),
                }),
            )
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to store contact message");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ContactResponse {
                    success: false,
                    message: None,
                    error: Some(SEND_FAILED.to_string()),
                    form,
                }),
            )
        }
    }
}
