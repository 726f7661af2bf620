/**
 * Appointment Routes
 * Booking form options and submission
 */
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::auth::{MaybeSession, Session};
use super::directory::load_doctors;
use super::AppState;
use crate::backend::{
    create, fetch_one,
    models::{Appointment, AppointmentStatus, Doctor, NewAppointment, NewPatient},
    Query, Table,
};
use crate::error::{ApiError, BackendError};

/// Bookable consultation slots
pub const TIME_SLOTS: &[&str] = &[
    "09:00", "09:30", "10:00", "10:30", "11:00", "11:30", "14:00", "14:30", "15:00", "15:30",
    "16:00", "16:30", "17:00",
];

// ============================================================================
// Request/Response Types
// ============================================================================

/// Booking form as submitted; missing fields count as empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BookingForm {
    pub doctor_id: String,
    pub appointment_date: String,
    pub appointment_time: String,
    pub reason: String,
}

impl BookingForm {
    fn is_complete(&self) -> bool {
        ![
            &self.doctor_id,
            &self.appointment_date,
            &self.appointment_time,
            &self.reason,
        ]
        .iter()
        .any(|field| field.trim().is_empty())
    }
}

#[derive(Debug, Serialize)]
pub struct BookingOptions {
    pub doctors: Vec<Doctor>,
    pub time_slots: Vec<&'static str>,
    pub min_date: NaiveDate,
}

#[derive(Debug, Serialize)]
pub struct BookingResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub appointment: Option<Appointment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<&'static str>,
    /// Form state to render next: cleared on success, as submitted on failure.
    pub form: BookingForm,
}

impl BookingResponse {
    fn failure(error: &str, form: BookingForm) -> Self {
        Self {
            success: false,
            appointment: None,
            message: None,
            error: Some(error.to_string()),
            redirect: None,
            form,
        }
    }
}

/// A form that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidBooking {
    pub doctor_id: Uuid,
    pub date: NaiveDate,
    pub time: String,
    pub reason: String,
}

// ============================================================================
// Validation
// ============================================================================

pub fn validate_booking(form: &BookingForm, today: NaiveDate) -> Result<ValidBooking, &'static str> {
    if !form.is_complete() {
        return Err("Please fill in all required fields");
    }

    let doctor_id =
        Uuid::parse_str(form.doctor_id.trim()).map_err(|_| "Please select a valid doctor")?;

    let date = NaiveDate::parse_from_str(form.appointment_date.trim(), "%Y-%m-%d")
        .map_err(|_| "Please choose a valid date")?;
    if date < today {
        return Err("Appointment date cannot be in the past");
    }

    let time = NaiveTime::parse_from_str(form.appointment_time.trim(), "%H:%M")
        .map_err(|_| "Please choose a valid time")?;

    Ok(ValidBooking {
        doctor_id,
        date,
        time: time.format("%H:%M").to_string(),
        reason: form.reason.clone(),
    })
}

/// Name for a lazily created patient: the email's local part, else `Patient`.
pub fn default_patient_name(email: Option<&str>) -> String {
    email
        .and_then(|e| e.split('@').next())
        .filter(|local| !local.is_empty())
        .unwrap_or("Patient")
        .to_string()
}

/// Create the caller's patient row if it does not exist yet.
async fn ensure_patient(state: &AppState, session: &Session) -> Result<(), BackendError> {
    let token = Some(session.token.as_str());
    let existing = fetch_one::<Value>(
        state.backend.as_ref(),
        Table::Patients,
        Query::new().eq("id", session.user.id),
        token,
    )
    .await?;

    if existing.is_none() {
        let patient = NewPatient {
            id: session.user.id,
            name: default_patient_name(session.user.email.as_deref()),
            email: session.user.email.clone().unwrap_or_default(),
        };
        create::<_, Value>(state.backend.as_ref(), Table::Patients, &patient, token).await?;
        tracing::info!(patient_id = %patient.id, "created patient profile");
    }
    Ok(())
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/appointments/options
pub async fn booking_options(
    State(state): State<AppState>,
) -> Result<Json<BookingOptions>, ApiError> {
    Ok(Json(BookingOptions {
        doctors: load_doctors(&state).await?,
        time_slots: TIME_SLOTS.to_vec(),
        min_date: Utc::now().date_naive(),
    }))
}

/// POST /api/appointments
pub async fn book_appointment(
    State(state): State<AppState>,
    MaybeSession(session): MaybeSession,
    Json(form): Json<BookingForm>,
) -> impl IntoResponse {
    let Some(session) = session else {
        let mut response = BookingResponse::failure("Please login to book an appointment", form);
        response.redirect = Some("login");
        return (StatusCode::UNAUTHORIZED, Json(response));
    };

    let booking = match validate_booking(&form, Utc::now().date_naive()) {
        Ok(booking) => booking,
        Err(message) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(BookingResponse::failure(message, form)),
            );
        }
    };

    if let Err(e) = ensure_patient(&state, &session).await {
        tracing::error!(user_id = %session.user.id, error = %e, "failed to ensure patient profile");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(BookingResponse::failure(
                "Error creating patient profile. Please try again.",
                form,
            )),
        );
    }

    let new_appointment = NewAppointment {
        patient_id: session.user.id,
        doctor_id: booking.doctor_id,
        appointment_date: booking.date,
        appointment_time: booking.time,
        reason: booking.reason,
        status: AppointmentStatus::Pending,
    };

    match create::<_, Appointment>(
        state.backend.as_ref(),
        Table::Appointments,
        &new_appointment,
        Some(&session.token),
    )
    .await
    {
        Ok(appointment) => {
            tracing::info!(
                appointment_id = %appointment.id,
                doctor_id = %appointment.doctor_id,
                "appointment booked"
            );
            (
                StatusCode::CREATED,
                Json(BookingResponse {
                    success: true,
                    appointment: Some(appointment),
                    message: Some("Appointment Booked Successfully!".to_string()),
                    error: None,
                    redirect: None,
                    form: BookingForm::default(),
                }),
            )
        }
        Err(e) => {
            tracing::error!(user_id = %session.user.id, error = %e, "failed to book appointment");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(BookingResponse::failure(
                    "Failed to book appointment. Please try again.",
                    form,
                )),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::testing::{memory, send, signed_in, state, FailingWrites};
    use axum::routing::{get, post};
    use axum::Router;
    use chrono::Duration;
    use serde_json::json;
    use std::sync::Arc;

    fn router(app_state: AppState) -> Router {
        Router::new()
            .route("/api/appointments/options", get(booking_options))
            .route("/api/appointments", post(book_appointment))
            .with_state(app_state)
    }

    fn today() -> NaiveDate {
        Utc::now().date_naive()
    }

    fn tomorrow() -> String {
        (today() + Duration::days(1)).format("%Y-%m-%d").to_string()
    }

    fn form(doctor_id: &str, date: &str) -> BookingForm {
        BookingForm {
            doctor_id: doctor_id.to_string(),
            appointment_date: date.to_string(),
            appointment_time: "09:30".to_string(),
            reason: "Chest pain".to_string(),
        }
    }

    #[test]
    fn test_validate_rejects_each_missing_field() {
        let doctor = Uuid::new_v4().to_string();
        let base = form(&doctor, &tomorrow());
        let blanks = [
            BookingForm { doctor_id: String::new(), ..base.clone() },
            BookingForm { appointment_date: String::new(), ..base.clone() },
            BookingForm { appointment_time: " ".to_string(), ..base.clone() },
            BookingForm { reason: String::new(), ..base.clone() },
        ];
        for f in &blanks {
            assert_eq!(
                validate_booking(f, today()),
                Err("Please fill in all required fields")
            );
        }
        assert!(validate_booking(&base, today()).is_ok());
    }

    #[test]
    fn test_validate_rejects_past_date_but_allows_today() {
        let doctor = Uuid::new_v4().to_string();
        let yesterday = (today() - Duration::days(1)).format("%Y-%m-%d").to_string();
        assert_eq!(
            validate_booking(&form(&doctor, &yesterday), today()),
            Err("Appointment date cannot be in the past")
        );
        let today_str = today().format("%Y-%m-%d").to_string();
        assert!(validate_booking(&form(&doctor, &today_str), today()).is_ok());
    }

    #[test]
    fn test_validate_rejects_malformed_values() {
        assert_eq!(
            validate_booking(&form("not-a-uuid", &tomorrow()), today()),
            Err("Please select a valid doctor")
        );
        let doctor = Uuid::new_v4().to_string();
        assert_eq!(
            validate_booking(&form(&doctor, "14/02/2030"), today()),
            Err("Please choose a valid date")
        );
    }

    #[test]
    fn test_validate_keeps_reason_as_submitted() {
        let doctor = Uuid::new_v4().to_string();
        let f = BookingForm {
            reason: "  Chest pain\n".to_string(),
            ..form(&doctor, &tomorrow())
        };
        assert_eq!(validate_booking(&f, today()).unwrap().reason, "  Chest pain\n");
    }

    #[test]
    fn test_default_patient_name() {
        assert_eq!(default_patient_name(Some("jane.doe@example.com")), "jane.doe");
        assert_eq!(default_patient_name(Some("@example.com")), "Patient");
        assert_eq!(default_patient_name(None), "Patient");
    }

    #[tokio::test]
    async fn test_options_list_time_slots_and_min_date() {
        let (status, body) = send(
            router(state(memory())),
            "GET",
            "/api/appointments/options",
            None,
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["time_slots"].as_array().unwrap().len(), 13);
        assert_eq!(body["min_date"], today().format("%Y-%m-%d").to_string());
    }

    #[tokio::test]
    async fn test_unauthenticated_booking_redirects_without_writing() {
        let backend = memory();
        let payload = serde_json::to_value(form(&Uuid::new_v4().to_string(), &tomorrow())).unwrap();
        let (status, body) = send(
            router(state(backend.clone())),
            "POST",
            "/api/appointments",
            None,
            Some(payload),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["redirect"], "login");
        assert_eq!(body["error"], "Please login to book an appointment");
        assert!(backend.rows(Table::Appointments).await.is_empty());
        assert!(backend.rows(Table::Patients).await.is_empty());
    }

    #[tokio::test]
    async fn test_incomplete_booking_does_not_write() {
        let backend = memory();
        let (token, _) = signed_in(&backend, "jane@example.com").await;
        let (status, body) = send(
            router(state(backend.clone())),
            "POST",
            "/api/appointments",
            Some(&token),
            Some(json!({ "doctor_id": Uuid::new_v4().to_string(), "reason": "Checkup" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Please fill in all required fields");
        assert_eq!(body["form"]["reason"], "Checkup");
        assert!(backend.rows(Table::Appointments).await.is_empty());
        assert!(backend.rows(Table::Patients).await.is_empty());
    }

    #[tokio::test]
    async fn test_booking_creates_patient_once_and_pending_appointment() {
        let backend = memory();
        let (token, user) = signed_in(&backend, "jane@example.com").await;
        let app = router(state(backend.clone()));
        let doctor = Uuid::new_v4().to_string();

        for _ in 0..2 {
            let payload = serde_json::to_value(form(&doctor, &tomorrow())).unwrap();
            let (status, body) =
                send(app.clone(), "POST", "/api/appointments", Some(&token), Some(payload)).await;
            assert_eq!(status, StatusCode::CREATED);
            assert_eq!(body["appointment"]["status"], "pending");
            assert_eq!(body["form"], json!(BookingForm::default()));
        }

        let patients = backend.rows(Table::Patients).await;
        assert_eq!(patients.len(), 1);
        assert_eq!(patients[0]["id"], user.id.to_string());
        assert_eq!(patients[0]["name"], "jane");

        let appointments = backend.rows(Table::Appointments).await;
        assert_eq!(appointments.len(), 2);
        assert_eq!(appointments[0]["patient_id"], user.id.to_string());
        assert_eq!(appointments[0]["appointment_time"], "09:30");
    }

    #[tokio::test]
    async fn test_patient_creation_failure_reports_profile_error() {
        let inner = memory();
        let (token, _) = signed_in(&inner, "jane@example.com").await;
        let failing = Arc::new(FailingWrites {
            inner: inner.clone(),
            failing: Table::Patients,
        });
        let payload = serde_json::to_value(form(&Uuid::new_v4().to_string(), &tomorrow())).unwrap();
        let (status, body) = send(
            router(AppState::new(failing)),
            "POST",
            "/api/appointments",
            Some(&token),
            Some(payload),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Error creating patient profile. Please try again.");
        assert!(inner.rows(Table::Appointments).await.is_empty());
    }

    #[tokio::test]
    async fn test_appointment_insert_failure_keeps_form() {
        let inner = memory();
        let (token, _) = signed_in(&inner, "jane@example.com").await;
        let failing = Arc::new(FailingWrites {
            inner: inner.clone(),
            failing: Table::Appointments,
        });
        let submitted = form(&Uuid::new_v4().to_string(), &tomorrow());
        let (status, body) = send(
            router(AppState::new(failing)),
            "POST",
            "/api/appointments",
            Some(&token),
            Some(serde_json::to_value(&submitted).unwrap()),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Failed to book appointment. Please try again.");
        assert_eq!(body["form"], serde_json::to_value(&submitted).unwrap());
    }
}
