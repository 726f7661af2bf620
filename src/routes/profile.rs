/**
 * Profile Routes
 * The signed-in patient's record, appointment history and profile edits
 */
use axum::{extract::State, http::StatusCode, Json};
use chrono::{NaiveDate, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};

use super::auth::{MaybeSession, Session};
use super::{non_blank, AppState};
use crate::backend::{
    fetch, fetch_one, modify,
    models::{Appointment, Doctor, Patient, PatientUpdate},
    AuthUser, Query, Table,
};
use crate::error::{ApiError, BackendError};

const UPDATE_FAILED: &str = "Failed to update profile. Please try again.";

// ============================================================================
// Request/Response Types
// ============================================================================

/// Editable profile fields as text, blank when absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileEdit {
    pub name: String,
    pub phone: String,
    pub date_of_birth: String,
    pub blood_group: String,
    pub address: String,
    pub emergency_contact: String,
}

impl ProfileEdit {
    pub fn from_patient(patient: &Patient) -> Self {
        Self {
            name: patient.name.clone(),
            phone: patient.phone.clone().unwrap_or_default(),
            date_of_birth: patient
                .date_of_birth
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            blood_group: patient.blood_group.clone().unwrap_or_default(),
            address: patient.address.clone().unwrap_or_default(),
            emergency_contact: patient.emergency_contact.clone().unwrap_or_default(),
        }
    }

    /// The update to commit, or the message to show. Values are stored as
    /// submitted; only blank optionals become null.
    pub fn to_update(&self) -> Result<PatientUpdate, &'static str> {
        let date_of_birth = match non_blank(&self.date_of_birth) {
            Some(raw) => Some(
                NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                    .map_err(|_| "Please enter a valid date of birth")?,
            ),
            None => None,
        };
        Ok(PatientUpdate {
            name: self.name.clone(),
            phone: non_blank(&self.phone),
            date_of_birth,
            blood_group: non_blank(&self.blood_group),
            address: non_blank(&self.address),
            emergency_contact: non_blank(&self.emergency_contact),
            updated_at: Utc::now(),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct AppointmentWithDoctor {
    #[serde(flatten)]
    pub appointment: Appointment,
    pub doctor: Option<Doctor>,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub user: AuthUser,
    pub patient: Option<Patient>,
    pub appointments: Vec<AppointmentWithDoctor>,
    pub form: ProfileEdit,
}

#[derive(Debug, Serialize)]
pub struct ProfileUpdateResponse {
    pub success: bool,
    pub patient: Patient,
    pub message: String,
}

// ============================================================================
// Loading
// ============================================================================

async fn load_patient(
    state: &AppState,
    session: &Session,
) -> Result<Option<Patient>, BackendError> {
    fetch_one::<Patient>(
        state.backend.as_ref(),
        Table::Patients,
        Query::new().eq("id", session.user.id),
        Some(&session.token),
    )
    .await
}

async fn load_doctor(
    state: &AppState,
    session: &Session,
    appointment: &Appointment,
) -> Option<Doctor> {
    let lookup = fetch_one::<Doctor>(
        state.backend.as_ref(),
        Table::Doctors,
        Query::new().eq("id", appointment.doctor_id),
        Some(&session.token),
    )
    .await;
    match lookup {
        Ok(doctor) => doctor,
        Err(e) => {
            tracing::warn!(
                appointment_id = %appointment.id,
                doctor_id = %appointment.doctor_id,
                error = %e,
                "doctor lookup failed"
            );
            None
        }
    }
}

/// Newest first, each with its doctor looked up concurrently.
async fn load_appointments(
    state: &AppState,
    session: &Session,
) -> Result<Vec<AppointmentWithDoctor>, BackendError> {
    let appointments = fetch::<Appointment>(
        state.backend.as_ref(),
        Table::Appointments,
        &Query::new()
            .eq("patient_id", session.user.id)
            .order("appointment_date", false),
        Some(&session.token),
    )
    .await?;

    let doctors = join_all(
        appointments
            .iter()
            .map(|appointment| load_doctor(state, session, appointment)),
    )
    .await;

    Ok(appointments
        .into_iter()
        .zip(doctors)
        .map(|(appointment, doctor)| AppointmentWithDoctor {
            appointment,
            doctor,
        })
        .collect())
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/profile
pub async fn get_profile(
    State(state): State<AppState>,
    MaybeSession(session): MaybeSession,
) -> Result<Json<ProfileResponse>, ApiError> {
    let session =
        session.ok_or_else(|| ApiError::login_required("Please login to view your profile"))?;

    let (patient, appointments) = tokio::join!(
        load_patient(&state, &session),
        load_appointments(&state, &session)
    );

    let patient = patient.unwrap_or_else(|e| {
        tracing::error!(user_id = %session.user.id, error = %e, "failed to load patient");
        None
    });
    let appointments = appointments.unwrap_or_else(|e| {
        tracing::error!(user_id = %session.user.id, error = %e, "failed to load appointments");
        Vec::new()
    });

    let form = patient
        .as_ref()
        .map(ProfileEdit::from_patient)
        .unwrap_or_default();

    Ok(Json(ProfileResponse {
        user: session.user,
        patient,
        appointments,
        form,
    }))
}

/// PUT /api/profile
/// Last write wins.
pub async fn update_profile(
    State(state): State<AppState>,
    MaybeSession(session): MaybeSession,
    Json(edit): Json<ProfileEdit>,
) -> Result<Json<ProfileUpdateResponse>, ApiError> {
    let session =
        session.ok_or_else(|| ApiError::login_required("Please login to view your profile"))?;
    let update = edit.to_update().map_err(ApiError::bad_request)?;

    let id = session.user.id.to_string();
    modify::<_, Patient>(
        state.backend.as_ref(),
        Table::Patients,
        &id,
        &update,
        Some(&session.token),
    )
    .await
    .map_err(|e| {
        tracing::error!(user_id = %id, error = %e, "failed to update profile");
        match e {
            BackendError::NotFound { .. } => ApiError::new(StatusCode::NOT_FOUND, UPDATE_FAILED),
            _ => ApiError::internal(UPDATE_FAILED),
        }
    })?;

    let patient = load_patient(&state, &session)
        .await
        .map_err(|e| {
            tracing::error!(user_id = %id, error = %e, "failed to reload profile");
            ApiError::internal(UPDATE_FAILED)
        })?
        .ok_or_else(|| ApiError::new(StatusCode::NOT_FOUND, UPDATE_FAILED))?;

    tracing::info!(user_id = %id, "profile updated");
    Ok(Json(ProfileUpdateResponse {
        success: true,
        patient,
        message: "Profile updated successfully".to_string(),
    }))
}
