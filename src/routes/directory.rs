/**
 * Directory Routes
 * Home page highlights, department list and the doctor directory
 */
use axum::{
    extract::{Query as QueryParams, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::backend::{
    fetch,
    models::{Department, Doctor},
    Query, Table,
};
use crate::error::ApiError;

/// Departments shown on the home page
const HOME_DEPARTMENT_LIMIT: usize = 6;

/// Specialization filter value that selects every doctor
pub const ALL_SPECIALIZATIONS: &str = "All";

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Highlight {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feature {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Serialize)]
pub struct HomeResponse {
    pub departments: Vec<Department>,
    pub stats: Vec<Highlight>,
    pub features: Vec<Feature>,
}

#[derive(Debug, Serialize)]
pub struct DepartmentsResponse {
    pub departments: Vec<Department>,
}

#[derive(Debug, Deserialize)]
pub struct DoctorsQuery {
    pub specialization: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DoctorsResponse {
    pub doctors: Vec<Doctor>,
    pub specializations: Vec<String>,
    pub selected: String,
}

// ============================================================================
// Static content
// ============================================================================

fn home_stats() -> Vec<Highlight> {
    [
        ("Patients Served", "50,000+"),
        ("Successful Surgeries", "25,000+"),
        ("Expert Doctors", "200+"),
        ("Years of Service", "25+"),
    ]
    .into_iter()
    .map(|(label, value)| Highlight {
        label: label.to_string(),
        value: value.to_string(),
    })
    .collect()
}

fn home_features() -> Vec<Feature> {
    [
        (
            "Expert Medical Team",
            "Board-certified physicians with extensive experience",
        ),
        (
            "24/7 Emergency Care",
            "Round-the-clock emergency services available",
        ),
        (
            "Advanced Technology",
            "State-of-the-art medical equipment and facilities",
        ),
        (
            "Compassionate Care",
            "Patient-centered approach with personalized treatment",
        ),
    ]
    .into_iter()
    .map(|(title, description)| Feature {
        title: title.to_string(),
        description: description.to_string(),
    })
    .collect()
}

// ============================================================================
// Filtering
// ============================================================================

/// `All` followed by each distinct specialization in first-seen order.
pub fn specializations(doctors: &[Doctor]) -> Vec<String> {
    let mut out = vec![ALL_SPECIALIZATIONS.to_string()];
    for doctor in doctors {
        if !out.iter().any(|s| s == &doctor.specialization) {
            out.push(doctor.specialization.clone());
        }
    }
    out
}

pub fn filter_by_specialization(doctors: Vec<Doctor>, selected: &str) -> Vec<Doctor> {
    if selected == ALL_SPECIALIZATIONS {
        return doctors;
    }
    doctors
        .into_iter()
        .filter(|d| d.specialization == selected)
        .collect()
}

// ============================================================================
// Handlers
// ============================================================================

fn load_failed(what: &str, e: crate::error::BackendError) -> ApiError {
    tracing::error!(error = %e, "failed to load {}", what);
    ApiError::new(StatusCode::BAD_GATEWAY, format!("Failed to load {}", what))
}

/// GET /api/home
pub async fn home(State(state): State<AppState>) -> Result<Json<HomeResponse>, ApiError> {
    let departments = fetch::<Department>(
        state.backend.as_ref(),
        Table::Departments,
        &Query::new().limit(HOME_DEPARTMENT_LIMIT),
        None,
    )
    .await
    .map_err(|e| load_failed("departments", e))?;

    Ok(Json(HomeResponse {
        departments,
        stats: home_stats(),
        features: home_features(),
    }))
}

/// GET /api/departments
pub async fn list_departments(
    State(state): State<AppState>,
) -> Result<Json<DepartmentsResponse>, ApiError> {
    let departments = fetch::<Department>(
        state.backend.as_ref(),
        Table::Departments,
        &Query::new().order("name", true),
        None,
    )
    .await
    .map_err(|e| load_failed("departments", e))?;

    Ok(Json(DepartmentsResponse { departments }))
}

/// All doctors ordered by name; shared with the booking form.
pub async fn load_doctors(state: &AppState) -> Result<Vec<Doctor>, ApiError> {
    fetch::<Doctor>(
        state.backend.as_ref(),
        Table::Doctors,
        &Query::new().order("name", true),
        None,
    )
    .await
    .map_err(|e| load_failed("doctors", e))
}

/// GET /api/doctors?specialization=...
pub async fn list_doctors(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<DoctorsQuery>,
) -> Result<Json<DoctorsResponse>, ApiError> {
    let doctors = load_doctors(&state).await?;
    let specializations = specializations(&doctors);
    let selected = query
        .specialization
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| ALL_SPECIALIZATIONS.to_string());

    Ok(Json(DoctorsResponse {
        doctors: filter_by_specialization(doctors, &selected),
        specializations,
        selected,
    }))
}
