//! Demo rows loaded into the memory backend so a local run has a directory to show.

use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

const DEPARTMENTS: &[(&str, &str, &str)] = &[
    (
        "Cardiology",
        "Comprehensive heart care including diagnostics, interventions and rehabilitation",
        "heart-pulse",
    ),
    (
        "Pediatrics",
        "Specialized care for infants, children and adolescents",
        "baby",
    ),
    (
        "Orthopedics",
        "Treatment of bones, joints, ligaments and muscles",
        "bone",
    ),
    (
        "Neurology",
        "Diagnosis and treatment of disorders of the nervous system",
        "brain",
    ),
    (
        "Ophthalmology",
        "Complete eye care from routine exams to surgery",
        "eye",
    ),
    (
        "General Medicine",
        "Primary care and preventive health services for all ages",
        "stethoscope",
    ),
    (
        "Emergency",
        "Round-the-clock emergency and trauma care",
        "ambulance",
    ),
];

/// (name, specialization, department, qualifications, years, fee, days)
const DOCTORS: &[(&str, &str, &str, &str, i32, f64, &[&str])] = &[
    (
        "Dr. Sarah Johnson",
        "Cardiologist",
        "Cardiology",
        "MD, FACC",
        15,
        150.0,
        &["Monday", "Wednesday", "Friday"],
    ),
    (
        "Dr. Michael Chen",
        "Pediatrician",
        "Pediatrics",
        "MD, FAAP",
        12,
        120.0,
        &["Tuesday", "Thursday", "Saturday"],
    ),
    (
        "Dr. Emily Rodriguez",
        "Orthopedic Surgeon",
        "Orthopedics",
        "MD, MS Ortho",
        18,
        180.0,
        &["Monday", "Tuesday", "Thursday"],
    ),
    (
        "Dr. James Wilson",
        "Neurologist",
        "Neurology",
        "MD, PhD",
        20,
        200.0,
        &["Wednesday", "Friday"],
    ),
    (
        "Dr. Aisha Patel",
        "Cardiologist",
        "Cardiology",
        "MD, DM Cardiology",
        9,
        140.0,
        &["Tuesday", "Thursday"],
    ),
    (
        "Dr. Robert Kim",
        "General Physician",
        "General Medicine",
        "MBBS, MD",
        10,
        80.0,
        &["Monday", "Tuesday", "Wednesday", "Thursday", "Friday"],
    ),
];

pub fn departments() -> Vec<Value> {
    let now = Utc::now().to_rfc3339();
    DEPARTMENTS
        .iter()
        .map(|(name, description, icon)| {
            json!({
                "id": Uuid::new_v4().to_string(),
                "name": name,
                "description": description,
                "icon": icon,
                "image_url": null,
                "created_at": now,
            })
        })
        .collect()
}

/// Doctors linked to the given department rows by name.
pub fn doctors(departments: &[Value]) -> Vec<Value> {
    let now = Utc::now().to_rfc3339();
    let department_id = |name: &str| {
        departments
            .iter()
            .find(|d| d["name"] == name)
            .map(|d| d["id"].clone())
            .unwrap_or(Value::Null)
    };

    DOCTORS
        .iter()
        .map(
            |(name, specialization, department, qualifications, years, fee, days)| {
                json!({
                    "id": Uuid::new_v4().to_string(),
                    "name": name,
                    "specialization": specialization,
                    "department_id": department_id(*department),
                    "qualifications": qualifications,
                    "experience_years": years,
                    "image_url": null,
                    "bio": format!(
                        "{} is a {} with {} years of experience.",
                        name,
                        specialization.to_lowercase(),
                        years
                    ),
                    "available_days": days,
                    "consultation_fee": fee,
                    "created_at": now,
                })
            },
        )
        .collect()
}
