//! Backend-as-a-service client: generic tables API plus auth.
//!
//! Every page handler talks to the backend through [`Backend`]. Rows cross
//! the trait as JSON objects; the typed helpers at the bottom of this module
//! decode them into [`models`] records.

pub mod memory;
pub mod models;
pub mod rest;
pub mod seed;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::BackendError;

pub use memory::MemoryBackend;
pub use rest::RestBackend;

/// The five tables the site addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Departments,
    Doctors,
    Patients,
    Appointments,
    ContactMessages,
}

impl Table {
    pub const ALL: [Table; 5] = [
        Table::Departments,
        Table::Doctors,
        Table::Patients,
        Table::Appointments,
        Table::ContactMessages,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Table::Departments => "departments",
            Table::Doctors => "doctors",
            Table::Patients => "patients",
            Table::Appointments => "appointments",
            Table::ContactMessages => "contact_messages",
        }
    }

    /// Tables whose rows carry an `updated_at` column.
    pub fn tracks_updates(self) -> bool {
        matches!(self, Table::Patients | Table::Appointments)
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

/// Select parameters: equality filters, one ordering, a row limit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pub filters: Vec<(String, String)>,
    pub order: Option<Order>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, column: &str, value: impl ToString) -> Self {
        self.filters.push((column.to_string(), value.to_string()));
        self
    }

    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        self.order = Some(Order {
            column: column.to_string(),
            ascending,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Authenticated user as reported by the backend's auth service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Result of a successful sign in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: AuthUser,
}

/// Tables and auth operations of the backend SDK.
///
/// `token` is the caller's access token; `None` acts with the public key.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn select(
        &self,
        table: Table,
        query: &Query,
        token: Option<&str>,
    ) -> Result<Vec<Value>, BackendError>;

    async fn insert(
        &self,
        table: Table,
        row: Value,
        token: Option<&str>,
    ) -> Result<Value, BackendError>;

    /// Patch the row whose `id` matches, returning the updated row.
    async fn update(
        &self,
        table: Table,
        id: &str,
        patch: Value,
        token: Option<&str>,
    ) -> Result<Value, BackendError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, BackendError>;

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<AuthUser, BackendError>;

    async fn sign_out(&self, token: &str) -> Result<(), BackendError>;

    async fn user_for_token(&self, token: &str) -> Result<AuthUser, BackendError>;

    /// Round-trip check used by the readiness probe.
    async fn ping(&self) -> Result<std::time::Duration, BackendError>;
}

// ============================================================================
// Typed helpers
// ============================================================================

pub async fn fetch<T: DeserializeOwned>(
    backend: &dyn Backend,
    table: Table,
    query: &Query,
    token: Option<&str>,
) -> Result<Vec<T>, BackendError> {
    backend
        .select(table, query, token)
        .await?
        .into_iter()
        .map(|row| serde_json::from_value(row).map_err(BackendError::from))
        .collect()
}

/// At most one row ("maybe single").
pub async fn fetch_one<T: DeserializeOwned>(
    backend: &dyn Backend,
    table: Table,
    query: Query,
    token: Option<&str>,
) -> Result<Option<T>, BackendError> {
    let query = query.limit(1);
    match backend.select(table, &query, token).await?.into_iter().next() {
        Some(row) => Ok(Some(serde_json::from_value(row)?)),
        None => Ok(None),
    }
}

pub async fn create<N: Serialize, T: DeserializeOwned>(
    backend: &dyn Backend,
    table: Table,
    row: &N,
    token: Option<&str>,
) -> Result<T, BackendError> {
    let created = backend.insert(table, serde_json::to_value(row)?, token).await?;
    Ok(serde_json::from_value(created)?)
}

pub async fn modify<P: Serialize, T: DeserializeOwned>(
    backend: &dyn Backend,
    table: Table,
    id: &str,
    patch: &P,
    token: Option<&str>,
) -> Result<T, BackendError> {
    let updated = backend
        .update(table, id, serde_json::to_value(patch)?, token)
        .await?;
    Ok(serde_json::from_value(updated)?)
}
