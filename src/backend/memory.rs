//! In-process backend used in development (no backend URL configured) and in tests.
//!
//! Mirrors the hosted backend closely enough for the site: generated ids and
//! timestamps on insert, `eq` filters, ordering with Postgres null placement,
//! bcrypt-hashed passwords and HS256 access tokens.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::time::Instant;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{seed, AuthSession, AuthUser, Backend, Query, Table};
use crate::error::BackendError;

/// Access token lifetime, matching the hosted auth default.
const ACCESS_TOKEN_EXPIRY_SECS: i64 = 3600;

const MIN_PASSWORD_LEN: usize = 6;

static NULL: Value = Value::Null;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    email: String,
    #[serde(default)]
    name: Option<String>,
    jti: String,
    exp: i64,
    iat: i64,
}

#[derive(Debug, Clone)]
struct StoredUser {
    id: Uuid,
    email: String,
    name: String,
    password_hash: String,
}

pub struct MemoryBackend {
    tables: RwLock<HashMap<Table, Vec<Value>>>,
    users: RwLock<HashMap<String, StoredUser>>,
    /// SHA-256 digests of signed-out access tokens, with their expiry
    revoked: RwLock<HashMap<String, i64>>,
    jwt_secret: String,
    hash_cost: u32,
}

impl MemoryBackend {
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
            users: RwLock::new(HashMap::new()),
            revoked: RwLock::new(HashMap::new()),
            jwt_secret: jwt_secret.into(),
            hash_cost: bcrypt::DEFAULT_COST,
        }
    }

    /// bcrypt cost for new passwords; tests use the minimum (4).
    pub fn with_hash_cost(mut self, cost: u32) -> Self {
        self.hash_cost = cost;
        self
    }

    /// Preload rows into a table, bypassing insert defaults.
    pub fn with_rows(mut self, table: Table, rows: Vec<Value>) -> Self {
        self.tables.get_mut().entry(table).or_default().extend(rows);
        self
    }

    /// Preload the demo departments and doctors.
    pub fn with_demo_data(self) -> Self {
        let departments = seed::departments();
        let doctors = seed::doctors(&departments);
        self.with_rows(Table::Departments, departments)
            .with_rows(Table::Doctors, doctors)
    }

    /// Snapshot of a table, in insertion order.
    pub async fn rows(&self, table: Table) -> Vec<Value> {
        self.tables
            .read()
            .await
            .get(&table)
            .cloned()
            .unwrap_or_default()
    }

    fn digest(token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    fn issue_token(&self, user: &StoredUser) -> Result<String, BackendError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            name: Some(user.name.clone()),
            jti: Uuid::new_v4().to_string(),
            exp: (now + Duration::seconds(ACCESS_TOKEN_EXPIRY_SECS)).timestamp(),
            iat: now.timestamp(),
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| BackendError::Other(format!("failed to sign token: {}", e)))
    }

    fn verify_token(&self, token: &str) -> Result<Claims, BackendError> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|e| BackendError::Unauthorized(e.to_string()))
    }
}

fn column_matches(row: &Value, column: &str, expected: &str) -> bool {
    match row.get(column) {
        Some(Value::String(s)) => s == expected,
        Some(Value::Null) | None => false,
        Some(other) => other.to_string() == expected,
    }
}

/// Ascending order with nulls last.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Greater,
        (_, Value::Null) => Ordering::Less,
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => a.to_string().cmp(&b.to_string()),
    }
}

fn into_object(table: Table, value: Value) -> Result<Map<String, Value>, BackendError> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(BackendError::Other(format!(
            "{} row must be an object, got {}",
            table, other
        ))),
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn select(
        &self,
        table: Table,
        query: &Query,
        _token: Option<&str>,
    ) -> Result<Vec<Value>, BackendError> {
        let tables = self.tables.read().await;
        let mut rows: Vec<Value> = tables
            .get(&table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| {
                        query
                            .filters
                            .iter()
                            .all(|(column, value)| column_matches(row, column, value))
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if let Some(order) = &query.order {
            rows.sort_by(|a, b| {
                let a = a.get(&order.column).unwrap_or(&NULL);
                let b = b.get(&order.column).unwrap_or(&NULL);
                let ord = compare_values(a, b);
                if order.ascending {
                    ord
                } else {
                    ord.reverse()
                }
            });
        }

        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }

        Ok(rows)
    }

    async fn insert(
        &self,
        table: Table,
        row: Value,
        _token: Option<&str>,
    ) -> Result<Value, BackendError> {
        let mut row = into_object(table, row)?;
        let now = Value::String(Utc::now().to_rfc3339());

        if row.get("id").map_or(true, Value::is_null) {
            row.insert("id".to_string(), Value::String(Uuid::new_v4().to_string()));
        }
        row.entry("created_at").or_insert_with(|| now.clone());
        if table.tracks_updates() {
            row.entry("updated_at").or_insert(now);
        }

        let row = Value::Object(row);
        let mut tables = self.tables.write().await;
        let rows = tables.entry(table).or_default();

        let id = row.get("id").cloned().unwrap_or(Value::Null);
        if rows.iter().any(|existing| existing.get("id") == Some(&id)) {
            return Err(BackendError::Status {
                status: 409,
                body: format!("duplicate key value violates unique constraint \"{}_pkey\"", table),
            });
        }

        rows.push(row.clone());
        Ok(row)
    }

    async fn update(
        &self,
        table: Table,
        id: &str,
        patch: Value,
        _token: Option<&str>,
    ) -> Result<Value, BackendError> {
        let patch = into_object(table, patch)?;
        let mut tables = self.tables.write().await;
        let row = tables
            .get_mut(&table)
            .and_then(|rows| rows.iter_mut().find(|row| column_matches(row, "id", id)))
            .ok_or(BackendError::NotFound {
                table: table.name(),
            })?;

        if let Value::Object(fields) = row {
            for (key, value) in patch {
                fields.insert(key, value);
            }
        }
        Ok(row.clone())
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, BackendError> {
        let user = self
            .users
            .read()
            .await
            .get(&email.trim().to_lowercase())
            .cloned()
            .ok_or_else(|| BackendError::Unauthorized("Invalid login credentials".to_string()))?;

        // bcrypt is CPU-bound; keep it off the async executor.
        let pwd = password.to_string();
        let hash = user.password_hash.clone();
        let password_ok = tokio::task::spawn_blocking(move || bcrypt::verify(&pwd, &hash))
            .await
            .map_err(|e| BackendError::Other(e.to_string()))?
            .unwrap_or(false);
        if !password_ok {
            tracing::warn!(email = %user.email, "failed sign in attempt");
            return Err(BackendError::Unauthorized(
                "Invalid login credentials".to_string(),
            ));
        }

        let access_token = self.issue_token(&user)?;
        Ok(AuthSession {
            access_token,
            token_type: "bearer".to_string(),
            expires_in: ACCESS_TOKEN_EXPIRY_SECS,
            user: AuthUser {
                id: user.id,
                email: Some(user.email),
                name: Some(user.name),
            },
        })
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<AuthUser, BackendError> {
        let email = email.trim().to_lowercase();
        if password.len() < MIN_PASSWORD_LEN {
            return Err(BackendError::Status {
                status: 422,
                body: format!(
                    "Password should be at least {} characters",
                    MIN_PASSWORD_LEN
                ),
            });
        }
        if self.users.read().await.contains_key(&email) {
            return Err(BackendError::Status {
                status: 422,
                body: "User already registered".to_string(),
            });
        }

        let pwd = password.to_string();
        let cost = self.hash_cost;
        let password_hash = tokio::task::spawn_blocking(move || bcrypt::hash(&pwd, cost))
            .await
            .map_err(|e| BackendError::Other(e.to_string()))?
            .map_err(|e| BackendError::Other(format!("failed to hash password: {}", e)))?;

        let user = StoredUser {
            id: Uuid::new_v4(),
            email: email.clone(),
            name: name.to_string(),
            password_hash,
        };

        let mut users = self.users.write().await;
        if users.contains_key(&email) {
            return Err(BackendError::Status {
                status: 422,
                body: "User already registered".to_string(),
            });
        }
        users.insert(email, user.clone());

        Ok(AuthUser {
            id: user.id,
            email: Some(user.email),
            name: Some(user.name),
        })
    }

    async fn sign_out(&self, token: &str) -> Result<(), BackendError> {
        // Tokens that no longer verify cannot be used anyway.
        let Ok(claims) = self.verify_token(token) else {
            return Ok(());
        };
        // Entries stay until decoding would reject the token on its own.
        let cutoff = Utc::now().timestamp() - Validation::default().leeway as i64;
        let mut revoked = self.revoked.write().await;
        revoked.retain(|_, exp| *exp >= cutoff);
        revoked.insert(Self::digest(token), claims.exp);
        Ok(())
    }

    async fn user_for_token(&self, token: &str) -> Result<AuthUser, BackendError> {
        if self.revoked.read().await.contains_key(&Self::digest(token)) {
            return Err(BackendError::Unauthorized("session signed out".to_string()));
        }
        let claims = self.verify_token(token)?;

        let id = Uuid::parse_str(&claims.sub)
            .map_err(|e| BackendError::Unauthorized(format!("invalid subject: {}", e)))?;
        Ok(AuthUser {
            id,
            email: Some(claims.email),
            name: claims.name,
        })
    }

    async fn ping(&self) -> Result<std::time::Duration, BackendError> {
        let start = Instant::now();
        let _tables = self.tables.read().await;
        Ok(start.elapsed())
    }
}
