//! HTTP client for a PostgREST tables API and GoTrue auth API.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Instant;
use uuid::Uuid;

use super::{AuthSession, AuthUser, Backend, Query, Table};
use crate::config::BackendConfig;
use crate::error::BackendError;

pub struct RestBackend {
    client: Client,
    base_url: String,
    anon_key: String,
}

/// User object as returned by the auth API.
#[derive(Debug, Deserialize)]
struct RemoteUser {
    id: Uuid,
    email: Option<String>,
    #[serde(default)]
    user_metadata: Value,
}

impl From<RemoteUser> for AuthUser {
    fn from(user: RemoteUser) -> Self {
        let name = user
            .user_metadata
            .get("name")
            .and_then(Value::as_str)
            .map(str::to_string);
        AuthUser {
            id: user.id,
            email: user.email,
            name,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RemoteSession {
    access_token: String,
    #[serde(default = "default_token_type")]
    token_type: String,
    #[serde(default)]
    expires_in: i64,
    user: RemoteUser,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

impl RestBackend {
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let client = Client::builder()
            .user_agent(concat!("hospital-portal/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            anon_key: config.anon_key.clone(),
        })
    }

    fn table_url(&self, table: Table) -> String {
        format!("{}/rest/v1/{}", self.base_url, table.name())
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    /// Attach the public key and the caller's bearer token.
    fn authorize(&self, request: RequestBuilder, token: Option<&str>) -> RequestBuilder {
        request
            .header("apikey", &self.anon_key)
            .bearer_auth(token.unwrap_or(&self.anon_key))
    }

    /// Turn a non-2xx response into a [`BackendError`].
    async fn check(response: Response) -> Result<Response, BackendError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        tracing::warn!(status = %status, body = %body, "backend returned error");
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(BackendError::Unauthorized(body));
        }
        Err(BackendError::Status {
            status: status.as_u16(),
            body,
        })
    }

    fn select_params(query: &Query) -> Vec<(String, String)> {
        let mut params = vec![("select".to_string(), "*".to_string())];
        for (column, value) in &query.filters {
            params.push((column.clone(), format!("eq.{}", value)));
        }
        if let Some(order) = &query.order {
            let direction = if order.ascending { "asc" } else { "desc" };
            params.push(("order".to_string(), format!("{}.{}", order.column, direction)));
        }
        if let Some(limit) = query.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        params
    }

    /// PostgREST answers writes with an array of affected rows.
    fn first_row(table: Table, value: Value) -> Result<Value, BackendError> {
        match value {
            Value::Array(rows) => rows.into_iter().next().ok_or(BackendError::NotFound {
                table: table.name(),
            }),
            row @ Value::Object(_) => Ok(row),
            other => Err(BackendError::Other(format!(
                "unexpected {} response: {}",
                table, other
            ))),
        }
    }
}

#[async_trait]
impl Backend for RestBackend {
    async fn select(
        &self,
        table: Table,
        query: &Query,
        token: Option<&str>,
    ) -> Result<Vec<Value>, BackendError> {
        let request = self
            .client
            .get(self.table_url(table))
            .query(&Self::select_params(query));
        let response = Self::check(self.authorize(request, token).send().await?).await?;
        Ok(response.json::<Vec<Value>>().await?)
    }

    async fn insert(
        &self,
        table: Table,
        row: Value,
        token: Option<&str>,
    ) -> Result<Value, BackendError> {
        let request = self
            .client
            .post(self.table_url(table))
            .header("Prefer", "return=representation")
            .json(&row);
        let response = Self::check(self.authorize(request, token).send().await?).await?;
        Self::first_row(table, response.json::<Value>().await?)
    }

    async fn update(
        &self,
        table: Table,
        id: &str,
        patch: Value,
        token: Option<&str>,
    ) -> Result<Value, BackendError> {
        let request = self
            .client
            .patch(self.table_url(table))
            .query(&[("id", format!("eq.{}", id))])
            .header("Prefer", "return=representation")
            .json(&patch);
        let response = Self::check(self.authorize(request, token).send().await?).await?;
        Self::first_row(table, response.json::<Value>().await?)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, BackendError> {
        let request = self
            .client
            .post(self.auth_url("token"))
            .query(&[("grant_type", "password")])
            .json(&json!({ "email": email, "password": password }));
        let response = Self::check(self.authorize(request, None).send().await?).await?;
        let session: RemoteSession = response.json().await?;
        Ok(AuthSession {
            access_token: session.access_token,
            token_type: session.token_type,
            expires_in: session.expires_in,
            user: session.user.into(),
        })
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<AuthUser, BackendError> {
        let request = self.client.post(self.auth_url("signup")).json(&json!({
            "email": email,
            "password": password,
            "data": { "name": name },
        }));
        let response = Self::check(self.authorize(request, None).send().await?).await?;
        // With auto-confirm on, signup answers with a session wrapping the user.
        let mut body: Value = response.json().await?;
        let user = match body.get_mut("user") {
            Some(user) => user.take(),
            None => body,
        };
        let user: RemoteUser = serde_json::from_value(user)?;
        Ok(user.into())
    }

    async fn sign_out(&self, token: &str) -> Result<(), BackendError> {
        let request = self.client.post(self.auth_url("logout"));
        Self::check(self.authorize(request, Some(token)).send().await?).await?;
        Ok(())
    }

    async fn user_for_token(&self, token: &str) -> Result<AuthUser, BackendError> {
        let request = self.client.get(self.auth_url("user"));
        let response = Self::check(self.authorize(request, Some(token)).send().await?).await?;
        let user: RemoteUser = response.json().await?;
        Ok(user.into())
    }

    async fn ping(&self) -> Result<std::time::Duration, BackendError> {
        let start = Instant::now();
        let request = self.client.get(self.auth_url("health"));
        Self::check(self.authorize(request, None).send().await?).await?;
        Ok(start.elapsed())
    }
}
