//! PostgREST Query Builder
//!
//! Covers the operations the app needs: select with equality filters and
//! ordering, insert, update and delete filtered by equality.

use std::fmt;

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use url::Url;

use super::client::SupabaseClient;
use super::response::ensure_success;
use crate::domain::DomainResult;

/// Handle to one table
#[derive(Clone)]
pub struct Table {
    client: SupabaseClient,
    name: String,
}

impl Table {
    pub(crate) fn new(client: SupabaseClient, name: &str) -> Self {
        Self {
            client,
            name: name.to_string(),
        }
    }

    /// `GET ?select=<columns>`
    pub fn select(&self, columns: &str) -> Query {
        Query::new(self.clone(), Method::GET, None).param("select", columns)
    }

    /// `POST` with the rows as a JSON array
    pub fn insert<T: Serialize>(&self, rows: &[T]) -> DomainResult<Query> {
        let body = serde_json::to_value(rows)?;
        Ok(Query::new(self.clone(), Method::POST, Some(body)))
    }

    /// `PATCH` with `patch` applied to every row matching the filters
    pub fn update<T: Serialize>(&self, patch: &T) -> DomainResult<Query> {
        let body = serde_json::to_value(patch)?;
        Ok(Query::new(self.clone(), Method::PATCH, Some(body)))
    }

    /// `DELETE` every row matching the filters
    pub fn delete(&self) -> Query {
        Query::new(self.clone(), Method::DELETE, None)
    }
}

/// A request being built against a [`Table`]
pub struct Query {
    table: Table,
    method: Method,
    params: Vec<(String, String)>,
    body: Option<Value>,
}

impl Query {
    fn new(table: Table, method: Method, body: Option<Value>) -> Self {
        Self {
            table,
            method,
            params: Vec::new(),
            body,
        }
    }

    fn param(mut self, key: &str, value: impl Into<String>) -> Self {
        self.params.push((key.to_string(), value.into()));
        self
    }

    /// Keep rows where `column = value`
    pub fn eq(self, column: &str, value: impl fmt::Display) -> Self {
        let filter = format!("eq.{}", value);
        self.param(column, filter)
    }

    pub fn order(self, column: &str, ascending: bool) -> Self {
        let direction = if ascending { "asc" } else { "desc" };
        let order = format!("{}.{}", column, direction);
        self.param("order", order)
    }

    /// Full request URL including filters
    pub fn url(&self) -> DomainResult<Url> {
        let mut url = self
            .table
            .client
            .config()
            .endpoint(&format!("rest/v1/{}", self.table.name))?;
        if !self.params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &self.params {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    /// Run a select and decode the rows
    pub async fn fetch<T: DeserializeOwned>(self) -> DomainResult<Vec<T>> {
        let response = self.send().await?;
        Ok(response.json::<Vec<T>>().await?)
    }

    /// Run a write, discarding the (minimal) response
    pub async fn execute(self) -> DomainResult<()> {
        self.send().await?;
        Ok(())
    }

    async fn send(self) -> DomainResult<reqwest::Response> {
        let url = self.url()?;
        let client = &self.table.client;
        let token = client.auth().access_token().await?;
        tracing::debug!(method = %self.method, table = %self.table.name, "postgrest request");

        let mut request = client
            .http()
            .request(self.method.clone(), url)
            .header("apikey", client.config().anon_key())
            .bearer_auth(token);
        if self.method != Method::GET {
            request = request.header("Prefer", "return=minimal");
        }
        if let Some(body) = &self.body {
            request = request.json(body);
        }

        ensure_success(request.send().await?).await
    }
}
