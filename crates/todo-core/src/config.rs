//! Client Configuration
//!
//! Endpoint and anon key of the Supabase project. Built once at start-up and
//! handed to the client; nothing reads it from ambient state afterwards.

use url::Url;

use crate::domain::{DomainError, DomainResult};

/// Environment variable holding the project URL
pub const URL_VAR: &str = "SUPABASE_URL";
/// Environment variable holding the anon (public) API key
pub const ANON_KEY_VAR: &str = "SUPABASE_ANON_KEY";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupabaseConfig {
    url: Url,
    anon_key: String,
}

impl SupabaseConfig {
    pub fn new(url: &str, anon_key: &str) -> DomainResult<Self> {
        let mut url = Url::parse(url.trim())?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(DomainError::InvalidConfig(format!(
                "unsupported scheme '{}'",
                url.scheme()
            )));
        }
        if url.host_str().is_none() {
            return Err(DomainError::InvalidConfig("url has no host".to_string()));
        }
        // Endpoint paths are joined relative to the base, which needs a trailing slash
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }

        let anon_key = anon_key.trim();
        if anon_key.is_empty() {
            return Err(DomainError::InvalidConfig("anon key is empty".to_string()));
        }

        Ok(Self {
            url,
            anon_key: anon_key.to_string(),
        })
    }

    /// Read `SUPABASE_URL` / `SUPABASE_ANON_KEY` from the process environment
    pub fn from_env() -> DomainResult<Self> {
        let url = std::env::var(URL_VAR)
            .map_err(|_| DomainError::InvalidConfig(format!("{} is not set", URL_VAR)))?;
        let anon_key = std::env::var(ANON_KEY_VAR)
            .map_err(|_| DomainError::InvalidConfig(format!("{} is not set", ANON_KEY_VAR)))?;
        Self::new(&url, &anon_key)
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn anon_key(&self) -> &str {
        &self.anon_key
    }

    /// Absolute URL of a service path such as `auth/v1/token`
    pub fn endpoint(&self, path: &str) -> DomainResult<Url> {
        Ok(self.url.join(path.trim_start_matches('/'))?)
    }

    /// Key under which the session is persisted: `sb-<project-ref>-auth-token`
    pub fn storage_key(&self) -> String {
        let host = self.url.host_str().unwrap_or("local");
        let project_ref = host.split('.').next().unwrap_or(host);
        format!("sb-{}-auth-token", project_ref)
    }
}
