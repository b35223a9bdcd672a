//! Configuration type definitions.

use super::ConfigError;
use std::fmt;
use url::Url;

pub const USER_ENV: &str = "CONTRAST__API__USER_NAME";
pub const API_KEY_ENV: &str = "CONTRAST__API__API_KEY";
pub const SERVICE_KEY_ENV: &str = "CONTRAST__API__SERVICE_KEY";
pub const ORG_ID_ENV: &str = "CONTRAST__API__ORGANIZATION_ID";
pub const GH_REPO_ENV: &str = "GITHUB_REPOSITORY";
pub const GH_REF_ENV: &str = "GITHUB_REF";
pub const GH_SHA_ENV: &str = "GITHUB_SHA";
pub const GH_TOKEN_ENV: &str = "GITHUB_TOKEN";
pub const GH_API_URL_ENV: &str = "GITHUB_API_URL";

/// Used when the runner does not export `GITHUB_API_URL`.
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

/// Credentials for the Contrast platform.
#[derive(Clone, PartialEq, Eq)]
pub struct PlatformCredentials {
    pub user: String,
    pub org_id: String,
    pub api_key: String,
    pub service_key: String,
}

impl fmt::Debug for PlatformCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlatformCredentials")
            .field("user", &self.user)
            .field("org_id", &self.org_id)
            .finish_non_exhaustive()
    }
}

impl PlatformCredentials {
    /// Read credentials through `lookup`, which maps a variable name to its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            user: required(&lookup, USER_ENV)?,
            org_id: required(&lookup, ORG_ID_ENV)?,
            api_key: required(&lookup, API_KEY_ENV)?,
            service_key: required(&lookup, SERVICE_KEY_ENV)?,
        })
    }
}

/// Repository context exported by the GitHub Actions runner.
#[derive(Clone, PartialEq, Eq)]
pub struct GitHubContext {
    /// Repository in "owner/repo" format
    pub repository: String,
    pub git_ref: String,
    pub sha: String,
    pub token: String,
    pub api_url: Url,
}

impl fmt::Debug for GitHubContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitHubContext")
            .field("repository", &self.repository)
            .field("git_ref", &self.git_ref)
            .field("sha", &self.sha)
            .field("api_url", &self.api_url.as_str())
            .finish_non_exhaustive()
    }
}

impl GitHubContext {
    /// Read the repository context through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = lookup(GH_API_URL_ENV)
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_GITHUB_API_URL.to_string());
        let parsed = Url::parse(&api_url).map_err(|source| ConfigError::InvalidUrl {
            name: GH_API_URL_ENV.to_string(),
            value: api_url.clone(),
            source,
        })?;

        Ok(Self {
            repository: required(&lookup, GH_REPO_ENV)?,
            git_ref: required(&lookup, GH_REF_ENV)?,
            sha: required(&lookup, GH_SHA_ENV)?,
            token: required(&lookup, GH_TOKEN_ENV)?,
            api_url: parsed,
        })
    }

    /// Contrast project name for this repository.
    pub fn project_name(&self) -> &str {
        &self.repository
    }

    /// Scan label identifying the ref and commit being scanned.
    pub fn scan_label(&self) -> String {
        format!("{}-{}", self.git_ref, self.sha)
    }

    /// Code scanning SARIF upload endpoint for this repository.
    pub fn code_scanning_endpoint(&self) -> String {
        format!(
            "{}/repos/{}/code-scanning/sarifs",
            self.api_url.as_str().trim_end_matches('/'),
            self.repository
        )
    }
}

fn required<F>(lookup: &F, name: &str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name).ok_or_else(|| ConfigError::MissingEnv(name.to_string()))
}
