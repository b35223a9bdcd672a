//! Configuration for a remote scan run.
//!
//! Credentials and repository context come from environment variables set by
//! the GitHub Actions runner; everything else comes from the command line.

mod error;
mod types;

pub use error::ConfigError;
pub use types::{
    API_KEY_ENV, DEFAULT_GITHUB_API_URL, GH_API_URL_ENV, GH_REF_ENV, GH_REPO_ENV, GH_SHA_ENV,
    GH_TOKEN_ENV, GitHubContext, ORG_ID_ENV, PlatformCredentials, SERVICE_KEY_ENV, USER_ENV,
};
