use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::info;

use crate::errors::ReportError;

pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum CredentialFile {
    ServiceAccount {
        project_id: Option<String>,
        client_email: String,
        private_key: String,
        private_key_id: Option<String>,
        token_uri: Option<String>,
    },
    AuthorizedUser {
        client_id: String,
        client_secret: String,
        refresh_token: String,
        quota_project_id: Option<String>,
        token_uri: Option<String>,
    },
}

/// How an access token is obtained for the billing data source.
pub enum CredentialGrant {
    /// Signed JWT assertion exchanged at the token endpoint.
    ServiceAccount {
        client_email: String,
        private_key: String,
        private_key_id: Option<String>,
        token_uri: String,
    },
    /// Long-lived refresh token exchanged at the token endpoint.
    AuthorizedUser {
        client_id: String,
        client_secret: String,
        refresh_token: String,
        token_uri: String,
    },
}

impl CredentialGrant {
    pub fn token_uri(&self) -> &str {
        match self {
            CredentialGrant::ServiceAccount { token_uri, .. } => token_uri,
            CredentialGrant::AuthorizedUser { token_uri, .. } => token_uri,
        }
    }
}

impl Drop for CredentialGrant {
    fn drop(&mut self) {
        match self {
            CredentialGrant::ServiceAccount { private_key, .. } => wipe(private_key),
            CredentialGrant::AuthorizedUser { client_secret, refresh_token, .. } => {
                wipe(client_secret);
                wipe(refresh_token);
            }
        }
    }
}

/// Zero a secret's heap buffer before it is freed.
fn wipe(secret: &mut String) {
    let mut bytes = std::mem::take(secret).into_bytes();
    bytes.fill(0);
    std::hint::black_box(&bytes);
}

/// Billing data credential, read once from its mounted file at startup and
/// held for the life of the process. Secret material is wiped on drop.
pub struct BillingCredential {
    source: PathBuf,
    project_id: Option<String>,
    grant: CredentialGrant,
}

impl BillingCredential {
    pub fn load(path: &Path) -> Result<Self, ReportError> {
        if !path.exists() {
            return Err(ReportError::Config(format!(
                "Billing credential file not found: {}",
                path.display()
            )));
        }
        let mut content = std::fs::read_to_string(path).map_err(|e| {
            ReportError::Config(format!("Cannot read credential file {}: {}", path.display(), e))
        })?;
        let result = Self::from_json(path, &content);
        wipe(&mut content);

        let credential = result?;
        info!(
            source = %path.display(),
            identity = %credential.identity(),
            "Billing credential loaded"
        );
        Ok(credential)
    }

    pub fn from_json(source: &Path, content: &str) -> Result<Self, ReportError> {
        let parsed: CredentialFile = serde_json::from_str(content).map_err(|e| {
            ReportError::Config(format!(
                "Unsupported or malformed credential file {}: {}",
                source.display(),
                e
            ))
        })?;

        let (project_id, grant) = match parsed {
            CredentialFile::ServiceAccount { project_id, client_email, private_key, private_key_id, token_uri } => {
                if !private_key.contains("PRIVATE KEY") {
                    return Err(ReportError::Config(format!(
                        "Credential file {} has no PEM private key",
                        source.display()
                    )));
                }
                (
                    project_id,
                    CredentialGrant::ServiceAccount {
                        client_email,
                        private_key,
                        private_key_id,
                        token_uri: token_uri.unwrap_or_else(|| DEFAULT_TOKEN_URI.to_string()),
                    },
                )
            }
            CredentialFile::AuthorizedUser { client_id, client_secret, refresh_token, quota_project_id, token_uri } => (
                quota_project_id,
                CredentialGrant::AuthorizedUser {
                    client_id,
                    client_secret,
                    refresh_token,
                    token_uri: token_uri.unwrap_or_else(|| DEFAULT_TOKEN_URI.to_string()),
                },
            ),
        };

        Ok(Self {
            source: source.to_path_buf(),
            project_id,
            grant,
        })
    }

    /// Project the credential belongs to, used to run query jobs.
    pub fn project_id(&self) -> Option<&str> {
        self.project_id.as_deref()
    }

    pub fn grant(&self) -> &CredentialGrant {
        &self.grant
    }

    /// Non-secret identity for logs: the service account email or client id.
    pub fn identity(&self) -> &str {
        match &self.grant {
            CredentialGrant::ServiceAccount { client_email, .. } => client_email,
            CredentialGrant::AuthorizedUser { client_id, .. } => client_id,
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }
}

impl fmt::Debug for BillingCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BillingCredential")
            .field("source", &self.source)
            .field("project_id", &self.project_id)
            .field("identity", &self.identity())
            .finish_non_exhaustive()
    }
}

/// Redact sensitive values in a string. Replaces each secret with [REDACTED].
pub fn redact_credentials(text: &str, secrets: &[&str]) -> String {
    let mut result = text.to_string();
    for secret in secrets {
        if !secret.is_empty() && secret.len() >= 4 {
            result = result.replace(secret, "[REDACTED]");
        }
    }
    result
}
