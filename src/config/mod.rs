pub mod types;
pub mod env;
pub mod credentials;

pub use types::*;
pub use env::{load_from_env, load_with, parse_bool};
pub use credentials::{BillingCredential, CredentialGrant, redact_credentials};
