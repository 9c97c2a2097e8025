// fieldbook-api: async HTTP transport for the fieldbook REST backend

pub mod auth;
pub mod client;
pub mod error;
pub mod template;
pub mod transport;
pub mod upload;

pub use auth::{AuthFailure, CredentialStore, MemoryCredentialStore};
pub use client::{ApiClient, DEFAULT_API_PREFIX};
pub use error::Error;
pub use template::{Endpoint, Endpoints, Operation, Params, ResolvedEndpoint, resolve_template};
pub use transport::{TlsMode, TransportConfig};
pub use upload::{ProgressFn, UploadFile};

// Consumers name HTTP verbs when overriding endpoint methods.
pub use reqwest::Method;
