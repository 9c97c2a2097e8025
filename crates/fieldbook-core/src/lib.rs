// fieldbook-core: hydrated models, CRUD services and reactive stores over fieldbook-api.

pub mod error;
pub mod model;
pub mod service;
pub mod session;
pub mod store;
pub mod stream;
pub mod workspace;

// ── Primary re-exports ──────────────────────────────────────────────
pub use error::CoreError;
pub use service::{CancelHandle, LoadingGuard, LoadingTracker, Resource, Service};
pub use session::{Registration, Session};
pub use store::Store;
pub use stream::{EntityStream, EntityWatchStream};
pub use workspace::Workspace;

// Re-export model types at the crate root for ergonomics.
pub use model::{
    // Hydration
    Hydratable, Payload, hydrate, hydrate_list,
    // Entities
    ApiInfo, EntityId, GeoMetadata, GeoPoint, Label, Merchant, MerchantTag, Project, RepeatMode,
    Subscription, Task, Team, User,
    // Operation results
    GeocodeResult, ImportResult, ImportRowError,
};

// Transport types consumers need to drive stores.
pub use fieldbook_api::{ApiClient, AuthFailure, Operation, Params, UploadFile};
