// ── Workspace facade ──
//
// One store per entity type plus the session, all sharing a single
// `ApiClient`. This is what an application shell holds.

use std::sync::Arc;

use fieldbook_api::{ApiClient, AuthFailure};
use tokio::sync::broadcast;
use tracing::debug;

use crate::model::{GeoPoint, Label, Merchant, MerchantTag, Project, Task, Team};
use crate::session::Session;
use crate::store::Store;

pub struct Workspace {
    client: Arc<ApiClient>,
    session: Session,
    projects: Store<Project>,
    tasks: Store<Task>,
    labels: Store<Label>,
    teams: Store<Team>,
    merchants: Store<Merchant>,
    merchant_tags: Store<MerchantTag>,
    geo_points: Store<GeoPoint>,
}

impl Workspace {
    pub fn new(client: ApiClient) -> Self {
        Self::from_shared(Arc::new(client))
    }

    pub fn from_shared(client: Arc<ApiClient>) -> Self {
        Self {
            session: Session::new(Arc::clone(&client)),
            projects: Store::new(Arc::clone(&client)),
            tasks: Store::new(Arc::clone(&client)),
            labels: Store::new(Arc::clone(&client)),
            teams: Store::new(Arc::clone(&client)),
            merchants: Store::new(Arc::clone(&client)),
            merchant_tags: Store::new(Arc::clone(&client)),
            geo_points: Store::new(Arc::clone(&client)),
            client,
        }
    }

    pub fn client(&self) -> &Arc<ApiClient> {
        &self.client
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn projects(&self) -> &Store<Project> {
        &self.projects
    }

    pub fn tasks(&self) -> &Store<Task> {
        &self.tasks
    }

    pub fn labels(&self) -> &Store<Label> {
        &self.labels
    }

    pub fn teams(&self) -> &Store<Team> {
        &self.teams
    }

    pub fn merchants(&self) -> &Store<Merchant> {
        &self.merchants
    }

    pub fn merchant_tags(&self) -> &Store<MerchantTag> {
        &self.merchant_tags
    }

    pub fn geo_points(&self) -> &Store<GeoPoint> {
        &self.geo_points
    }

    /// Credential rejections raised by the shared client.
    pub fn auth_failures(&self) -> broadcast::Receiver<AuthFailure> {
        self.client.subscribe_auth_failures()
    }

    /// End the session after a rejection and drop every cache, since
    /// they belonged to the rejected user.
    pub fn apply_auth_failure(&self, failure: &AuthFailure) {
        self.session.apply_auth_failure(failure);
        self.clear_caches();
    }

    pub fn clear_caches(&self) {
        self.projects.clear();
        self.tasks.clear();
        self.labels.clear();
        self.teams.clear();
        self.merchants.clear();
        self.merchant_tags.clear();
        self.geo_points.clear();
        debug!("caches cleared");
    }

    /// Cancel everything in flight on every store and the session.
    pub fn cancel_all(&self) -> usize {
        self.session.cancel()
            + self.projects.cancel()
            + self.tasks.cancel()
            + self.labels.cancel()
            + self.teams.cancel()
            + self.merchants.cancel()
            + self.merchant_tags.cancel()
            + self.geo_points.cancel()
    }
}
