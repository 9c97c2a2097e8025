// ── Endpoint catalogue ──
//
// One `Resource` impl per entity type: its nouns, relation key and the
// immutable operation → template table. The project/task/label/team
// backend creates with PUT and updates with POST.

use fieldbook_api::{Endpoints, Method, Operation};

use super::Resource;
use crate::model::{EntityId, GeoPoint, Label, Merchant, MerchantTag, Project, Task, Team};

// ── Extension operations ────────────────────────────────────────────

/// `GET /tasks/all`: tasks across every project.
pub const TASKS_ALL: Operation = Operation::Custom("all");
/// `POST /merchants/{id}/geocode`.
pub const GEOCODE_MERCHANT: Operation = Operation::Custom("geocodeMerchant");
/// `POST /merchants/import/excel` (multipart).
pub const IMPORT_EXCEL: Operation = Operation::Custom("importExcel");
/// `POST /merchants/import/csv` (multipart).
pub const IMPORT_CSV: Operation = Operation::Custom("importCsv");
/// `POST /merchants/geocode` with `{address}`.
pub const GEOCODE_ADDRESS: Operation = Operation::Custom("geocode");
/// `GET /merchant-tags/classes`.
pub const DISTINCT_CLASSES: Operation = Operation::Custom("distinctClasses");

/// CRUD table with the PUT-create / POST-update verbs.
fn put_create_post_update(
    create: &str,
    get: &str,
    get_all: &str,
    update: &str,
    delete: &str,
) -> Endpoints {
    Endpoints::crud(create, get, get_all, update, delete)
        .with_method(Operation::Create, Method::PUT)
        .with_method(Operation::Update, Method::POST)
}

impl Resource for Project {
    const NAME: &'static str = "project";
    const PLURAL: &'static str = "projects";

    fn endpoints() -> Endpoints {
        put_create_post_update(
            "/projects",
            "/projects/{id}",
            "/projects",
            "/projects/{id}",
            "/projects/{id}",
        )
    }

    fn id(&self) -> &EntityId {
        &self.id
    }
}

impl Resource for Task {
    const NAME: &'static str = "task";
    const PLURAL: &'static str = "tasks";
    const RELATION_KEY: Option<&'static str> = Some("project_id");

    fn endpoints() -> Endpoints {
        put_create_post_update(
            "/projects/{project_id}/tasks",
            "/tasks/{id}",
            "/projects/{project_id}/tasks",
            "/tasks/{id}",
            "/tasks/{id}",
        )
        .with(TASKS_ALL, "/tasks/all")
        .with_method(TASKS_ALL, Method::GET)
    }

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn relation_id(&self) -> Option<&EntityId> {
        Some(&self.project_id)
    }
}

impl Resource for Label {
    const NAME: &'static str = "label";
    const PLURAL: &'static str = "labels";

    fn endpoints() -> Endpoints {
        put_create_post_update(
            "/labels",
            "/labels/{id}",
            "/labels",
            "/labels/{id}",
            "/labels/{id}",
        )
    }

    fn id(&self) -> &EntityId {
        &self.id
    }
}

impl Resource for Team {
    const NAME: &'static str = "team";
    const PLURAL: &'static str = "teams";

    fn endpoints() -> Endpoints {
        put_create_post_update("/teams", "/teams/{id}", "/teams", "/teams/{id}", "/teams/{id}")
    }

    fn id(&self) -> &EntityId {
        &self.id
    }
}

impl Resource for Merchant {
    const NAME: &'static str = "merchant";
    const PLURAL: &'static str = "merchants";

    fn endpoints() -> Endpoints {
        Endpoints::crud(
            "/merchants",
            "/merchants/{id}",
            "/merchants",
            "/merchants/{id}",
            "/merchants/{id}",
        )
        .with(GEOCODE_MERCHANT, "/merchants/{id}/geocode")
        .with(IMPORT_EXCEL, "/merchants/import/excel")
        .with(IMPORT_CSV, "/merchants/import/csv")
        .with(GEOCODE_ADDRESS, "/merchants/geocode")
    }

    fn id(&self) -> &EntityId {
        &self.id
    }
}

impl Resource for MerchantTag {
    const NAME: &'static str = "merchant tag";
    const PLURAL: &'static str = "merchant tags";

    fn endpoints() -> Endpoints {
        Endpoints::crud(
            "/merchant-tags",
            "/merchant-tags/{id}",
            "/merchant-tags",
            "/merchant-tags/{id}",
            "/merchant-tags/{id}",
        )
        .with(DISTINCT_CLASSES, "/merchant-tags/classes")
        .with_method(DISTINCT_CLASSES, Method::GET)
    }

    fn id(&self) -> &EntityId {
        &self.id
    }
}

impl Resource for GeoPoint {
    const NAME: &'static str = "geo point";
    const PLURAL: &'static str = "geo points";
    const RELATION_KEY: Option<&'static str> = Some("merchant_id");

    fn endpoints() -> Endpoints {
        Endpoints::crud(
            "/merchants/{merchant_id}/geopoints",
            "/geopoints/{id}",
            "/merchants/{merchant_id}/geopoints",
            "/geopoints/{id}",
            "/geopoints/{id}",
        )
    }

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn relation_id(&self) -> Option<&EntityId> {
        Some(&self.merchant_id)
    }
}
