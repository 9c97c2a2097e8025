// ── Merchant domain type ──

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::entity_id::EntityId;
use super::geo_point::GeoPoint;
use super::merchant_tag::MerchantTag;
use super::subscription::Subscription;
use super::user::User;
use super::{Hydratable, Payload};

/// `geocode_description` of a merchant the geocoder has not resolved yet.
pub const GEOCODE_PENDING: &str = "等待解析";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Merchant {
    pub id: EntityId,
    pub title: String,
    pub description: String,
    pub legal_name: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub area: String,

    // ── Geocoding ──
    pub lng: Option<f64>,
    pub lat: Option<f64>,
    pub geocode_level: String,
    pub geocode_score: f64,
    pub geocode_description: String,
    pub geocode_attempts: i64,

    // ── Relationships ──
    pub owner: User,
    pub created_by: User,
    pub tags: Vec<MerchantTag>,
    pub geo_points: Vec<GeoPoint>,

    pub is_favorite: bool,
    pub subscription: Option<Subscription>,

    pub created: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
}

impl Default for Merchant {
    fn default() -> Self {
        Self {
            id: EntityId::default(),
            title: String::new(),
            description: String::new(),
            legal_name: String::new(),
            phone: String::new(),
            address: String::new(),
            city: String::new(),
            area: String::new(),
            lng: None,
            lat: None,
            geocode_level: String::new(),
            geocode_score: 0.0,
            geocode_description: GEOCODE_PENDING.to_owned(),
            geocode_attempts: 0,
            owner: User::default(),
            created_by: User::default(),
            tags: Vec::new(),
            geo_points: Vec::new(),
            is_favorite: false,
            subscription: None,
            created: None,
            updated: None,
        }
    }
}

impl Merchant {
    pub fn has_location(&self) -> bool {
        self.lng.is_some() && self.lat.is_some()
    }

    /// Located and no longer waiting on the geocoder.
    pub fn is_geocoded(&self) -> bool {
        self.geocode_description != GEOCODE_PENDING && self.has_location()
    }

    /// `address, area, city`, skipping empty parts.
    pub fn full_address(&self) -> String {
        [&self.address, &self.area, &self.city]
            .into_iter()
            .filter(|part| !part.is_empty())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Hydratable for Merchant {
    fn assign(&mut self, p: &Payload) {
        p.set("id", &mut self.id);
        p.set("title", &mut self.title);
        p.set("description", &mut self.description);
        p.set("legal_name", &mut self.legal_name);
        p.set("phone", &mut self.phone);
        p.set("address", &mut self.address);
        p.set("city", &mut self.city);
        p.set("area", &mut self.area);

        p.set("lng", &mut self.lng);
        p.set("lat", &mut self.lat);
        p.set("geocode_level", &mut self.geocode_level);
        p.set("geocode_score", &mut self.geocode_score);
        p.set("geocode_description", &mut self.geocode_description);
        p.set("geocode_attempts", &mut self.geocode_attempts);

        p.nested("owner", &mut self.owner);
        p.nested("created_by", &mut self.created_by);
        p.list("tags", &mut self.tags);
        p.list("geo_points", &mut self.geo_points);

        p.set("is_favorite", &mut self.is_favorite);
        p.nested_opt("subscription", &mut self.subscription);

        p.set_any(&["created", "created_at"], &mut self.created);
        p.set_any(&["updated", "updated_at"], &mut self.updated);
    }
}
