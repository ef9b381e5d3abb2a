use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use super::domain::{FleetCategory, FleetItem, MapPoint, MapPointKind, Tour};
use super::geo::{Coordinates, DEFAULT_NEAREST_LIMIT};
use super::query::TourQuery;
use super::seed::SeedOutcome;
use super::service::{CatalogError, CatalogService};
use crate::identity::IdentityProvider;
use crate::store::KeyValueStore;
use crate::workflows::access::AccessError;
use crate::workflows::http::{error_response, unauthorized, user_token, JsonBody};

type Service<S, I> = Arc<CatalogService<S, I>>;

/// Router builder for the public catalog and its admin curation endpoints.
pub fn catalog_router<S, I>(service: Service<S, I>) -> Router
where
    S: KeyValueStore + 'static,
    I: IdentityProvider + 'static,
{
    Router::new()
        .route("/seed", post(seed_handler::<S, I>))
        .route(
            "/tours",
            get(list_tours_handler::<S, I>).post(save_tour_handler::<S, I>),
        )
        .route(
            "/tours/:slug",
            get(get_tour_handler::<S, I>).delete(delete_tour_handler::<S, I>),
        )
        .route(
            "/fleet",
            get(list_fleet_handler::<S, I>).post(save_fleet_handler::<S, I>),
        )
        .route("/fleet/:id", delete(delete_fleet_handler::<S, I>))
        .route(
            "/map-points",
            get(list_points_handler::<S, I>).post(save_point_handler::<S, I>),
        )
        .route("/map-points/nearest", get(nearest_points_handler::<S, I>))
        .route("/map-points/:id", delete(delete_point_handler::<S, I>))
        .with_state(service)
}

fn failure(error: CatalogError, context: &'static str) -> Response {
    match error {
        CatalogError::Validation(reason) => error_response(StatusCode::BAD_REQUEST, reason),
        CatalogError::Access(AccessError::Unauthorized) => unauthorized(),
        error @ CatalogError::NotFound(_) => error_response(StatusCode::NOT_FOUND, error.to_string()),
        other => {
            error!(error = %other, "{context}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, context)
        }
    }
}

fn message(text: &'static str) -> Response {
    (StatusCode::OK, Json(json!({ "message": text }))).into_response()
}

pub(crate) async fn seed_handler<S, I>(State(service): State<Service<S, I>>) -> Response
where
    S: KeyValueStore + 'static,
    I: IdentityProvider + 'static,
{
    match service.seed() {
        Ok(SeedOutcome::AlreadySeeded) => message("Already seeded"),
        Ok(SeedOutcome::Seeded {
            tours,
            fleet,
            map_points,
        }) => (
            StatusCode::OK,
            Json(json!({
                "message": "Seed complete",
                "tours": tours,
                "fleet": fleet,
                "mapPoints": map_points,
            })),
        )
            .into_response(),
        Err(error) => failure(error, "Seeding failed"),
    }
}

pub(crate) async fn list_tours_handler<S, I>(
    State(service): State<Service<S, I>>,
    Query(query): Query<TourQuery>,
) -> Response
where
    S: KeyValueStore + 'static,
    I: IdentityProvider + 'static,
{
    match service.tours(query) {
        Ok(tours) => (StatusCode::OK, Json(json!({ "tours": tours }))).into_response(),
        Err(error) => failure(error, "Failed to fetch tours"),
    }
}

pub(crate) async fn get_tour_handler<S, I>(
    State(service): State<Service<S, I>>,
    Path(slug): Path<String>,
) -> Response
where
    S: KeyValueStore + 'static,
    I: IdentityProvider + 'static,
{
    match service.tour(&slug) {
        Ok(tour) => (StatusCode::OK, Json(json!({ "tour": tour }))).into_response(),
        Err(error) => failure(error, "Failed to fetch tour"),
    }
}

pub(crate) async fn save_tour_handler<S, I>(
    State(service): State<Service<S, I>>,
    headers: HeaderMap,
    JsonBody(tour): JsonBody<Tour>,
) -> Response
where
    S: KeyValueStore + 'static,
    I: IdentityProvider + 'static,
{
    match service.save_tour(user_token(&headers), tour) {
        Ok(tour) => (
            StatusCode::OK,
            Json(json!({ "message": "Tour saved", "tour": tour })),
        )
            .into_response(),
        Err(error) => failure(error, "Failed to save tour"),
    }
}

pub(crate) async fn delete_tour_handler<S, I>(
    State(service): State<Service<S, I>>,
    Path(slug): Path<String>,
    headers: HeaderMap,
) -> Response
where
    S: KeyValueStore + 'static,
    I: IdentityProvider + 'static,
{
    match service.delete_tour(user_token(&headers), &slug) {
        Ok(()) => message("Tour deleted"),
        Err(error) => failure(error, "Failed to delete tour"),
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct FleetQuery {
    category: Option<FleetCategory>,
}

pub(crate) async fn list_fleet_handler<S, I>(
    State(service): State<Service<S, I>>,
    Query(query): Query<FleetQuery>,
) -> Response
where
    S: KeyValueStore + 'static,
    I: IdentityProvider + 'static,
{
    match service.fleet(query.category) {
        Ok(items) => (StatusCode::OK, Json(json!({ "items": items }))).into_response(),
        Err(error) => failure(error, "Failed to fetch fleet"),
    }
}

pub(crate) async fn save_fleet_handler<S, I>(
    State(service): State<Service<S, I>>,
    headers: HeaderMap,
    JsonBody(item): JsonBody<FleetItem>,
) -> Response
where
    S: KeyValueStore + 'static,
    I: IdentityProvider + 'static,
{
    match service.save_fleet_item(user_token(&headers), item) {
        Ok(()) => message("Fleet item saved"),
        Err(error) => failure(error, "Failed to save fleet item"),
    }
}

pub(crate) async fn delete_fleet_handler<S, I>(
    State(service): State<Service<S, I>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    S: KeyValueStore + 'static,
    I: IdentityProvider + 'static,
{
    match service.delete_fleet_item(user_token(&headers), &id) {
        Ok(()) => message("Fleet item deleted"),
        Err(error) => failure(error, "Failed to delete fleet item"),
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct PointsQuery {
    #[serde(rename = "type")]
    kind: Option<MapPointKind>,
}

pub(crate) async fn list_points_handler<S, I>(
    State(service): State<Service<S, I>>,
    Query(query): Query<PointsQuery>,
) -> Response
where
    S: KeyValueStore + 'static,
    I: IdentityProvider + 'static,
{
    match service.map_points(query.kind) {
        Ok(points) => (StatusCode::OK, Json(json!({ "points": points }))).into_response(),
        Err(error) => failure(error, "Failed to fetch map points"),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct NearestQuery {
    lat: f64,
    lng: f64,
    limit: Option<usize>,
}

pub(crate) async fn nearest_points_handler<S, I>(
    State(service): State<Service<S, I>>,
    Query(query): Query<NearestQuery>,
) -> Response
where
    S: KeyValueStore + 'static,
    I: IdentityProvider + 'static,
{
    let origin = Coordinates {
        lat: query.lat,
        lng: query.lng,
    };
    let limit = query.limit.unwrap_or(DEFAULT_NEAREST_LIMIT);
    match service.nearest_points(origin, limit) {
        Ok(points) => (StatusCode::OK, Json(json!({ "points": points }))).into_response(),
        Err(error) => failure(error, "Failed to fetch map points"),
    }
}

pub(crate) async fn save_point_handler<S, I>(
    State(service): State<Service<S, I>>,
    headers: HeaderMap,
    JsonBody(point): JsonBody<MapPoint>,
) -> Response
where
    S: KeyValueStore + 'static,
    I: IdentityProvider + 'static,
{
    match service.save_map_point(user_token(&headers), point) {
        Ok(()) => message("Map point saved"),
        Err(error) => failure(error, "Failed to save map point"),
    }
}

pub(crate) async fn delete_point_handler<S, I>(
    State(service): State<Service<S, I>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    S: KeyValueStore + 'static,
    I: IdentityProvider + 'static,
{
    match service.delete_map_point(user_token(&headers), &id) {
        Ok(()) => message("Map point deleted"),
        Err(error) => failure(error, "Failed to delete map point"),
    }
}
