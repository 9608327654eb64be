//! HTTP handler functions for the municipal budget map API.

use std::sync::Arc;

use actix_web::http::header;
use actix_web::{HttpRequest, HttpResponse, error, web};
use muni_budget_allocation::default_catalog;
use muni_budget_allocation_models::{AllocationSubmission, RequesterInfo};
use muni_budget_database as database;
use muni_budget_map_data::MapData;
use muni_budget_server_models::{
    AllocationListParams, ApiAllocationList, ApiError, ApiHealth, ApiStoredAllocation,
    LocateParams, MAP_DATA_UNAVAILABLE, MunicipalitySearchParams, STORED_MESSAGE,
};

use crate::AppState;

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        status: "ok".to_string(),
        message: "Server is running".to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// `POST /api/budget-allocations`
///
/// Stores one submission with the requester's address and user agent.
pub async fn store_allocation(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<AllocationSubmission>,
) -> HttpResponse {
    let user_info = RequesterInfo {
        ip_address: req
            .connection_info()
            .realip_remote_addr()
            .map(ToString::to_string),
        user_agent: req
            .headers()
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string),
    };

    match database::insert_allocation(state.db.as_ref(), body.into_inner(), user_info).await {
        Ok(stored) => HttpResponse::Created().json(ApiStoredAllocation {
            success: true,
            id: stored.id,
            message: STORED_MESSAGE.to_string(),
        }),
        Err(e) => {
            log::error!("Error storing budget allocation: {e}");
            HttpResponse::InternalServerError()
                .json(ApiError::with_error("Error storing budget allocation", e))
        }
    }
}

/// `GET /api/budget-allocations`
///
/// Most recent submissions, newest first.
pub async fn list_allocations(
    state: web::Data<AppState>,
    params: web::Query<AllocationListParams>,
) -> HttpResponse {
    match database::list_recent(state.db.as_ref(), params.effective_limit()).await {
        Ok(data) => HttpResponse::Ok().json(ApiAllocationList {
            success: true,
            count: data.len(),
            data,
        }),
        Err(e) => {
            log::error!("Error fetching budget allocations: {e}");
            HttpResponse::InternalServerError()
                .json(ApiError::with_error("Error fetching budget allocations", e))
        }
    }
}

/// Rejects unparsable submission bodies with the shared error shape.
pub fn json_error(err: error::JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    log::warn!("Rejected budget allocation body: {err}");
    let response = HttpResponse::BadRequest().json(ApiError::with_error(
        "Invalid budget allocation",
        err.to_string(),
    ));
    error::InternalError::from_response(err, response).into()
}

/// Rejects unparsable query strings with the shared error shape.
pub fn query_error(err: error::QueryPayloadError, req: &HttpRequest) -> actix_web::Error {
    log::warn!("Rejected query `{}`: {err}", req.query_string());
    let response = HttpResponse::BadRequest().json(ApiError::with_error(
        "Invalid query parameters",
        err.to_string(),
    ));
    error::InternalError::from_response(err, response).into()
}

/// `GET /api/categories`
pub async fn categories() -> HttpResponse {
    HttpResponse::Ok().json(default_catalog())
}

async fn map_data(state: &AppState) -> Result<Arc<MapData>, HttpResponse> {
    state.map_data.get().await.map_err(|e| {
        log::error!("Map data unavailable: {e}");
        HttpResponse::ServiceUnavailable().json(ApiError::with_error(MAP_DATA_UNAVAILABLE, e))
    })
}

/// `GET /api/municipalities?q=`
pub async fn municipalities(
    state: web::Data<AppState>,
    params: web::Query<MunicipalitySearchParams>,
) -> HttpResponse {
    let data = match map_data(&state).await {
        Ok(data) => data,
        Err(response) => return response,
    };

    let results = data.search(params.q.as_deref().unwrap_or_default());
    HttpResponse::Ok().json(results)
}

/// `GET /api/municipalities/{id}`
pub async fn municipality(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    let data = match map_data(&state).await {
        Ok(data) => data,
        Err(response) => return response,
    };

    let id = path.into_inner();
    data.find_by_id(&id).map_or_else(
        || HttpResponse::NotFound().json(ApiError::new(format!("Municipality {id} not found"))),
        |record| HttpResponse::Ok().json(record),
    )
}

/// `GET /api/locate?lat=&lon=`
///
/// The municipality whose boundary contains the point.
pub async fn locate(state: web::Data<AppState>, params: web::Query<LocateParams>) -> HttpResponse {
    let data = match map_data(&state).await {
        Ok(data) => data,
        Err(response) => return response,
    };

    match data.locate(params.lat, params.lon) {
        Some(record) => HttpResponse::Ok().json(record),
        None => {
            log::debug!("No municipality at ({}, {})", params.lat, params.lon);
            HttpResponse::NotFound().json(ApiError::new("No municipality found at this location"))
        }
    }
}

/// `GET /api/boundaries`
///
/// Decoded boundaries as `GeoJSON`, with resolved record fields merged
/// into each feature's properties.
pub async fn boundaries(state: web::Data<AppState>) -> HttpResponse {
    let data = match map_data(&state).await {
        Ok(data) => data,
        Err(response) => return response,
    };

    HttpResponse::Ok().json(data.enriched_geojson())
}
