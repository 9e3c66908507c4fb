use chrono::Utc;
use futures_util::future;
use serde::Deserialize;
use serde_json::Value;

use crate::{
    error::{status_text, EtabusError, EtabusResult},
    eta::{enhance_eta_data, EnhancedEta},
    kmb::{
        entities::{Bound, Envelope, Eta},
        error::KmbError,
    },
    routes::{combine_route_with_stops, RouteWithStops},
    ContextData,
};

#[derive(Deserialize, Debug, Default)]
pub struct BusDataQuery {
    #[serde(rename = "dataType")]
    pub data_type: Option<String>,
    pub route: Option<String>,
    #[serde(rename = "stopId")]
    pub stop_id: Option<String>,
    #[serde(rename = "serviceType")]
    pub service_type: Option<String>,
    pub bound: Option<String>,
    pub enhanced: Option<String>,
}

/// Cache-Control hint attached to the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// Real-time data, never cached.
    NoStore,
    /// Reference data, cacheable for ten minutes.
    Cacheable,
}

impl CachePolicy {
    pub fn header_value(&self) -> &'static str {
        match self {
            CachePolicy::NoStore => "no-cache, no-store, must-revalidate",
            CachePolicy::Cacheable => "public, max-age=600",
        }
    }
}

#[derive(Debug)]
pub struct BusDataReply {
    pub body: Value,
    pub cache: CachePolicy,
}

/// Query strings treat an empty value the same as an absent one.
fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Picks and fetches the upstream data selected by the query. Single-fetch
/// selectors pass the upstream envelope through; `route-with-stops` builds
/// the combined view from three parallel fetches.
pub async fn get_bus_data(ctx: &ContextData, query: &BusDataQuery) -> EtabusResult<BusDataReply> {
    let data_type = non_empty(&query.data_type).unwrap_or("routes");
    let route = non_empty(&query.route);
    let stop_id = non_empty(&query.stop_id);
    let service_type = non_empty(&query.service_type).unwrap_or("1");
    let bound = non_empty(&query.bound);
    let enhanced = non_empty(&query.enhanced) == Some("true");

    // The combined view needs both a route and a bound; without them the
    // selector falls through and is rejected below.
    if data_type == "route-with-stops" {
        if let (Some(route), Some(bound)) = (route, bound) {
            let body = match combined_route_with_stops(ctx, route, bound, service_type).await {
                Ok(body) => body,
                Err(error @ EtabusError::Response(..)) => return Err(error),
                Err(error) => {
                    log::error!("Error getting combined route with stops: {}", error);
                    return Err(EtabusError::Response(
                        500,
                        "Error getting combined route with stops".to_string(),
                    ));
                }
            };

            return Ok(BusDataReply {
                body,
                cache: CachePolicy::Cacheable,
            });
        }
    }

    let body = match data_type {
        "routes" => match (route, bound) {
            (Some(route), Some(bound)) => serde_json::to_value(
                ctx.kmb
                    .route(route, Bound::from_query(bound), service_type)
                    .await?,
            )?,
            (Some(route), None) => {
                serde_json::to_value(ctx.kmb.route_by_service_type(route, service_type).await?)?
            }
            (None, _) => serde_json::to_value(ctx.kmb.routes().await?)?,
        },
        "stops" => match stop_id {
            Some(stop_id) => serde_json::to_value(ctx.kmb.stop(stop_id).await?)?,
            None => serde_json::to_value(ctx.kmb.stops().await?)?,
        },
        "route-stops" => match (route, bound) {
            (Some(route), Some(bound)) => serde_json::to_value(
                ctx.kmb
                    .route_stops(route, Bound::from_query(bound), service_type)
                    .await?,
            )?,
            _ => serde_json::to_value(ctx.kmb.route_stops_all().await?)?,
        },
        "eta" => {
            let envelope = match (stop_id, route) {
                (Some(stop_id), Some(route)) => ctx.kmb.eta(stop_id, route, service_type).await?,
                (Some(stop_id), None) => ctx.kmb.stop_eta(stop_id, service_type).await?,
                (None, Some(route)) => ctx.kmb.route_eta(route, service_type).await?,
                (None, None) => {
                    return Err(EtabusError::Response(
                        400,
                        "Either stopId or route must be provided for ETA data".to_string(),
                    ))
                }
            };

            if enhanced {
                serde_json::to_value(enhance_envelope(envelope))?
            } else {
                serde_json::to_value(envelope)?
            }
        }
        _ => {
            return Err(EtabusError::Response(
                400,
                "Invalid dataType parameter".to_string(),
            ))
        }
    };

    let cache = if data_type == "eta" {
        CachePolicy::NoStore
    } else {
        CachePolicy::Cacheable
    };

    Ok(BusDataReply { body, cache })
}

/// Fetches route detail, the route's stop sequence, and the full stop list
/// in parallel, then combines them into one envelope. Each fetch fails with
/// its own status and message; a route detail without a data section is a
/// not-found.
async fn combined_route_with_stops(
    ctx: &ContextData,
    route: &str,
    bound: &str,
    service_type: &str,
) -> EtabusResult<Value> {
    let bound = Bound::from_query(bound);

    log::debug!(
        "Fetching combined data for route {}, bound {}, serviceType {}",
        route,
        bound.as_path_segment(),
        service_type
    );

    let (route_response, route_stops_response, stops_response) = future::join3(
        ctx.kmb.route(route, bound, service_type),
        ctx.kmb.route_stops(route, bound, service_type),
        ctx.kmb.stops(),
    )
    .await;

    let route_envelope = route_response.map_err(|e| upstream_error("route", e))?;
    let route_stops = route_stops_response.map_err(|e| upstream_error("route stops", e))?;
    let stops = stops_response.map_err(|e| upstream_error("stops", e))?;

    let Some(route_detail) = route_envelope.data else {
        return Err(EtabusError::Response(404, "Route not found".to_string()));
    };

    let stops = combine_route_with_stops(&route_detail, &route_stops.data, &stops.data);
    let combined = Envelope::generated(
        "RouteWithStops",
        RouteWithStops {
            route: route_detail,
            stops,
        },
    );

    Ok(serde_json::to_value(combined)?)
}

/// Maps a failure of one fetch in the combined flow to a response naming
/// that fetch. Non-status failures keep their kind and are handled by the
/// caller.
fn upstream_error(call: &str, error: KmbError) -> EtabusError {
    match error {
        KmbError::Status(status) => {
            log::error!("{} response error: {}", call, status);
            EtabusError::Response(
                status.as_u16(),
                format!("Error fetching {} data: {}", call, status_text(status)),
            )
        }
        other => other.into(),
    }
}

/// Swaps the envelope's data section for its enhanced form. A null data
/// section stays null.
fn enhance_envelope(envelope: Envelope<Option<Vec<Eta>>>) -> Envelope<Option<Vec<EnhancedEta>>> {
    Envelope {
        kind: envelope.kind,
        version: envelope.version,
        generated_timestamp: envelope.generated_timestamp,
        data: envelope
            .data
            .map(|entries| enhance_eta_data(entries, Utc::now())),
    }
}
