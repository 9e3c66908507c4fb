use std::collections::HashMap;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::kmb::entities::{Route, RouteStop, Stop};

/// Combined view of one route variant and its ordered stops.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RouteWithStops {
    pub route: Route,
    pub stops: Vec<SequencedStop>,
}

/// One position along a route: the original sequence string plus the
/// resolved (or placeholder) stop record.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SequencedStop {
    pub sequence: String,
    pub stop: Stop,
}

/// Orders the stops of one route variant. Filtering keys on the fetched
/// route's own (route, bound, service_type) triple rather than anything
/// request-supplied, since the upstream normalizes those values. Sequence
/// strings compare numerically, and stop IDs missing from the stop list
/// resolve to a placeholder; a gap in the stop list must never abort the
/// combination.
pub fn combine_route_with_stops(
    route: &Route,
    route_stops: &[RouteStop],
    stops: &[Stop],
) -> Vec<SequencedStop> {
    let stops_by_id: HashMap<&str, &Stop> = stops.iter().map(|s| (s.stop.as_str(), s)).collect();

    route_stops
        .iter()
        .filter(|rs| {
            rs.route == route.route
                && rs.bound == route.bound
                && rs.service_type == route.service_type
        })
        .sorted_by_key(|rs| rs.seq.parse::<i64>().unwrap_or(i64::MAX))
        .map(|rs| SequencedStop {
            sequence: rs.seq.clone(),
            stop: stops_by_id
                .get(rs.stop.as_str())
                .map(|s| (*s).clone())
                .unwrap_or_else(|| Stop::unknown(&rs.stop)),
        })
        .collect()
}

/// Every route variant calling at a stop, in mapping order. Mapping rows
/// with no matching route are dropped silently.
pub fn find_routes_for_stop(
    stop_id: &str,
    route_stops: &[RouteStop],
    routes: &[Route],
) -> Vec<Route> {
    route_stops
        .iter()
        .filter(|rs| rs.stop == stop_id)
        .filter_map(|rs| {
            routes.iter().find(|r| {
                r.route == rs.route && r.bound == rs.bound && r.service_type == rs.service_type
            })
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod test {

    use super::*;

    fn route(number: &str, bound: &str, service_type: &str) -> Route {
        Route {
            route: number.to_string(),
            bound: bound.to_string(),
            service_type: service_type.to_string(),
            orig_en: "CHUK YUEN ESTATE".to_string(),
            orig_tc: "竹園邨".to_string(),
            orig_sc: "竹园邨".to_string(),
            dest_en: "STAR FERRY".to_string(),
            dest_tc: "尖沙咀碼頭".to_string(),
            dest_sc: "尖沙咀码头".to_string(),
        }
    }

    fn route_stop(number: &str, bound: &str, service_type: &str, seq: &str, stop: &str) -> RouteStop {
        RouteStop {
            route: number.to_string(),
            bound: bound.to_string(),
            service_type: service_type.to_string(),
            seq: seq.to_string(),
            stop: stop.to_string(),
        }
    }

    fn stop(id: &str, name: &str) -> Stop {
        Stop {
            stop: id.to_string(),
            name_en: name.to_string(),
            name_tc: name.to_string(),
            name_sc: name.to_string(),
            lat: 22.3,
            long: 114.1,
        }
    }

    #[test]
    fn test_sequences_order_numerically_not_lexicographically() {
        let route = route("1", "O", "1");
        let route_stops = vec![
            route_stop("1", "O", "1", "10", "S10"),
            route_stop("1", "O", "1", "9", "S9"),
            route_stop("1", "O", "1", "1", "S1"),
            route_stop("1", "O", "1", "2", "S2"),
        ];
        let stops = vec![
            stop("S1", "First"),
            stop("S2", "Second"),
            stop("S9", "Ninth"),
            stop("S10", "Tenth"),
        ];

        let combined = combine_route_with_stops(&route, &route_stops, &stops);

        let sequences: Vec<&str> = combined.iter().map(|s| s.sequence.as_str()).collect();
        assert_eq!(sequences, vec!["1", "2", "9", "10"]);
        assert_eq!(combined[2].stop.name_en, "Ninth");
    }

    #[test]
    fn test_missing_stop_becomes_a_placeholder() {
        let route = route("1", "O", "1");
        let route_stops = vec![
            route_stop("1", "O", "1", "1", "S1"),
            route_stop("1", "O", "1", "2", "GONE"),
        ];
        let stops = vec![stop("S1", "First")];

        let combined = combine_route_with_stops(&route, &route_stops, &stops);

        assert_eq!(combined.len(), 2);
        let placeholder = &combined[1].stop;
        assert_eq!(placeholder.stop, "GONE");
        assert_eq!(placeholder.name_en, "Unknown");
        assert_eq!(placeholder.name_tc, "Unknown");
        assert_eq!(placeholder.name_sc, "Unknown");
        assert_eq!((placeholder.lat, placeholder.long), (0.0, 0.0));
    }

    #[test]
    fn test_filtering_uses_the_route_detail_key() {
        // The request might have said serviceType "01"; the fetched route
        // detail carries the normalized "1", and filtering follows it.
        let route = route("1", "O", "1");
        let route_stops = vec![
            route_stop("1", "O", "1", "1", "S1"),
            route_stop("1", "I", "1", "1", "S2"),
            route_stop("1", "O", "2", "1", "S3"),
            route_stop("1A", "O", "1", "1", "S4"),
        ];
        let stops = vec![
            stop("S1", "First"),
            stop("S2", "Other bound"),
            stop("S3", "Other service"),
            stop("S4", "Other route"),
        ];

        let combined = combine_route_with_stops(&route, &route_stops, &stops);

        assert_eq!(combined.len(), 1);
        assert_eq!(combined[0].stop.stop, "S1");
    }

    #[test]
    fn test_routes_for_stop_drops_unmatched_rows_silently() {
        let routes = vec![route("1", "O", "1"), route("6", "I", "1")];
        let route_stops = vec![
            route_stop("1", "O", "1", "3", "S1"),
            // no route entry exists for 271/O/1
            route_stop("271", "O", "1", "12", "S1"),
            route_stop("6", "I", "1", "5", "S1"),
            route_stop("6", "I", "1", "5", "ELSEWHERE"),
        ];

        let found = find_routes_for_stop("S1", &route_stops, &routes);

        let numbers: Vec<&str> = found.iter().map(|r| r.route.as_str()).collect();
        assert_eq!(numbers, vec!["1", "6"]);
    }

    #[test]
    fn test_routes_for_stop_keeps_duplicates_for_looping_routes() {
        // A circular route can call at the same stop twice.
        let routes = vec![route("13", "O", "1")];
        let route_stops = vec![
            route_stop("13", "O", "1", "2", "S1"),
            route_stop("13", "O", "1", "17", "S1"),
        ];

        let found = find_routes_for_stop("S1", &route_stops, &routes);

        assert_eq!(found.len(), 2);
    }
}
