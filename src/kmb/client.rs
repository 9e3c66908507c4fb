use std::env;

#[cfg(test)]
use std::{collections::HashMap, sync::Arc};

use reqwest::StatusCode;
use url::Url;

use super::entities::{Bound, Envelope, Eta, Route, RouteStop, Stop};
use super::error::{KmbError, KmbResult};

const DEFAULT_API_BASE: &str = "https://data.etabus.gov.hk/v1/transport/kmb/";

#[derive(Clone)]
enum Transport {
    Http(reqwest::Client),
    /// Deterministic responses looked up by relative path, for tests.
    #[cfg(test)]
    Fixed(Arc<HashMap<String, (u16, String)>>),
}

/// Thin client over the KMB open-data API. One method per upstream endpoint,
/// each returning the parsed envelope.
#[derive(Clone)]
pub struct KmbClient {
    base: Url,
    transport: Transport,
}

impl KmbClient {
    pub fn new() -> KmbResult<KmbClient> {
        let base = match env::var("KMB_API_BASE") {
            Ok(value) => Url::parse(&value)
                .map_err(|e| KmbError::Init(format!("Invalid KMB_API_BASE: {}", e)))?,
            Err(_) => Url::parse(DEFAULT_API_BASE)?,
        };

        let client = KmbClient {
            base: with_trailing_slash(base),
            transport: Transport::Http(reqwest::Client::builder().build()?),
        };

        Ok(client)
    }

    /// Client whose transport answers from a fixed path -> (status, body)
    /// table. Paths not in the table answer 404 with an empty body.
    #[cfg(test)]
    pub fn fixed(responses: Vec<(String, u16, String)>) -> KmbClient {
        KmbClient {
            base: Url::parse(DEFAULT_API_BASE).unwrap(),
            transport: Transport::Fixed(Arc::new(
                responses
                    .into_iter()
                    .map(|(path, status, body)| (path, (status, body)))
                    .collect(),
            )),
        }
    }

    async fn fetch(&self, path: &str) -> KmbResult<(StatusCode, String)> {
        match &self.transport {
            Transport::Http(client) => {
                let url = self.base.join(path)?;
                log::debug!("Requesting {}", url);
                let response = client.get(url).send().await?;
                let status = response.status();
                let body = response.text().await?;
                Ok((status, body))
            }
            #[cfg(test)]
            Transport::Fixed(responses) => {
                let (status, body) = responses.get(path).cloned().unwrap_or((404, String::new()));
                let status =
                    StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                Ok((status, body))
            }
        }
    }

    async fn request<T>(&self, path: &str) -> KmbResult<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let (status, body) = self.fetch(path).await?;
        if !status.is_success() {
            return Err(KmbError::Status(status));
        }

        log::trace!("Response: {}", body);
        let data = serde_json::from_str(&body)?;

        Ok(data)
    }

    /// The full route list.
    pub async fn routes(&self) -> KmbResult<Envelope<Vec<Route>>> {
        self.request("route/").await
    }

    /// One route variant. The data section is null when the route is unknown.
    pub async fn route(
        &self,
        route: &str,
        bound: Bound,
        service_type: &str,
    ) -> KmbResult<Envelope<Option<Route>>> {
        self.request(&format!(
            "route/{}/{}/{}",
            route,
            bound.as_path_segment(),
            service_type
        ))
        .await
    }

    /// Route lookup without a direction, keyed by service type alone.
    pub async fn route_by_service_type(
        &self,
        route: &str,
        service_type: &str,
    ) -> KmbResult<Envelope<Option<Route>>> {
        self.request(&format!("route/{}/{}", route, service_type))
            .await
    }

    /// The full stop list.
    pub async fn stops(&self) -> KmbResult<Envelope<Vec<Stop>>> {
        self.request("stop").await
    }

    pub async fn stop(&self, stop_id: &str) -> KmbResult<Envelope<Option<Stop>>> {
        self.request(&format!("stop/{}", stop_id)).await
    }

    /// The entire route-stop mapping table.
    pub async fn route_stops_all(&self) -> KmbResult<Envelope<Vec<RouteStop>>> {
        self.request("route-stop").await
    }

    /// The ordered stop sequence of one route variant.
    pub async fn route_stops(
        &self,
        route: &str,
        bound: Bound,
        service_type: &str,
    ) -> KmbResult<Envelope<Vec<RouteStop>>> {
        self.request(&format!(
            "route-stop/{}/{}/{}",
            route,
            bound.as_path_segment(),
            service_type
        ))
        .await
    }

    /// ETAs for one route at one stop.
    pub async fn eta(
        &self,
        stop_id: &str,
        route: &str,
        service_type: &str,
    ) -> KmbResult<Envelope<Option<Vec<Eta>>>> {
        self.request(&format!("eta/{}/{}/{}", stop_id, route, service_type))
            .await
    }

    /// ETAs for every route calling at one stop.
    pub async fn stop_eta(
        &self,
        stop_id: &str,
        service_type: &str,
    ) -> KmbResult<Envelope<Option<Vec<Eta>>>> {
        self.request(&format!("eta/{}/all/{}", stop_id, service_type))
            .await
    }

    /// ETAs for every stop on one route.
    pub async fn route_eta(
        &self,
        route: &str,
        service_type: &str,
    ) -> KmbResult<Envelope<Option<Vec<Eta>>>> {
        self.request(&format!("route-eta/{}/{}", route, service_type))
            .await
    }
}

/// Url::join treats the last path segment as a file unless the base ends
/// with a slash, so normalize the base up front.
fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        url.set_path(&format!("{}/", url.path()));
    }
    url
}
