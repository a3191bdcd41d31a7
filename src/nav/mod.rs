//! Navigation backend client and location sources

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A latitude/longitude pair
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    /// Spoken form for location announcements
    #[must_use]
    pub fn spoken(&self) -> String {
        format!(
            "latitude {:.4}, longitude {:.4}",
            self.lat, self.lng
        )
    }
}

/// Capability interface for obtaining the current position
#[async_trait]
pub trait LocationProvider: Send + Sync {
    /// Return the current position
    ///
    /// # Errors
    ///
    /// Returns error if no position is available
    async fn current_location(&self) -> Result<Coordinates>;
}

/// Fixed position from config (no platform location service)
pub struct StaticLocation {
    coords: Coordinates,
}

impl StaticLocation {
    #[must_use]
    pub const fn new(coords: Coordinates) -> Self {
        Self { coords }
    }
}

#[async_trait]
impl LocationProvider for StaticLocation {
    async fn current_location(&self) -> Result<Coordinates> {
        Ok(self.coords)
    }
}

/// One step of a computed route
#[derive(Debug, Clone, Deserialize)]
pub struct RouteStep {
    pub instruction: String,
    pub distance_meters: f64,
    pub duration_seconds: f64,
    #[serde(default)]
    pub maneuver: Option<String>,
    pub start_location: Coordinates,
    pub end_location: Coordinates,
}

/// A computed route as returned by the navigation backend
#[derive(Debug, Clone, Deserialize)]
pub struct RouteSummary {
    pub route_mode: String,
    pub total_distance_meters: f64,
    pub estimated_time_minutes: f64,
    pub steps: Vec<RouteStep>,
    #[serde(default)]
    pub polyline: Option<String>,
}

impl RouteSummary {
    /// Spoken route confirmation: distance in km (one decimal) plus minutes
    #[must_use]
    pub fn announcement(&self) -> String {
        format!(
            "Route found. Total distance {:.1} kilometers. Estimated time {:.0} minutes.",
            self.total_distance_meters / 1000.0,
            self.estimated_time_minutes
        )
    }
}

/// Capability interface for computing a route to a spoken destination
#[async_trait]
pub trait RoutePlanner: Send + Sync {
    /// Plan a route from `current` to `destination`
    ///
    /// # Errors
    ///
    /// Returns error if no route can be computed
    async fn plan(&self, current: Coordinates, destination: &str) -> Result<RouteSummary>;
}

/// HTTP client for the navigation backend
pub struct NavigationClient {
    client: reqwest::Client,
    base_url: String,
}

impl NavigationClient {
    #[must_use]
    pub fn new(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    /// Request a route from the current position to a spoken destination
    ///
    /// # Errors
    ///
    /// Returns `Error::Navigation` with the backend's `detail` message on a
    /// non-success response, or `Error::Http` on transport failure
    pub async fn navigate(
        &self,
        current: Coordinates,
        destination: &str,
    ) -> Result<RouteSummary> {
        #[derive(Serialize)]
        struct NavigateRequest<'a> {
            current_location: Coordinates,
            destination: &'a str,
        }

        let request = NavigateRequest {
            current_location: current,
            destination,
        };

        let response = self
            .client
            .post(format!("{}/navigate", self.base_url))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::Navigation(error_detail(response).await));
        }

        let route: RouteSummary = response.json().await?;
        tracing::info!(
            mode = %route.route_mode,
            distance_m = route.total_distance_meters,
            steps = route.steps.len(),
            "route received"
        );

        Ok(route)
    }
}

#[async_trait]
impl RoutePlanner for NavigationClient {
    async fn plan(&self, current: Coordinates, destination: &str) -> Result<RouteSummary> {
        self.navigate(current, destination).await
    }
}

/// Extract the backend's `{"detail": ...}` error message
async fn error_detail(response: reqwest::Response) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        detail: String,
    }

    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    serde_json::from_str::<ErrorBody>(&body)
        .map_or_else(|_| format!("backend error {status}"), |e| e.detail)
}
