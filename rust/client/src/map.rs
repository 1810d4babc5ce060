// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Project locations for the map page.

use bim_dash_core::ProjectCoordinate;
use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::backend::Backend;
use crate::error::Result;
use crate::geocode::Geocoder;

/// A plottable project location with its resolved city.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapPoint {
    #[serde(flatten)]
    pub coordinate: ProjectCoordinate,
    pub city: String,
}

/// Loads every project coordinate and resolves its city.
///
/// Coordinates outside the valid latitude/longitude range are skipped. Each
/// distinct coordinate pair is looked up once per call, in first-seen order,
/// so a failed lookup is not repeated for projects sharing a location.
pub async fn load_map_points(backend: &dyn Backend, geocoder: &Geocoder) -> Result<Vec<MapPoint>> {
    let coordinates = backend.list_coordinates().await?;
    let total = coordinates.len();

    let mut cities: FxHashMap<String, String> = FxHashMap::default();
    let mut points = Vec::with_capacity(total);
    for coordinate in coordinates {
        if !coordinate.is_plottable() {
            tracing::warn!(
                project = %coordinate.project,
                "Skipping coordinate outside valid range"
            );
            continue;
        }
        let key = coordinate.pair_key();
        let city = match cities.get(&key) {
            Some(city) => city.clone(),
            None => {
                let city = geocoder
                    .city_for(coordinate.latitude, coordinate.longitude)
                    .await;
                cities.insert(key, city.clone());
                city
            }
        };
        points.push(MapPoint { coordinate, city });
    }

    tracing::debug!(total, plotted = points.len(), distinct = cities.len(), "Loaded map points");
    Ok(points)
}
