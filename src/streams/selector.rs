//! Chooses which stream plays first

use serde::{Deserialize, Serialize};

use super::{StreamCatalog, StreamDescriptor};
use crate::models::Location;

/// Strategy for picking the primary stream at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SelectionPolicy {
    /// Closest stream to the viewer's coordinates
    #[default]
    Nearest,
    /// Whatever the catalog itself declares, location ignored
    Declared,
}

/// Squared planar distance; good enough to rank cities.
fn distance_sq(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let dx = lat1 - lat2;
    let dy = lon1 - lon2;
    dx * dx + dy * dy
}

/// Derive a catalog copy with the primary stream marked according to `policy`.
pub fn select_primary(
    catalog: &StreamCatalog,
    location: Option<&Location>,
    policy: SelectionPolicy,
) -> StreamCatalog {
    match policy {
        SelectionPolicy::Declared => catalog.clone(),
        SelectionPolicy::Nearest => match location {
            Some(location) => nearest(catalog, location),
            None => match catalog.primary() {
                Some(_) => catalog.clone(),
                None => {
                    let first = catalog.get(0).map(|s| s.id().clone());
                    catalog.with_primary(first.as_ref())
                }
            },
        },
    }
}

fn nearest(catalog: &StreamCatalog, location: &Location) -> StreamCatalog {
    let mut closest: Option<(&StreamDescriptor, f64)> = None;

    for stream in catalog.iter() {
        let Some((lat, lon)) = stream.coordinates() else {
            continue;
        };
        let d = distance_sq(location.latitude, location.longitude, lat, lon);
        // Strict comparison keeps the earliest stream on ties
        if closest.map_or(true, |(_, best)| d < best) {
            closest = Some((stream, d));
        }
    }

    match closest {
        Some((stream, _)) => {
            tracing::debug!(
                stream = %stream.title(),
                city = %location.city,
                "selected nearest stream"
            );
            catalog.with_primary(Some(stream.id()))
        }
        None => catalog.clone(),
    }
}

/// The stream a session starts on: the marked primary, else the first one.
pub fn initial_stream(catalog: &StreamCatalog) -> Option<&StreamDescriptor> {
    catalog.primary().or_else(|| catalog.get(0))
}
