//! # Port Registry
//!
//! The static list of named ports a voyage can start or end at. The registry
//! is supplied by the caller once per session and only ever read here.
//!
//! Proximity is measured with the rhumb-line distance of
//! [`leg_between`](crate::loxodrome::leg_between), the same metric the planner
//! shows for legs, so "within 30 NM of a port" means the same thing everywhere.

use crate::loxodrome::leg_between;
use crate::GeoPoint;
use serde::{Deserialize, Serialize};

/// A named port.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PortNode {
    /// Registry id, e.g. "BR_RIG"
    pub id: String,
    /// Display name, e.g. "Rio Grande-RS"
    pub name: String,
    /// Port position
    #[serde(flatten)]
    pub point: GeoPoint,
}

/// A port together with its distance from some query point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PortMatch<'a> {
    /// The matched port
    pub port: &'a PortNode,
    /// Rhumb-line distance to the port in nautical miles
    pub distance_nm: f64,
}

/// Departure and arrival ports guessed from a track's first and last points.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct EndpointPorts<'a> {
    /// Port near the first point, if any
    pub departure: Option<PortMatch<'a>>,
    /// Port near the last point, if any
    pub arrival: Option<PortMatch<'a>>,
}

/// Ordered, read-only list of ports.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PortRegistry {
    ports: Vec<PortNode>,
}

impl PortRegistry {
    /// Wrap an ordered list of ports.
    pub fn new(ports: Vec<PortNode>) -> Self {
        PortRegistry { ports }
    }

    /// All ports in registry order.
    pub fn ports(&self) -> &[PortNode] {
        &self.ports
    }

    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }

    /// Look a port up by registry id.
    pub fn get(&self, id: &str) -> Option<&PortNode> {
        self.ports.iter().find(|p| p.id == id)
    }

    /// Nearest port to `point`, scanning the whole registry.
    ///
    /// Ties keep the port listed first.
    pub fn nearest(&self, point: &GeoPoint) -> Option<PortMatch<'_>> {
        let mut best: Option<PortMatch<'_>> = None;
        for port in &self.ports {
            let distance_nm = leg_between(point, &port.point).distance;
            let is_better = match &best {
                Some(current) => distance_nm < current.distance_nm,
                None => true,
            };
            if is_better {
                best = Some(PortMatch { port, distance_nm });
            }
        }
        best
    }

    /// Nearest port, accepted only when strictly closer than `threshold_nm`.
    pub fn match_within(&self, point: &GeoPoint, threshold_nm: f64) -> Option<PortMatch<'_>> {
        self.nearest(point)
            .filter(|m| m.distance_nm < threshold_nm)
    }

    /// Guess departure and arrival ports for an imported track.
    ///
    /// Each end is matched independently; a track with fewer than two points
    /// has no meaningful ends and matches nothing.
    pub fn match_track_endpoints(&self, points: &[GeoPoint], threshold_nm: f64) -> EndpointPorts<'_> {
        match (points.first(), points.last()) {
            (Some(first), Some(last)) if points.len() >= 2 => EndpointPorts {
                departure: self.match_within(first, threshold_nm),
                arrival: self.match_within(last, threshold_nm),
            },
            _ => EndpointPorts::default(),
        }
    }
}

impl From<Vec<PortNode>> for PortRegistry {
    fn from(ports: Vec<PortNode>) -> Self {
        PortRegistry::new(ports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn port(id: &str, name: &str, lat: f64, lon: f64) -> PortNode {
        PortNode {
            id: id.to_string(),
            name: name.to_string(),
            point: GeoPoint::new(lat, lon),
        }
    }

    fn registry() -> PortRegistry {
        PortRegistry::new(vec![
            port("BR_REC", "Recife-PE", -8.050, -34.866),
            port("BR_SUA", "Suape-PE", -8.397, -34.959),
            port("BR_SAL", "Salvador-BA", -12.966, -38.516),
        ])
    }

    #[test]
    fn nearest_scans_all_ports() {
        let reg = registry();
        let m = reg.nearest(&GeoPoint::new(-8.40, -34.95)).unwrap();
        assert_eq!(m.port.id, "BR_SUA");
        assert!(m.distance_nm < 1.0);
        assert!(PortRegistry::default().nearest(&GeoPoint::new(0.0, 0.0)).is_none());
    }

    #[test]
    fn threshold_is_strict() {
        let reg = registry();
        let salvador = reg.get("BR_SAL").unwrap().point;
        // Half a degree due north of Salvador is ~30.02 NM away
        let probe = GeoPoint::new(salvador.lat + 0.5, salvador.lon);
        let d = reg.nearest(&probe).unwrap().distance_nm;
        assert!(reg.match_within(&probe, d).is_none());
        assert!(reg.match_within(&probe, d + 1e-9).is_some());
    }

    #[test]
    fn track_endpoints_match_independently() {
        let reg = registry();
        let track = [
            GeoPoint::new(-8.06, -34.87),
            GeoPoint::new(-10.0, -36.0),
            GeoPoint::new(-14.5, -37.0),
        ];
        let ends = reg.match_track_endpoints(&track, 20.0);
        assert_eq!(ends.departure.unwrap().port.id, "BR_REC");
        assert!(ends.arrival.is_none());

        let single = reg.match_track_endpoints(&track[..1], 20.0);
        assert_eq!(single, EndpointPorts::default());
    }

    #[test]
    fn deserializes_flat_port_records() {
        let json = r#"[{"id":"BR_ITJ","name":"Itajaí-SC","lat":-26.916,"lon":-48.65}]"#;
        let reg: PortRegistry = serde_json::from_str(json).unwrap();
        assert_eq!(reg.ports().len(), 1);
        assert_eq!(reg.get("BR_ITJ").unwrap().point, GeoPoint::new(-26.916, -48.65));
    }
}
