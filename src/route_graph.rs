//! # Route Graph Pathfinder
//!
//! Stitches a voyage between two ports out of previously recorded tracks.
//!
//! ## Build
//! Every [`RouteSegment`] is reduced to its two endpoints. Each endpoint is
//! snapped to the nearest port of the [`PortRegistry`] when that port is
//! strictly closer than the snap threshold. A segment whose ends snap to two
//! different ports contributes a forward edge and a reversed edge; any other
//! segment is left out of the graph without complaint.
//!
//! Interior points are never snapped: a track passing close to a port on its
//! way elsewhere does not create a stop there.
//!
//! ## Search
//! Breadth-first over port ids, so the result uses the fewest segments, not
//! the fewest miles. Each port is discovered once and remembers the edge that
//! discovered it.
//!
//! ## Reconstruction
//! Edges are walked back from the destination, then each segment's points are
//! appended in travel order (reversed for reversed edges) and renumbered from 1.
//! Join points are not deduplicated, so the shared port position may appear
//! twice where two segments meet.
//!
//! ## Failure
//! [`RouteError::NoConnection`] carries whether each end has any edge at all,
//! which is what tells "no recorded track reaches this port" apart from
//! "tracks exist at both ends but never link up".

use crate::ports::PortRegistry;
use crate::{GeoPoint, Waypoint};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use thiserror::Error;

/// Default snap threshold in nautical miles.
pub const DEFAULT_SNAP_THRESHOLD_NM: f64 = 30.0;

/// A previously travelled or surveyed track.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RouteSegment {
    /// Catalog id, typically the source file name ("santos x paranagua")
    pub id: String,
    /// Track points in recorded order
    pub points: Vec<GeoPoint>,
}

/// One directed use of a segment between two ports.
#[derive(Clone, Debug, PartialEq)]
pub struct Edge {
    /// Port id this edge leads to
    pub target: String,
    /// Id of the segment travelled
    pub segment_id: String,
    /// True when the segment is travelled from its last point to its first
    pub reversed: bool,
    segment_index: usize,
}

/// Why no route could be produced.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RouteError {
    /// A requested port id is not in the registry
    #[error("unknown port '{0}'")]
    UnknownPort(String),

    /// Origin and destination are the same port
    #[error("origin and destination are both '{0}'")]
    SamePort(String),

    /// The graph holds no chain of segments between the two ports
    #[error("no recorded route connects '{origin}' and '{destination}'")]
    NoConnection {
        origin: String,
        destination: String,
        /// Whether any segment touches the origin
        origin_linked: bool,
        /// Whether any segment touches the destination
        destination_linked: bool,
    },
}

impl RouteError {
    /// True when at least one end has no incident segment at all.
    ///
    /// `false` for a `NoConnection` means both ports are reachable individually
    /// but lie in different parts of the graph.
    pub fn is_isolated(&self) -> bool {
        matches!(
            self,
            RouteError::NoConnection {
                origin_linked,
                destination_linked,
                ..
            } if !origin_linked || !destination_linked
        )
    }
}

/// A stitched route: the segments used, in order, and the resulting waypoints.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StitchedRoute {
    /// Segment ids in travel order
    pub segment_ids: Vec<String>,
    /// Waypoints numbered 1..=n
    pub waypoints: Vec<Waypoint>,
}

/// Port adjacency built from a segment catalog.
///
/// Rebuilt for every pathfinding call; it borrows the catalog it was built
/// from so reconstruction can read segment points back.
#[derive(Debug)]
pub struct RouteGraph<'a> {
    segments: &'a [RouteSegment],
    adjacency: HashMap<String, Vec<Edge>>,
}

impl<'a> RouteGraph<'a> {
    /// Build the graph by snapping segment endpoints to ports.
    ///
    /// # Time Complexity
    /// *O*(*s* · *p*) for *s* segments and *p* ports.
    pub fn build(segments: &'a [RouteSegment], ports: &PortRegistry, snap_threshold_nm: f64) -> Self {
        let mut adjacency: HashMap<String, Vec<Edge>> = HashMap::new();
        let mut accepted = 0usize;

        for (index, segment) in segments.iter().enumerate() {
            let (Some(first), Some(last)) = (segment.points.first(), segment.points.last()) else {
                debug!("Segment '{}' has no points, skipped", segment.id);
                continue;
            };

            let start = ports.match_within(first, snap_threshold_nm);
            let end = ports.match_within(last, snap_threshold_nm);

            match (start, end) {
                (Some(start), Some(end)) if start.port.id != end.port.id => {
                    adjacency
                        .entry(start.port.id.clone())
                        .or_default()
                        .push(Edge {
                            target: end.port.id.clone(),
                            segment_id: segment.id.clone(),
                            reversed: false,
                            segment_index: index,
                        });
                    adjacency
                        .entry(end.port.id.clone())
                        .or_default()
                        .push(Edge {
                            target: start.port.id.clone(),
                            segment_id: segment.id.clone(),
                            reversed: true,
                            segment_index: index,
                        });
                    accepted += 1;
                }
                _ => debug!("Segment '{}' does not link two known ports", segment.id),
            }
        }

        info!(
            "Route graph: {} of {} segments linked {} ports",
            accepted,
            segments.len(),
            adjacency.len()
        );

        RouteGraph {
            segments,
            adjacency,
        }
    }

    /// Edges leaving `port_id`, in catalog order.
    pub fn edges_from(&self, port_id: &str) -> &[Edge] {
        self.adjacency
            .get(port_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Whether any segment touches `port_id`.
    pub fn has_edges(&self, port_id: &str) -> bool {
        !self.edges_from(port_id).is_empty()
    }

    /// Total number of directed edges (twice the accepted segments).
    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(Vec::len).sum()
    }

    /// Fewest-segment chain of edges from `origin` to `destination`.
    ///
    /// Returns `None` when the destination is never reached. For
    /// `origin == destination` the chain is empty.
    pub fn shortest_hops(&self, origin: &str, destination: &str) -> Option<Vec<&Edge>> {
        // port -> (parent port, edge used to reach it)
        let mut discovered: HashMap<&str, Option<(&str, &Edge)>> = HashMap::new();
        let mut queue = VecDeque::new();

        discovered.insert(origin, None);
        queue.push_back(origin);

        while let Some(node) = queue.pop_front() {
            if node == destination {
                return Some(self.unwind(&discovered, destination));
            }
            for edge in self.edges_from(node) {
                let target = edge.target.as_str();
                if !discovered.contains_key(target) {
                    discovered.insert(target, Some((node, edge)));
                    queue.push_back(target);
                }
            }
        }
        None
    }

    fn unwind<'g>(
        &self,
        discovered: &HashMap<&str, Option<(&str, &'g Edge)>>,
        destination: &str,
    ) -> Vec<&'g Edge> {
        let mut chain = Vec::new();
        let mut current = destination;
        while let Some(Some((parent, edge))) = discovered.get(current) {
            chain.push(*edge);
            current = *parent;
        }
        chain.reverse();
        chain
    }

    /// Concatenate the points of a chain of edges into numbered waypoints.
    pub fn stitch(&self, chain: &[&Edge]) -> StitchedRoute {
        let mut waypoints = Vec::new();
        let mut segment_ids = Vec::with_capacity(chain.len());

        for edge in chain {
            let segment = &self.segments[edge.segment_index];
            segment_ids.push(segment.id.clone());

            let mut points = segment.points.clone();
            if edge.reversed {
                points.reverse();
            }
            for point in points {
                let sequence = waypoints.len() as u32 + 1;
                waypoints.push(Waypoint::numbered(sequence, point));
            }
        }

        StitchedRoute {
            segment_ids,
            waypoints,
        }
    }
}

/// Find and stitch a route between two registry ports.
///
/// # Arguments
/// * `origin` / `destination` - port registry ids
/// * `segments` - catalog of recorded tracks
/// * `ports` - port registry used for endpoint snapping
/// * `snap_threshold_nm` - see [`DEFAULT_SNAP_THRESHOLD_NM`]
///
/// # Example
/// ```
/// use voyage_nav_lib::ports::{PortNode, PortRegistry};
/// use voyage_nav_lib::route_graph::{find_route, RouteSegment, DEFAULT_SNAP_THRESHOLD_NM};
/// use voyage_nav_lib::GeoPoint;
///
/// let ports = PortRegistry::new(vec![
///     PortNode { id: "A".into(), name: "Alpha".into(), point: GeoPoint::new(0.0, 0.0) },
///     PortNode { id: "B".into(), name: "Bravo".into(), point: GeoPoint::new(0.0, 2.0) },
/// ]);
/// let segments = vec![RouteSegment {
///     id: "a x b".into(),
///     points: vec![GeoPoint::new(0.0, 2.0), GeoPoint::new(0.0, 1.0), GeoPoint::new(0.0, 0.0)],
/// }];
///
/// let route = find_route("A", "B", &segments, &ports, DEFAULT_SNAP_THRESHOLD_NM).unwrap();
/// assert_eq!(route.waypoints.first().unwrap().point, GeoPoint::new(0.0, 0.0));
/// assert_eq!(route.waypoints.len(), 3);
/// ```
pub fn find_route(
    origin: &str,
    destination: &str,
    segments: &[RouteSegment],
    ports: &PortRegistry,
    snap_threshold_nm: f64,
) -> Result<StitchedRoute, RouteError> {
    for id in [origin, destination] {
        if ports.get(id).is_none() {
            return Err(RouteError::UnknownPort(id.to_string()));
        }
    }
    if origin == destination {
        return Err(RouteError::SamePort(origin.to_string()));
    }

    let graph = RouteGraph::build(segments, ports, snap_threshold_nm);

    match graph.shortest_hops(origin, destination) {
        Some(chain) => {
            let route = graph.stitch(&chain);
            info!(
                "Route {} -> {}: {} segment(s), {} waypoints",
                origin,
                destination,
                route.segment_ids.len(),
                route.waypoints.len()
            );
            Ok(route)
        }
        None => Err(RouteError::NoConnection {
            origin: origin.to_string(),
            destination: destination.to_string(),
            origin_linked: graph.has_edges(origin),
            destination_linked: graph.has_edges(destination),
        }),
    }
}
