//! The railway: a clothoid network with stations, trains, and pathfinding.
//!
//! Edges are directed and an edge is distinct from its mate in the search
//! space. From a node, only outgoing edges whose initial tangent is within
//! [`TANGENT_CONTINUITY`] of the arriving edge's final tangent are eligible,
//! which forbids reversal and sharp turns at junctions.
//!
//! Station-to-station paths repeat every schedule cycle over a network that
//! rarely changes, so results are memoized in an LRU cache keyed by start
//! and goal identity (the start offset does not influence the expansion
//! order). Any mutation of the network drops the cache.

use std::num::NonZeroUsize;
use std::sync::Mutex;

use glam::Vec2;
use lru::LruCache;
use tracing::debug;

use crate::clothoid::{Network, Segment, SegmentKind};
use crate::handle::Handle;
use crate::render::{Color, Renderer};
use crate::search::{astar, Candidate};
use crate::train::Train;
use crate::world::{SpawnError, World};

pub use crate::clothoid::{EdgeIndex, NodeIndex, INVALID_EDGE, INVALID_NODE};

/// Minimum `dot(tangent_in, tangent_out)` for an edge to continue a path.
pub const TANGENT_CONTINUITY: f32 = 0.999;

/// Stations snap onto track within this distance of their spawn position.
const STATION_SNAP_DISTANCE: f32 = 1.0;

const PATH_CACHE_CAPACITY: usize = 256;

/// A location on the rail network: either a distance along a directed edge
/// or a node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RailPosition {
    OnEdge { edge: EdgeIndex, dist: f32 },
    OnNode { node: NodeIndex },
}

impl RailPosition {
    pub fn from_edge(edge: EdgeIndex, dist: f32) -> RailPosition {
        RailPosition::OnEdge { edge, dist }
    }

    pub fn from_node(node: NodeIndex) -> RailPosition {
        RailPosition::OnNode { node }
    }
}

/// A named stop at a fixed distance along an edge.
#[derive(Debug, Clone)]
pub struct RailStation {
    edge: EdgeIndex,
    dist: f32,
    name: String,
}

impl RailStation {
    pub fn new(edge: EdgeIndex, dist: f32, name: &str) -> RailStation {
        RailStation {
            edge,
            dist,
            name: name.to_owned(),
        }
    }

    pub fn edge(&self) -> EdgeIndex {
        self.edge
    }

    pub fn dist(&self) -> f32 {
        self.dist
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn position(&self, world: &World) -> Vec2 {
        world.rail().get_segment(self.edge).evaluate(self.dist)
    }

    pub fn draw(&self, renderer: &mut dyn Renderer, world: &World, _time: f32) {
        let position = self.position(world);
        let across = world
            .rail()
            .get_segment(self.edge)
            .evaluate_tangent(self.dist)
            .perp();
        renderer.draw_line(
            position - across * 2.0,
            position + across * 2.0,
            Color::WHITE,
            Color::WHITE,
        );
        renderer.draw_string(&self.name, position + Vec2::new(0.0, 3.0), Color::WHITE);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum PositionKey {
    Edge(EdgeIndex),
    Node(NodeIndex),
}

impl From<RailPosition> for PositionKey {
    fn from(position: RailPosition) -> PositionKey {
        match position {
            RailPosition::OnEdge { edge, .. } => PositionKey::Edge(edge),
            RailPosition::OnNode { node } => PositionKey::Node(node),
        }
    }
}

#[derive(Debug)]
struct PathCache {
    paths: LruCache<(PositionKey, PositionKey), Vec<EdgeIndex>>,
    hits: u64,
    misses: u64,
}

impl PathCache {
    fn new() -> PathCache {
        PathCache {
            paths: LruCache::new(NonZeroUsize::new(PATH_CACHE_CAPACITY).expect("nonzero")),
            hits: 0,
            misses: 0,
        }
    }
}

/// The rail network and its registered stations and trains.
pub struct RailNetwork {
    network: Network,
    stations: Vec<Handle<RailStation>>,
    trains: Vec<Handle<Train>>,
    cache: Mutex<PathCache>,
}

impl Default for RailNetwork {
    fn default() -> Self {
        RailNetwork::new()
    }
}

impl RailNetwork {
    pub fn new() -> RailNetwork {
        RailNetwork {
            network: Network::new(),
            stations: Vec::new(),
            trains: Vec::new(),
            cache: Mutex::new(PathCache::new()),
        }
    }

    /// Drop station and train handles; the geometry survives. Used when the
    /// owning world resets its registry.
    pub(crate) fn detach_objects(&mut self) {
        self.stations.clear();
        self.trains.clear();
    }

    pub fn clear(&mut self) {
        self.detach_objects();
        self.network.clear();
        self.invalidate_cache();
    }

    pub fn add_segment(&mut self, segment: Segment) -> EdgeIndex {
        self.invalidate_cache();
        self.network.insert_edge(segment)
    }

    fn invalidate_cache(&mut self) {
        let cache = self.cache.get_mut().expect("cache poisoned");
        cache.paths.clear();
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn get_segment(&self, edge: EdgeIndex) -> Segment {
        self.network.get_segment(edge)
    }

    pub fn get_closest_segment(
        &self,
        position: Vec2,
        max_distance: f32,
    ) -> Option<(EdgeIndex, f32)> {
        self.network.get_closest_segment(position, max_distance)
    }

    pub fn stations(&self) -> &[Handle<RailStation>] {
        &self.stations
    }

    pub fn trains(&self) -> &[Handle<Train>] {
        &self.trains
    }

    /// `(hits, misses)` of the path cache.
    pub fn cache_stats(&self) -> (u64, u64) {
        let cache = self.cache.lock().expect("cache poisoned");
        (cache.hits, cache.misses)
    }

    /// World position of a rail position.
    pub fn position_of(&self, position: RailPosition) -> Vec2 {
        match position {
            RailPosition::OnEdge { edge, dist } => self.network.get_segment(edge).evaluate(dist),
            RailPosition::OnNode { node } => self.network.node_position(node),
        }
    }

    /// Shortest tangent-continuous edge sequence from `start` to `goal`.
    ///
    /// The returned sequence excludes the edge `start` lies on. If `edges`
    /// is too small the required length is returned and nothing is written.
    /// Returns 0 when no path exists.
    pub fn find_path(
        &self,
        start: RailPosition,
        goal: RailPosition,
        edges: &mut [EdgeIndex],
    ) -> usize {
        let key = (PositionKey::from(start), PositionKey::from(goal));
        {
            let mut cache = self.cache.lock().expect("cache poisoned");
            let hit = cache.paths.get(&key).cloned();
            match hit {
                Some(path) => {
                    cache.hits += 1;
                    if path.len() > edges.len() {
                        return path.len();
                    }
                    edges[..path.len()].copy_from_slice(&path);
                    return path.len();
                }
                None => cache.misses += 1,
            }
        }

        let Some(path) = self.search_path(start, goal) else {
            return 0;
        };

        let depth = path.len();
        let mut cache = self.cache.lock().expect("cache poisoned");
        if depth > edges.len() {
            cache.paths.put(key, path);
            return depth;
        }
        edges[..depth].copy_from_slice(&path);
        cache.paths.put(key, path);
        depth
    }

    fn search_path(&self, start: RailPosition, goal: RailPosition) -> Option<Vec<EdgeIndex>> {
        let goal_pos = self.position_of(goal);

        let mut seeds = Vec::new();
        match start {
            RailPosition::OnEdge { edge, dist } => {
                let start_pos = self.network.get_segment(edge).evaluate(dist);
                seeds.push(Candidate {
                    state: edge,
                    cost: 0.0,
                    heuristic: (start_pos - goal_pos).length(),
                });
            }
            RailPosition::OnNode { node } => {
                for edge in self.network.outgoing_edges(node) {
                    let end = self.network.end_node(edge);
                    seeds.push(Candidate {
                        state: edge,
                        cost: self.network.edge_length(edge),
                        heuristic: (goal_pos - self.network.node_position(end)).length(),
                    });
                }
            }
        }

        let network = &self.network;
        let chain = astar(
            seeds,
            |&edge, push| {
                let dir = network.get_segment(edge).final_tangent();
                for next in network.outgoing_edges(network.end_node(edge)) {
                    if dir.dot(network.edge_direction(next)) < TANGENT_CONTINUITY {
                        continue;
                    }
                    let end = network.end_node(next);
                    push(Candidate {
                        state: next,
                        cost: network.edge_length(next),
                        heuristic: (goal_pos - network.node_position(end)).length(),
                    });
                }
            },
            |&edge| match goal {
                RailPosition::OnEdge { edge: goal_edge, .. } => edge == goal_edge,
                RailPosition::OnNode { node } => network.end_node(edge) == node,
            },
            |&edge| Some(edge),
            usize::MAX,
        )?;

        // The seed edge is where the search started, not part of the output.
        Some(chain[1..].to_vec())
    }

    /// Draw the track. Odd (mate) edges are skipped; curved segments are
    /// subdivided by the view's pixel density.
    pub fn draw(&self, renderer: &mut dyn Renderer, _time: f32) {
        let view = renderer.view();
        let diag = 16.0 * view.size.length() / renderer.window_size().length().max(1.0);
        for edge in self.network.edges() {
            if edge & 1 != 0 {
                continue;
            }
            let segment = self.network.get_segment(edge);
            if segment.kind() == SegmentKind::Line {
                renderer.draw_line(
                    segment.initial_position(),
                    segment.final_position(),
                    Color::WHITE,
                    Color::WHITE,
                );
            } else {
                let n = (segment.length() / diag.max(1e-3)).max(2.0);
                let mut p0 = segment.initial_position();
                let mut ii = 1.0;
                while ii < n {
                    let p1 = segment.evaluate(ii / n * segment.length());
                    renderer.draw_line(p0, p1, Color::WHITE, Color::WHITE);
                    p0 = p1;
                    ii += 1.0;
                }
                renderer.draw_line(p0, segment.final_position(), Color::WHITE, Color::WHITE);
            }
        }
    }
}

/// Spawn a station snapped to the closest segment within one meter of the
/// requested position. Returns a null handle when no track is close enough.
pub fn add_station(
    world: &mut World,
    position: Vec2,
    name: &str,
) -> Result<Handle<RailStation>, SpawnError> {
    let Some((edge, dist)) = world.rail().get_closest_segment(position, STATION_SNAP_DISTANCE)
    else {
        debug!(?position, "no track near station");
        return Ok(Handle::null());
    };
    let handle = world.spawn(RailStation::new(edge, dist, name))?;
    world.rail_mut().stations.push(handle);
    Ok(handle)
}

/// Spawn a train and register it with the network.
pub fn add_train(world: &mut World, num_cars: usize) -> Result<Handle<Train>, SpawnError> {
    let handle = world.spawn(Train::new(num_cars))?;
    world.rail_mut().trains.push(handle);
    Ok(handle)
}
