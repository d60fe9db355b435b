//! Planar track geometry: line / arc / clothoid segments and the directed
//! edge network built from them.
//!
//! A [`Segment`] is parameterized by arc length and exposes position, tangent,
//! and curvature at any point along it. Curvature is signed: positive bends
//! left. The three kinds:
//!
//! - **Line**: zero curvature.
//! - **Arc**: constant curvature.
//! - **Transition**: curvature linear in arc length (Euler spiral), used to
//!   join segments of different curvature without a lateral-acceleration step.
//!
//! A [`Network`] welds segment endpoints into nodes and stores each
//! undirected segment as a pair of opposite directed edges. The odd edge of a
//! pair traverses the same geometry with reversed parameterization.

use glam::Vec2;

/// Endpoints closer than this are welded into a single node.
const NODE_WELD_DISTANCE: f32 = 1e-3;

/// Curvature rates below this are treated as constant-curvature.
const MIN_CURVATURE_RATE: f32 = 1e-6;

// ---------------------------------------------------------------------------
// Fresnel integrals
// ---------------------------------------------------------------------------

/// Fresnel integrals `C(x)`, `S(x)` with the normalization
/// `C(x) = ∫₀ˣ cos(πt²/2) dt`, `S(x) = ∫₀ˣ sin(πt²/2) dt`.
///
/// Heald's rational approximation; absolute error is a few 1e-3, which is
/// well inside the tolerance of track geometry. Both integrals are odd.
fn fresnel(x: f32) -> (f32, f32) {
    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();

    let r = (0.506 * x + 1.0) / (1.79 * x * x + 2.054 * x + std::f32::consts::SQRT_2);
    let a = 1.0 / (0.803 * x * x * x + 1.886 * x * x + 2.524 * x + 2.0);
    let phase = 0.5 * std::f32::consts::PI * (a - x * x);

    let c = 0.5 - r * phase.sin();
    let s = 0.5 - r * phase.cos();
    (sign * c, sign * s)
}

/// `∫₀ˣ (cos(k't²/2), sin(k't²/2)) dt` for curvature rate `k' = rate`.
fn spiral_integral(x: f32, rate: f32) -> Vec2 {
    let scale = (std::f32::consts::PI / rate.abs()).sqrt();
    let (c, s) = fresnel(x / scale);
    Vec2::new(scale * c, scale * s * rate.signum())
}

// ---------------------------------------------------------------------------
// Segments
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    Line,
    Arc,
    Transition,
}

/// A geometric track segment parameterized by arc length in `[0, length]`.
#[derive(Debug, Clone, Copy)]
pub struct Segment {
    kind: SegmentKind,
    start: Vec2,
    /// Unit tangent at `s = 0`.
    tangent: Vec2,
    length: f32,
    /// Curvature at `s = 0`.
    k0: f32,
    /// Curvature at `s = length`.
    k1: f32,
}

impl Segment {
    pub fn from_line(p0: Vec2, p1: Vec2) -> Segment {
        let delta = p1 - p0;
        Segment {
            kind: SegmentKind::Line,
            start: p0,
            tangent: delta.normalize_or_zero(),
            length: delta.length(),
            k0: 0.0,
            k1: 0.0,
        }
    }

    pub fn from_arc(start: Vec2, tangent: Vec2, length: f32, curvature: f32) -> Segment {
        Segment {
            kind: SegmentKind::Arc,
            start,
            tangent: tangent.normalize_or_zero(),
            length,
            k0: curvature,
            k1: curvature,
        }
    }

    pub fn from_transition(
        start: Vec2,
        tangent: Vec2,
        length: f32,
        initial_curvature: f32,
        final_curvature: f32,
    ) -> Segment {
        Segment {
            kind: SegmentKind::Transition,
            start,
            tangent: tangent.normalize_or_zero(),
            length,
            k0: initial_curvature,
            k1: final_curvature,
        }
    }

    pub fn kind(&self) -> SegmentKind {
        self.kind
    }

    pub fn length(&self) -> f32 {
        self.length
    }

    pub fn initial_position(&self) -> Vec2 {
        self.start
    }

    pub fn final_position(&self) -> Vec2 {
        self.evaluate(self.length)
    }

    pub fn initial_tangent(&self) -> Vec2 {
        self.tangent
    }

    pub fn final_tangent(&self) -> Vec2 {
        self.evaluate_tangent(self.length)
    }

    pub fn initial_curvature(&self) -> f32 {
        self.k0
    }

    pub fn final_curvature(&self) -> f32 {
        self.k1
    }

    /// Curvature rate `dk/ds`.
    fn curvature_rate(&self) -> f32 {
        if self.length > 0.0 {
            (self.k1 - self.k0) / self.length
        } else {
            0.0
        }
    }

    pub fn evaluate_curvature(&self, s: f32) -> f32 {
        self.k0 + self.curvature_rate() * s
    }

    /// Position at arc length `s`. Values outside `[0, length]` extrapolate.
    pub fn evaluate(&self, s: f32) -> Vec2 {
        let normal = self.tangent.perp();
        match self.kind {
            SegmentKind::Line => self.start + self.tangent * s,
            SegmentKind::Arc => {
                if self.k0.abs() < MIN_CURVATURE_RATE {
                    return self.start + self.tangent * s;
                }
                let angle = self.k0 * s;
                self.start
                    + self.tangent * (angle.sin() / self.k0)
                    + normal * ((1.0 - angle.cos()) / self.k0)
            }
            SegmentKind::Transition => {
                let rate = self.curvature_rate();
                if rate.abs() < MIN_CURVATURE_RATE {
                    return Segment::from_arc(self.start, self.tangent, self.length, self.k0)
                        .evaluate(s);
                }
                // Shift onto the canonical spiral: at offset s0 from the
                // spiral origin the curvature equals k0.
                let s0 = self.k0 / rate;
                let phi = -0.5 * rate * s0 * s0;
                let delta = spiral_integral(s0 + s, rate) - spiral_integral(s0, rate);
                let (sin_p, cos_p) = phi.sin_cos();
                // Rotate by (theta0 + phi) where theta0 is the start heading.
                let rotated = Vec2::new(
                    delta.x * cos_p - delta.y * sin_p,
                    delta.x * sin_p + delta.y * cos_p,
                );
                self.start + self.tangent * rotated.x + normal * rotated.y
            }
        }
    }

    /// Unit tangent at arc length `s`.
    pub fn evaluate_tangent(&self, s: f32) -> Vec2 {
        let angle = self.k0 * s + 0.5 * self.curvature_rate() * s * s;
        let (sin_a, cos_a) = angle.sin_cos();
        self.tangent * cos_a + self.tangent.perp() * sin_a
    }

    /// The same geometry traversed in the opposite direction.
    pub fn reversed(&self) -> Segment {
        Segment {
            kind: self.kind,
            start: self.final_position(),
            tangent: -self.final_tangent(),
            length: self.length,
            k0: -self.k1,
            k1: -self.k0,
        }
    }

    /// Arc length of the closest point to `point`, with the distance.
    fn closest_point(&self, point: Vec2) -> (f32, f32) {
        match self.kind {
            SegmentKind::Line => {
                let s = (point - self.start).dot(self.tangent).clamp(0.0, self.length);
                (s, (point - self.evaluate(s)).length())
            }
            _ => {
                // Coarse scan then ternary refinement. Curved segments are
                // short relative to their radius so the scan is dense enough.
                let steps = ((self.length / 2.0).ceil() as usize).clamp(8, 64);
                let mut best_s = 0.0;
                let mut best_d = f32::MAX;
                for ii in 0..=steps {
                    let s = self.length * ii as f32 / steps as f32;
                    let d = (point - self.evaluate(s)).length();
                    if d < best_d {
                        best_d = d;
                        best_s = s;
                    }
                }
                let span = self.length / steps as f32;
                let mut lo = (best_s - span).max(0.0);
                let mut hi = (best_s + span).min(self.length);
                for _ in 0..24 {
                    let m0 = lo + (hi - lo) / 3.0;
                    let m1 = hi - (hi - lo) / 3.0;
                    if (point - self.evaluate(m0)).length_squared()
                        < (point - self.evaluate(m1)).length_squared()
                    {
                        hi = m1;
                    } else {
                        lo = m0;
                    }
                }
                let s = 0.5 * (lo + hi);
                (s, (point - self.evaluate(s)).length())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Network
// ---------------------------------------------------------------------------

pub type NodeIndex = u32;
pub type EdgeIndex = u32;

pub const INVALID_NODE: NodeIndex = NodeIndex::MAX;
pub const INVALID_EDGE: EdgeIndex = EdgeIndex::MAX;

#[derive(Debug, Clone, Copy)]
struct Node {
    position: Vec2,
    /// Head of the intrusive list of outgoing edges.
    first_edge: EdgeIndex,
}

#[derive(Debug, Clone, Copy)]
struct Edge {
    end_node: NodeIndex,
    /// Next outgoing edge from this edge's start node.
    next_edge: EdgeIndex,
}

/// Planar directed graph of geometric segments.
///
/// Each inserted segment becomes a pair of directed edges `2i` and `2i + 1`;
/// the odd edge is the reverse traversal. Endpoints within
/// a millimeter of an existing node are welded to it.
#[derive(Debug, Default)]
pub struct Network {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    segments: Vec<Segment>,
    generation: u64,
}

impl Network {
    pub fn new() -> Network {
        Network::default()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
        self.segments.clear();
        self.generation += 1;
    }

    /// Insert a segment, welding its endpoints into the node set. Returns the
    /// forward edge; the reverse edge is `edge ^ 1`.
    pub fn insert_edge(&mut self, segment: Segment) -> EdgeIndex {
        let n0 = self.find_or_insert_node(segment.initial_position());
        let n1 = self.find_or_insert_node(segment.final_position());

        let e0 = self.edges.len() as EdgeIndex;
        let e1 = e0 + 1;

        self.edges.push(Edge {
            end_node: n1,
            next_edge: self.nodes[n0 as usize].first_edge,
        });
        self.nodes[n0 as usize].first_edge = e0;

        self.edges.push(Edge {
            end_node: n0,
            next_edge: self.nodes[n1 as usize].first_edge,
        });
        self.nodes[n1 as usize].first_edge = e1;

        self.segments.push(segment);
        self.generation += 1;
        e0
    }

    fn find_or_insert_node(&mut self, position: Vec2) -> NodeIndex {
        for (index, node) in self.nodes.iter().enumerate() {
            if (node.position - position).length() < NODE_WELD_DISTANCE {
                return index as NodeIndex;
            }
        }
        self.nodes.push(Node {
            position,
            first_edge: INVALID_EDGE,
        });
        (self.nodes.len() - 1) as NodeIndex
    }

    /// Monotone counter bumped by every mutation; used to invalidate caches.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// All directed edge indices.
    pub fn edges(&self) -> impl Iterator<Item = EdgeIndex> {
        0..self.edges.len() as EdgeIndex
    }

    /// Geometry of the given directed edge. Odd edges reverse the stored
    /// segment's parameterization.
    pub fn get_segment(&self, edge: EdgeIndex) -> Segment {
        let segment = self.segments[(edge >> 1) as usize];
        if edge & 1 == 0 {
            segment
        } else {
            segment.reversed()
        }
    }

    pub fn edge_length(&self, edge: EdgeIndex) -> f32 {
        self.segments[(edge >> 1) as usize].length()
    }

    /// Unit tangent at the start of the directed edge.
    pub fn edge_direction(&self, edge: EdgeIndex) -> Vec2 {
        self.get_segment(edge).initial_tangent()
    }

    pub fn end_node(&self, edge: EdgeIndex) -> NodeIndex {
        self.edges[edge as usize].end_node
    }

    pub fn start_node(&self, edge: EdgeIndex) -> NodeIndex {
        self.edges[(edge ^ 1) as usize].end_node
    }

    pub fn node_position(&self, node: NodeIndex) -> Vec2 {
        self.nodes[node as usize].position
    }

    /// First outgoing edge of a node, or [`INVALID_EDGE`].
    pub fn first_edge(&self, node: NodeIndex) -> EdgeIndex {
        self.nodes[node as usize].first_edge
    }

    /// Next outgoing edge from the same start node, or [`INVALID_EDGE`].
    pub fn next_edge(&self, edge: EdgeIndex) -> EdgeIndex {
        self.edges[edge as usize].next_edge
    }

    /// Outgoing edges of a node.
    pub fn outgoing_edges(&self, node: NodeIndex) -> OutgoingEdges<'_> {
        OutgoingEdges {
            network: self,
            edge: self.first_edge(node),
        }
    }

    /// Closest point on the network to `position` within `max_distance`,
    /// as a forward (even) edge and an arc length along it.
    pub fn get_closest_segment(
        &self,
        position: Vec2,
        max_distance: f32,
    ) -> Option<(EdgeIndex, f32)> {
        let mut best: Option<(EdgeIndex, f32)> = None;
        let mut best_distance = max_distance;
        for (index, segment) in self.segments.iter().enumerate() {
            let (s, d) = segment.closest_point(position);
            if d <= best_distance {
                best_distance = d;
                best = Some(((index << 1) as EdgeIndex, s));
            }
        }
        best
    }
}

pub struct OutgoingEdges<'a> {
    network: &'a Network,
    edge: EdgeIndex,
}

impl Iterator for OutgoingEdges<'_> {
    type Item = EdgeIndex;

    fn next(&mut self) -> Option<EdgeIndex> {
        if self.edge == INVALID_EDGE {
            return None;
        }
        let edge = self.edge;
        self.edge = self.network.next_edge(edge);
        Some(edge)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: Vec2, b: Vec2, tolerance: f32) {
        assert!(
            (a - b).length() <= tolerance,
            "{a:?} != {b:?} (tolerance {tolerance})"
        );
    }

    #[test]
    fn line_evaluation() {
        let s = Segment::from_line(Vec2::new(1.0, 2.0), Vec2::new(4.0, 6.0));
        assert_eq!(s.length(), 5.0);
        assert_close(s.evaluate(0.0), Vec2::new(1.0, 2.0), 1e-6);
        assert_close(s.evaluate(5.0), Vec2::new(4.0, 6.0), 1e-6);
        assert_close(s.evaluate_tangent(2.5), Vec2::new(0.6, 0.8), 1e-6);
        assert_eq!(s.evaluate_curvature(2.5), 0.0);
    }

    #[test]
    fn arc_quarter_circle() {
        // Radius 10, quarter turn to the left starting along +x.
        let len = 10.0 * std::f32::consts::FRAC_PI_2;
        let s = Segment::from_arc(Vec2::ZERO, Vec2::X, len, 0.1);
        assert_close(s.final_position(), Vec2::new(10.0, 10.0), 1e-3);
        assert_close(s.final_tangent(), Vec2::Y, 1e-5);
    }

    #[test]
    fn transition_matches_arc_at_constant_curvature() {
        let arc = Segment::from_arc(Vec2::ZERO, Vec2::X, 20.0, 0.05);
        let spiral = Segment::from_transition(Vec2::ZERO, Vec2::X, 20.0, 0.05, 0.05);
        for ii in 0..=10 {
            let s = 2.0 * ii as f32;
            assert_close(spiral.evaluate(s), arc.evaluate(s), 1e-2);
        }
    }

    #[test]
    fn transition_curvature_is_linear() {
        let s = Segment::from_transition(Vec2::ZERO, Vec2::X, 40.0, 0.0, 0.02);
        assert_eq!(s.evaluate_curvature(0.0), 0.0);
        assert!((s.evaluate_curvature(20.0) - 0.01).abs() < 1e-6);
        assert!((s.evaluate_curvature(40.0) - 0.02).abs() < 1e-6);
    }

    #[test]
    fn transition_tangent_follows_heading_integral() {
        let s = Segment::from_transition(Vec2::ZERO, Vec2::X, 30.0, 0.0, 0.02);
        // Final heading is the integral of curvature over the segment.
        let angle: f32 = 0.5 * (0.0 + 0.02) * 30.0;
        let tangent = s.final_tangent();
        assert_close(tangent, Vec2::new(angle.cos(), angle.sin()), 1e-4);
    }

    #[test]
    fn reversed_round_trip() {
        let s = Segment::from_transition(Vec2::new(3.0, -1.0), Vec2::Y, 25.0, 0.01, 0.04);
        let r = s.reversed();
        // Fresnel evaluation error compounds across the two endpoints.
        assert_close(r.initial_position(), s.final_position(), 1e-2);
        assert_close(r.final_position(), s.initial_position(), 0.3);
        assert!((r.initial_curvature() + s.final_curvature()).abs() < 1e-6);
        assert!((r.final_curvature() + s.initial_curvature()).abs() < 1e-6);
    }

    #[test]
    fn network_welds_shared_endpoints() {
        let mut network = Network::new();
        let e0 = network.insert_edge(Segment::from_line(Vec2::ZERO, Vec2::new(10.0, 0.0)));
        let e1 = network.insert_edge(Segment::from_line(Vec2::new(10.0, 0.0), Vec2::new(20.0, 0.0)));
        assert_eq!(network.num_nodes(), 3);
        assert_eq!(network.num_edges(), 4);
        // e0 ends where e1 starts.
        assert_eq!(network.end_node(e0), network.start_node(e1));
        // The shared node's outgoing edges are e1 and the reverse of e0.
        let shared = network.end_node(e0);
        let outgoing: Vec<_> = network.outgoing_edges(shared).collect();
        assert_eq!(outgoing.len(), 2);
        assert!(outgoing.contains(&e1));
        assert!(outgoing.contains(&(e0 ^ 1)));
    }

    #[test]
    fn closest_segment_projects_onto_line() {
        let mut network = Network::new();
        let e = network.insert_edge(Segment::from_line(Vec2::ZERO, Vec2::new(10.0, 0.0)));
        let (edge, dist) = network
            .get_closest_segment(Vec2::new(3.0, 0.5), 1.0)
            .expect("close enough");
        assert_eq!(edge, e);
        assert!((dist - 3.0).abs() < 1e-4);
        assert!(network.get_closest_segment(Vec2::new(3.0, 5.0), 1.0).is_none());
    }
}
