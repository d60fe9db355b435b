//! Ship interiors: compartment geometry, path search, and atmosphere flow.
//!
//! A [`ShipLayout`] is immutable geometry: a shared vertex pool, compartments
//! as clockwise convex polygon rings over it, and connections as doorway
//! quads between two compartments (or between a compartment and the outside
//! of the hull). A [`ShipState`] is the mutable per-frame simulation over a
//! layout: per-compartment atmosphere and hull damage, per-connection door
//! state and gas flow.
//!
//! The flow sign convention: positive `flow` on a connection advects gas
//! from `compartments[0]` to `compartments[1]`.

use glam::Vec2;
use rand::Rng;

use crate::search::{astar, Candidate};
use crate::FRAMETIME;

pub const INVALID_COMPARTMENT: u16 = u16::MAX;
pub const INVALID_CONNECTION: u16 = u16::MAX;

/// Search pool cap for [`ShipLayout::find_path`].
const MAX_SEARCH_NODES: usize = 256;

/// Samples kept per compartment of recent atmosphere values.
pub const HISTORY_SIZE: usize = 256;

/// Velocity damping applied every tick to connection flow.
const FLOW_DAMPING: f32 = 0.95;

/// Upper bound on clamp passes per tick.
const MAX_CLAMP_ITERATIONS: usize = 32;

/// Compartment definition: a clockwise ring as a slice of the vertex pool.
#[derive(Debug, Clone, Copy)]
pub struct CompartmentDef {
    pub first_vertex: u16,
    pub num_vertices: u16,
}

/// Connection definition: the two compartments joined (either may be
/// [`INVALID_COMPARTMENT`], meaning outside the hull) and the four doorway
/// vertices, two on each side of the wall.
#[derive(Debug, Clone, Copy)]
pub struct ConnectionDef {
    pub compartments: [u16; 2],
    pub vertices: [u16; 4],
}

#[derive(Debug, Clone, Copy)]
pub struct Compartment {
    pub first_vertex: u16,
    pub num_vertices: u16,
    /// Signed ring area; positive for the required clockwise winding.
    pub area: f32,
}

#[derive(Debug, Clone, Copy)]
pub struct Connection {
    pub compartments: [u16; 2],
    pub vertices: [u16; 4],
    /// Mean of the two side openings.
    pub width: f32,
}

/// Immutable compartment/connection geometry of one ship interior.
#[derive(Debug, Clone)]
pub struct ShipLayout {
    vertices: Vec<Vec2>,
    compartments: Vec<Compartment>,
    connections: Vec<Connection>,
}

impl ShipLayout {
    pub fn new(
        vertices: Vec<Vec2>,
        compartments: &[CompartmentDef],
        connections: &[ConnectionDef],
    ) -> ShipLayout {
        let compartments = compartments
            .iter()
            .map(|def| {
                let base = def.first_vertex as usize;
                let v0 = vertices[base];
                let mut area = 0.0;
                for ii in 2..def.num_vertices as usize {
                    let v1 = vertices[base + ii - 1];
                    let v2 = vertices[base + ii];
                    area += 0.5 * (v2 - v1).perp_dot(v1 - v0);
                }
                Compartment {
                    first_vertex: def.first_vertex,
                    num_vertices: def.num_vertices,
                    area,
                }
            })
            .collect();

        let connections = connections
            .iter()
            .map(|def| {
                let side0 = vertices[def.vertices[1] as usize] - vertices[def.vertices[0] as usize];
                let side1 = vertices[def.vertices[3] as usize] - vertices[def.vertices[2] as usize];
                Connection {
                    compartments: def.compartments,
                    vertices: def.vertices,
                    width: 0.5 * (side0.length() + side1.length()),
                }
            })
            .collect();

        ShipLayout {
            vertices,
            compartments,
            connections,
        }
    }

    pub fn vertices(&self) -> &[Vec2] {
        &self.vertices
    }

    pub fn compartments(&self) -> &[Compartment] {
        &self.compartments
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Index of the first compartment containing `point`, or
    /// [`INVALID_COMPARTMENT`].
    pub fn intersect_compartment(&self, point: Vec2) -> u16 {
        'compartments: for (index, compartment) in self.compartments.iter().enumerate() {
            let base = compartment.first_vertex as usize;
            let size = compartment.num_vertices as usize;
            for jj in 0..size {
                let va = point - self.vertices[base + jj];
                let vb = point - self.vertices[base + (jj + 1) % size];
                if va.perp_dot(vb) > 0.0 {
                    continue 'compartments;
                }
            }
            return index as u16;
        }
        INVALID_COMPARTMENT
    }

    /// Polyline from `start` to `end` traversable by a disc of radius
    /// `radius`, as `[start, (left, right) per doorway, end]`.
    ///
    /// Returns the number of vertices in the path. When `buffer` is too
    /// small the required length is returned and nothing is written; when no
    /// path exists (or either endpoint is outside every compartment) the
    /// result is 0.
    pub fn find_path(&self, start: Vec2, end: Vec2, radius: f32, buffer: &mut [Vec2]) -> usize {
        let start_idx = self.intersect_compartment(start);
        let end_idx = self.intersect_compartment(end);

        if start_idx == INVALID_COMPARTMENT || end_idx == INVALID_COMPARTMENT {
            return 0;
        }
        if start_idx == end_idx {
            if buffer.len() >= 2 {
                buffer[0] = start;
                buffer[1] = end;
            }
            return 2;
        }

        #[derive(Clone, Copy)]
        struct State {
            position: Vec2,
            compartment: u16,
            connection: u16,
        }

        let chain = astar(
            [Candidate {
                state: State {
                    position: start,
                    compartment: start_idx,
                    connection: INVALID_CONNECTION,
                },
                cost: 0.0,
                heuristic: (start - end).length(),
            }],
            |state: &State, push: &mut dyn FnMut(Candidate<State>)| {
                for (ii, connection) in self.connections.iter().enumerate() {
                    if connection.width < 2.0 * radius {
                        continue;
                    }
                    let other = if connection.compartments[0] == state.compartment {
                        connection.compartments[1]
                    } else if connection.compartments[1] == state.compartment {
                        connection.compartments[0]
                    } else {
                        continue;
                    };
                    if other == INVALID_COMPARTMENT {
                        continue;
                    }
                    let midpoint = connection
                        .vertices
                        .iter()
                        .map(|&v| self.vertices[v as usize])
                        .sum::<Vec2>()
                        / connection.vertices.len() as f32;
                    push(Candidate {
                        state: State {
                            position: midpoint,
                            compartment: other,
                            connection: ii as u16,
                        },
                        cost: (midpoint - state.position).length(),
                        heuristic: (midpoint - end).length(),
                    });
                }
            },
            |state: &State| state.compartment == end_idx,
            |state: &State| {
                if state.connection == INVALID_CONNECTION {
                    None
                } else {
                    Some(state.connection)
                }
            },
            MAX_SEARCH_NODES,
        );
        let Some(chain) = chain else {
            return 0;
        };

        let depth = chain.len() - 1;
        let num_vertices = depth * 2 + 2;
        if num_vertices > buffer.len() {
            return num_vertices;
        }

        buffer[0] = start;
        buffer[num_vertices - 1] = end;
        // Resolve doorway pairs back to front so each normal can be oriented
        // against the already-placed next path point.
        for kk in (1..=depth).rev() {
            let state = &chain[kk];
            let connection = &self.connections[state.connection as usize];
            let v = |index: usize| self.vertices[connection.vertices[index] as usize];
            let mut normal = v(0) - v(2) + v(1) - v(3);
            let length = normal.length();
            let inset = 0.25 * length;
            normal = if length > 1e-6 {
                normal / length
            } else {
                Vec2::X
            };
            if normal.dot(state.position - buffer[2 * kk + 1]) < 0.0 {
                normal = -normal;
            }
            buffer[2 * kk] = state.position - normal * (inset + radius);
            buffer[2 * kk - 1] = state.position + normal * (inset + radius);
        }
        num_vertices
    }

    /// A point inside the layout, uniformly distributed by compartment area.
    pub fn random_point(&self, rng: &mut impl Rng) -> Vec2 {
        let total: f32 = self.compartments.iter().map(|c| c.area.max(0.0)).sum();
        let mut pick = rng.gen_range(0.0..total.max(f32::MIN_POSITIVE));
        let mut index = 0;
        for (ii, compartment) in self.compartments.iter().enumerate() {
            index = ii;
            pick -= compartment.area.max(0.0);
            if pick <= 0.0 {
                break;
            }
        }
        self.random_point_in(rng, index as u16)
    }

    /// A point inside the given compartment, uniformly distributed by area.
    pub fn random_point_in(&self, rng: &mut impl Rng, compartment: u16) -> Vec2 {
        let c = &self.compartments[compartment as usize];
        let base = c.first_vertex as usize;
        let ring = &self.vertices[base..base + c.num_vertices as usize];
        let mut min = ring[0];
        let mut max = ring[0];
        for &v in ring {
            min = min.min(v);
            max = max.max(v);
        }
        // Rejection sampling against the ring's bounding box; convex rings
        // accept fast. Fall back to the ring mean if luck runs out.
        for _ in 0..64 {
            let p = Vec2::new(
                rng.gen_range(min.x..=max.x),
                rng.gen_range(min.y..=max.y),
            );
            if self.intersect_compartment(p) == compartment {
                return p;
            }
        }
        ring.iter().copied().sum::<Vec2>() / ring.len() as f32
    }
}

/// Per-compartment mutable state.
#[derive(Debug, Clone)]
pub struct CompartmentState {
    /// Fractional gas density in `[0, 1]`.
    pub atmosphere: f32,
    /// Leak rate from hull damage, in atmosphere per second.
    pub damage: f32,
    /// Scratch accumulators for the clamp passes: `[outflow, inflow]`.
    flow: [f32; 2],
    /// Ring buffer of recent atmosphere samples.
    pub history: [f32; HISTORY_SIZE],
}

/// Per-connection mutable state.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConnectionState {
    pub opened: bool,
    pub opened_automatic: bool,
    pub gradient: f32,
    pub velocity: f32,
    pub flow: f32,
}

impl ConnectionState {
    fn is_open(&self) -> bool {
        self.opened || self.opened_automatic
    }
}

/// Time-stepped atmosphere simulation over a [`ShipLayout`].
///
/// The state holds no reference to its layout; every step takes the layout
/// it was sized for. Compartment and connection counts must match.
#[derive(Debug, Clone)]
pub struct ShipState {
    compartments: Vec<CompartmentState>,
    connections: Vec<ConnectionState>,
    framenum: usize,
}

impl ShipState {
    pub fn new(layout: &ShipLayout) -> ShipState {
        ShipState {
            compartments: layout
                .compartments()
                .iter()
                .map(|_| CompartmentState {
                    atmosphere: 1.0,
                    damage: 0.0,
                    flow: [0.0, 0.0],
                    history: [0.0; HISTORY_SIZE],
                })
                .collect(),
            connections: vec![ConnectionState::default(); layout.connections().len()],
            framenum: 0,
        }
    }

    pub fn compartments(&self) -> &[CompartmentState] {
        &self.compartments
    }

    pub fn connections(&self) -> &[ConnectionState] {
        &self.connections
    }

    pub fn framenum(&self) -> usize {
        self.framenum
    }

    /// Add to a compartment's leak rate.
    pub fn damage(&mut self, index: u16, amount: f32) {
        self.compartments[index as usize].damage += amount;
    }

    /// Reduce a compartment's leak rate by `rate` per second, floored at 0.
    pub fn repair(&mut self, index: u16, rate: f32) {
        let damage = &mut self.compartments[index as usize].damage;
        *damage = (*damage - rate * FRAMETIME).max(0.0);
    }

    /// Add `rate` per second of atmosphere to every compartment, clamped
    /// into `[0, 1]`.
    pub fn recharge(&mut self, rate: f32) {
        for compartment in &mut self.compartments {
            compartment.atmosphere = (compartment.atmosphere + rate * FRAMETIME).clamp(0.0, 1.0);
        }
    }

    pub fn set_connection(&mut self, index: u16, opened: bool) {
        self.connections[index as usize].opened = opened;
    }

    pub fn set_connection_automatic(&mut self, index: u16, opened: bool) {
        self.connections[index as usize].opened_automatic = opened;
    }

    /// One [`FRAMETIME`] step: damage loss, pressure-driven flow with
    /// iterative clamping so no compartment goes negative, advection, and
    /// the history push.
    pub fn think(&mut self, layout: &ShipLayout) {
        let dt = FRAMETIME;

        for compartment in &mut self.compartments {
            compartment.flow = [0.0, 0.0];
            compartment.atmosphere = (compartment.atmosphere - compartment.damage * dt).max(0.0);
        }

        for (state, connection) in self.connections.iter_mut().zip(layout.connections()) {
            let [c0, c1] = connection.compartments;
            state.gradient = if c0 == INVALID_COMPARTMENT {
                debug_assert!(c1 != INVALID_COMPARTMENT);
                -self.compartments[c1 as usize].atmosphere
            } else if c1 == INVALID_COMPARTMENT {
                self.compartments[c0 as usize].atmosphere
            } else {
                self.compartments[c0 as usize].atmosphere
                    - self.compartments[c1 as usize].atmosphere
            };
        }

        for (state, connection) in self.connections.iter_mut().zip(layout.connections()) {
            let [c0, c1] = connection.compartments;
            let mut mass = 0.0;
            if c0 != INVALID_COMPARTMENT {
                mass += self.compartments[c0 as usize].atmosphere
                    * layout.compartments()[c0 as usize].area;
            }
            if c1 != INVALID_COMPARTMENT {
                mass += self.compartments[c1 as usize].atmosphere
                    * layout.compartments()[c1 as usize].area;
            }

            state.velocity *= FLOW_DAMPING;
            if state.is_open() {
                state.velocity += state.gradient * mass * dt;
            } else {
                state.velocity = 0.0;
            }
        }

        for (state, connection) in self.connections.iter_mut().zip(layout.connections()) {
            state.flow = if state.is_open() {
                state.velocity * connection.width * dt
            } else {
                0.0
            };
        }

        for _ in 0..MAX_CLAMP_ITERATIONS {
            let mut clamped = false;

            for compartment in &mut self.compartments {
                compartment.flow = [0.0, 0.0];
            }
            for (state, connection) in self.connections.iter().zip(layout.connections()) {
                if !state.is_open() {
                    continue;
                }
                let [c0, c1] = connection.compartments;
                let delta = state.flow;
                if c0 != INVALID_COMPARTMENT {
                    self.compartments[c0 as usize].flow[0] += delta.max(0.0);
                    self.compartments[c0 as usize].flow[1] -= delta.min(0.0);
                }
                if c1 != INVALID_COMPARTMENT {
                    self.compartments[c1 as usize].flow[0] -= delta.min(0.0);
                    self.compartments[c1 as usize].flow[1] += delta.max(0.0);
                }
            }

            // Scale each connection's draw so no compartment's total outflow
            // exceeds its available mass plus inflow.
            for (state, connection) in self.connections.iter_mut().zip(layout.connections()) {
                if !state.is_open() {
                    continue;
                }
                let [c0, c1] = connection.compartments;
                if state.flow > 0.0 && c0 != INVALID_COMPARTMENT {
                    let source = &self.compartments[c0 as usize];
                    let area = layout.compartments()[c0 as usize].area;
                    let fraction = state.flow / source.flow[0];
                    let limit = fraction * (source.flow[1] + source.atmosphere * area);
                    debug_assert!(limit >= -1e-6);
                    if state.flow > limit {
                        state.flow = limit;
                        clamped = true;
                    }
                }
                if state.flow < 0.0 && c1 != INVALID_COMPARTMENT {
                    let source = &self.compartments[c1 as usize];
                    let area = layout.compartments()[c1 as usize].area;
                    let fraction = -state.flow / source.flow[0];
                    let limit = fraction * (source.flow[1] + source.atmosphere * area);
                    debug_assert!(limit >= -1e-6);
                    if -state.flow > limit {
                        state.flow = -limit;
                        clamped = true;
                    }
                }
                debug_assert!(!state.flow.is_nan());
            }

            if !clamped {
                break;
            }
        }

        for (state, connection) in self.connections.iter().zip(layout.connections()) {
            if !state.is_open() {
                continue;
            }
            let [c0, c1] = connection.compartments;
            if c0 != INVALID_COMPARTMENT {
                let area = layout.compartments()[c0 as usize].area;
                self.compartments[c0 as usize].atmosphere -= state.flow / area;
                debug_assert!(self.compartments[c0 as usize].atmosphere >= -1e-3);
            }
            if c1 != INVALID_COMPARTMENT {
                let area = layout.compartments()[c1 as usize].area;
                self.compartments[c1 as usize].atmosphere += state.flow / area;
                debug_assert!(self.compartments[c1 as usize].atmosphere >= -1e-3);
            }
        }

        let index = self.framenum % HISTORY_SIZE;
        self.framenum += 1;
        for compartment in &mut self.compartments {
            compartment.history[index] = compartment.atmosphere;
        }
    }
}

/// A ship in the world: immutable layout plus its simulated interior.
pub struct Ship {
    layout: ShipLayout,
    state: ShipState,
}

impl Ship {
    pub fn new(layout: ShipLayout) -> Ship {
        let state = ShipState::new(&layout);
        Ship { layout, state }
    }

    pub fn layout(&self) -> &ShipLayout {
        &self.layout
    }

    pub fn state(&self) -> &ShipState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut ShipState {
        &mut self.state
    }

    pub(crate) fn think(&mut self) {
        self.state.think(&self.layout);
    }
}
