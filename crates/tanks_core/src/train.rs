//! Schedule-driven train controller.
//!
//! A train follows a committed sequence of directed edges. Each tick it
//! advances by `speed * dt`, pops the head edge once the whole train has
//! crossed it, and steers its speed toward the minimum of the curvature
//! limit ahead and the braking envelope into `target_distance`.
//!
//! Replanning happens on arrival: the next station's position becomes the
//! goal, and the search starts from the point the train is already committed
//! to reach (current position plus stopping distance), because the train
//! cannot brake in zero distance. The found path is appended to the edges
//! already committed.

use glam::{Affine2, Vec2};
use tracing::debug;

use crate::clothoid::{Segment, SegmentKind};
use crate::handle::Handle;
use crate::rail::{EdgeIndex, RailPosition, RailStation, INVALID_EDGE};
use crate::render::{Color, Renderer};
use crate::world::World;
use crate::FRAMETIME;

impl Train {
    pub const MAX_SPEED: f32 = 50.0;
    pub const MAX_ACCELERATION: f32 = 4.0;
    pub const MAX_DECELERATION: f32 = 4.0;
    pub const MAX_LATERAL_ACCELERATION: f32 = 4.0;

    pub const LOCOMOTIVE_LENGTH: f32 = 24.0;
    pub const CAR_LENGTH: f32 = 16.0;
    pub const COUPLING_LENGTH: f32 = 1.0;

    /// Truck inset from each end of a body.
    const TRUCK_INSET: f32 = 2.4;
}

/// Curvatures below this are treated as straight track.
const MIN_CURVATURE: f32 = 1e-6;

pub struct Train {
    schedule: Vec<Handle<RailStation>>,
    /// Index into `schedule` of the station being approached; `None` until
    /// the first replanning.
    next_station: Option<usize>,
    /// Set when the schedule changed; triggers a replan on the next tick.
    replan: bool,

    /// Committed edges ahead of (and under) the locomotive.
    path: Vec<EdgeIndex>,
    /// Arc length of the locomotive nose along `path`, measured from the
    /// start of `path[0]`.
    current_distance: f32,
    current_speed: f32,
    /// Brake-to-stop target measured along `path`.
    target_distance: f32,

    num_cars: usize,
}

impl Train {
    pub fn new(num_cars: usize) -> Train {
        Train {
            schedule: Vec::new(),
            next_station: None,
            replan: false,
            path: Vec::new(),
            current_distance: 0.0,
            current_speed: 0.0,
            target_distance: 0.0,
            num_cars,
        }
    }

    pub fn num_cars(&self) -> usize {
        self.num_cars
    }

    pub fn current_speed(&self) -> f32 {
        self.current_speed
    }

    pub fn current_distance(&self) -> f32 {
        self.current_distance
    }

    pub fn target_distance(&self) -> f32 {
        self.target_distance
    }

    pub fn path(&self) -> &[EdgeIndex] {
        &self.path
    }

    pub fn schedule(&self) -> &[Handle<RailStation>] {
        &self.schedule
    }

    pub fn next_station_index(&self) -> Option<usize> {
        self.next_station
    }

    /// Nose-to-rear length of the whole train.
    pub fn length(&self) -> f32 {
        self.car_offset(self.num_cars as i32 - 1)
    }

    /// Replace the schedule. The next tick replans: a train with no path
    /// yet snaps onto the first station, a moving train reroutes from the
    /// point it is already committed to reach.
    pub fn set_schedule(&mut self, schedule: Vec<Handle<RailStation>>) {
        self.schedule = schedule;
        self.next_station = None;
        self.replan = !self.schedule.is_empty();
    }

    pub(crate) fn think(&mut self, world: &mut World) {
        if self.replan {
            self.replan = false;
            self.next_station(world);
        }
        if self.path.is_empty() {
            return;
        }

        let head = world.rail().get_segment(self.path[0]);
        let train_length = self.length();

        self.current_distance += self.current_speed * FRAMETIME;
        if self.current_distance - train_length > head.length() {
            self.current_distance -= head.length();
            self.target_distance -= head.length();
            if self.path.len() > 1 {
                self.path.remove(0);
            }
        }

        if self.current_distance >= self.target_distance {
            self.current_distance = self.target_distance;
            self.next_station(world);
        }

        let braking_limit = (2.0
            * (self.target_distance - self.current_distance).max(0.0)
            * Self::MAX_DECELERATION)
            .sqrt();
        let s = self.target_speed(world).min(braking_limit);
        if self.current_speed > s {
            self.current_speed = s.max(self.current_speed - Self::MAX_DECELERATION * FRAMETIME);
        } else if self.current_speed < s {
            self.current_speed = s.min(self.current_speed + Self::MAX_ACCELERATION * FRAMETIME);
        }
    }

    /// Advance the schedule cursor and extend the path toward the next
    /// station, replanning from the point the train is committed to reach.
    fn next_station(&mut self, world: &World) {
        if self.schedule.is_empty() {
            return;
        }

        let next = match self.next_station {
            Some(index) => (index + 1) % self.schedule.len(),
            None => 0,
        };
        self.next_station = Some(next);

        let Some(station) = world.get(self.schedule[next]) else {
            // Dead station handle: leave the path alone, the cursor will
            // advance past it on the next arrival.
            debug!(index = next, "schedule entry no longer resolves");
            return;
        };

        if self.path.is_empty() {
            self.path.push(station.edge());
            self.current_distance = station.dist();
            self.target_distance = station.dist();
            return;
        }

        let stopping_distance =
            0.5 * self.current_speed * self.current_speed / Self::MAX_DECELERATION;
        let goal = RailPosition::from_edge(station.edge(), station.dist());

        // Find the path edge containing the committed point.
        let mut path_distance = 0.0;
        let mut start = None;
        let mut committed = self.path.len();
        for (ii, &edge) in self.path.iter().enumerate() {
            let segment = world.rail().get_segment(edge);
            if path_distance + segment.length() > self.current_distance + stopping_distance {
                committed = ii + 1;
                start = Some(RailPosition::from_edge(
                    edge,
                    self.current_distance + stopping_distance - path_distance,
                ));
                path_distance += segment.length();
                break;
            }
            path_distance += segment.length();
        }
        let Some(start) = start else {
            // The committed point lies beyond the current path; keep the old
            // target and try again on the next arrival.
            debug!("stopping point beyond committed path");
            return;
        };

        let mut buffer = [INVALID_EDGE; 1024];
        let depth = world.rail().find_path(start, goal, &mut buffer);
        if depth > buffer.len() {
            debug!(depth, "replanned path too deep");
            return;
        }

        self.path.truncate(committed);
        for &edge in &buffer[..depth] {
            if matches!(goal, RailPosition::OnEdge { edge: goal_edge, .. } if edge == goal_edge) {
                self.target_distance = path_distance + station.dist();
            } else {
                path_distance += world.rail().get_segment(edge).length();
            }
            self.path.push(edge);
        }
    }

    /// Maximum speed permitted by the curvature of the track ahead, within
    /// the worst-case stopping horizon.
    fn target_speed(&self, world: &World) -> f32 {
        let stopping_distance =
            0.5 * Self::MAX_SPEED * Self::MAX_SPEED / Self::MAX_DECELERATION;
        let tail_distance = self.current_distance - self.length();
        let mut segment_distance = 0.0;

        let mut maximum_speed = Self::MAX_SPEED;
        for &edge in &self.path {
            let segment = world.rail().get_segment(edge);

            match segment.kind() {
                SegmentKind::Line => {}

                SegmentKind::Arc => {
                    let k = segment.initial_curvature().abs();
                    if k > MIN_CURVATURE {
                        let d = (segment_distance - self.current_distance).max(0.0);
                        let vsqr = Self::MAX_LATERAL_ACCELERATION / k;
                        maximum_speed = maximum_speed
                            .min((vsqr + 2.0 * d * Self::MAX_DECELERATION).sqrt());
                    }
                }

                SegmentKind::Transition => {
                    maximum_speed = maximum_speed.min(self.transition_limit(
                        &segment,
                        segment_distance,
                        tail_distance,
                    ));
                }
            }

            segment_distance += segment.length();
            if segment_distance > self.current_distance + stopping_distance {
                break;
            }
        }

        maximum_speed
    }

    /// Speed limit contributed by one curvature transition starting at
    /// `segment_distance` along the path.
    fn transition_limit(
        &self,
        segment: &Segment,
        segment_distance: f32,
        tail_distance: f32,
    ) -> f32 {
        let a_lat = Self::MAX_LATERAL_ACCELERATION;
        let a_dec = Self::MAX_DECELERATION;
        let k0 = segment.initial_curvature().abs();
        let k1 = segment.final_curvature().abs();

        if k0 > k1 {
            // Curvature eases off. The binding point is the tail while it is
            // still inside the segment, the entry otherwise.
            if tail_distance > segment_distance {
                let s = tail_distance - segment_distance;
                let k = segment.evaluate_curvature(s).abs();
                if k > MIN_CURVATURE {
                    return (a_lat / k).sqrt();
                }
                return f32::MAX;
            }
            if k0 > MIN_CURVATURE {
                let d = (segment_distance - self.current_distance).max(0.0);
                return (a_lat / k0 + 2.0 * d * a_dec).sqrt();
            }
            return f32::MAX;
        }

        if (k1 - k0) < MIN_CURVATURE {
            // Degenerate constant-curvature transition, same as an arc.
            if k0 > MIN_CURVATURE {
                let d = (segment_distance - self.current_distance).max(0.0);
                return (a_lat / k0 + 2.0 * d * a_dec).sqrt();
            }
            return f32::MAX;
        }

        if self.current_distance < segment_distance + segment.length() {
            // Tightening curvature ahead: the allowed speed a_lat/k(s) falls
            // while the braking bonus 2*a_dec*(s - s_loco) grows, so the
            // binding point is where d/ds [a_lat/k(s) + 2*a_dec*s] = 0.
            let a = (k1 - k0) / (a_lat * segment.length());
            let b = k0 / a_lat;
            let c = 2.0 * a_dec;
            let mut s = (a.sqrt() - b * c.sqrt()) / (a * c.sqrt());
            s = s.clamp(0.0, segment.length());
            s = s.max(self.current_distance - segment_distance);
            let d = (s + segment_distance - self.current_distance).max(0.0);
            let k = segment.evaluate_curvature(s).abs();
            if k > MIN_CURVATURE {
                return (a_lat / k + 2.0 * d * a_dec).sqrt();
            }
            return f32::MAX;
        }

        // Fully behind the locomotive: limited by the exit curvature.
        if k1 > MIN_CURVATURE {
            return (a_lat / k1).sqrt();
        }
        f32::MAX
    }

    // -----------------------------------------------------------------------
    // Geometry
    // -----------------------------------------------------------------------

    /// Distance from the nose to the far end of car `index`.
    pub fn car_offset(&self, index: i32) -> f32 {
        (Self::LOCOMOTIVE_LENGTH + Self::COUPLING_LENGTH)
            + index as f32 * (Self::CAR_LENGTH + Self::COUPLING_LENGTH)
    }

    /// Distance from the nose to truck `index`. The locomotive carries
    /// trucks 0 and 1; each car the following pair.
    pub fn truck_offset(&self, index: i32) -> f32 {
        if index == 0 {
            Self::TRUCK_INSET
        } else if index == 1 {
            Self::LOCOMOTIVE_LENGTH - Self::TRUCK_INSET
        } else if index & 1 == 0 {
            self.car_offset(index / 2 - 1) + Self::TRUCK_INSET
        } else {
            self.car_offset(index / 2 - 1) + Self::CAR_LENGTH - Self::TRUCK_INSET
        }
    }

    /// Evaluate a point `offset` behind the nose at distance `distance`
    /// along the path.
    fn evaluate_on_path(&self, world: &World, mut dist: f32) -> Option<(Vec2, Vec2)> {
        for (ii, &edge) in self.path.iter().enumerate() {
            let segment = world.rail().get_segment(edge);
            if dist <= segment.length() || ii == self.path.len() - 1 {
                return Some((segment.evaluate(dist), segment.evaluate_tangent(dist)));
            }
            dist -= segment.length();
        }
        None
    }

    pub fn position(&self, world: &World, time: f32) -> Vec2 {
        let dist = self.current_distance + self.current_speed * (time - world.frametime());
        self.evaluate_on_path(world, dist)
            .map(|(p, _)| p)
            .unwrap_or(Vec2::ZERO)
    }

    pub fn rotation(&self, world: &World, time: f32) -> f32 {
        let dist = self.current_distance + self.current_speed * (time - world.frametime());
        self.evaluate_on_path(world, dist)
            .map(|(_, t)| t.y.atan2(t.x))
            .unwrap_or(0.0)
    }

    // -----------------------------------------------------------------------
    // Drawing
    // -----------------------------------------------------------------------

    pub fn draw(&self, renderer: &mut dyn Renderer, world: &World, time: f32) {
        if self.path.is_empty() {
            return;
        }
        let distance =
            self.current_distance + self.current_speed * (time - world.frametime());
        self.draw_at(renderer, world, distance, Color::WHITE);
    }

    fn draw_at(&self, renderer: &mut dyn Renderer, world: &World, distance: f32, color: Color) {
        let num_trucks = self.num_cars * 2 + 2;
        let mut trucks = vec![None; num_trucks];

        // Walk the path front to back, resolving each truck onto its segment.
        let mut path_length = 0.0;
        let mut jj = 0;
        for &edge in &self.path {
            let segment = world.rail().get_segment(edge);
            while jj < num_trucks {
                let truck = num_trucks - jj - 1;
                let s = distance - self.truck_offset(truck as i32) - path_length;
                if s > segment.length() {
                    break;
                }
                trucks[truck] = Some((segment.evaluate(s), segment.evaluate_tangent(s)));
                let (p, t) = trucks[truck].expect("just set");
                renderer.draw_line(p - t.perp() * 2.0, p + t.perp() * 2.0, color, color);
                jj += 1;
            }
            path_length += segment.length();
        }

        let body_transform = |front: usize, back: usize| -> Option<Affine2> {
            let (front, _) = trucks[front]?;
            let (back, _) = trucks[back]?;
            let dir = (front - back).normalize_or_zero();
            let pos = 0.5 * (front + back);
            Some(Affine2::from_cols(dir, dir.perp(), pos))
        };

        if let Some(tx) = body_transform(0, 1) {
            self.draw_locomotive(renderer, tx, color);
        }
        for ii in 0..self.num_cars {
            if let Some(tx) = body_transform(ii * 2 + 1, ii * 2 + 2) {
                self.draw_coupler(renderer, tx, color);
            }
            if let Some(tx) = body_transform(ii * 2 + 2, ii * 2 + 3) {
                self.draw_car(renderer, tx, color);
            }
        }
    }

    fn draw_body(
        &self,
        renderer: &mut dyn Renderer,
        tx: Affine2,
        color: Color,
        half_length: f32,
        half_width: f32,
    ) {
        let points = [
            tx.transform_point2(Vec2::new(-half_length, half_width)),
            tx.transform_point2(Vec2::new(-half_length, -half_width)),
            tx.transform_point2(Vec2::new(half_length, half_width)),
            tx.transform_point2(Vec2::new(half_length, -half_width)),
        ];
        let fill = [Color::BLACK; 4];
        renderer.draw_triangles(&points, &fill, &[0, 1, 3, 0, 3, 2]);
        renderer.draw_line(points[0], points[1], color, color);
        renderer.draw_line(points[1], points[3], color, color);
        renderer.draw_line(points[3], points[2], color, color);
        renderer.draw_line(points[2], points[0], color, color);
    }

    fn draw_locomotive(&self, renderer: &mut dyn Renderer, tx: Affine2, color: Color) {
        self.draw_body(renderer, tx, color, 12.0, 1.6);
        // Nose wedge.
        let nose = [
            tx.transform_point2(Vec2::new(11.3, 1.6)),
            tx.transform_point2(Vec2::new(12.0, 0.9)),
            tx.transform_point2(Vec2::new(12.0, -0.9)),
            tx.transform_point2(Vec2::new(11.3, -1.6)),
        ];
        renderer.draw_line(nose[0], nose[1], color, color);
        renderer.draw_line(nose[1], nose[2], color, color);
        renderer.draw_line(nose[2], nose[3], color, color);
    }

    fn draw_car(&self, renderer: &mut dyn Renderer, tx: Affine2, color: Color) {
        self.draw_body(renderer, tx, color, 8.0, 1.6);
    }

    fn draw_coupler(&self, renderer: &mut dyn Renderer, tx: Affine2, color: Color) {
        self.draw_body(renderer, tx, color, 1.0, 0.2);
    }
}
