//! The object registry and frame loop.
//!
//! A [`World`] owns a sparse, slot-reusing array of [`Object`]s. Objects are
//! referred to by sequence-tagged [`Handle`]s, spawned with [`World::spawn`],
//! and destroyed at frame boundaries after [`World::remove`]. One call to
//! [`World::run_frame`] advances the simulation by [`FRAMETIME`]:
//!
//! 1. inbound messages have been drained and applied by the session,
//! 2. input has been sampled into the world's [`Usercmd`],
//! 3. every live object's `think` runs in registry order,
//! 4. pending removals are committed,
//! 5. the session emits the outbound snapshot.
//!
//! That fixed order is the sole source of determinism.

use std::collections::VecDeque;

use glam::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;
use tracing::trace;

use crate::handle::{Handle, WorldIndex, MAX_OBJECTS, MAX_WORLDS};
use crate::hextile::HexGrid;
use crate::object::{Object, Variant};
use crate::protocol::{msg, MessageWriter};
use crate::rail::RailNetwork;
use crate::render::{Color, Renderer};
use crate::sound::Asset;
use crate::usercmd::Usercmd;
use crate::FRAMETIME;

#[derive(Debug, Error)]
pub enum WorldError {
    #[error("all {MAX_WORLDS} world slots are in use")]
    TooManyWorlds,
}

#[derive(Debug, Error)]
pub enum SpawnError {
    #[error("world is at its capacity of {MAX_OBJECTS} objects")]
    WorldFull,
}

/// Replicated visual effect types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectKind {
    None,
    Smoke,
    Sparks,
    Cannon,
    Blaster,
    MissileTrail,
    CannonImpact,
    MissileImpact,
    BlasterImpact,
    Explosion,
}

impl EffectKind {
    pub fn to_u8(self) -> u8 {
        match self {
            EffectKind::None => 0,
            EffectKind::Smoke => 1,
            EffectKind::Sparks => 2,
            EffectKind::Cannon => 3,
            EffectKind::Blaster => 4,
            EffectKind::MissileTrail => 5,
            EffectKind::CannonImpact => 6,
            EffectKind::MissileImpact => 7,
            EffectKind::BlasterImpact => 8,
            EffectKind::Explosion => 9,
        }
    }

    pub fn from_u8(value: u8) -> Option<EffectKind> {
        Some(match value {
            0 => EffectKind::None,
            1 => EffectKind::Smoke,
            2 => EffectKind::Sparks,
            3 => EffectKind::Cannon,
            4 => EffectKind::Blaster,
            5 => EffectKind::MissileTrail,
            6 => EffectKind::CannonImpact,
            7 => EffectKind::MissileImpact,
            8 => EffectKind::BlasterImpact,
            9 => EffectKind::Explosion,
            _ => return None,
        })
    }
}

/// A single time-parametric particle. Position, size, and color at draw time
/// `t` seconds after spawn are closed-form, so the pool is only written when
/// particles spawn or expire.
#[derive(Debug, Clone, Copy)]
pub struct Particle {
    pub position: Vec2,
    pub velocity: Vec2,
    pub acceleration: Vec2,
    pub size: f32,
    pub size_velocity: f32,
    pub color: Color,
    pub color_velocity: Color,
    /// Spawn time in seconds.
    pub time: f32,
}

impl Particle {
    /// Seconds until the alpha ramp reaches zero.
    fn lifetime(&self) -> f32 {
        if self.color_velocity.a < 0.0 {
            -self.color.a / self.color_velocity.a
        } else {
            f32::MAX
        }
    }

    fn evaluate_position(&self, t: f32) -> Vec2 {
        self.position + self.velocity * t + 0.5 * self.acceleration * t * t
    }
}

struct LiveSlot {
    sequence: u64,
    spawn_frame: i64,
    object: Object,
}

enum Slot {
    Vacant,
    Live(LiveSlot),
    /// Object temporarily moved out while its `think` or spawn hook runs.
    /// The slot stays reserved so a concurrent spawn cannot reuse it.
    Running { sequence: u64, spawn_frame: i64 },
}

/// Object registry plus the frame-owned subsystems: rail network, hex tiles,
/// particle pool, and the outbound message buffer.
pub struct World {
    index: WorldIndex,
    objects: Vec<Slot>,
    removed: VecDeque<Handle<Object>>,
    sequence: u64,
    framenum: i64,
    rng: StdRng,
    usercmd: Usercmd,

    rail: RailNetwork,
    tiles: HexGrid,
    particles: Vec<Particle>,

    /// Queued outbound sound/effect messages; the server session drains this
    /// into the per-frame transmission.
    message: MessageWriter,
}

impl World {
    /// Create a world with an entropy-seeded RNG.
    pub fn new() -> Result<World, WorldError> {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Create a world with a deterministic RNG seed.
    pub fn with_seed(seed: u64) -> Result<World, WorldError> {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Result<World, WorldError> {
        let index = WorldIndex::claim().ok_or(WorldError::TooManyWorlds)?;
        Ok(World {
            index,
            objects: Vec::new(),
            removed: VecDeque::new(),
            sequence: 0,
            framenum: 0,
            rng,
            usercmd: Usercmd::default(),
            rail: RailNetwork::new(),
            tiles: HexGrid::new(),
            particles: Vec::new(),
            message: MessageWriter::new(),
        })
    }

    /// Index of this world, as encoded in its handles.
    pub fn world_index(&self) -> u8 {
        self.index.get()
    }

    pub fn framenum(&self) -> i64 {
        self.framenum
    }

    /// Time of the most recent frame in seconds.
    pub fn frametime(&self) -> f32 {
        self.framenum as f32 * FRAMETIME
    }

    /// Overwrite the frame counter; used when applying a snapshot.
    pub fn set_framenum(&mut self, framenum: i64) {
        self.framenum = framenum;
    }

    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    pub fn rail(&self) -> &RailNetwork {
        &self.rail
    }

    pub fn rail_mut(&mut self) -> &mut RailNetwork {
        &mut self.rail
    }

    pub fn tiles(&self) -> &HexGrid {
        &self.tiles
    }

    pub fn tiles_mut(&mut self) -> &mut HexGrid {
        &mut self.tiles
    }

    /// Latest sampled local input.
    pub fn usercmd(&self) -> Usercmd {
        self.usercmd
    }

    /// Sample local input for this frame.
    pub fn update_usercmd(&mut self, cmd: Usercmd, _time: f32) {
        self.usercmd = cmd;
    }

    // -----------------------------------------------------------------------
    // Registry
    // -----------------------------------------------------------------------

    /// Allocate a slot, mint a handle, insert the object, and run its spawn
    /// hook. Slots are reused lowest-first; the sequence id is fresh so stale
    /// handles to the reused slot resolve to null.
    pub fn spawn<T: Variant>(&mut self, value: T) -> Result<Handle<T>, SpawnError> {
        let index = match self.objects.iter().position(|s| matches!(s, Slot::Vacant)) {
            Some(index) => index,
            None => {
                if self.objects.len() >= MAX_OBJECTS {
                    return Err(SpawnError::WorldFull);
                }
                self.objects.push(Slot::Vacant);
                self.objects.len() - 1
            }
        };

        self.sequence += 1;
        let sequence = self.sequence;
        let spawn_frame = self.framenum;
        let handle: Handle<Object> = Handle::pack(index, self.index.get(), sequence);

        self.objects[index] = Slot::Running {
            sequence,
            spawn_frame,
        };
        let mut object = value.into_object();
        object.spawn(self, handle);
        self.objects[index] = Slot::Live(LiveSlot {
            sequence,
            spawn_frame,
            object,
        });
        trace!(slot = index, sequence, "spawned object");
        Ok(handle.cast())
    }

    /// Queue an object for destruction at the end of the frame. Removing a
    /// null or already-removed handle is a no-op.
    pub fn remove(&mut self, handle: Handle<Object>) {
        if !handle.is_null() {
            self.removed.push_back(handle);
        }
    }

    /// Validated dereference: null on vacant slot, sequence mismatch, world
    /// mismatch, or variant mismatch.
    pub fn get<T: Variant>(&self, handle: Handle<T>) -> Option<&T> {
        if handle.is_null() || handle.world_index() != self.index.get() {
            return None;
        }
        match self.objects.get(handle.index())? {
            Slot::Live(slot) if slot.sequence == handle.sequence() => {
                T::from_object(&slot.object)
            }
            _ => None,
        }
    }

    pub fn get_mut<T: Variant>(&mut self, handle: Handle<T>) -> Option<&mut T> {
        if handle.is_null() || handle.world_index() != self.index.get() {
            return None;
        }
        match self.objects.get_mut(handle.index())? {
            Slot::Live(slot) if slot.sequence == handle.sequence() => {
                T::from_object_mut(&mut slot.object)
            }
            _ => None,
        }
    }

    /// Frame the object was spawned on, converted to seconds.
    pub fn spawn_time<T: Variant>(&self, handle: Handle<T>) -> Option<f32> {
        if handle.is_null() || handle.world_index() != self.index.get() {
            return None;
        }
        match self.objects.get(handle.index())? {
            Slot::Live(LiveSlot {
                sequence,
                spawn_frame,
                ..
            })
            | Slot::Running {
                sequence,
                spawn_frame,
            } if *sequence == handle.sequence() => Some(*spawn_frame as f32 * FRAMETIME),
            _ => None,
        }
    }

    /// Handle of the object with the given sequence id, or null.
    pub fn find(&self, sequence: u64) -> Handle<Object> {
        if sequence == 0 {
            return Handle::null();
        }
        for (index, slot) in self.objects.iter().enumerate() {
            let slot_sequence = match slot {
                Slot::Live(live) => live.sequence,
                Slot::Running { sequence, .. } => *sequence,
                Slot::Vacant => continue,
            };
            if slot_sequence == sequence {
                return Handle::pack(index, self.index.get(), sequence);
            }
        }
        Handle::null()
    }

    /// All live objects with their handles, in registry order.
    pub fn objects(&self) -> impl Iterator<Item = (Handle<Object>, &Object)> {
        let world = self.index.get();
        self.objects.iter().enumerate().filter_map(move |(index, slot)| {
            if let Slot::Live(live) = slot {
                Some((Handle::pack(index, world, live.sequence), &live.object))
            } else {
                None
            }
        })
    }

    /// Number of live objects.
    pub fn object_count(&self) -> usize {
        self.objects
            .iter()
            .filter(|s| matches!(s, Slot::Live(_)))
            .count()
    }

    // -----------------------------------------------------------------------
    // Frame loop
    // -----------------------------------------------------------------------

    /// Advance one tick: think every live object in registry order, then
    /// commit pending removals and expire dead particles.
    pub fn run_frame(&mut self) {
        self.framenum += 1;

        let mut index = 0;
        while index < self.objects.len() {
            let live = match &self.objects[index] {
                Slot::Live(live) => Some((live.sequence, live.spawn_frame)),
                _ => None,
            };
            if let Some((sequence, spawn_frame)) = live {
                let Slot::Live(live) = std::mem::replace(
                    &mut self.objects[index],
                    Slot::Running {
                        sequence,
                        spawn_frame,
                    },
                ) else {
                    unreachable!()
                };
                let mut object = live.object;
                object.think(self);
                self.objects[index] = Slot::Live(LiveSlot {
                    sequence,
                    spawn_frame,
                    object,
                });
            }
            index += 1;
        }

        self.commit_removals();

        let now = self.frametime();
        self.particles.retain(|p| now < p.time + p.lifetime());
    }

    fn commit_removals(&mut self) {
        while let Some(handle) = self.removed.pop_front() {
            let live = matches!(
                self.objects.get(handle.index()),
                Some(Slot::Live(live)) if live.sequence == handle.sequence()
            );
            if live {
                self.objects[handle.index()] = Slot::Vacant;
                trace!(slot = handle.index(), "removed object");
            }
        }
    }

    /// Reset to the initial playable state: drop all objects and pending
    /// removals. Particles, tiles, and rail geometry survive; the sequence
    /// counter does not restart, so stale handles stay null.
    pub fn reset(&mut self) {
        self.objects.clear();
        self.removed.clear();
        self.framenum = 0;
        self.rail.detach_objects();
    }

    /// [`World::reset`] plus particles, tile caches, rail geometry, and any
    /// queued outbound messages.
    pub fn clear(&mut self) {
        self.reset();
        self.particles.clear();
        self.tiles.clear();
        self.rail.clear();
        self.message.clear();
    }

    pub fn clear_particles(&mut self) {
        self.particles.clear();
    }

    // -----------------------------------------------------------------------
    // Effects, sounds, particles
    // -----------------------------------------------------------------------

    /// Queued outbound sound/effect bytes, drained by the server session.
    pub fn take_message(&mut self) -> bytes::Bytes {
        self.message.take()
    }

    /// Play a sound: queue the replication message. `position` and `volume`
    /// are accepted for parity with the local mixer path but the wire record
    /// carries the asset index only.
    pub fn add_sound(&mut self, asset: Asset, position: Vec2, volume: f32) {
        let _ = (position, volume);
        self.message.write_u8(msg::SOUND);
        self.message.write_i32(asset.0);
    }

    /// Spawn the particles for an effect locally and queue the replication
    /// message for connected clients.
    pub fn broadcast_effect(
        &mut self,
        time: f32,
        kind: EffectKind,
        position: Vec2,
        direction: Vec2,
        strength: f32,
    ) {
        self.message.write_u8(msg::EFFECT);
        self.message.write_u8(kind.to_u8());
        self.message.write_vec2(position);
        self.message.write_vec2(direction);
        self.message.write_f32(strength);
        self.add_effect(time, kind, position, direction, strength);
    }

    /// Spawn the particles for an effect locally.
    pub fn add_effect(
        &mut self,
        time: f32,
        kind: EffectKind,
        position: Vec2,
        direction: Vec2,
        strength: f32,
    ) {
        match kind {
            EffectKind::None => {}
            EffectKind::Smoke => self.spawn_smoke(time, position, strength),
            EffectKind::Sparks => self.spawn_sparks(time, position, direction, strength),
            EffectKind::Cannon | EffectKind::Blaster => {
                self.spawn_smoke(time, position, 0.5 * strength);
                self.spawn_sparks(time, position, direction, strength);
            }
            EffectKind::MissileTrail => self.spawn_smoke(time, position, 0.25 * strength),
            EffectKind::CannonImpact
            | EffectKind::MissileImpact
            | EffectKind::BlasterImpact
            | EffectKind::Explosion => {
                self.spawn_flash(time, position, strength);
                self.spawn_smoke(time, position, strength);
                self.spawn_sparks(time, position, direction, 2.0 * strength);
            }
        }
    }

    /// Spread an effect along the distance moved since the previous frame.
    pub fn add_trail_effect(
        &mut self,
        kind: EffectKind,
        position: Vec2,
        old_position: Vec2,
        direction: Vec2,
        strength: f32,
    ) {
        let distance = (position - old_position).length();
        let count = (distance.ceil() as usize).clamp(1, 8);
        let time = self.frametime();
        for ii in 0..count {
            let t = ii as f32 / count as f32;
            let p = old_position.lerp(position, t);
            self.add_effect(time, kind, p, direction, strength);
        }
    }

    fn spawn_smoke(&mut self, time: f32, position: Vec2, strength: f32) {
        let count = (4.0 * strength).ceil().max(1.0) as usize;
        for _ in 0..count {
            let angle = self.rng.gen_range(0.0..std::f32::consts::TAU);
            let speed = self.rng.gen_range(0.5..2.0) * strength.max(0.25);
            let shade = self.rng.gen_range(0.3..0.6);
            self.particles.push(Particle {
                position,
                velocity: Vec2::from_angle(angle) * speed,
                acceleration: Vec2::ZERO,
                size: self.rng.gen_range(0.5..1.5),
                size_velocity: 1.0,
                color: Color::new(shade, shade, shade, 0.6),
                color_velocity: Color::new(0.0, 0.0, 0.0, -0.4),
                time,
            });
        }
    }

    fn spawn_sparks(&mut self, time: f32, position: Vec2, direction: Vec2, strength: f32) {
        let count = (6.0 * strength).ceil().max(1.0) as usize;
        for _ in 0..count {
            let spread = self.rng.gen_range(-0.6..0.6);
            let dir = if direction.length_squared() > 1e-6 {
                Vec2::from_angle(direction.y.atan2(direction.x) + spread)
            } else {
                Vec2::from_angle(self.rng.gen_range(0.0..std::f32::consts::TAU))
            };
            let speed = self.rng.gen_range(8.0..24.0);
            self.particles.push(Particle {
                position,
                velocity: dir * speed,
                acceleration: -dir * speed,
                size: 0.2,
                size_velocity: 0.0,
                color: Color::new(1.0, self.rng.gen_range(0.5..0.9), 0.1, 1.0),
                color_velocity: Color::new(0.0, -0.5, 0.0, -1.5),
                time,
            });
        }
    }

    fn spawn_flash(&mut self, time: f32, position: Vec2, strength: f32) {
        self.particles.push(Particle {
            position,
            velocity: Vec2::ZERO,
            acceleration: Vec2::ZERO,
            size: strength,
            size_velocity: 12.0 * strength,
            color: Color::new(1.0, 0.9, 0.5, 1.0),
            color_velocity: Color::new(0.0, -1.0, -1.0, -4.0),
            time,
        });
    }

    pub fn particle_count(&self) -> usize {
        self.particles.len()
    }

    // -----------------------------------------------------------------------
    // Drawing
    // -----------------------------------------------------------------------

    /// Draw the rail network, all objects, and live particles at `time`,
    /// which may fall between frames.
    pub fn draw(&self, renderer: &mut dyn Renderer, time: f32) {
        self.rail.draw(renderer, time);
        for (_, object) in self.objects() {
            object.draw(renderer, self, time);
        }
        self.draw_particles(renderer, time);
    }

    fn draw_particles(&self, renderer: &mut dyn Renderer, time: f32) {
        for particle in &self.particles {
            let t = time - particle.time;
            if t < 0.0 || t > particle.lifetime() {
                continue;
            }
            let position = particle.evaluate_position(t);
            let size = (particle.size + particle.size_velocity * t).max(0.0);
            let color = Color::new(
                (particle.color.r + particle.color_velocity.r * t).clamp(0.0, 1.0),
                (particle.color.g + particle.color_velocity.g * t).clamp(0.0, 1.0),
                (particle.color.b + particle.color_velocity.b * t).clamp(0.0, 1.0),
                (particle.color.a + particle.color_velocity.a * t).clamp(0.0, 1.0),
            );
            let half = 0.5 * size;
            let points = [
                position + Vec2::new(-half, -half),
                position + Vec2::new(half, -half),
                position + Vec2::new(half, half),
                position + Vec2::new(-half, half),
            ];
            let colors = [color; 4];
            renderer.draw_triangles(&points, &colors, &[0, 1, 2, 0, 2, 3]);
        }
    }
}
