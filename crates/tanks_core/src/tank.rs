//! The player vehicle.
//!
//! Server-side tanks integrate their own motion in `think`; client-side
//! copies are overwritten from snapshots each frame, so the fields mirror
//! the snapshot record exactly.

use glam::Vec2;

use crate::render::{Color, Renderer};
use crate::usercmd::{Action, Usercmd};
use crate::world::{EffectKind, World};
use crate::FRAMETIME;

/// The slice of a [`Usercmd`] a tank consumes, in the shape it crosses the
/// wire: a movement direction, a world-space aim point, and the one-shot
/// action.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TankInput {
    pub move_dir: Vec2,
    pub look: Vec2,
    pub action: Action,
}

impl From<Usercmd> for TankInput {
    fn from(cmd: Usercmd) -> TankInput {
        TankInput {
            move_dir: cmd.move_vector(),
            look: cmd.cursor,
            action: cmd.action,
        }
    }
}

const MAX_SPEED: f32 = 48.0;
const ACCELERATION: f32 = 64.0;
const TURRET_TRACK_RATE: f32 = 8.0;
const WEAPON_COOLDOWN: f32 = 1.5;

/// Replicated player vehicle state.
#[derive(Debug, Clone)]
pub struct Tank {
    pub position: Vec2,
    pub linear_velocity: Vec2,
    pub rotation: f32,
    pub angular_velocity: f32,
    pub turret_rotation: f32,
    pub turret_velocity: f32,
    pub damage: f32,
    pub fire_time: f32,
    pub color: Color,

    // Previous-snapshot state kept on the client for interpolation.
    pub old_position: Vec2,
    pub old_rotation: f32,
    pub old_turret_rotation: f32,

    /// Most recent command from the owning client.
    input: TankInput,
}

impl Default for Tank {
    fn default() -> Self {
        Tank::new()
    }
}

impl Tank {
    pub fn new() -> Tank {
        Tank {
            position: Vec2::ZERO,
            linear_velocity: Vec2::ZERO,
            rotation: 0.0,
            angular_velocity: 0.0,
            turret_rotation: 0.0,
            turret_velocity: 0.0,
            damage: 0.0,
            fire_time: -WEAPON_COOLDOWN,
            color: Color::WHITE,
            old_position: Vec2::ZERO,
            old_rotation: 0.0,
            old_turret_rotation: 0.0,
            input: TankInput::default(),
        }
    }

    pub fn set_input(&mut self, input: TankInput) {
        self.input = input;
    }

    pub fn input(&self) -> TankInput {
        self.input
    }

    pub(crate) fn think(&mut self, world: &mut World) {
        let dt = FRAMETIME;

        // Accelerate toward the commanded direction, coast otherwise.
        let wish = self.input.move_dir * MAX_SPEED;
        let delta = wish - self.linear_velocity;
        let step = ACCELERATION * dt;
        if delta.length() <= step {
            self.linear_velocity = wish;
        } else {
            self.linear_velocity += delta.normalize() * step;
        }

        self.position += self.linear_velocity * dt;
        self.rotation += self.angular_velocity * dt;

        // Turret tracks the aim point.
        let aim = self.input.look - self.position;
        if aim.length_squared() > 1e-6 {
            let target = aim.y.atan2(aim.x);
            let mut error = target - self.turret_rotation;
            while error > std::f32::consts::PI {
                error -= std::f32::consts::TAU;
            }
            while error < -std::f32::consts::PI {
                error += std::f32::consts::TAU;
            }
            self.turret_velocity = error * TURRET_TRACK_RATE;
            self.turret_rotation += self.turret_velocity * dt;
        } else {
            self.turret_velocity = 0.0;
        }

        let now = world.frametime();
        if matches!(
            self.input.action,
            Action::Weapon1 | Action::Weapon2 | Action::Weapon3
        ) && now - self.fire_time >= WEAPON_COOLDOWN
        {
            self.fire_time = now;
            let muzzle = Vec2::from_angle(self.turret_rotation);
            world.broadcast_effect(
                now,
                EffectKind::Cannon,
                self.position + muzzle * 2.0,
                muzzle,
                1.0,
            );
        }

        // One-shot actions apply for a single frame.
        self.input.action = Action::None;
    }

    pub fn position(&self, world: &World, time: f32) -> Vec2 {
        self.position + self.linear_velocity * (time - world.frametime())
    }

    pub fn rotation(&self, world: &World, time: f32) -> f32 {
        self.rotation + self.angular_velocity * (time - world.frametime())
    }

    pub fn turret_rotation(&self, world: &World, time: f32) -> f32 {
        self.turret_rotation + self.turret_velocity * (time - world.frametime())
    }

    pub fn draw(&self, renderer: &mut dyn Renderer, world: &World, time: f32) {
        let position = self.position(world, time);
        let rotation = self.rotation(world, time);
        let forward = Vec2::from_angle(rotation);
        let side = forward.perp();

        let hull = [
            position + forward * 2.0 + side * 1.4,
            position - forward * 2.0 + side * 1.4,
            position - forward * 2.0 - side * 1.4,
            position + forward * 2.0 - side * 1.4,
        ];
        for ii in 0..4 {
            renderer.draw_line(hull[ii], hull[(ii + 1) % 4], self.color, self.color);
        }

        let barrel = Vec2::from_angle(self.turret_rotation(world, time));
        renderer.draw_line(position, position + barrel * 3.0, self.color, self.color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::World;

    #[test]
    fn interpolates_position_by_velocity() {
        let world = World::with_seed(1).expect("world");
        let mut tank = Tank::new();
        tank.position = Vec2::new(10.0, 0.0);
        tank.linear_velocity = Vec2::new(2.0, 0.0);
        let at = world.frametime() + 0.5;
        assert_eq!(tank.position(&world, at), Vec2::new(11.0, 0.0));
    }

    #[test]
    fn accelerates_toward_commanded_direction() {
        let mut world = World::with_seed(1).expect("world");
        let mut tank = Tank::new();
        let mut cmd = Usercmd::default();
        cmd.buttons = crate::usercmd::Buttons::FORWARD;
        tank.set_input(TankInput::from(cmd));
        for _ in 0..200 {
            tank.think(&mut world);
        }
        assert!((tank.linear_velocity.y - MAX_SPEED).abs() < 1e-3);
        assert!(tank.linear_velocity.x.abs() < 1e-3);
    }
}
