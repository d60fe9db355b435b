//! Polymorphic world objects as a tagged sum type.
//!
//! Every entity owned by a [`crate::world::World`] is one variant of
//! [`Object`]. Dispatch is a match on the tag; [`Variant`] lets typed
//! handles resolve back to the concrete type.

use glam::{Affine2, Vec2};

use crate::handle::Handle;
use crate::rail::RailStation;
use crate::render::Renderer;
use crate::ship::Ship;
use crate::tank::Tank;
use crate::train::Train;
use crate::world::World;

/// Type tag of an [`Object`] variant, used for pair-matching in collision
/// callbacks and for replication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Tank,
    Train,
    Station,
    Ship,
}

pub enum Object {
    Tank(Tank),
    Train(Train),
    Station(RailStation),
    Ship(Ship),
}

impl Object {
    pub fn kind(&self) -> ObjectKind {
        match self {
            Object::Tank(_) => ObjectKind::Tank,
            Object::Train(_) => ObjectKind::Train,
            Object::Station(_) => ObjectKind::Station,
            Object::Ship(_) => ObjectKind::Ship,
        }
    }

    /// Post-insertion hook, invoked once by [`World::spawn`] with the
    /// freshly minted self handle.
    pub(crate) fn spawn(&mut self, world: &mut World, self_handle: Handle<Object>) {
        let _ = (world, self_handle);
    }

    /// Advance one frame. Runs with the object temporarily moved out of its
    /// slot, so the rest of the world is freely accessible; the object's own
    /// handle resolves to null for the duration.
    pub(crate) fn think(&mut self, world: &mut World) {
        match self {
            Object::Tank(tank) => tank.think(world),
            Object::Train(train) => train.think(world),
            Object::Station(_) => {}
            Object::Ship(ship) => ship.think(),
        }
    }

    pub fn draw(&self, renderer: &mut dyn Renderer, world: &World, time: f32) {
        match self {
            Object::Tank(tank) => tank.draw(renderer, world, time),
            Object::Train(train) => train.draw(renderer, world, time),
            Object::Station(station) => station.draw(renderer, world, time),
            Object::Ship(_) => {}
        }
    }

    /// Position at `time`, extrapolated from frame-snapped state.
    pub fn position(&self, world: &World, time: f32) -> Vec2 {
        match self {
            Object::Tank(tank) => tank.position(world, time),
            Object::Train(train) => train.position(world, time),
            Object::Station(station) => station.position(world),
            Object::Ship(_) => Vec2::ZERO,
        }
    }

    /// Heading in radians at `time`.
    pub fn rotation(&self, world: &World, time: f32) -> f32 {
        match self {
            Object::Tank(tank) => tank.rotation(world, time),
            Object::Train(train) => train.rotation(world, time),
            Object::Station(_) | Object::Ship(_) => 0.0,
        }
    }

    pub fn transform(&self, world: &World, time: f32) -> Affine2 {
        Affine2::from_angle_translation(self.rotation(world, time), self.position(world, time))
    }
}

/// Conversion between [`Object`] and its concrete variants. Implemented by
/// every variant type so `World::spawn`/`World::get` can be typed.
pub trait Variant: Sized {
    fn into_object(self) -> Object;
    fn from_object(object: &Object) -> Option<&Self>;
    fn from_object_mut(object: &mut Object) -> Option<&mut Self>;
}

impl Variant for Object {
    fn into_object(self) -> Object {
        self
    }

    fn from_object(object: &Object) -> Option<&Self> {
        Some(object)
    }

    fn from_object_mut(object: &mut Object) -> Option<&mut Self> {
        Some(object)
    }
}

macro_rules! impl_variant {
    ($ty:ty, $variant:ident) => {
        impl Variant for $ty {
            fn into_object(self) -> Object {
                Object::$variant(self)
            }

            fn from_object(object: &Object) -> Option<&Self> {
                match object {
                    Object::$variant(inner) => Some(inner),
                    _ => None,
                }
            }

            fn from_object_mut(object: &mut Object) -> Option<&mut Self> {
                match object {
                    Object::$variant(inner) => Some(inner),
                    _ => None,
                }
            }
        }
    };
}

impl_variant!(Tank, Tank);
impl_variant!(Train, Train);
impl_variant!(RailStation, Station);
impl_variant!(Ship, Ship);
