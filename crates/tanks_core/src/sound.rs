//! Sound device collaborator interface.

use glam::Vec2;

/// Index of a loaded sound asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Asset(pub i32);

impl Asset {
    pub const NONE: Asset = Asset(-1);
}

/// Abstract playback device implemented by the sound backend.
pub trait SoundDevice {
    fn play(&mut self, asset: Asset, position: Vec2, volume: f32, pitch: f32);
}

/// Device that discards playback requests.
#[derive(Debug, Default)]
pub struct NullSoundDevice;

impl SoundDevice for NullSoundDevice {
    fn play(&mut self, _asset: Asset, _position: Vec2, _volume: f32, _pitch: f32) {}
}

/// Device that records playback requests for assertions in tests.
#[derive(Debug, Default)]
pub struct RecordingSoundDevice {
    pub played: Vec<(Asset, Vec2)>,
}

impl SoundDevice for RecordingSoundDevice {
    fn play(&mut self, asset: Asset, position: Vec2, _volume: f32, _pitch: f32) {
        self.played.push((asset, position));
    }
}
