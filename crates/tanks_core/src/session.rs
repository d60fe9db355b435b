//! Client and server sessions: handshake, replication, discovery.
//!
//! The transport (reliable framing, retransmission, address resolution) is a
//! collaborator; sessions consume already-delivered datagrams and return the
//! datagrams to send. Two kinds of traffic exist:
//!
//! - **Out-of-band text**: `connect` / `connack` / `info`, used before or
//!   outside an established channel.
//! - **In-band bytes**: snapshots and effect/sound records from the server,
//!   `clc_*` records from the client.
//!
//! Malformed messages and stale snapshots are dropped silently; a failed
//! handshake surfaces by returning the client to the menu.

use std::net::SocketAddr;

use bytes::Bytes;
use glam::Vec2;
use tracing::{debug, info, warn};

use crate::config::Profile;
use crate::handle::Handle;
use crate::protocol::{clc, msg, MessageReader, MessageWriter, ParseError, PROTOCOL_VERSION};
use crate::render::Color;
use crate::sound::{Asset, SoundDevice};
use crate::tank::{Tank, TankInput};
use crate::usercmd::{Action, UsercmdGen};
use crate::world::{EffectKind, World, WorldError};
use crate::MAX_PLAYERS;

/// Size of the client's discovered-server table.
pub const MAX_SERVERS: usize = 8;

/// An outbound datagram produced by a session.
#[derive(Debug, Clone, PartialEq)]
pub struct Packet {
    pub to: SocketAddr,
    pub payload: Payload,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Text(String),
    Data(Vec<u8>),
}

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

/// Per-slot client bookkeeping on the server.
#[derive(Debug, Clone)]
pub struct ServerClient {
    pub active: bool,
    pub name: String,
    pub address: Option<SocketAddr>,
    pub netport: u16,
    pub upgrades: u32,
    pub damage_mod: f32,
    pub armor_mod: f32,
    pub refire_mod: f32,
    pub speed_mod: f32,
}

impl Default for ServerClient {
    fn default() -> Self {
        ServerClient {
            active: false,
            name: String::new(),
            address: None,
            netport: 0,
            upgrades: 0,
            damage_mod: 1.0,
            armor_mod: 1.0,
            refire_mod: 1.0,
            speed_mod: 1.0,
        }
    }
}

/// The authoritative session: owns the world, assigns slots, and emits one
/// snapshot per frame.
pub struct ServerSession {
    name: String,
    world: World,
    clients: Vec<ServerClient>,
    players: Vec<Handle<Tank>>,
}

impl ServerSession {
    pub fn new(name: &str, seed: u64) -> Result<ServerSession, WorldError> {
        Ok(ServerSession {
            name: name.to_owned(),
            world: World::with_seed(seed)?,
            clients: vec![ServerClient::default(); MAX_PLAYERS],
            players: vec![Handle::null(); MAX_PLAYERS],
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn clients(&self) -> &[ServerClient] {
        &self.clients
    }

    pub fn player(&self, slot: usize) -> Option<&Tank> {
        self.world.get(self.players[slot])
    }

    /// Slot owned by the given address, if any.
    pub fn slot_for_address(&self, address: SocketAddr) -> Option<usize> {
        self.clients
            .iter()
            .position(|c| c.active && c.address == Some(address))
    }

    /// Handle an out-of-band text command, optionally producing a reply.
    pub fn handle_oob(&mut self, from: SocketAddr, text: &str) -> Option<Packet> {
        let mut parts = text.split_whitespace();
        match parts.next()? {
            "connect" => {
                let protocol: i32 = parts.next()?.parse().ok()?;
                let name = parts.next()?;
                let netport: u16 = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
                if protocol != PROTOCOL_VERSION {
                    warn!(protocol, expected = PROTOCOL_VERSION, "protocol mismatch");
                    return None;
                }
                let slot = self.clients.iter().position(|c| !c.active)?;
                let client = &mut self.clients[slot];
                client.active = true;
                client.name = name.to_owned();
                client.address = Some(from);
                client.netport = netport;
                client.upgrades = 0;
                client.damage_mod = 1.0;
                client.armor_mod = 1.0;
                client.refire_mod = 1.0;
                client.speed_mod = 1.0;

                let mut tank = Tank::new();
                tank.position = Vec2::new(slot as f32 * 8.0, 0.0);
                match self.world.spawn(tank) {
                    Ok(handle) => self.players[slot] = handle,
                    Err(err) => {
                        warn!(%err, "could not spawn player");
                        self.clients[slot].active = false;
                        return None;
                    }
                }
                info!(slot, name, "client connected");
                Some(Packet {
                    to: from,
                    payload: Payload::Text(format!("connack {slot}")),
                })
            }
            "info" => Some(Packet {
                to: from,
                payload: Payload::Text(format!("info {}", self.name)),
            }),
            _ => None,
        }
    }

    /// Handle in-band bytes from an established client. Malformed records
    /// are dropped without disconnecting.
    pub fn handle_message(&mut self, slot: usize, data: &[u8]) {
        if slot >= self.clients.len() {
            debug!(slot, "message for nonexistent slot");
            return;
        }
        if let Err(err) = self.parse_message(slot, data) {
            debug!(slot, %err, "dropping malformed client message");
        }
    }

    fn parse_message(&mut self, slot: usize, data: &[u8]) -> Result<(), ParseError> {
        let mut reader = MessageReader::new(data);
        while reader.remaining() > 0 {
            match reader.read_u8()? {
                clc::COMMAND => {
                    let move_dir = reader.read_vec2()?;
                    let look = reader.read_vec2()?;
                    let action = Action::from_u8(reader.read_u8()?);
                    if let Some(tank) = self.world.get_mut(self.players[slot]) {
                        tank.set_input(TankInput {
                            move_dir,
                            look,
                            action,
                        });
                    }
                }
                clc::DISCONNECT => {
                    info!(slot, "client disconnected");
                    self.clients[slot].active = false;
                    self.clients[slot].address = None;
                    self.world.remove(self.players[slot].cast());
                    self.players[slot] = Handle::null();
                }
                clc::UPGRADE => {
                    let kind = reader.read_u8()?;
                    let client = &mut self.clients[slot];
                    client.upgrades += 1;
                    match kind {
                        0 => client.damage_mod += 0.25,
                        1 => client.armor_mod += 0.25,
                        2 => client.refire_mod += 0.25,
                        _ => client.speed_mod += 0.25,
                    }
                }
                other => return Err(ParseError::UnknownType(other)),
            }
        }
        Ok(())
    }

    /// Advance the world one frame and emit the transmission for this frame:
    /// the snapshot record followed by any queued sound/effect records.
    pub fn run_frame(&mut self) -> Bytes {
        self.world.run_frame();

        let mut writer = MessageWriter::new();
        writer.write_u8(msg::FRAME);
        writer.write_i32(self.world.framenum() as i32);
        for slot in 0..MAX_PLAYERS {
            if !self.clients[slot].active {
                continue;
            }
            let Some(tank) = self.world.get(self.players[slot]) else {
                continue;
            };
            writer.write_u8(1);
            writer.write_u8(slot as u8);
            writer.write_vec2(tank.position);
            writer.write_vec2(tank.linear_velocity);
            writer.write_f32(tank.rotation);
            writer.write_f32(tank.angular_velocity);
            writer.write_f32(tank.turret_rotation);
            writer.write_f32(tank.turret_velocity);
            writer.write_f32(tank.damage);
            writer.write_f32(tank.fire_time);
        }
        writer.write_u8(0);

        let mut transmission = writer.take().to_vec();
        transmission.extend_from_slice(&self.world.take_message());
        Bytes::from(transmission)
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// An entry in the client's discovered-server table.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerInfo {
    pub active: bool,
    pub name: String,
    pub address: Option<SocketAddr>,
    pub ping: f32,
}

impl Default for ServerInfo {
    fn default() -> Self {
        ServerInfo {
            active: false,
            name: String::new(),
            address: None,
            ping: 0.0,
        }
    }
}

/// Client-static state, persisted across connections.
#[derive(Debug, Clone)]
pub struct ClientState {
    pub name: String,
    pub color: Color,
    /// Player slot assigned by the server.
    pub number: usize,
    /// Frame number of the newest applied snapshot.
    pub last_frame: i64,
    pub servers: Vec<ServerInfo>,
    pub ping_time: f32,
}

/// The replicating session: applies snapshots into its local world and
/// player table, and produces the per-frame command record.
pub struct ClientSession {
    pub cls: ClientState,
    world: World,
    players: Vec<Tank>,
    input: UsercmdGen,
    server: Option<SocketAddr>,

    pub multiplayer: bool,
    pub multiplayer_active: bool,
    pub menu_active: bool,
    pub game_active: bool,
}

impl ClientSession {
    pub fn new(profile: &Profile, seed: u64) -> Result<ClientSession, WorldError> {
        Ok(ClientSession {
            cls: ClientState {
                name: profile.ui_name.clone(),
                color: profile.color(),
                number: 0,
                last_frame: 0,
                servers: vec![ServerInfo::default(); MAX_SERVERS],
                ping_time: 0.0,
            },
            world: World::with_seed(seed)?,
            players: (0..MAX_PLAYERS).map(|_| Tank::new()).collect(),
            input: UsercmdGen::new(),
            server: None,
            multiplayer: false,
            multiplayer_active: false,
            menu_active: true,
            game_active: false,
        })
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn player(&self, slot: usize) -> &Tank {
        &self.players[slot]
    }

    pub fn input_mut(&mut self) -> &mut UsercmdGen {
        &mut self.input
    }

    /// Write the archived fields back into the profile on shutdown.
    pub fn shutdown(&self, profile: &mut Profile) {
        profile.ui_name = self.cls.name.clone();
        profile.set_color(self.cls.color);
    }

    /// Leave any current game and return to the menu. Produces the
    /// disconnect record to transmit when a game was active.
    pub fn stop(&mut self) -> Option<Packet> {
        let notice = if self.multiplayer && self.multiplayer_active {
            self.server.map(|to| {
                let mut writer = MessageWriter::new();
                writer.write_u8(clc::DISCONNECT);
                Packet {
                    to,
                    payload: Payload::Data(writer.take().to_vec()),
                }
            })
        } else {
            None
        };

        self.world.reset();
        self.multiplayer = false;
        self.multiplayer_active = false;
        self.game_active = false;
        self.menu_active = true;
        notice
    }

    /// Ask a server for a connection.
    pub fn connect_to(&mut self, server: SocketAddr, netport: u16) -> Packet {
        self.stop();
        self.server = Some(server);
        Packet {
            to: server,
            payload: Payload::Text(format!(
                "connect {} {} {}",
                PROTOCOL_VERSION, self.cls.name, netport
            )),
        }
    }

    /// Query the master server and the local broadcast for servers.
    pub fn info_ask(&mut self, master: SocketAddr, broadcast: SocketAddr) -> Vec<Packet> {
        for server in &mut self.cls.servers {
            *server = ServerInfo::default();
        }
        self.cls.ping_time = self.world.frametime();
        vec![
            Packet {
                to: master,
                payload: Payload::Text("info".to_owned()),
            },
            Packet {
                to: broadcast,
                payload: Payload::Text("info".to_owned()),
            },
        ]
    }

    /// Handle an out-of-band reply from a server.
    pub fn handle_oob(&mut self, from: SocketAddr, text: &str) {
        if let Some(rest) = text.strip_prefix("connack") {
            self.connect_ack(from, rest.trim());
        } else if let Some(name) = text.strip_prefix("info") {
            self.info_get(from, name.trim());
        }
    }

    fn connect_ack(&mut self, from: SocketAddr, slot_text: &str) {
        let Ok(slot) = slot_text.parse::<usize>() else {
            debug!(slot_text, "malformed connack");
            return;
        };
        if slot >= MAX_PLAYERS {
            debug!(slot, "connack slot out of range");
            return;
        }
        self.server = Some(from);
        self.cls.number = slot;
        self.cls.last_frame = 0;
        self.world.set_framenum(0);

        self.multiplayer = true;
        self.multiplayer_active = true;
        self.menu_active = false;
        self.game_active = true;

        self.players[slot].color = self.cls.color;
        info!(slot, "connected");
    }

    fn info_get(&mut self, from: SocketAddr, name: &str) {
        let ping = self.world.frametime() - self.cls.ping_time;
        for server in &mut self.cls.servers {
            // Already known and active: nothing to do.
            if server.active && server.address == Some(from) {
                return;
            }
            if server.active {
                continue;
            }
            server.active = true;
            server.address = Some(from);
            server.name = name.to_owned();
            server.ping = ping;
            return;
        }
    }

    /// Produce this frame's command record for the server. The command is
    /// also sampled into the local world for prediction and cursor state.
    pub fn send_command(&mut self) -> Vec<u8> {
        let cmd = self.input.generate();
        let time = self.world.frametime();
        self.world.update_usercmd(cmd, time);
        let mut writer = MessageWriter::new();
        writer.write_u8(clc::COMMAND);
        writer.write_vec2(cmd.move_vector());
        writer.write_vec2(cmd.cursor);
        writer.write_u8(cmd.action.to_u8());
        writer.take().to_vec()
    }

    /// Apply a server transmission: the snapshot plus any sound/effect
    /// records. Malformed trailing data is dropped silently.
    pub fn read_snapshot(&mut self, data: &[u8], sound: &mut dyn SoundDevice) {
        let mut reader = MessageReader::new(data);
        loop {
            match self.read_message(&mut reader, sound) {
                Ok(true) => continue,
                Ok(false) => break,
                Err(err) => {
                    debug!(%err, "dropping malformed server message");
                    break;
                }
            }
        }
    }

    fn read_message(
        &mut self,
        reader: &mut MessageReader<'_>,
        sound: &mut dyn SoundDevice,
    ) -> Result<bool, ParseError> {
        if reader.remaining() == 0 {
            return Ok(false);
        }
        match reader.read_u8()? {
            msg::NONE => Ok(false),
            msg::FRAME => {
                self.read_frame(reader)?;
                Ok(true)
            }
            msg::SOUND => {
                let asset = reader.read_i32()?;
                sound.play(Asset(asset), Vec2::ZERO, 1.0, 0.0);
                Ok(true)
            }
            msg::EFFECT => {
                let kind = reader.read_u8()?;
                let position = reader.read_vec2()?;
                let direction = reader.read_vec2()?;
                let strength = reader.read_f32()?;
                if let Some(kind) = EffectKind::from_u8(kind) {
                    let time = self.world.frametime();
                    self.world.add_effect(time, kind, position, direction, strength);
                }
                Ok(true)
            }
            other => Err(ParseError::UnknownType(other)),
        }
    }

    fn read_frame(&mut self, reader: &mut MessageReader<'_>) -> Result<(), ParseError> {
        self.world.reset();

        let framenum = reader.read_i32()? as i64;
        if framenum < self.cls.last_frame {
            // Late snapshot; drop it rather than rewind.
            debug!(framenum, last = self.cls.last_frame, "stale snapshot");
            return Ok(());
        }
        self.cls.last_frame = framenum;
        self.world.set_framenum(framenum);

        loop {
            let marker = reader.read_u8()?;
            if marker == 0 {
                break;
            }
            let slot = reader.read_u8()? as usize;
            if slot >= MAX_PLAYERS {
                return Err(ParseError::UnknownType(slot as u8));
            }
            let player = &mut self.players[slot];
            player.old_position = player.position;
            player.old_rotation = player.rotation;
            player.old_turret_rotation = player.turret_rotation;

            player.position = reader.read_vec2()?;
            player.linear_velocity = reader.read_vec2()?;
            player.rotation = reader.read_f32()?;
            player.angular_velocity = reader.read_f32()?;
            player.turret_rotation = reader.read_f32()?;
            player.turret_velocity = reader.read_f32()?;
            player.damage = reader.read_f32()?;
            player.fire_time = reader.read_f32()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sound::RecordingSoundDevice;

    fn addr(port: u16) -> SocketAddr {
        format!("127.0.0.1:{port}").parse().expect("addr")
    }

    fn test_profile(name: &str) -> Profile {
        Profile {
            ui_name: name.to_owned(),
            ..Profile::default()
        }
    }

    #[test]
    fn connect_handshake_assigns_slot_and_activates() {
        let mut server = ServerSession::new("testbed", 1).expect("server");
        let mut client = ClientSession::new(&test_profile("Alice"), 2).expect("client");

        let request = client.connect_to(addr(27910), 27015);
        let Payload::Text(text) = &request.payload else {
            panic!("connect is text");
        };
        assert_eq!(text, &format!("connect {PROTOCOL_VERSION} Alice 27015"));

        let reply = server.handle_oob(addr(40000), text).expect("connack");
        let Payload::Text(reply_text) = &reply.payload else {
            panic!("connack is text");
        };
        assert_eq!(reply_text, "connack 0");
        assert!(server.clients()[0].active);
        assert_eq!(server.clients()[0].name, "Alice");

        client.handle_oob(request.to, reply_text);
        assert_eq!(client.cls.number, 0);
        assert!(client.multiplayer_active);
        assert!(!client.menu_active);
        assert!(client.game_active);
    }

    #[test]
    fn connack_parses_arbitrary_slot() {
        let mut client = ClientSession::new(&test_profile("Alice"), 3).expect("client");
        client.handle_oob(addr(27910), "connack 3");
        assert_eq!(client.cls.number, 3);
        assert!(client.multiplayer_active);
        assert!(!client.menu_active);
    }

    #[test]
    fn protocol_mismatch_aborts_handshake() {
        let mut server = ServerSession::new("testbed", 1).expect("server");
        let reply = server.handle_oob(addr(40000), "connect 9999 Mallory 27015");
        assert!(reply.is_none());
        assert!(server.clients().iter().all(|c| !c.active));
    }

    #[test]
    fn info_discovery_fills_server_table() {
        let mut server = ServerSession::new("my server", 1).expect("server");
        let mut client = ClientSession::new(&test_profile("Alice"), 2).expect("client");

        let queries = client.info_ask(addr(27910), addr(27911));
        assert_eq!(queries.len(), 2);

        let reply = server.handle_oob(addr(40000), "info").expect("info reply");
        let Payload::Text(text) = &reply.payload else {
            panic!("info is text");
        };
        assert_eq!(text, "info my server");

        client.handle_oob(addr(27910), text);
        assert!(client.cls.servers[0].active);
        assert_eq!(client.cls.servers[0].name, "my server");

        // A duplicate reply from the same address is ignored.
        client.handle_oob(addr(27910), text);
        assert!(!client.cls.servers[1].active);
    }

    #[test]
    fn snapshot_round_trip_replicates_positions() {
        let mut server = ServerSession::new("testbed", 1).expect("server");
        let mut client = ClientSession::new(&test_profile("Alice"), 2).expect("client");
        let mut sound = RecordingSoundDevice::default();

        server.handle_oob(addr(40001), "connect 4 Alice 27015");
        server.handle_oob(addr(40002), "connect 4 Bob 27016");
        let player0 = server.players[0];
        let player1 = server.players[1];
        server
            .world_mut()
            .get_mut(player0)
            .expect("tank")
            .position = Vec2::new(10.0, 0.0);
        server
            .world_mut()
            .get_mut(player1)
            .expect("tank")
            .position = Vec2::new(-10.0, 5.0);

        let transmission = server.run_frame();
        client.read_snapshot(&transmission, &mut sound);

        let time = client.world().frametime();
        let world = client.world();
        let p0 = client.player(0).position(world, time);
        let p1 = client.player(1).position(world, time);
        assert!((p0 - Vec2::new(10.0, 0.0)).length() < 1e-5);
        assert!((p1 - Vec2::new(-10.0, 5.0)).length() < 1e-5);
        assert_eq!(client.cls.last_frame, 1);
    }

    #[test]
    fn stale_snapshots_are_dropped() {
        let mut server = ServerSession::new("testbed", 1).expect("server");
        let mut client = ClientSession::new(&test_profile("Alice"), 2).expect("client");
        let mut sound = RecordingSoundDevice::default();

        server.handle_oob(addr(40001), "connect 4 Alice 27015");
        let first = server.run_frame();
        let second = server.run_frame();

        // Move the player between the two frames so the payloads differ.
        client.read_snapshot(&second, &mut sound);
        assert_eq!(client.cls.last_frame, 2);
        client.read_snapshot(&first, &mut sound);
        // The older frame must not regress the counter.
        assert_eq!(client.cls.last_frame, 2);
    }

    #[test]
    fn command_record_reaches_the_player_tank() {
        let mut server = ServerSession::new("testbed", 1).expect("server");
        let mut client = ClientSession::new(&test_profile("Alice"), 2).expect("client");

        server.handle_oob(addr(40001), "connect 4 Alice 27015");
        client
            .input_mut()
            .cursor_event(Vec2::new(30.0, 40.0));
        let record = client.send_command();
        server.handle_message(0, &record);

        let tank = server.player(0).expect("tank");
        assert_eq!(tank.input().look, Vec2::new(30.0, 40.0));
    }

    #[test]
    fn effect_and_sound_records_apply_on_the_client() {
        let mut server = ServerSession::new("testbed", 1).expect("server");
        let mut client = ClientSession::new(&test_profile("Alice"), 2).expect("client");
        let mut sound = RecordingSoundDevice::default();

        let time = server.world().frametime();
        server.world_mut().broadcast_effect(
            time,
            EffectKind::Explosion,
            Vec2::new(5.0, 5.0),
            Vec2::X,
            1.0,
        );
        server.world_mut().add_sound(Asset(7), Vec2::ZERO, 1.0);

        let transmission = server.run_frame();
        client.read_snapshot(&transmission, &mut sound);

        assert!(client.world().particle_count() > 0);
        assert_eq!(sound.played, vec![(Asset(7), Vec2::ZERO)]);
    }

    #[test]
    fn malformed_messages_are_dropped_silently() {
        let mut server = ServerSession::new("testbed", 1).expect("server");
        let mut client = ClientSession::new(&test_profile("Alice"), 2).expect("client");
        let mut sound = RecordingSoundDevice::default();

        // Truncated garbage on both sides must not panic or disconnect.
        server.handle_oob(addr(40001), "connect 4 Alice 27015");
        server.handle_message(0, &[clc::COMMAND, 0x01]);
        client.read_snapshot(&[msg::FRAME, 0xFF], &mut sound);
        client.read_snapshot(&[0x77, 0x01, 0x02], &mut sound);
        assert!(server.clients()[0].active);
    }

    #[test]
    fn disconnect_frees_the_slot_and_tank() {
        let mut server = ServerSession::new("testbed", 1).expect("server");
        server.handle_oob(addr(40001), "connect 4 Alice 27015");
        let handle = server.players[0];

        let mut writer = MessageWriter::new();
        writer.write_u8(clc::DISCONNECT);
        server.handle_message(0, writer.as_slice());
        assert!(!server.clients()[0].active);

        server.run_frame();
        assert!(server.world().get(handle).is_none());
    }

    #[test]
    fn upgrades_accumulate_modifiers() {
        let mut server = ServerSession::new("testbed", 1).expect("server");
        server.handle_oob(addr(40001), "connect 4 Alice 27015");

        for kind in [0u8, 0, 2] {
            let mut writer = MessageWriter::new();
            writer.write_u8(clc::UPGRADE);
            writer.write_u8(kind);
            server.handle_message(0, writer.as_slice());
        }
        let client = &server.clients()[0];
        assert_eq!(client.upgrades, 3);
        assert!((client.damage_mod - 1.5).abs() < 1e-6);
        assert!((client.refire_mod - 1.25).abs() < 1e-6);
        assert_eq!(client.armor_mod, 1.0);
    }

    #[test]
    fn stop_returns_to_menu_and_notifies_server() {
        let mut client = ClientSession::new(&test_profile("Alice"), 2).expect("client");
        client.handle_oob(addr(27910), "connack 1");
        assert!(!client.menu_active);

        let notice = client.stop().expect("disconnect record");
        assert_eq!(notice.to, addr(27910));
        assert_eq!(notice.payload, Payload::Data(vec![clc::DISCONNECT]));
        assert!(client.menu_active);
        assert!(!client.multiplayer_active);

        // Stopping again is quiet.
        assert!(client.stop().is_none());
    }
}
