mod support;

use tanks_core::config::Profile;
use tanks_core::session::{ClientSession, Payload, ServerSession};
use tanks_core::sound::RecordingSoundDevice;
use tanks_core::usercmd::{Action, Binding, Buttons};

const KEY_W: u32 = 87;
const KEY_SPACE: u32 = 32;

fn profile(name: &str) -> Profile {
    Profile {
        ui_name: name.to_owned(),
        ..Profile::default()
    }
}

fn connect(server: &mut ServerSession, client: &mut ClientSession, port: u16) {
    let server_addr = format!("127.0.0.1:{port}").parse().expect("addr");
    let from = format!("127.0.0.1:{}", 40000 + port).parse().expect("addr");
    let request = client.connect_to(server_addr, port + 1);
    let Payload::Text(text) = request.payload else {
        panic!("connect is text");
    };
    let reply = server.handle_oob(from, &text).expect("connack");
    let Payload::Text(text) = reply.payload else {
        panic!("connack is text");
    };
    client.handle_oob(server_addr, &text);
}

/// Drive one frame of the loopback pair: client command in, snapshot out.
fn run_loopback_frame(
    server: &mut ServerSession,
    client: &mut ClientSession,
    sound: &mut RecordingSoundDevice,
) {
    let slot = client.cls.number;
    let command = client.send_command();
    server.handle_message(slot, &command);
    let transmission = server.run_frame();
    client.read_snapshot(&transmission, sound);
}

#[test]
fn held_movement_key_replicates_motion_to_the_client() {
    let mut server = ServerSession::new("loopback", 7).expect("server");
    let mut client = ClientSession::new(&profile("Alice"), 8).expect("client");
    let mut sound = RecordingSoundDevice::default();
    connect(&mut server, &mut client, 27910);

    client.input_mut().bind(KEY_W, Binding::Button(Buttons::FORWARD));
    client.input_mut().key_event(KEY_W, true);

    for _ in 0..40 {
        run_loopback_frame(&mut server, &mut client, &mut sound);
    }

    let slot = client.cls.number;
    let time = client.world().frametime();
    let replicated = client.player(slot).position(client.world(), time);
    assert!(replicated.y > 1.0, "tank never moved: {replicated:?}");

    // Client and server agree on the player's state.
    let authoritative = server.player(slot).expect("tank");
    assert!((replicated - authoritative.position).length() < 1e-4);

    // Releasing the key stops acceleration; velocity decays toward zero.
    client.input_mut().key_event(KEY_W, false);
    for _ in 0..60 {
        run_loopback_frame(&mut server, &mut client, &mut sound);
    }
    assert!(client.player(slot).linear_velocity.length() < 1e-2);
}

#[test]
fn fired_weapon_effect_reaches_the_client_as_particles() {
    let mut server = ServerSession::new("loopback", 7).expect("server");
    let mut client = ClientSession::new(&profile("Alice"), 8).expect("client");
    let mut sound = RecordingSoundDevice::default();
    connect(&mut server, &mut client, 27912);

    client.input_mut().bind(KEY_SPACE, Binding::Action(Action::Weapon1));
    client.input_mut().key_event(KEY_SPACE, true);

    for _ in 0..4 {
        run_loopback_frame(&mut server, &mut client, &mut sound);
    }
    assert!(
        client.world().particle_count() > 0,
        "muzzle effect never replicated"
    );
}

#[test]
fn two_clients_see_each_other() {
    let mut server = ServerSession::new("loopback", 7).expect("server");
    let mut alice = ClientSession::new(&profile("Alice"), 8).expect("client");
    let mut bob = ClientSession::new(&profile("Bob"), 9).expect("client");
    let mut sound = RecordingSoundDevice::default();
    connect(&mut server, &mut alice, 27914);
    connect(&mut server, &mut bob, 27916);
    assert_ne!(alice.cls.number, bob.cls.number);

    alice.input_mut().bind(KEY_W, Binding::Button(Buttons::RIGHT));
    alice.input_mut().key_event(KEY_W, true);

    for _ in 0..40 {
        let command = alice.send_command();
        server.handle_message(alice.cls.number, &command);
        let command = bob.send_command();
        server.handle_message(bob.cls.number, &command);
        let transmission = server.run_frame();
        alice.read_snapshot(&transmission, &mut sound);
        bob.read_snapshot(&transmission, &mut sound);
    }

    // Bob sees Alice's tank displaced to the right of her spawn slot.
    let time = bob.world().frametime();
    let alice_seen_by_bob = bob.player(alice.cls.number).position(bob.world(), time);
    let alice_authoritative = server.player(alice.cls.number).expect("tank").position;
    assert!(alice_seen_by_bob.x > 1.0, "alice never moved: {alice_seen_by_bob:?}");
    assert!((alice_seen_by_bob - alice_authoritative).length() < 1e-4);
}

#[test]
fn ship_objects_tick_inside_the_server_world() {
    let mut server = ServerSession::new("loopback", 7).expect("server");
    let ship = server
        .world_mut()
        .spawn(support::breached_room_ship())
        .expect("ship");
    {
        let ship = server.world_mut().get_mut(ship).expect("ship");
        ship.state_mut().set_connection(0, true);
    }

    for _ in 0..400 {
        server.run_frame();
    }
    let ship = server.world().get(ship).expect("ship");
    let atmosphere = ship.state().compartments()[0].atmosphere;
    assert!(atmosphere < 0.9, "breach never vented: {atmosphere}");
    assert!(atmosphere >= -1e-3);
    assert_eq!(ship.state().framenum(), 400);
}

#[test]
fn damaged_room_leaks_only_itself_through_world_frames() {
    let mut server = ServerSession::new("loopback", 7).expect("server");
    let ship = server
        .world_mut()
        .spawn(support::four_room_ship())
        .expect("ship");
    server
        .world_mut()
        .get_mut(ship)
        .expect("ship")
        .state_mut()
        .damage(1, 0.5);

    for _ in 0..40 {
        server.run_frame();
    }
    let state = server.world().get(ship).expect("ship").state();
    assert!(state.compartments()[1].atmosphere < 1.0);
    for index in [0usize, 2, 3] {
        assert_eq!(state.compartments()[index].atmosphere, 1.0);
    }
}
