//! Headless demo driver: runs a server and a loopback client for a fixed
//! number of frames and logs what the simulation is doing.
//!
//! The scenario is a rounded-rectangle rail loop with three stations and a
//! commuter train, plus a damaged ship venting atmosphere through a breached
//! compartment.

use std::net::SocketAddr;

use clap::Parser;
use glam::{IVec2, Vec2};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

use tanks_core::clothoid::Segment;
use tanks_core::config::Profile;
use tanks_core::hextile::HexTile;
use tanks_core::rail;
use tanks_core::session::{ClientSession, Payload, ServerSession};
use tanks_core::ship::{CompartmentDef, ConnectionDef, Ship, ShipLayout, INVALID_COMPARTMENT};
use tanks_core::sound::NullSoundDevice;
use tanks_core::world::World;
use tanks_core::FRAMETIME;

#[derive(Parser, Debug)]
#[command(about = "Run the Tanks! simulation core headless")]
struct Args {
    /// Number of frames to simulate (20 frames per second).
    #[arg(long, default_value_t = 1200)]
    frames: u64,

    /// Simulation seed.
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Frames between progress reports.
    #[arg(long, default_value_t = 100)]
    report_every: u64,
}

/// Rounded-rectangle loop: straights of 200 and 100, corner radius 50.
fn build_rail_loop(world: &mut World) {
    let corner = std::f32::consts::FRAC_PI_2 * 50.0;
    let k = 1.0 / 50.0;
    let rail = world.rail_mut();

    rail.add_segment(Segment::from_line(Vec2::new(0.0, 0.0), Vec2::new(200.0, 0.0)));
    rail.add_segment(Segment::from_arc(Vec2::new(200.0, 0.0), Vec2::X, corner, k));
    rail.add_segment(Segment::from_line(Vec2::new(250.0, 50.0), Vec2::new(250.0, 150.0)));
    rail.add_segment(Segment::from_arc(Vec2::new(250.0, 150.0), Vec2::Y, corner, k));
    rail.add_segment(Segment::from_line(Vec2::new(200.0, 200.0), Vec2::new(0.0, 200.0)));
    rail.add_segment(Segment::from_arc(
        Vec2::new(0.0, 200.0),
        -Vec2::X,
        corner,
        k,
    ));
    rail.add_segment(Segment::from_line(Vec2::new(-50.0, 150.0), Vec2::new(-50.0, 50.0)));
    rail.add_segment(Segment::from_arc(
        Vec2::new(-50.0, 50.0),
        -Vec2::Y,
        corner,
        k,
    ));
}

/// Three rooms in a row; the middle one is breached to space.
fn build_ship() -> Ship {
    let vertices = vec![
        // Room rings, clockwise.
        Vec2::new(0.0, 0.0),
        Vec2::new(0.0, 4.0),
        Vec2::new(6.0, 4.0),
        Vec2::new(6.0, 0.0),
        Vec2::new(6.0, 0.0),
        Vec2::new(6.0, 4.0),
        Vec2::new(12.0, 4.0),
        Vec2::new(12.0, 0.0),
        Vec2::new(12.0, 0.0),
        Vec2::new(12.0, 4.0),
        Vec2::new(18.0, 4.0),
        Vec2::new(18.0, 0.0),
        // Doorways.
        Vec2::new(5.95, 1.5),
        Vec2::new(5.95, 2.5),
        Vec2::new(6.05, 1.5),
        Vec2::new(6.05, 2.5),
        Vec2::new(11.95, 1.5),
        Vec2::new(11.95, 2.5),
        Vec2::new(12.05, 1.5),
        Vec2::new(12.05, 2.5),
        // Hull breach in the middle room's ceiling.
        Vec2::new(8.5, 3.95),
        Vec2::new(9.5, 3.95),
        Vec2::new(8.5, 4.05),
        Vec2::new(9.5, 4.05),
    ];
    let layout = ShipLayout::new(
        vertices,
        &[
            CompartmentDef { first_vertex: 0, num_vertices: 4 },
            CompartmentDef { first_vertex: 4, num_vertices: 4 },
            CompartmentDef { first_vertex: 8, num_vertices: 4 },
        ],
        &[
            ConnectionDef { compartments: [0, 1], vertices: [12, 13, 14, 15] },
            ConnectionDef { compartments: [1, 2], vertices: [16, 17, 18, 19] },
            ConnectionDef { compartments: [1, INVALID_COMPARTMENT], vertices: [20, 21, 22, 23] },
        ],
    );
    Ship::new(layout)
}

fn main() {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let mut server = ServerSession::new("demo", args.seed).expect("server world");
    let mut client =
        ClientSession::new(&Profile::default(), args.seed.wrapping_add(1)).expect("client world");
    let mut sound = NullSoundDevice;

    // Scenario: rail loop with a commuter train.
    build_rail_loop(server.world_mut());
    let s1 = rail::add_station(server.world_mut(), Vec2::new(100.0, 0.0), "Dockside")
        .expect("station");
    let s2 = rail::add_station(server.world_mut(), Vec2::new(250.0, 100.0), "Foundry")
        .expect("station");
    let s3 = rail::add_station(server.world_mut(), Vec2::new(100.0, 200.0), "Observatory")
        .expect("station");
    let train = rail::add_train(server.world_mut(), 2).expect("train");
    server
        .world_mut()
        .get_mut(train)
        .expect("train")
        .set_schedule(vec![s1, s2, s3]);

    // Scenario: breached ship with open internal doors.
    let ship = server.world_mut().spawn(build_ship()).expect("ship");
    {
        let ship = server.world_mut().get_mut(ship).expect("ship");
        ship.state_mut().set_connection(0, true);
        ship.state_mut().set_connection(1, true);
        ship.state_mut().set_connection(2, true);
        ship.state_mut().damage(1, 0.02);
    }

    // Scenario: grow a small patch of terrain around the origin.
    {
        let mut rng = StdRng::seed_from_u64(args.seed);
        let world = server.world_mut();
        world
            .tiles_mut()
            .insert_tile(IVec2::ZERO, HexTile::default());
        for _ in 0..12 {
            let Some(&slot) = world.tiles().boundary_tiles().first() else {
                break;
            };
            let position = world.tiles().tiles()[slot].position;
            let climate = world.tiles().choose_climate(slot, &mut rng);
            let mut tile = HexTile::default();
            tile.climate = climate;
            world.tiles_mut().insert_tile(position, tile);
        }
        info!(
            tiles = world.tiles().tiles().len(),
            boundary = world.tiles().boundary_tiles().len(),
            "terrain seeded"
        );
    }

    // Loopback handshake.
    let server_addr: SocketAddr = "127.0.0.1:27910".parse().expect("addr");
    let request = client.connect_to(server_addr, 27015);
    if let Payload::Text(text) = &request.payload {
        let reply = server
            .handle_oob("127.0.0.1:40000".parse().expect("addr"), text)
            .expect("connack");
        if let Payload::Text(text) = &reply.payload {
            client.handle_oob(server_addr, text);
        }
    }
    info!(slot = client.cls.number, "client joined");

    for frame in 0..args.frames {
        let command = client.send_command();
        server.handle_message(client.cls.number, &command);

        let transmission = server.run_frame();
        client.read_snapshot(&transmission, &mut sound);

        if frame % args.report_every == 0 {
            let world = server.world();
            let t = world.get(train).expect("train");
            let position = t.position(world, world.frametime());
            let atmospheres: Vec<f32> = world
                .get(ship)
                .expect("ship")
                .state()
                .compartments()
                .iter()
                .map(|c| (c.atmosphere * 100.0).round() / 100.0)
                .collect();
            info!(
                frame,
                time = %format_args!("{:.1}s", frame as f32 * FRAMETIME),
                speed = %format_args!("{:.1}", t.current_speed()),
                train = ?position,
                next_station = ?t.next_station_index(),
                ?atmospheres,
                "tick"
            );
        }
    }

    let world = server.world();
    let t = world.get(train).expect("train");
    info!(
        frames = args.frames,
        final_speed = %format_args!("{:.1}", t.current_speed()),
        objects = world.object_count(),
        "simulation complete"
    );
}
