#![allow(dead_code)]

use glam::Vec2;
use tanks_core::clothoid::Segment;
use tanks_core::handle::Handle;
use tanks_core::rail::{self, RailStation};
use tanks_core::ship::{CompartmentDef, ConnectionDef, Ship, ShipLayout, INVALID_COMPARTMENT};
use tanks_core::world::World;

/// A world with `count` straight rail edges of the given length along +x.
pub fn straight_rail_world(count: usize, edge_length: f32) -> World {
    let mut world = World::with_seed(0xBEEF).expect("world slot");
    for ii in 0..count {
        let x0 = ii as f32 * edge_length;
        world.rail_mut().add_segment(Segment::from_line(
            Vec2::new(x0, 0.0),
            Vec2::new(x0 + edge_length, 0.0),
        ));
    }
    world
}

/// A closed rounded-square rail loop with three stations.
///
/// Four straights of `side` and four quarter arcs of radius `radius`; total
/// length `4 * side + 2 * pi * radius`. Stations sit at the middle of the
/// bottom, right, and top straights.
pub fn loop_rail_world(side: f32, radius: f32) -> (World, Vec<Handle<RailStation>>) {
    let mut world = World::with_seed(0xBEEF).expect("world slot");
    let corner = std::f32::consts::FRAC_PI_2 * radius;
    let k = 1.0 / radius;
    {
        let net = world.rail_mut();
        net.add_segment(Segment::from_line(Vec2::new(0.0, 0.0), Vec2::new(side, 0.0)));
        net.add_segment(Segment::from_arc(Vec2::new(side, 0.0), Vec2::X, corner, k));
        net.add_segment(Segment::from_line(
            Vec2::new(side + radius, radius),
            Vec2::new(side + radius, radius + side),
        ));
        net.add_segment(Segment::from_arc(
            Vec2::new(side + radius, radius + side),
            Vec2::Y,
            corner,
            k,
        ));
        net.add_segment(Segment::from_line(
            Vec2::new(side, 2.0 * radius + side),
            Vec2::new(0.0, 2.0 * radius + side),
        ));
        net.add_segment(Segment::from_arc(
            Vec2::new(0.0, 2.0 * radius + side),
            -Vec2::X,
            corner,
            k,
        ));
        net.add_segment(Segment::from_line(
            Vec2::new(-radius, radius + side),
            Vec2::new(-radius, radius),
        ));
        net.add_segment(Segment::from_arc(
            Vec2::new(-radius, radius),
            -Vec2::Y,
            corner,
            k,
        ));
    }

    let stations = vec![
        rail::add_station(&mut world, Vec2::new(side / 2.0, 0.0), "south").expect("station"),
        rail::add_station(
            &mut world,
            Vec2::new(side + radius, radius + side / 2.0),
            "east",
        )
        .expect("station"),
        rail::add_station(&mut world, Vec2::new(side / 2.0, 2.0 * radius + side), "north")
            .expect("station"),
    ];
    assert!(stations.iter().all(|s| !s.is_null()));
    (world, stations)
}

/// Four rooms in a row with closed doors between them; returns the ship and
/// the index of each internal connection.
pub fn four_room_ship() -> Ship {
    let mut vertices = Vec::new();
    let mut compartments = Vec::new();
    let mut connections = Vec::new();

    for ii in 0..4u16 {
        let x0 = ii as f32 * 4.0;
        let base = vertices.len() as u16;
        vertices.extend([
            Vec2::new(x0, 0.0),
            Vec2::new(x0, 3.0),
            Vec2::new(x0 + 4.0, 3.0),
            Vec2::new(x0 + 4.0, 0.0),
        ]);
        compartments.push(CompartmentDef {
            first_vertex: base,
            num_vertices: 4,
        });
    }
    for ii in 0..3u16 {
        let x = (ii + 1) as f32 * 4.0;
        let base = vertices.len() as u16;
        vertices.extend([
            Vec2::new(x - 0.05, 1.0),
            Vec2::new(x - 0.05, 2.0),
            Vec2::new(x + 0.05, 1.0),
            Vec2::new(x + 0.05, 2.0),
        ]);
        connections.push(ConnectionDef {
            compartments: [ii, ii + 1],
            vertices: [base, base + 1, base + 2, base + 3],
        });
    }

    Ship::new(ShipLayout::new(vertices, &compartments, &connections))
}

/// One room with a breach to the outside.
pub fn breached_room_ship() -> Ship {
    let vertices = vec![
        Vec2::new(0.0, 0.0),
        Vec2::new(0.0, 3.0),
        Vec2::new(4.0, 3.0),
        Vec2::new(4.0, 0.0),
        Vec2::new(3.95, 1.0),
        Vec2::new(3.95, 2.0),
        Vec2::new(4.05, 1.0),
        Vec2::new(4.05, 2.0),
    ];
    Ship::new(ShipLayout::new(
        vertices,
        &[CompartmentDef {
            first_vertex: 0,
            num_vertices: 4,
        }],
        &[ConnectionDef {
            compartments: [0, INVALID_COMPARTMENT],
            vertices: [4, 5, 6, 7],
        }],
    ))
}
