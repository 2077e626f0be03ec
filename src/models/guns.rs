//! Gun transfer between robot, reactor and ship records and the models they use.

use crate::data::ham::{NUM_PLAYER_GUNS, Reactor, Robot, Ship};
use crate::game_types::FixVector;
use crate::models::polymodel::{MAX_GUNS, Polymodel};

/// Copy a robot's guns onto its model. Robots store no gun directions; every
/// robot gun fires forward.
pub fn guns_from_robot(robot: &Robot, model: &mut Polymodel) {
    model.num_guns = robot.num_guns as i32;
    for gun in 0..MAX_GUNS {
        model.gun_points[gun] = robot.gun_points[gun];
        model.gun_dirs[gun] = FixVector::forward();
        model.gun_submodels[gun] = robot.gun_submodels[gun] as i32;
    }
}

/// Copy a reactor's guns onto its model. Reactor guns sit on the root.
pub fn guns_from_reactor(reactor: &Reactor, model: &mut Polymodel) {
    model.num_guns = reactor.num_guns;
    for gun in 0..MAX_GUNS {
        model.gun_points[gun] = reactor.gun_points[gun];
        model.gun_dirs[gun] = reactor.gun_dirs[gun];
        model.gun_submodels[gun] = 0;
    }
}

/// Copy the player ship's guns onto its model.
pub fn guns_from_ship(ship: &Ship, model: &mut Polymodel) {
    model.num_guns = NUM_PLAYER_GUNS as i32;
    for gun in 0..NUM_PLAYER_GUNS {
        model.gun_points[gun] = ship.gun_points[gun];
        model.gun_dirs[gun] = FixVector::forward();
        model.gun_submodels[gun] = 0;
    }
}

/// Write a model's guns back onto the reactor that uses it.
pub fn reactor_guns_from_model(reactor: &mut Reactor, model: &Polymodel) {
    let count = model.gun_count();
    reactor.num_guns = count as i32;
    reactor.gun_points[..count].copy_from_slice(&model.gun_points[..count]);
    reactor.gun_dirs[..count].copy_from_slice(&model.gun_dirs[..count]);
}

/// Write a model's gun points back onto the player ship.
pub fn ship_guns_from_model(ship: &mut Ship, model: &Polymodel) {
    ship.gun_points
        .copy_from_slice(&model.gun_points[..NUM_PLAYER_GUNS]);
}
