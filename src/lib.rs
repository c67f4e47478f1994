//! Sheep Arena - steering and horn-combat simulation core
//!
//! A [`game::World`] owns a roster of sheep and advances them on a fixed
//! step: every sheep steers and moves, then a single resolver applies body
//! contact, terrain, horn clashes and kills. [`game::GameMatch`] drives a
//! world as an async task.

pub mod config;
pub mod game;
pub mod util;
