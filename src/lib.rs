//! Mech Tactics - deterministic, event-sourced hex combat between mechs

pub mod battle;
pub mod combat;
pub mod core;
