//! Battle rules constants - all tunable values in one place
//!
//! Modifiers are ADDITIVE target-number adjustments on a 2d6 roll.

// Map and game length
pub const DEFAULT_MAP_RADIUS: u32 = 7;
pub const MAX_MAP_RADIUS: u32 = 50;
pub const DEFAULT_TURN_LIMIT: u32 = 30;
/// Hard stop for run-to-completion when the turn limit is 0 (unlimited)
pub const UNLIMITED_TURN_CAP: u32 = 500;

// Pilot defaults
pub const DEFAULT_GUNNERY: u32 = 4;
pub const DEFAULT_PILOTING: u32 = 5;
pub const PILOT_LETHAL_WOUNDS: u32 = 6;
pub const HEAD_HIT_PILOT_WOUNDS: u32 = 1;
pub const AMMO_EXPLOSION_PILOT_WOUNDS: u32 = 2;

/// Consciousness roll needed on 2d6, indexed by total wounds (1-based)
pub const CONSCIOUSNESS_TARGETS: [u32; 5] = [3, 5, 7, 10, 11];

// Range modifiers
pub const SHORT_RANGE_MODIFIER: u32 = 0;
pub const MEDIUM_RANGE_MODIFIER: u32 = 2;
pub const LONG_RANGE_MODIFIER: u32 = 4;

// Attacker movement modifiers
pub const WALKED_MODIFIER: u32 = 1;
pub const RAN_MODIFIER: u32 = 2;
pub const JUMPED_MODIFIER: u32 = 3;

/// Target movement modifier: (minimum hexes moved, modifier), highest first
pub const TARGET_MOVEMENT_MODIFIERS: [(u32, u32); 5] = [(18, 5), (10, 4), (7, 3), (5, 2), (3, 1)];
pub const TARGET_JUMPED_BONUS: u32 = 1;

/// Attacker heat to-hit penalty: (minimum heat, modifier), highest first
pub const HEAT_FIRE_MODIFIERS: [(u32, u32); 4] = [(24, 4), (17, 3), (13, 2), (8, 1)];

// Heat
pub const DEFAULT_HEAT_SINKS: u32 = 10;
pub const WALK_HEAT: u32 = 1;
pub const RUN_HEAT: u32 = 2;
pub const MIN_JUMP_HEAT: u32 = 3;
pub const AUTOMATIC_SHUTDOWN_HEAT: u32 = 30;
pub const SHUTDOWN_CHECK_HEAT: u32 = 14;
/// Shutdown avoidance roll on 2d6: (minimum heat, target), highest first
pub const SHUTDOWN_AVOID_TARGETS: [(u32, u32); 4] = [(26, 10), (22, 8), (18, 6), (14, 4)];

// Criticals
/// 2d6 roll at or above which a destroyed location suffers a critical hit
pub const CRITICAL_HIT_TARGET: u32 = 8;

// Armor
pub const HEAD_MAX_ARMOR: u32 = 9;

/// Look up a stepped table of (threshold, value) sorted highest first
pub fn stepped_lookup(table: &[(u32, u32)], value: u32) -> u32 {
    table
        .iter()
        .find(|(threshold, _)| value >= *threshold)
        .map(|(_, modifier)| *modifier)
        .unwrap_or(0)
}
