pub mod clock;
pub mod config;
pub mod error;
pub mod rng;
pub mod types;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::GameConfig;
pub use error::{Result, TacticsError};
pub use rng::DiceRng;
pub use types::{SessionId, Side, UnitId};
