#![forbid(unsafe_code)]

pub mod campaign;
pub mod error;
pub mod model;
pub mod policy;
pub mod time;

pub use campaign::{CampaignState, CorrectAnswerOutcome, ScoreChange, UnitProgress};
pub use error::Error;
pub use policy::UnlockPolicy;
pub use time::Clock;
