pub mod events;

pub use events::{ConditionsOfJoining, ConditionsOfJoiningSignedEvent};
