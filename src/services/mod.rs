pub mod conditions_of_joining;

pub use conditions_of_joining::ConditionsOfJoiningPublisher;
