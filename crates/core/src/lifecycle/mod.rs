pub mod controller;
pub mod states;

pub use controller::{ControllerStatus, LifecycleController, RollbackPolicy};
pub use states::{LifecycleEvent, LifecycleState};
