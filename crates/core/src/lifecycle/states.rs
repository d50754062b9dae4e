use serde::{Deserialize, Serialize};

use crate::errors::AgentError;

/// Where a template/instance pair sits in its lifecycle. Once activated, a pair never
/// returns to `Available`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    Available,
    Activating,
    Active,
    Inactive,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleEvent {
    ActivationRequested,
    ActivationSucceeded,
    ActivationFailed,
    Enabled,
    Disabled,
}

impl LifecycleState {
    pub fn from_instance(is_active: bool) -> Self {
        if is_active {
            Self::Active
        } else {
            Self::Inactive
        }
    }

    pub fn transition(self, event: LifecycleEvent) -> Result<Self, AgentError> {
        use LifecycleEvent::*;
        use LifecycleState::*;

        let next = match (self, event) {
            (Available, ActivationRequested) => Activating,
            (Activating, ActivationSucceeded) => Active,
            (Activating, ActivationFailed) => Available,
            // an inactive instance is re-activated through the toggle path, never re-created
            (Active | Inactive, Enabled) => Active,
            (Active | Inactive, Disabled) => Inactive,
            (from, event) => {
                return Err(AgentError::InvalidTransition { from, to: target_of(event) })
            }
        };
        Ok(next)
    }
}

fn target_of(event: LifecycleEvent) -> LifecycleState {
    match event {
        LifecycleEvent::ActivationRequested => LifecycleState::Activating,
        LifecycleEvent::ActivationSucceeded | LifecycleEvent::Enabled => LifecycleState::Active,
        LifecycleEvent::ActivationFailed => LifecycleState::Available,
        LifecycleEvent::Disabled => LifecycleState::Inactive,
    }
}
