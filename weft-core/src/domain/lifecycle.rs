use crate::foundation::WeftError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which chaincode lifecycle protocol a connection speaks.
///
/// Selected once at connection construction; the coordinator dispatches on
/// this value rather than overriding partial behavior per deployment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleVariant {
    /// Single-phase instantiate/upgrade (Fabric v1.x).
    V1,
    /// Two-phase approve/commit (Fabric v2.x).
    #[default]
    V2,
}

impl fmt::Display for LifecycleVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleVariant::V1 => write!(f, "v1"),
            LifecycleVariant::V2 => write!(f, "v2"),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum DefinitionState {
    Uninstalled,
    Installed,
    Approved,
    Committed,
    Initialized,
}

const VALID_TRANSITIONS: &[(DefinitionState, DefinitionState)] = &[
    (DefinitionState::Uninstalled, DefinitionState::Installed),
    (DefinitionState::Installed, DefinitionState::Approved),
    (DefinitionState::Approved, DefinitionState::Committed),
    // v1 collapses definition publication and initialization into one phase.
    (DefinitionState::Installed, DefinitionState::Committed),
    (DefinitionState::Committed, DefinitionState::Initialized),
];

#[derive(Clone, Debug)]
pub struct StateTransition {
    pub valid: bool,
    pub from_state: String,
    pub to_state: String,
}

pub fn validate_transition(from: DefinitionState, to: DefinitionState) -> StateTransition {
    let valid = from == to || VALID_TRANSITIONS.contains(&(from, to));
    StateTransition { valid, from_state: format!("{:?}", from), to_state: format!("{:?}", to) }
}

pub fn ensure_valid_transition(from: DefinitionState, to: DefinitionState) -> Result<(), WeftError> {
    let transition = validate_transition(from, to);
    if transition.valid {
        Ok(())
    } else {
        Err(WeftError::InvalidStateTransition { from: transition.from_state, to: transition.to_state })
    }
}

pub fn is_terminal(state: DefinitionState) -> bool {
    matches!(state, DefinitionState::Initialized)
}

/// Next definition sequence for the v2 lifecycle: 1 for a brand-new name,
/// otherwise one past the committed definition.
pub fn next_sequence(committed: Option<i64>) -> i64 {
    match committed {
        Some(previous) => previous + 1,
        None => 1,
    }
}
