//! State machine trait for lifecycle enums.
//!
//! Connection and consumer lifecycles are both small forward-only state
//! machines. This trait gives them a shared, validated transition API.

use super::ValidationError;

/// Trait for lifecycle enums that represent state machines.
///
/// Implementors list the legal edges once in `valid_transitions`;
/// `can_transition_to` and `transition_to` are derived from it.
///
/// # Example
///
/// ```ignore
/// let closing = ConnectionState::Open.transition_to(ConnectionState::Closing)?;
/// assert!(closing.transition_to(ConnectionState::Open).is_err());
/// ```
pub trait StateMachine: Sized + Copy + PartialEq + std::fmt::Debug {
    /// Returns all valid target states from current state.
    fn valid_transitions(&self) -> Vec<Self>;

    /// Returns true if transition from self to target is valid.
    fn can_transition_to(&self, target: &Self) -> bool {
        self.valid_transitions().contains(target)
    }

    /// Performs transition with validation, returning error if invalid.
    fn transition_to(&self, target: Self) -> Result<Self, ValidationError> {
        if self.can_transition_to(&target) {
            Ok(target)
        } else {
            Err(ValidationError::invalid_format(
                "state_transition",
                format!("Cannot transition from {:?} to {:?}", self, target),
            ))
        }
    }

    /// Checks if current state is terminal (no valid outgoing transitions).
    fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Light {
        Off,
        Warming,
        On,
        Burnt,
    }

    impl StateMachine for Light {
        fn valid_transitions(&self) -> Vec<Self> {
            match self {
                Light::Off => vec![Light::Warming],
                Light::Warming => vec![Light::On, Light::Burnt],
                Light::On => vec![Light::Off, Light::Burnt],
                Light::Burnt => vec![],
            }
        }
    }

    #[test]
    fn derived_can_transition_follows_valid_transitions() {
        assert!(Light::Off.can_transition_to(&Light::Warming));
        assert!(!Light::Off.can_transition_to(&Light::On));
        assert!(Light::On.can_transition_to(&Light::Off));
    }

    #[test]
    fn transition_to_rejects_unlisted_edge() {
        let err = Light::Burnt.transition_to(Light::On).unwrap_err();
        assert!(err.to_string().contains("Cannot transition from Burnt to On"));
    }

    #[test]
    fn only_burnt_is_terminal() {
        assert!(Light::Burnt.is_terminal());
        assert!(!Light::Off.is_terminal());
        assert!(!Light::On.is_terminal());
    }
}
