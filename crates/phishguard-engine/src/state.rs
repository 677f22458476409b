//! Engine UI state and the per-tick decision function
//!
//! The decision logic is a pure function of observed tree facts, so it is
//! unit-testable without a document. Effects (attach/detach) live in the
//! controller, which checks current presence before acting, making every
//! tick idempotent.

/// Presence/activity flags for the injected surfaces
///
/// Single instance per page view, owned by the controller. Invariant:
/// `busy` implies `control_present`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineUiState {
    /// Action control is attached
    pub control_present: bool,
    /// Result panel is attached
    pub panel_present: bool,
    /// An activation is in flight
    pub busy: bool,
}

impl EngineUiState {
    /// Whether the `busy ⇒ control_present` invariant holds
    #[inline]
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        !self.busy || self.control_present
    }
}

/// Structural action chosen for one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickAction {
    /// View closed: remove control and panel, reset state
    Teardown,
    /// Control absent and an anchor resolved: attach the control
    Inject,
    /// Control absent but no anchor yet; try again next tick
    Retry,
    /// Control already correctly placed
    Noop,
}

/// Decide what one tick should do
///
/// Pure over the three observed facts; callers re-derive them from the tree
/// on every tick rather than trusting cached state.
#[must_use]
pub fn decide(view_open: bool, control_attached: bool, anchor_resolvable: bool) -> TickAction {
    if !view_open {
        TickAction::Teardown
    } else if control_attached {
        TickAction::Noop
    } else if anchor_resolvable {
        TickAction::Inject
    } else {
        TickAction::Retry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closed_view_always_tears_down() {
        assert_eq!(decide(false, true, true), TickAction::Teardown);
        assert_eq!(decide(false, false, false), TickAction::Teardown);
    }

    #[test]
    fn open_view_injects_when_control_absent() {
        assert_eq!(decide(true, false, true), TickAction::Inject);
    }

    #[test]
    fn missing_anchor_is_a_transient_retry() {
        assert_eq!(decide(true, false, false), TickAction::Retry);
    }

    #[test]
    fn present_control_is_left_alone() {
        assert_eq!(decide(true, true, true), TickAction::Noop);
        assert_eq!(decide(true, true, false), TickAction::Noop);
    }

    #[test]
    fn default_state_is_consistent() {
        assert!(EngineUiState::default().is_consistent());
        let busy_without_control = EngineUiState {
            busy: true,
            ..EngineUiState::default()
        };
        assert!(!busy_without_control.is_consistent());
    }
}
