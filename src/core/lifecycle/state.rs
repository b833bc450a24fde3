//=========================================================================
// Lifecycle State Machine
//=========================================================================
//
// Guard flags driving the per-behaviour hook sequence:
//
//   Uninitialized → Awoken → { Enabled ⇄ Disabled } → Destroyed
//
// with Start as an orthogonal one-shot gated on "awoken and currently
// enabled". Each `begin_*` commits its flag *before* the user callback
// runs and reports whether the hook may fire; misuse is structurally a
// no-op, never a panic. Committed flags are not rolled back if the user
// callback later unwinds.
//
//=========================================================================

//=== LifecycleState ======================================================

/// Guard flags for one behaviour's lifecycle hooks.
///
/// Each flag flips at most in the direction its invariant requires:
/// `did_awake`, `did_start`, `has_ever_been_active` and
/// `destroy_callbacks_sent` only ever go false → true, while
/// `on_enable_called` alternates and enforces strict OnEnable/OnDisable
/// alternation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LifecycleState {
    did_awake: bool,
    on_enable_called: bool,
    did_start: bool,
    has_ever_been_active: bool,
    destroy_callbacks_sent: bool,
}

/// Which destruction callbacks a `begin_destroy` transition owes the
/// behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DestroySteps {
    /// OnDisable must run first: the behaviour was enabled when destroyed.
    pub disable: bool,
    /// OnDestroy must run: the behaviour was active at least once.
    pub destroy: bool,
}

impl LifecycleState {
    /// Fresh, uninitialized state.
    pub fn new() -> Self {
        Self::default()
    }

    //--- Transitions ------------------------------------------------------

    /// Commits the Awake transition. Fires at most once.
    pub fn begin_awake(&mut self) -> bool {
        if self.did_awake {
            return false;
        }
        self.did_awake = true;
        true
    }

    /// Commits an OnEnable transition.
    ///
    /// Refused before Awake (OnEnable strictly follows Awake) and refused
    /// while already enabled (calls strictly alternate).
    pub fn begin_enable(&mut self) -> bool {
        if !self.did_awake || self.on_enable_called {
            return false;
        }
        self.on_enable_called = true;
        self.has_ever_been_active = true;
        true
    }

    /// Commits an OnDisable transition. Refused unless an OnEnable is
    /// outstanding.
    pub fn begin_disable(&mut self) -> bool {
        if !self.on_enable_called {
            return false;
        }
        self.on_enable_called = false;
        true
    }

    /// Commits the Start transition. Fires at most once, and only while
    /// awoken and currently enabled.
    pub fn begin_start(&mut self) -> bool {
        if self.did_start || !self.did_awake || !self.on_enable_called {
            return false;
        }
        self.did_start = true;
        true
    }

    /// Commits the terminal Destroyed transition.
    ///
    /// Returns the callbacks owed, or `None` on repeat calls. An enabled
    /// behaviour owes an OnDisable immediately before its OnDestroy, and
    /// OnDestroy itself is owed only if the behaviour was ever active.
    pub fn begin_destroy(&mut self) -> Option<DestroySteps> {
        if self.destroy_callbacks_sent {
            return None;
        }
        self.destroy_callbacks_sent = true;
        let disable = self.on_enable_called;
        self.on_enable_called = false;
        Some(DestroySteps {
            disable,
            destroy: self.has_ever_been_active,
        })
    }

    //--- Queries ----------------------------------------------------------

    /// Whether Awake has fired.
    pub fn awoken(&self) -> bool {
        self.did_awake
    }

    /// Whether an OnEnable is outstanding (no matching OnDisable yet).
    pub fn enable_called(&self) -> bool {
        self.on_enable_called
    }

    /// Whether Start has fired.
    pub fn started(&self) -> bool {
        self.did_start
    }

    /// Whether the behaviour has ever been effectively active.
    pub fn has_ever_been_active(&self) -> bool {
        self.has_ever_been_active
    }

    /// Whether destruction callbacks have been issued.
    pub fn destroyed(&self) -> bool {
        self.destroy_callbacks_sent
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    //--- One-Shot Guards --------------------------------------------------

    #[test]
    fn awake_fires_exactly_once() {
        let mut state = LifecycleState::new();
        assert!(state.begin_awake());
        assert!(!state.begin_awake());
        assert!(state.awoken());
    }

    #[test]
    fn enable_is_refused_before_awake() {
        let mut state = LifecycleState::new();
        assert!(!state.begin_enable());
        assert!(!state.enable_called());
    }

    #[test]
    fn start_requires_awake_and_enable() {
        let mut state = LifecycleState::new();
        assert!(!state.begin_start());
        state.begin_awake();
        assert!(!state.begin_start());
        state.begin_enable();
        assert!(state.begin_start());
        assert!(!state.begin_start());
    }

    #[test]
    fn start_is_refused_while_disabled() {
        let mut state = LifecycleState::new();
        state.begin_awake();
        state.begin_enable();
        state.begin_disable();
        assert!(!state.begin_start());
        // Re-enabling restores eligibility; Start is deferred, not lost.
        state.begin_enable();
        assert!(state.begin_start());
    }

    //--- Alternation ------------------------------------------------------

    #[test]
    fn enable_disable_strictly_alternate() {
        let mut state = LifecycleState::new();
        state.begin_awake();

        let mut enables = 0;
        let mut disables = 0;
        for round in 0..10 {
            if round % 2 == 0 {
                if state.begin_enable() {
                    enables += 1;
                }
                // A second enable in a row must be refused.
                assert!(!state.begin_enable());
            } else {
                if state.begin_disable() {
                    disables += 1;
                }
                assert!(!state.begin_disable());
            }
            let delta = enables - disables;
            assert!(delta == 0 || delta == 1);
        }
    }

    #[test]
    fn toggling_many_times_leaves_awake_count_at_one() {
        let mut state = LifecycleState::new();
        let mut awakes = 0;
        for _ in 0..50 {
            if state.begin_awake() {
                awakes += 1;
            }
            state.begin_enable();
            state.begin_disable();
        }
        assert_eq!(awakes, 1);
    }

    //--- Destruction ------------------------------------------------------

    #[test]
    fn destroy_while_enabled_owes_disable_then_destroy() {
        let mut state = LifecycleState::new();
        state.begin_awake();
        state.begin_enable();

        let steps = state.begin_destroy().unwrap();
        assert!(steps.disable);
        assert!(steps.destroy);
        assert!(!state.enable_called());
    }

    #[test]
    fn destroy_before_any_activity_owes_nothing() {
        let mut state = LifecycleState::new();
        let steps = state.begin_destroy().unwrap();
        assert!(!steps.disable);
        assert!(!steps.destroy);
    }

    #[test]
    fn destroy_after_disable_owes_only_on_destroy() {
        let mut state = LifecycleState::new();
        state.begin_awake();
        state.begin_enable();
        state.begin_disable();

        let steps = state.begin_destroy().unwrap();
        assert!(!steps.disable);
        assert!(steps.destroy);
    }

    #[test]
    fn repeated_destroy_is_a_no_op() {
        let mut state = LifecycleState::new();
        assert!(state.begin_destroy().is_some());
        assert!(state.begin_destroy().is_none());
        assert!(state.destroyed());
    }
}
