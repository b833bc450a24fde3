//=========================================================================
// Invoke Request
//=========================================================================
//
// The data carried by one scheduled callback: target, tick policy, and
// the timing fields that make pause/resume exact.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::fmt;

//=== Internal Dependencies ===============================================

use crate::core::scene::Context;

//=== Invoke Handle =======================================================

/// Identity of one scheduled invoke, unique within its scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InvokeHandle(pub(crate) u64);

//=== Tick Policy =========================================================

/// When a scheduled invoke is allowed to advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickPolicy {
    /// Advances whenever the owning object is active in hierarchy,
    /// regardless of the owning behaviour's enabled flag. Enforced by the
    /// frame driver, which never ticks behaviours on inactive objects.
    WhileGameObjectActive,

    /// Advances only while the owning behaviour is enabled. Disabling the
    /// behaviour pauses the request, capturing its remaining time;
    /// re-enabling resumes it from the new now.
    WhileBehaviourEnabled,
}

//=== Invoke Target =======================================================

/// What a firing invoke executes.
pub enum InvokeTarget {
    /// Dispatched through the behaviour's
    /// [`on_invoke`](crate::core::scene::Behaviour::on_invoke) handler.
    /// An unhandled name is a silent no-op.
    Method(String),

    /// Called directly with the scene context.
    Callback(Box<dyn FnMut(&mut Context)>),
}

impl fmt::Debug for InvokeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Method(name) => f.debug_tuple("Method").field(name).finish(),
            Self::Callback(_) => f.write_str("Callback(..)"),
        }
    }
}

//=== InvokeRequest =======================================================

/// One scheduled callback.
///
/// `target` is taken out for the duration of a firing and restored
/// afterwards, so a callback can freely reschedule or cancel against the
/// same scheduler without aliasing it. `method_name` keeps name matching
/// (cancel/is-invoking by name) working even while the target is out.
#[derive(Debug)]
pub(crate) struct InvokeRequest {
    pub handle: InvokeHandle,
    pub target: Option<InvokeTarget>,
    pub method_name: Option<String>,
    pub policy: TickPolicy,
    /// Original delay, kept for restart.
    pub delay: f64,
    /// Absolute due time on the scaled clock.
    pub next_time: f64,
    /// Repeat interval; `<= 0` on a repeating request means "every tick".
    pub rate: f64,
    pub repeating: bool,
    pub cancelled: bool,
    pub paused: bool,
    /// Time left until due, captured at pause.
    pub paused_remaining: f64,
}

impl InvokeRequest {
    /// Whether the request would fire at `now`.
    pub fn due(&self, now: f64) -> bool {
        !self.cancelled && !self.paused && self.next_time <= now
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn request(next_time: f64) -> InvokeRequest {
        InvokeRequest {
            handle: InvokeHandle(1),
            target: Some(InvokeTarget::Method("fire".into())),
            method_name: Some("fire".into()),
            policy: TickPolicy::WhileGameObjectActive,
            delay: next_time,
            next_time,
            rate: 0.0,
            repeating: false,
            cancelled: false,
            paused: false,
            paused_remaining: 0.0,
        }
    }

    #[test]
    fn due_compares_against_next_time() {
        let entry = request(1.0);
        assert!(!entry.due(0.9));
        assert!(entry.due(1.0));
        assert!(entry.due(5.0));
    }

    #[test]
    fn cancelled_or_paused_entries_are_never_due() {
        let mut entry = request(1.0);
        entry.cancelled = true;
        assert!(!entry.due(2.0));

        let mut entry = request(1.0);
        entry.paused = true;
        assert!(!entry.due(2.0));
    }

    #[test]
    fn target_debug_does_not_expose_the_closure() {
        let callback = InvokeTarget::Callback(Box::new(|_ctx| {}));
        assert_eq!(format!("{:?}", callback), "Callback(..)");
    }
}
