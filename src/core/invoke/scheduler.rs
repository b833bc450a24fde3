//=========================================================================
// Invoke Scheduler
//=========================================================================
//
// Per-behaviour table of delayed/repeating callbacks.
//
// The scheduler owns timing and bookkeeping only; the scene coordinator
// performs the actual dispatch, because firing a target needs the whole
// scene. A tick is therefore split into:
//
//   1. due_handles(now)      - stable snapshot of everything due
//   2. take_target(handle)   - per firing, with a liveness re-check
//   3. complete_firing()     - repeat advance or one-shot retirement
//   4. compact()             - drop cancelled entries after the pass
//
// Entries are never removed mid-pass, so a callback that cancels or
// schedules against its own scheduler can neither skip nor double-fire
// anything in the pass that is running it.
//
//=========================================================================

//=== External Dependencies ===============================================

use log::debug;

//=== Internal Dependencies ===============================================

use super::request::InvokeRequest;
use super::{InvokeHandle, InvokeTarget, TickPolicy};

//=== InvokeScheduler =====================================================

/// Timed-callback set owned by one behaviour.
///
/// All times are absolute scaled-clock seconds supplied by the caller;
/// the scheduler never reads a clock itself.
pub struct InvokeScheduler {
    entries: Vec<InvokeRequest>,
    next_handle: u64,
    /// Mirror of the owning behaviour's enabled flag, maintained through
    /// [`set_owner_enabled`](Self::set_owner_enabled). Governs the initial
    /// and resumable state of `WhileBehaviourEnabled` requests.
    owner_enabled: bool,
}

impl InvokeScheduler {
    /// Creates an empty scheduler for an enabled owner.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_handle: 0,
            owner_enabled: true,
        }
    }

    //--- Scheduling -------------------------------------------------------

    /// Schedules a callback `delay` seconds from `now`.
    ///
    /// Negative delays clamp to zero. A `WhileBehaviourEnabled` request
    /// scheduled while the owner is disabled starts paused with its full
    /// remaining time captured, so it neither fires while disabled nor
    /// loses its due time.
    pub fn schedule(
        &mut self,
        target: InvokeTarget,
        delay: f64,
        policy: TickPolicy,
        rate: f64,
        repeating: bool,
        now: f64,
    ) -> InvokeHandle {
        self.next_handle += 1;
        let handle = InvokeHandle(self.next_handle);

        let delay = delay.max(0.0);
        let next_time = now + delay;
        let paused = policy == TickPolicy::WhileBehaviourEnabled && !self.owner_enabled;

        let method_name = match &target {
            InvokeTarget::Method(name) => Some(name.clone()),
            InvokeTarget::Callback(_) => None,
        };

        self.entries.push(InvokeRequest {
            handle,
            target: Some(target),
            method_name,
            policy,
            delay,
            next_time,
            rate,
            repeating,
            cancelled: false,
            paused,
            paused_remaining: if paused { delay } else { 0.0 },
        });
        handle
    }

    //--- Ticking ----------------------------------------------------------

    /// Snapshot of every handle due at `now`.
    pub fn due_handles(&self, now: f64) -> Vec<InvokeHandle> {
        self.entries
            .iter()
            .filter(|entry| entry.due(now))
            .map(|entry| entry.handle)
            .collect()
    }

    /// Takes the target of a due entry for execution.
    ///
    /// Returns `None` if the entry has been cancelled or paused since the
    /// snapshot was taken; a cancellation earlier in the same pass must
    /// prevent the firing.
    pub fn take_target(&mut self, handle: InvokeHandle) -> Option<InvokeTarget> {
        let entry = self.entry_mut(handle)?;
        if entry.cancelled || entry.paused {
            return None;
        }
        entry.target.take()
    }

    /// Puts a target back after execution.
    ///
    /// A no-op if the entry disappeared meanwhile (the pass compacted, or
    /// the behaviour was torn down).
    pub fn restore_target(&mut self, handle: InvokeHandle, target: InvokeTarget) {
        if let Some(entry) = self.entry_mut(handle) {
            entry.target = Some(target);
        }
    }

    /// Retires or re-arms an entry after it fired at `now`.
    ///
    /// One-shots are marked cancelled. Repeating entries advance
    /// `next_time` by whole multiples of `rate` until it exceeds `now`, so
    /// a long stall produces one catch-up firing per tick rather than a
    /// burst. A repeating rate `<= 0` means "fire every tick".
    pub fn complete_firing(&mut self, handle: InvokeHandle, now: f64) {
        let Some(entry) = self.entry_mut(handle) else {
            return;
        };
        if entry.cancelled {
            return;
        }
        if !entry.repeating {
            entry.cancelled = true;
            return;
        }
        if entry.rate <= 0.0 {
            entry.next_time = now;
            return;
        }
        while entry.next_time <= now {
            entry.next_time += entry.rate;
        }
    }

    /// Removes cancelled entries. Called after a tick pass, never during.
    pub fn compact(&mut self) {
        self.entries.retain(|entry| !entry.cancelled);
    }

    //--- Cancellation -----------------------------------------------------

    /// Cancels one entry. Unknown handles are absorbed.
    pub fn cancel(&mut self, handle: InvokeHandle) {
        match self.entry_mut(handle) {
            Some(entry) => entry.cancelled = true,
            None => debug!("cancel for unknown invoke handle {:?}", handle),
        }
    }

    /// Cancels every entry dispatching to `method`.
    pub fn cancel_method(&mut self, method: &str) {
        for entry in &mut self.entries {
            if entry.method_name.as_deref() == Some(method) {
                entry.cancelled = true;
            }
        }
    }

    /// Cancels every entry.
    pub fn cancel_all(&mut self) {
        for entry in &mut self.entries {
            entry.cancelled = true;
        }
    }

    //--- Pause / Resume ---------------------------------------------------

    /// Pauses one entry, capturing its remaining time. Idempotent.
    pub fn pause(&mut self, handle: InvokeHandle, now: f64) {
        let Some(entry) = self.entry_mut(handle) else {
            debug!("pause for unknown invoke handle {:?}", handle);
            return;
        };
        if entry.cancelled || entry.paused {
            return;
        }
        entry.paused = true;
        entry.paused_remaining = (entry.next_time - now).max(0.0);
    }

    /// Resumes one entry, re-anchoring its due time to `now` plus the
    /// captured remainder, with no drift against the original schedule.
    ///
    /// A `WhileBehaviourEnabled` entry stays paused while its owner is
    /// disabled; the policy cannot be bypassed by an explicit resume.
    pub fn resume(&mut self, handle: InvokeHandle, now: f64) {
        let owner_enabled = self.owner_enabled;
        let Some(entry) = self.entry_mut(handle) else {
            debug!("resume for unknown invoke handle {:?}", handle);
            return;
        };
        if entry.cancelled || !entry.paused {
            return;
        }
        if entry.policy == TickPolicy::WhileBehaviourEnabled && !owner_enabled {
            return;
        }
        entry.paused = false;
        entry.next_time = now + entry.paused_remaining;
    }

    /// Re-arms one entry at its original delay from `now`, clearing any
    /// pause (subject to the owner-enabled policy).
    pub fn restart(&mut self, handle: InvokeHandle, now: f64) {
        let owner_enabled = self.owner_enabled;
        let Some(entry) = self.entry_mut(handle) else {
            debug!("restart for unknown invoke handle {:?}", handle);
            return;
        };
        if entry.cancelled {
            return;
        }
        entry.next_time = now + entry.delay;
        if entry.policy == TickPolicy::WhileBehaviourEnabled && !owner_enabled {
            entry.paused = true;
            entry.paused_remaining = entry.delay;
        } else {
            entry.paused = false;
            entry.paused_remaining = 0.0;
        }
    }

    /// Pauses every live entry.
    pub fn pause_all(&mut self, now: f64) {
        let handles: Vec<InvokeHandle> = self.entries.iter().map(|entry| entry.handle).collect();
        for handle in handles {
            self.pause(handle, now);
        }
    }

    /// Resumes every paused entry the owner-enabled policy allows.
    pub fn resume_all(&mut self, now: f64) {
        let handles: Vec<InvokeHandle> = self.entries.iter().map(|entry| entry.handle).collect();
        for handle in handles {
            self.resume(handle, now);
        }
    }

    //--- Owner Enabled Wiring ---------------------------------------------

    /// Reacts to the owning behaviour's enabled flag changing.
    ///
    /// Affects only `WhileBehaviourEnabled` entries: disable pauses them
    /// (capturing remaining time), enable resumes them against the new
    /// now. `WhileGameObjectActive` entries are untouched.
    pub fn set_owner_enabled(&mut self, enabled: bool, now: f64) {
        if self.owner_enabled == enabled {
            return;
        }
        self.owner_enabled = enabled;
        for entry in &mut self.entries {
            if entry.policy != TickPolicy::WhileBehaviourEnabled || entry.cancelled {
                continue;
            }
            if !enabled && !entry.paused {
                entry.paused = true;
                entry.paused_remaining = (entry.next_time - now).max(0.0);
            } else if enabled && entry.paused {
                entry.paused = false;
                entry.next_time = now + entry.paused_remaining;
            }
        }
    }

    //--- Queries ----------------------------------------------------------

    /// Whether the handle refers to a live (non-cancelled) entry.
    pub fn is_invoking(&self, handle: InvokeHandle) -> bool {
        self.entries
            .iter()
            .any(|entry| entry.handle == handle && !entry.cancelled)
    }

    /// Whether any live entry dispatches to `method`.
    pub fn is_invoking_method(&self, method: &str) -> bool {
        self.entries
            .iter()
            .any(|entry| !entry.cancelled && entry.method_name.as_deref() == Some(method))
    }

    /// Whether any live entry exists.
    pub fn is_invoking_any(&self) -> bool {
        self.entries.iter().any(|entry| !entry.cancelled)
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|entry| !entry.cancelled).count()
    }

    /// Returns true if no live entry exists.
    pub fn is_empty(&self) -> bool {
        !self.is_invoking_any()
    }

    fn entry_mut(&mut self, handle: InvokeHandle) -> Option<&mut InvokeRequest> {
        self.entries.iter_mut().find(|entry| entry.handle == handle)
    }
}

impl Default for InvokeScheduler {
    fn default() -> Self {
        Self::new()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn method(name: &str) -> InvokeTarget {
        InvokeTarget::Method(name.into())
    }

    // Drives one full tick pass the way the scene coordinator does,
    // returning how many entries fired.
    fn run_pass(scheduler: &mut InvokeScheduler, now: f64) -> usize {
        let due = scheduler.due_handles(now);
        let mut fired = 0;
        for handle in due {
            if let Some(target) = scheduler.take_target(handle) {
                scheduler.restore_target(handle, target);
                scheduler.complete_firing(handle, now);
                fired += 1;
            }
        }
        scheduler.compact();
        fired
    }

    //--- Scheduling Tests -------------------------------------------------

    #[test]
    fn one_shot_fires_once_at_its_due_time() {
        let mut scheduler = InvokeScheduler::new();
        scheduler.schedule(method("fire"), 1.0, TickPolicy::WhileGameObjectActive, 0.0, false, 0.0);

        assert_eq!(run_pass(&mut scheduler, 0.5), 0);
        assert_eq!(run_pass(&mut scheduler, 1.0), 1);
        assert_eq!(run_pass(&mut scheduler, 2.0), 0);
        assert!(!scheduler.is_invoking_any());
    }

    #[test]
    fn negative_delay_clamps_to_now() {
        let mut scheduler = InvokeScheduler::new();
        scheduler.schedule(method("fire"), -3.0, TickPolicy::WhileGameObjectActive, 0.0, false, 10.0);
        assert_eq!(run_pass(&mut scheduler, 10.0), 1);
    }

    #[test]
    fn scheduling_while_disabled_starts_policy_requests_paused() {
        let mut scheduler = InvokeScheduler::new();
        scheduler.set_owner_enabled(false, 0.0);

        let held = scheduler.schedule(
            method("held"),
            1.0,
            TickPolicy::WhileBehaviourEnabled,
            0.0,
            false,
            0.0,
        );
        let free = scheduler.schedule(
            method("free"),
            1.0,
            TickPolicy::WhileGameObjectActive,
            0.0,
            false,
            0.0,
        );

        // Only the object-active request fires while the owner is disabled.
        let due = scheduler.due_handles(5.0);
        assert_eq!(due, vec![free]);

        // Re-enable at t=4: the held request fires its full delay later.
        scheduler.set_owner_enabled(true, 4.0);
        assert!(!scheduler.due_handles(4.5).contains(&held));
        assert!(scheduler.due_handles(5.0).contains(&held));
    }

    //--- Repeating Tests --------------------------------------------------

    #[test]
    fn repeating_invoke_has_no_drift_over_many_ticks() {
        let mut scheduler = InvokeScheduler::new();
        let delay = 1.0;
        let rate = 0.5;
        scheduler.schedule(
            method("fire"),
            delay,
            TickPolicy::WhileGameObjectActive,
            rate,
            true,
            0.0,
        );

        let mut firings = 0;
        let ticks = 10_000;
        for k in 0..=ticks {
            let now = delay + k as f64 * rate;
            firings += run_pass(&mut scheduler, now);
        }
        assert_eq!(firings, ticks + 1);

        // After the final firing the due time sits exactly one rate ahead.
        let expected = delay + (ticks + 1) as f64 * rate;
        let next = scheduler.entries[0].next_time;
        assert_abs_diff_eq!(next, expected, epsilon = 1e-6);
    }

    #[test]
    fn long_stall_produces_one_catch_up_firing_per_tick() {
        let mut scheduler = InvokeScheduler::new();
        scheduler.schedule(method("fire"), 1.0, TickPolicy::WhileGameObjectActive, 1.0, true, 0.0);

        // The clock jumps far past several periods: a single firing, and
        // the due time lands beyond now.
        assert_eq!(run_pass(&mut scheduler, 10.0), 1);
        assert!(scheduler.entries[0].next_time > 10.0);
        assert_eq!(run_pass(&mut scheduler, 10.5), 0);
        assert_eq!(run_pass(&mut scheduler, 11.0), 1);
    }

    #[test]
    fn zero_rate_repeating_fires_every_tick() {
        let mut scheduler = InvokeScheduler::new();
        scheduler.schedule(method("fire"), 0.0, TickPolicy::WhileGameObjectActive, 0.0, true, 0.0);

        assert_eq!(run_pass(&mut scheduler, 0.0), 1);
        assert_eq!(run_pass(&mut scheduler, 0.01), 1);
        assert_eq!(run_pass(&mut scheduler, 0.02), 1);
        assert!(scheduler.is_invoking_any());
    }

    //--- Cancellation Tests -----------------------------------------------

    #[test]
    fn cancelled_entry_never_fires_again() {
        let mut scheduler = InvokeScheduler::new();
        let handle = scheduler.schedule(
            method("fire"),
            0.0,
            TickPolicy::WhileGameObjectActive,
            1.0,
            true,
            0.0,
        );
        assert_eq!(run_pass(&mut scheduler, 0.0), 1);
        scheduler.cancel(handle);
        assert_eq!(run_pass(&mut scheduler, 10.0), 0);
        assert!(!scheduler.is_invoking(handle));
    }

    #[test]
    fn cancellation_mid_pass_prevents_the_firing() {
        let mut scheduler = InvokeScheduler::new();
        let a = scheduler.schedule(method("a"), 0.0, TickPolicy::WhileGameObjectActive, 0.0, false, 0.0);
        let b = scheduler.schedule(method("b"), 0.0, TickPolicy::WhileGameObjectActive, 0.0, false, 0.0);

        // Both are in the due snapshot; `a`'s callback cancels `b` before
        // `b` is reached.
        let due = scheduler.due_handles(0.0);
        assert_eq!(due, vec![a, b]);
        assert!(scheduler.take_target(a).is_some());
        scheduler.cancel(b);
        assert!(scheduler.take_target(b).is_none());
    }

    #[test]
    fn cancel_by_method_name_hits_all_matches() {
        let mut scheduler = InvokeScheduler::new();
        scheduler.schedule(method("blink"), 1.0, TickPolicy::WhileGameObjectActive, 0.0, false, 0.0);
        scheduler.schedule(method("blink"), 2.0, TickPolicy::WhileGameObjectActive, 0.0, false, 0.0);
        let other = scheduler.schedule(
            method("step"),
            3.0,
            TickPolicy::WhileGameObjectActive,
            0.0,
            false,
            0.0,
        );

        scheduler.cancel_method("blink");
        assert!(!scheduler.is_invoking_method("blink"));
        assert!(scheduler.is_invoking(other));
    }

    #[test]
    fn cancel_unknown_handle_is_a_no_op() {
        let mut scheduler = InvokeScheduler::new();
        scheduler.cancel(InvokeHandle(999));
        assert!(scheduler.is_empty());
    }

    #[test]
    fn cancel_all_empties_the_scheduler() {
        let mut scheduler = InvokeScheduler::new();
        scheduler.schedule(method("a"), 1.0, TickPolicy::WhileGameObjectActive, 0.0, false, 0.0);
        scheduler.schedule(method("b"), 2.0, TickPolicy::WhileBehaviourEnabled, 0.0, false, 0.0);
        scheduler.cancel_all();
        assert!(!scheduler.is_invoking_any());
        scheduler.compact();
        assert_eq!(scheduler.entries.len(), 0);
    }

    //--- Pause / Resume Tests ---------------------------------------------

    #[test]
    fn resume_fires_at_resume_time_plus_remaining() {
        let mut scheduler = InvokeScheduler::new();
        let handle = scheduler.schedule(
            method("fire"),
            2.0,
            TickPolicy::WhileGameObjectActive,
            0.0,
            false,
            0.0,
        );

        // Pause at t=0.5 with 1.5 remaining; resume at t=10.
        scheduler.pause(handle, 0.5);
        assert_eq!(run_pass(&mut scheduler, 5.0), 0);
        scheduler.resume(handle, 10.0);

        // Not at the original due time, and not immediately...
        assert_eq!(run_pass(&mut scheduler, 10.0), 0);
        assert_eq!(run_pass(&mut scheduler, 11.0), 0);
        // ...but exactly remaining seconds after the resume.
        assert_eq!(run_pass(&mut scheduler, 11.5), 1);
    }

    #[test]
    fn pause_and_resume_are_idempotent() {
        let mut scheduler = InvokeScheduler::new();
        let handle = scheduler.schedule(
            method("fire"),
            2.0,
            TickPolicy::WhileGameObjectActive,
            0.0,
            false,
            0.0,
        );
        scheduler.pause(handle, 1.0);
        scheduler.pause(handle, 1.5);
        scheduler.resume(handle, 3.0);
        scheduler.resume(handle, 9.0);
        // Remaining was captured once, at the first pause.
        assert_eq!(run_pass(&mut scheduler, 3.9), 0);
        assert_eq!(run_pass(&mut scheduler, 4.0), 1);
    }

    #[test]
    fn restart_rearms_at_the_original_delay() {
        let mut scheduler = InvokeScheduler::new();
        let handle = scheduler.schedule(
            method("fire"),
            3.0,
            TickPolicy::WhileGameObjectActive,
            0.0,
            false,
            0.0,
        );
        scheduler.restart(handle, 10.0);
        assert_eq!(run_pass(&mut scheduler, 12.9), 0);
        assert_eq!(run_pass(&mut scheduler, 13.0), 1);
    }

    #[test]
    fn explicit_resume_cannot_bypass_the_enabled_policy() {
        let mut scheduler = InvokeScheduler::new();
        let handle = scheduler.schedule(
            method("fire"),
            1.0,
            TickPolicy::WhileBehaviourEnabled,
            0.0,
            false,
            0.0,
        );
        scheduler.set_owner_enabled(false, 0.4);
        scheduler.resume(handle, 0.5);
        assert_eq!(run_pass(&mut scheduler, 5.0), 0);

        scheduler.set_owner_enabled(true, 5.0);
        assert_eq!(run_pass(&mut scheduler, 5.6), 1);
    }

    #[test]
    fn pause_all_and_resume_all_round_trip() {
        let mut scheduler = InvokeScheduler::new();
        scheduler.schedule(method("a"), 1.0, TickPolicy::WhileGameObjectActive, 0.0, false, 0.0);
        scheduler.schedule(method("b"), 2.0, TickPolicy::WhileGameObjectActive, 0.0, false, 0.0);

        scheduler.pause_all(0.5);
        assert_eq!(run_pass(&mut scheduler, 10.0), 0);

        scheduler.resume_all(10.0);
        assert_eq!(run_pass(&mut scheduler, 10.5), 1);
        assert_eq!(run_pass(&mut scheduler, 11.5), 1);
    }

    //--- Owner Enabled Wiring Tests ---------------------------------------

    #[test]
    fn disable_then_enable_preserves_remaining_time_exactly() {
        // The pause contract end to end: delay 1.0, disabled at 0.4
        // (0.6 remaining), re-enabled at 2.0, so the firing lands at 2.6.
        let mut scheduler = InvokeScheduler::new();
        scheduler.schedule(
            method("fire"),
            1.0,
            TickPolicy::WhileBehaviourEnabled,
            0.5,
            true,
            0.0,
        );

        scheduler.set_owner_enabled(false, 0.4);
        assert_eq!(run_pass(&mut scheduler, 1.0), 0);
        assert_eq!(run_pass(&mut scheduler, 2.0), 0);

        scheduler.set_owner_enabled(true, 2.0);
        assert_eq!(run_pass(&mut scheduler, 2.5), 0);
        assert_eq!(run_pass(&mut scheduler, 2.6), 1);
        // Repeats continue from the re-anchored time.
        assert_eq!(run_pass(&mut scheduler, 3.1), 1);
    }

    #[test]
    fn object_active_requests_ignore_enabled_wiring() {
        let mut scheduler = InvokeScheduler::new();
        scheduler.schedule(
            method("fire"),
            1.0,
            TickPolicy::WhileGameObjectActive,
            0.0,
            false,
            0.0,
        );
        scheduler.set_owner_enabled(false, 0.2);
        assert_eq!(run_pass(&mut scheduler, 1.0), 1);
    }

    #[test]
    fn redundant_owner_enabled_updates_do_not_reanchor() {
        let mut scheduler = InvokeScheduler::new();
        scheduler.schedule(
            method("fire"),
            1.0,
            TickPolicy::WhileBehaviourEnabled,
            0.0,
            false,
            0.0,
        );
        scheduler.set_owner_enabled(true, 0.5);
        assert_eq!(run_pass(&mut scheduler, 1.0), 1);
    }
}
