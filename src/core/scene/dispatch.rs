//=========================================================================
// Lifecycle Dispatch
//=========================================================================
//
// Hook execution, the pending-batch drain, the frame tick, and deferred
// finalization.
//
// Re-entrancy is the governing constraint here: any user callback may
// create objects, destroy objects, toggle enabled state or schedule new
// invokes. Every loop below iterates a stable snapshot and re-checks
// liveness/activity per element, so mid-pass mutation never skips or
// double-fires anything.
//
// Hook dispatch itself uses take-and-put-back: the boxed behaviour is
// removed from its cell for the duration of the call, the callback gets
// a Context with full scene access, and the box is restored afterwards.
// A hook a behaviour triggers on *itself* mid-callback finds the slot
// empty and is deferred until the current callback returns.
//
//=========================================================================

//=== External Dependencies ===============================================

use log::debug;

//=== Internal Dependencies ===============================================

use crate::core::error::LifecycleError;
use crate::core::invoke::InvokeTarget;
use crate::core::registry::ObjectId;

use super::{Behaviour, BehaviourId, Context, Scene};

//=== Contact Events ======================================================

/// Which edge of a contact the physics collaborator is reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactPhase {
    Enter,
    Stay,
    Exit,
}

/// A solid contact reported by the external physics collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionEvent {
    /// The other object involved in the contact.
    pub other: ObjectId,
    pub phase: ContactPhase,
}

/// A trigger-volume overlap reported by the external physics collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerEvent {
    /// The other object involved in the overlap.
    pub other: ObjectId,
    pub phase: ContactPhase,
}

//=== Hook ================================================================

/// One dispatchable user callback.
#[derive(Debug)]
pub(crate) enum Hook {
    Awake,
    OnEnable,
    Start,
    Update,
    FixedUpdate,
    LateUpdate,
    OnDisable,
    OnDestroy,
    InvokeMethod(String),
    Collision(CollisionEvent),
    Trigger(TriggerEvent),
}

impl Hook {
    fn call(self, behaviour: &mut dyn Behaviour, ctx: &mut Context) {
        match self {
            Hook::Awake => behaviour.awake(ctx),
            Hook::OnEnable => behaviour.on_enable(ctx),
            Hook::Start => behaviour.start(ctx),
            Hook::Update => behaviour.update(ctx),
            Hook::FixedUpdate => behaviour.fixed_update(ctx),
            Hook::LateUpdate => behaviour.late_update(ctx),
            Hook::OnDisable => behaviour.on_disable(ctx),
            Hook::OnDestroy => behaviour.on_destroy(ctx),
            Hook::InvokeMethod(name) => {
                if !behaviour.on_invoke(&name, ctx) {
                    debug!("unhandled invoke method '{}' on {:?}", name, ctx.behaviour_id());
                }
            }
            Hook::Collision(event) => behaviour.on_collision(event, ctx),
            Hook::Trigger(event) => behaviour.on_trigger(event, ctx),
        }
    }
}

//=== Dispatch ============================================================

impl Scene {
    //--- Hook Execution ---------------------------------------------------

    /// Executes one hook on one behaviour.
    ///
    /// If the behaviour is currently inside one of its own callbacks (the
    /// hooks slot is empty), the hook is deferred and replayed as soon as
    /// that callback returns; guard flags were already committed by the
    /// trigger, so exactly-once and alternation are unaffected.
    pub(crate) fn run_hook(&mut self, id: BehaviourId, hook: Hook) {
        let Some(cell) = self.behaviours.get_mut(&id) else {
            return;
        };
        let object = cell.owner;
        let Some(mut hooks) = cell.hooks.take() else {
            self.deferred_hooks.push((id, hook));
            return;
        };

        {
            let mut ctx = Context::new(self, id, object);
            hook.call(hooks.as_mut(), &mut ctx);
        }

        match self.behaviours.get_mut(&id) {
            Some(cell) => cell.hooks = Some(hooks),
            None => {
                // The cell was torn down while the callback ran; any work
                // it deferred against itself dies with it.
                self.deferred_hooks.retain(|(b, _)| *b != id);
                return;
            }
        }

        while let Some(pos) = self.deferred_hooks.iter().position(|(b, _)| *b == id) {
            let (_, deferred) = self.deferred_hooks.remove(pos);
            self.run_hook(id, deferred);
        }
    }

    //--- Guarded Triggers -------------------------------------------------

    /// Fires Awake if it never fired. Safe to call repeatedly.
    pub(crate) fn trigger_awake(&mut self, id: BehaviourId) {
        let Some(cell) = self.behaviours.get_mut(&id) else {
            return;
        };
        if !cell.lifecycle.begin_awake() {
            return;
        }
        self.run_hook(id, Hook::Awake);
    }

    /// Fires OnEnable if an enable is owed. Safe to call repeatedly.
    pub(crate) fn trigger_enable(&mut self, id: BehaviourId) {
        let Some(cell) = self.behaviours.get_mut(&id) else {
            return;
        };
        if !cell.lifecycle.begin_enable() {
            return;
        }
        self.run_hook(id, Hook::OnEnable);
    }

    /// Fires OnDisable if a disable is owed. Safe to call repeatedly.
    pub(crate) fn trigger_disable(&mut self, id: BehaviourId) {
        let Some(cell) = self.behaviours.get_mut(&id) else {
            return;
        };
        if !cell.lifecycle.begin_disable() {
            return;
        }
        self.run_hook(id, Hook::OnDisable);
    }

    /// Fires Start if it never fired and the behaviour is awoken and
    /// enabled.
    pub(crate) fn trigger_start(&mut self, id: BehaviourId) {
        let Some(cell) = self.behaviours.get_mut(&id) else {
            return;
        };
        if !cell.lifecycle.begin_start() {
            return;
        }
        self.run_hook(id, Hook::Start);
    }

    /// Fires the destruction callbacks exactly once: OnDisable first if
    /// the behaviour is enabled, then OnDestroy if it was ever active.
    pub(crate) fn trigger_destroy(&mut self, id: BehaviourId) {
        let Some(cell) = self.behaviours.get_mut(&id) else {
            return;
        };
        let Some(steps) = cell.lifecycle.begin_destroy() else {
            return;
        };
        if steps.disable {
            self.run_hook(id, Hook::OnDisable);
        }
        if steps.destroy {
            self.run_hook(id, Hook::OnDestroy);
        }
    }

    //--- Pending Batch ----------------------------------------------------

    /// Adds a behaviour to the pending Awake/OnEnable/Start batch.
    /// Idempotent: queueing twice before a drain processes once.
    pub fn queue_lifecycle(&mut self, behaviour: BehaviourId) {
        self.pending.insert(behaviour);
    }

    /// Processes the pending batch.
    ///
    /// The batch is snapshotted and cleared first, so `queue_lifecycle`
    /// calls made by the callbacks below accumulate for the *next* drain.
    /// Two passes: Awake+OnEnable over the snapshot (skipping entries no
    /// longer valid or effective), then Start for every entry that ended
    /// pass one enabled and never started, re-checked at fire time
    /// because a sibling's OnEnable may have disabled it meanwhile.
    pub fn drain_lifecycle(&mut self) -> Result<(), LifecycleError> {
        let batch = self.pending.take();
        let mut start_candidates = Vec::with_capacity(batch.len());

        for id in batch {
            let Some(cell) = self.behaviours.get(&id) else {
                continue;
            };
            let owner = cell.owner;
            if !self.objects.contains_key(&owner) {
                return Err(LifecycleError::OrphanedBehaviour {
                    behaviour: id,
                    owner,
                });
            }
            if !self.is_active_and_enabled(id) {
                continue;
            }
            self.trigger_awake(id);
            if !self.is_active_and_enabled(id) {
                // Its own Awake disabled or deactivated it.
                continue;
            }
            self.trigger_enable(id);
            let eligible = self.behaviours.get(&id).map_or(false, |cell| {
                cell.lifecycle.enable_called() && !cell.lifecycle.started()
            });
            if eligible {
                start_candidates.push(id);
            }
        }

        for id in start_candidates {
            if self.is_active_and_enabled(id) {
                self.trigger_start(id);
            }
        }
        Ok(())
    }

    /// Queues every behaviour in the scene and drains once.
    ///
    /// Called at scene activation so pre-existing behaviours become live
    /// before the first frame.
    pub fn activate(&mut self) -> Result<(), LifecycleError> {
        let all: Vec<BehaviourId> = self.behaviours.keys().copied().collect();
        for id in all {
            self.queue_lifecycle(id);
        }
        self.drain_lifecycle()
    }

    //--- Frame Tick -------------------------------------------------------

    /// Runs one full frame:
    ///
    /// 1. drain (newly created/activated behaviours become live)
    /// 2. per active object, creation order: invoke ticking, then
    ///    `update` for effectively-active behaviours
    /// 3. `late_update` pass over the same snapshot
    /// 4. drain again (work queued by frame callbacks lands this frame)
    /// 5. destroy-queue pass
    pub fn tick(&mut self) -> Result<(), LifecycleError> {
        self.drain_lifecycle()?;
        let now = self.clock.now();
        let frame = self.active_object_snapshot();

        for object in &frame {
            let behaviours = match self.objects.get(object) {
                Some(obj) if obj.active_in_hierarchy => obj.behaviours.clone(),
                _ => continue,
            };
            for behaviour in behaviours {
                if !self.active_in_hierarchy(*object) {
                    // A callback deactivated the object mid-loop; the
                    // rest of its behaviours sit this frame out.
                    break;
                }
                self.tick_invokes(behaviour, now);
                if self.is_live_for_update(behaviour) {
                    self.run_hook(behaviour, Hook::Update);
                }
            }
        }

        for object in &frame {
            let behaviours = match self.objects.get(object) {
                Some(obj) if obj.active_in_hierarchy => obj.behaviours.clone(),
                _ => continue,
            };
            for behaviour in behaviours {
                if self.is_live_for_update(behaviour) {
                    self.run_hook(behaviour, Hook::LateUpdate);
                }
            }
        }

        self.drain_lifecycle()?;
        let end = self.clock.now();
        self.process_destroy_queue(end)?;
        Ok(())
    }

    /// Runs one fixed-timestep step: `fixed_update` for every
    /// effectively-active behaviour, creation order.
    pub fn fixed_tick(&mut self) -> Result<(), LifecycleError> {
        self.drain_lifecycle()?;
        for object in self.active_object_snapshot() {
            let behaviours = match self.objects.get(&object) {
                Some(obj) if obj.active_in_hierarchy => obj.behaviours.clone(),
                _ => continue,
            };
            for behaviour in behaviours {
                if self.is_live_for_update(behaviour) {
                    self.run_hook(behaviour, Hook::FixedUpdate);
                }
            }
        }
        Ok(())
    }

    fn active_object_snapshot(&self) -> Vec<ObjectId> {
        self.objects
            .iter()
            .filter(|(_, obj)| obj.active_in_hierarchy)
            .map(|(id, _)| *id)
            .collect()
    }

    // Update-family hooks require a completed OnEnable: a behaviour
    // created mid-frame waits for its drain before it ever updates.
    fn is_live_for_update(&self, id: BehaviourId) -> bool {
        self.is_active_and_enabled(id)
            && self
                .behaviours
                .get(&id)
                .map_or(false, |cell| cell.lifecycle.enable_called())
    }

    //--- Invoke Ticking ---------------------------------------------------

    /// Fires every due invoke on one behaviour.
    ///
    /// The due set is a snapshot; each firing re-checks cancellation (a
    /// callback earlier in the pass may have cancelled it) and the
    /// scheduler compacts cancelled entries afterwards.
    pub(crate) fn tick_invokes(&mut self, id: BehaviourId, now: f64) {
        let due = match self.behaviours.get(&id) {
            Some(cell) => cell.invokes.due_handles(now),
            None => return,
        };

        for handle in due {
            let target = match self.behaviours.get_mut(&id) {
                Some(cell) => cell.invokes.take_target(handle),
                None => return,
            };
            let Some(target) = target else {
                continue;
            };

            match target {
                InvokeTarget::Method(name) => {
                    self.run_hook(id, Hook::InvokeMethod(name.clone()));
                    if let Some(cell) = self.behaviours.get_mut(&id) {
                        cell.invokes.restore_target(handle, InvokeTarget::Method(name));
                    }
                }
                InvokeTarget::Callback(mut callback) => {
                    let object = match self.behaviours.get(&id) {
                        Some(cell) => cell.owner,
                        None => return,
                    };
                    {
                        let mut ctx = Context::new(self, id, object);
                        callback(&mut ctx);
                    }
                    if let Some(cell) = self.behaviours.get_mut(&id) {
                        cell.invokes
                            .restore_target(handle, InvokeTarget::Callback(callback));
                    }
                }
            }

            if let Some(cell) = self.behaviours.get_mut(&id) {
                cell.invokes.complete_firing(handle, now);
            }
        }

        if let Some(cell) = self.behaviours.get_mut(&id) {
            cell.invokes.compact();
        }
    }

    //--- Deferred Destruction ---------------------------------------------

    /// Finalizes every destroy request due at `now`. Returns how many
    /// objects were finalized.
    ///
    /// The due set is a stable snapshot: destroy requests issued by
    /// teardown hooks land in the queue for a later call, even at the
    /// same timestamp. Entries whose target was already finalized as part
    /// of an ancestor's subtree are skipped; a target the object table
    /// and registry disagree about is an invariant breach.
    pub fn process_destroy_queue(&mut self, now: f64) -> Result<usize, LifecycleError> {
        let due = self.registry.take_due(now);
        let mut finalized = 0;
        for id in due {
            match (self.objects.contains_key(&id), self.registry.is_live(id)) {
                (true, true) => {
                    self.finalize_object(id);
                    finalized += 1;
                }
                (false, false) => {}
                _ => return Err(LifecycleError::AlreadyFinalized(id)),
            }
        }
        Ok(finalized)
    }

    // Tears down one object and its whole subtree: destruction callbacks
    // for every behaviour first (top-down), then table removal. Subtree
    // membership is captured before any callback runs.
    fn finalize_object(&mut self, root: ObjectId) {
        if let Some(parent) = self.objects.get(&root).and_then(|obj| obj.parent) {
            if let Some(parent_obj) = self.objects.get_mut(&parent) {
                parent_obj.children.retain(|id| *id != root);
            }
        }

        let mut order = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if let Some(obj) = self.objects.get(&id) {
                order.push(id);
                stack.extend(obj.children.iter().copied());
            }
        }

        for object in &order {
            let behaviours = self
                .objects
                .get(object)
                .map(|obj| obj.behaviours.clone())
                .unwrap_or_default();
            for behaviour in behaviours {
                self.trigger_destroy(behaviour);
            }
        }

        for object in order.into_iter().rev() {
            let behaviours = self
                .objects
                .get(&object)
                .map(|obj| obj.behaviours.clone())
                .unwrap_or_default();
            for behaviour in behaviours {
                self.behaviours.remove(&behaviour);
            }
            self.objects.remove(&object);
            self.registry.unregister(object);
            debug!("finalized object {:?}", object);
        }
    }

    //--- External Collaborator Entry Points -------------------------------

    /// Routes a physics contact to every effectively-active behaviour on
    /// the object.
    pub fn dispatch_collision(&mut self, object: ObjectId, event: CollisionEvent) {
        for behaviour in self.behaviours_of(object) {
            if self.is_live_for_update(behaviour) {
                self.run_hook(behaviour, Hook::Collision(event));
            }
        }
    }

    /// Routes a trigger overlap to every effectively-active behaviour on
    /// the object.
    pub fn dispatch_trigger(&mut self, object: ObjectId, event: TriggerEvent) {
        for behaviour in self.behaviours_of(object) {
            if self.is_live_for_update(behaviour) {
                self.run_hook(behaviour, Hook::Trigger(event));
            }
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
