//=========================================================================
// Behaviour Context
//=========================================================================
//
// The scene handle passed into every user hook.
//
// A Context is the full scene surface minus the frame drivers: a callback
// may create, destroy, query, re-enable and schedule freely, but it can
// never recursively run `tick`/`drain_lifecycle`/`process_destroy_queue`
// from inside a hook. Invoke helpers without an explicit target aim at
// the behaviour currently executing.
//
//=========================================================================

//=== Internal Dependencies ===============================================

use crate::core::invoke::{InvokeHandle, InvokeTarget, TickPolicy};
use crate::core::registry::ObjectId;

use super::{Behaviour, BehaviourId, Scene};

//=== Context =============================================================

/// Scene access scoped to one executing hook.
pub struct Context<'a> {
    scene: &'a mut Scene,
    behaviour: BehaviourId,
    object: ObjectId,
}

impl<'a> Context<'a> {
    pub(crate) fn new(scene: &'a mut Scene, behaviour: BehaviourId, object: ObjectId) -> Self {
        Self {
            scene,
            behaviour,
            object,
        }
    }

    //--- Identity ---------------------------------------------------------

    /// The behaviour this hook is executing on.
    pub fn behaviour_id(&self) -> BehaviourId {
        self.behaviour
    }

    /// The object owning the executing behaviour.
    pub fn object_id(&self) -> ObjectId {
        self.object
    }

    //--- Time -------------------------------------------------------------

    /// Current scaled game time in seconds.
    pub fn now(&self) -> f64 {
        self.scene.now()
    }

    /// Current real (unscaled) time in seconds.
    pub fn unscaled_now(&self) -> f64 {
        self.scene.unscaled_now()
    }

    //--- Object Surface ---------------------------------------------------

    /// Creates a new root object. See [`Scene::spawn`].
    pub fn spawn(&mut self, name: impl Into<String>) -> ObjectId {
        self.scene.spawn(name)
    }

    /// Creates a new child object. See [`Scene::spawn_child`].
    pub fn spawn_child(&mut self, parent: ObjectId, name: impl Into<String>) -> Option<ObjectId> {
        self.scene.spawn_child(parent, name)
    }

    /// Attaches a behaviour to an object. See [`Scene::add_behaviour`].
    pub fn add_behaviour<B: Behaviour>(
        &mut self,
        object: ObjectId,
        behaviour: B,
    ) -> Option<BehaviourId> {
        self.scene.add_behaviour(object, behaviour)
    }

    /// Requests deferred destruction of an object and its subtree.
    pub fn destroy(&mut self, object: ObjectId, delay: f64) {
        self.scene.destroy(object, delay);
    }

    /// Requests deferred destruction of the executing behaviour's own
    /// object. Valid from any hook, including `awake`.
    pub fn destroy_self(&mut self, delay: f64) {
        self.scene.destroy(self.object, delay);
    }

    /// Reparents an object. See [`Scene::set_parent`].
    pub fn set_parent(&mut self, child: ObjectId, parent: Option<ObjectId>) {
        self.scene.set_parent(child, parent);
    }

    //--- Activation -------------------------------------------------------

    /// Flips an object's own active flag. See [`Scene::set_active`].
    pub fn set_active(&mut self, object: ObjectId, active: bool) {
        self.scene.set_active(object, active);
    }

    /// Flips another behaviour's enabled flag. See [`Scene::set_enabled`].
    pub fn set_enabled(&mut self, behaviour: BehaviourId, enabled: bool) {
        self.scene.set_enabled(behaviour, enabled);
    }

    /// Flips the executing behaviour's own enabled flag.
    pub fn set_self_enabled(&mut self, enabled: bool) {
        self.scene.set_enabled(self.behaviour, enabled);
    }

    /// Whether the executing behaviour is effectively active.
    pub fn is_active_and_enabled(&self) -> bool {
        self.scene.is_active_and_enabled(self.behaviour)
    }

    //--- Queries ----------------------------------------------------------

    /// Whether the object existed and has been finalized.
    pub fn is_destroyed(&self, object: ObjectId) -> bool {
        self.scene.is_destroyed(object)
    }

    /// Display name of a live object.
    pub fn object_name(&self, object: ObjectId) -> Option<&str> {
        self.scene.object_name(object)
    }

    /// Renames a live object.
    pub fn set_object_name(&mut self, object: ObjectId, name: impl Into<String>) {
        self.scene.set_object_name(object, name);
    }

    /// First live object with the given name, in creation order.
    pub fn find_object_by_name(&self, name: &str) -> Option<ObjectId> {
        self.scene.find_object_by_name(name)
    }

    /// Live objects carrying a behaviour with `tag`. See
    /// [`Scene::find_objects_by_tag`].
    pub fn find_objects_by_tag(&self, tag: &str, include_inactive: bool) -> Vec<ObjectId> {
        self.scene.find_objects_by_tag(tag, include_inactive)
    }

    //--- Self-Targeted Invokes --------------------------------------------

    /// Schedules a one-shot named-method invoke on the executing
    /// behaviour.
    pub fn invoke(&mut self, method: &str, delay: f64) -> Option<InvokeHandle> {
        self.scene.invoke(self.behaviour, method, delay)
    }

    /// Schedules a repeating named-method invoke on the executing
    /// behaviour: first firing after `delay`, then every `rate` seconds.
    pub fn invoke_repeating(&mut self, method: &str, delay: f64, rate: f64) -> Option<InvokeHandle> {
        self.scene.invoke_repeating(self.behaviour, method, delay, rate)
    }

    /// Schedules an invoke on the executing behaviour with full control
    /// over target, policy and repetition.
    pub fn schedule_invoke(
        &mut self,
        target: InvokeTarget,
        delay: f64,
        policy: TickPolicy,
        rate: f64,
        repeating: bool,
    ) -> Option<InvokeHandle> {
        self.scene
            .schedule_invoke(self.behaviour, target, delay, policy, rate, repeating)
    }

    /// Cancels one invoke on the executing behaviour.
    pub fn cancel_invoke(&mut self, handle: InvokeHandle) {
        self.scene.cancel_invoke(self.behaviour, handle);
    }

    /// Cancels every invoke on the executing behaviour dispatching to
    /// `method`.
    pub fn cancel_invoke_method(&mut self, method: &str) {
        self.scene.cancel_invoke_method(self.behaviour, method);
    }

    /// Cancels every invoke on the executing behaviour.
    pub fn cancel_all_invokes(&mut self) {
        self.scene.cancel_all_invokes(self.behaviour);
    }

    /// Whether the handle refers to a live invoke on the executing
    /// behaviour.
    pub fn is_invoking(&self, handle: InvokeHandle) -> bool {
        self.scene.is_invoking(self.behaviour, handle)
    }

    /// Whether any live invoke on the executing behaviour dispatches to
    /// `method`.
    pub fn is_invoking_method(&self, method: &str) -> bool {
        self.scene.is_invoking_method(self.behaviour, method)
    }

    /// Whether the executing behaviour has any live invoke.
    pub fn is_invoking_any(&self) -> bool {
        self.scene.is_invoking_any(self.behaviour)
    }

    /// Pauses one invoke, capturing its remaining time.
    pub fn pause_invoke(&mut self, handle: InvokeHandle) {
        self.scene.pause_invoke(self.behaviour, handle);
    }

    /// Resumes one invoke at now plus its captured remainder.
    pub fn resume_invoke(&mut self, handle: InvokeHandle) {
        self.scene.resume_invoke(self.behaviour, handle);
    }

    /// Re-arms one invoke at its original delay from now.
    pub fn restart_invoke(&mut self, handle: InvokeHandle) {
        self.scene.restart_invoke(self.behaviour, handle);
    }

    /// Pauses every invoke on the executing behaviour.
    pub fn pause_all_invokes(&mut self) {
        self.scene.pause_all_invokes(self.behaviour);
    }

    /// Resumes every invoke on the executing behaviour the enabled policy
    /// allows.
    pub fn resume_all_invokes(&mut self) {
        self.scene.resume_all_invokes(self.behaviour);
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
