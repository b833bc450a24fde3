//=========================================================================
// Scene
//=========================================================================
//
// Coordinator owning every table of the lifecycle runtime.
//
// There is no global state: each Scene is a fully independent instance,
// so parallel tests and multiple worlds never interfere. The scene is
// single-threaded by design; a multithreaded host must serialize access
// per scene.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::collections::BTreeMap;

use log::{debug, warn};

//=== Internal Dependencies ===============================================

use crate::core::invoke::{InvokeHandle, InvokeTarget, TickPolicy};
use crate::core::lifecycle::PendingSet;
use crate::core::registry::{ObjectId, ObjectRegistry};
use crate::core::time::{ScaledClock, TimeSource};

use super::object::{BehaviourCell, GameObject};
use super::{Behaviour, BehaviourId, Hook};

//=== Scene ===============================================================

/// The component lifecycle and deferred-scheduling runtime.
///
/// Owns the object registry, the containment tables, the pending
/// lifecycle batch and the clock. Host code drives it with
/// [`tick`](Scene::tick) / [`fixed_tick`](Scene::fixed_tick); behaviours
/// talk back through [`Context`](super::Context).
///
/// # Example
///
/// ```
/// use orrery_engine::prelude::*;
///
/// struct Greeter;
///
/// impl Behaviour for Greeter {
///     fn start(&mut self, ctx: &mut Context) {
///         log::info!("hello from object {:?}", ctx.object_id());
///     }
/// }
///
/// let mut scene = Scene::new();
/// let player = scene.spawn("player");
/// scene.add_behaviour(player, Greeter);
/// scene.tick().unwrap();
/// ```
pub struct Scene {
    pub(crate) clock: Box<dyn TimeSource>,
    pub(crate) registry: ObjectRegistry,
    pub(crate) objects: BTreeMap<ObjectId, GameObject>,
    pub(crate) behaviours: BTreeMap<BehaviourId, BehaviourCell>,
    pub(crate) pending: PendingSet,
    /// Hooks a behaviour triggered on itself from inside one of its own
    /// callbacks; replayed as soon as that callback returns.
    pub(crate) deferred_hooks: Vec<(BehaviourId, Hook)>,
    next_behaviour: u64,
}

impl Scene {
    //--- Construction -----------------------------------------------------

    /// Creates a scene on a real-time [`ScaledClock`].
    pub fn new() -> Self {
        Self::with_clock(ScaledClock::new())
    }

    /// Creates a scene on the given clock.
    ///
    /// Tests typically pass a [`ManualClock`](crate::core::time::ManualClock)
    /// handle and advance it explicitly between ticks.
    pub fn with_clock(clock: impl TimeSource + 'static) -> Self {
        Self {
            clock: Box::new(clock),
            registry: ObjectRegistry::new(),
            objects: BTreeMap::new(),
            behaviours: BTreeMap::new(),
            pending: PendingSet::new(),
            deferred_hooks: Vec::new(),
            next_behaviour: 0,
        }
    }

    //--- Time -------------------------------------------------------------

    /// Current scaled game time in seconds.
    pub fn now(&self) -> f64 {
        self.clock.now()
    }

    /// Current real (unscaled) time in seconds.
    pub fn unscaled_now(&self) -> f64 {
        self.clock.unscaled_now()
    }

    //--- Object Surface ---------------------------------------------------

    /// Creates and registers a new root object, active by default.
    ///
    /// Spawning always creates a fresh, empty object: behaviours are
    /// trait objects and cannot be cloned from an existing instance, so
    /// instantiation-from-template belongs to an external prefab/asset
    /// layer that spawns and then attaches behaviours itself.
    pub fn spawn(&mut self, name: impl Into<String>) -> ObjectId {
        let id = self.registry.register();
        let name = name.into();
        debug!("spawned object {:?} ({})", id, name);
        self.objects.insert(id, GameObject::new(name, None, true));
        id
    }

    /// Creates and registers a new object parented under `parent`.
    ///
    /// Returns `None` (and spawns nothing) if the parent is dead.
    pub fn spawn_child(&mut self, parent: ObjectId, name: impl Into<String>) -> Option<ObjectId> {
        if !self.objects.contains_key(&parent) {
            warn!("spawn_child under dead object {:?}", parent);
            return None;
        }
        let id = self.registry.register();
        let parent_active = self
            .objects
            .get(&parent)
            .map_or(false, |obj| obj.active_in_hierarchy);
        self.objects
            .insert(id, GameObject::new(name.into(), Some(parent), parent_active));
        if let Some(obj) = self.objects.get_mut(&parent) {
            obj.children.push(id);
        }
        Some(id)
    }

    /// Attaches a behaviour to an object and queues its lifecycle batch.
    ///
    /// The behaviour starts enabled; its Awake/OnEnable/Start run at the
    /// next drain, provided the object is active in hierarchy by then.
    /// Returns `None` if the object is dead.
    pub fn add_behaviour<B: Behaviour>(&mut self, object: ObjectId, behaviour: B) -> Option<BehaviourId> {
        if !self.objects.contains_key(&object) {
            warn!("add_behaviour on dead object {:?}", object);
            return None;
        }
        self.next_behaviour += 1;
        let id = BehaviourId(self.next_behaviour);
        let tag = behaviour.type_tag();
        self.behaviours
            .insert(id, BehaviourCell::new(object, tag, Box::new(behaviour)));
        if let Some(obj) = self.objects.get_mut(&object) {
            obj.behaviours.push(id);
        }
        self.queue_lifecycle(id);
        Some(id)
    }

    /// Requests deferred destruction of an object and its subtree.
    ///
    /// Never finalizes synchronously, even at delay 0: the object stays
    /// valid until the next destroy-queue pass. Repeat requests are
    /// absorbed; the first request's time stands. Negative delays clamp
    /// to zero.
    pub fn destroy(&mut self, object: ObjectId, delay: f64) {
        let execute_at = self.clock.now() + delay.max(0.0);
        self.registry.mark_pending_destroy(object, execute_at);
    }

    //--- Object Queries ---------------------------------------------------

    /// Whether the object is live.
    pub fn contains(&self, object: ObjectId) -> bool {
        self.objects.contains_key(&object)
    }

    /// Whether the object existed and has been finalized.
    pub fn is_destroyed(&self, object: ObjectId) -> bool {
        self.registry.is_destroyed(object)
    }

    /// Whether a destroy request is queued for the object.
    pub fn pending_destruction(&self, object: ObjectId) -> bool {
        self.registry.pending_destruction(object)
    }

    /// Display name of a live object.
    pub fn object_name(&self, object: ObjectId) -> Option<&str> {
        self.objects.get(&object).map(|obj| obj.name.as_str())
    }

    /// Renames a live object. No-op on a dead id.
    pub fn set_object_name(&mut self, object: ObjectId, name: impl Into<String>) {
        if let Some(obj) = self.objects.get_mut(&object) {
            obj.name = name.into();
        }
    }

    /// First live object with the given name, in creation order.
    pub fn find_object_by_name(&self, name: &str) -> Option<ObjectId> {
        self.objects
            .iter()
            .find(|(_, obj)| obj.name == name)
            .map(|(id, _)| *id)
    }

    /// Live objects carrying at least one behaviour with `tag`, in
    /// creation order. Inactive objects are filtered out unless
    /// `include_inactive` is set.
    pub fn find_objects_by_tag(&self, tag: &str, include_inactive: bool) -> Vec<ObjectId> {
        self.objects
            .iter()
            .filter(|(_, obj)| include_inactive || obj.active_in_hierarchy)
            .filter(|(_, obj)| {
                obj.behaviours.iter().any(|id| {
                    self.behaviours
                        .get(id)
                        .map_or(false, |cell| cell.tag == tag)
                })
            })
            .map(|(id, _)| *id)
            .collect()
    }

    /// Parent of a live object, if any.
    pub fn parent(&self, object: ObjectId) -> Option<ObjectId> {
        self.objects.get(&object).and_then(|obj| obj.parent)
    }

    /// Child ids of a live object.
    pub fn children(&self, object: ObjectId) -> Vec<ObjectId> {
        self.objects
            .get(&object)
            .map(|obj| obj.children.clone())
            .unwrap_or_default()
    }

    /// Behaviour ids attached to a live object.
    pub fn behaviours_of(&self, object: ObjectId) -> Vec<BehaviourId> {
        self.objects
            .get(&object)
            .map(|obj| obj.behaviours.clone())
            .unwrap_or_default()
    }

    /// Number of live objects.
    pub fn live_count(&self) -> usize {
        self.objects.len()
    }

    //--- Invoke Surface ---------------------------------------------------

    /// Schedules a callback on a behaviour with full control over policy
    /// and repetition. Returns `None` if the behaviour is dead.
    pub fn schedule_invoke(
        &mut self,
        behaviour: BehaviourId,
        target: InvokeTarget,
        delay: f64,
        policy: TickPolicy,
        rate: f64,
        repeating: bool,
    ) -> Option<InvokeHandle> {
        let now = self.clock.now();
        let Some(cell) = self.behaviours.get_mut(&behaviour) else {
            warn!("schedule_invoke on dead behaviour {:?}", behaviour);
            return None;
        };
        Some(cell.invokes.schedule(target, delay, policy, rate, repeating, now))
    }

    /// Schedules a one-shot named-method invoke under the
    /// `WhileBehaviourEnabled` policy.
    pub fn invoke(&mut self, behaviour: BehaviourId, method: &str, delay: f64) -> Option<InvokeHandle> {
        self.schedule_invoke(
            behaviour,
            InvokeTarget::Method(method.into()),
            delay,
            TickPolicy::WhileBehaviourEnabled,
            0.0,
            false,
        )
    }

    /// Schedules a repeating named-method invoke under the
    /// `WhileBehaviourEnabled` policy.
    pub fn invoke_repeating(
        &mut self,
        behaviour: BehaviourId,
        method: &str,
        delay: f64,
        rate: f64,
    ) -> Option<InvokeHandle> {
        self.schedule_invoke(
            behaviour,
            InvokeTarget::Method(method.into()),
            delay,
            TickPolicy::WhileBehaviourEnabled,
            rate,
            true,
        )
    }

    /// Cancels one invoke. Unknown handles and dead behaviours are
    /// absorbed.
    pub fn cancel_invoke(&mut self, behaviour: BehaviourId, handle: InvokeHandle) {
        if let Some(cell) = self.behaviours.get_mut(&behaviour) {
            cell.invokes.cancel(handle);
        }
    }

    /// Cancels every invoke on the behaviour dispatching to `method`.
    pub fn cancel_invoke_method(&mut self, behaviour: BehaviourId, method: &str) {
        if let Some(cell) = self.behaviours.get_mut(&behaviour) {
            cell.invokes.cancel_method(method);
        }
    }

    /// Cancels every invoke on the behaviour.
    pub fn cancel_all_invokes(&mut self, behaviour: BehaviourId) {
        if let Some(cell) = self.behaviours.get_mut(&behaviour) {
            cell.invokes.cancel_all();
        }
    }

    /// Whether the handle refers to a live invoke on the behaviour.
    pub fn is_invoking(&self, behaviour: BehaviourId, handle: InvokeHandle) -> bool {
        self.behaviours
            .get(&behaviour)
            .map_or(false, |cell| cell.invokes.is_invoking(handle))
    }

    /// Whether any live invoke on the behaviour dispatches to `method`.
    pub fn is_invoking_method(&self, behaviour: BehaviourId, method: &str) -> bool {
        self.behaviours
            .get(&behaviour)
            .map_or(false, |cell| cell.invokes.is_invoking_method(method))
    }

    /// Whether the behaviour has any live invoke.
    pub fn is_invoking_any(&self, behaviour: BehaviourId) -> bool {
        self.behaviours
            .get(&behaviour)
            .map_or(false, |cell| cell.invokes.is_invoking_any())
    }

    /// Pauses one invoke, capturing its remaining time.
    pub fn pause_invoke(&mut self, behaviour: BehaviourId, handle: InvokeHandle) {
        let now = self.clock.now();
        if let Some(cell) = self.behaviours.get_mut(&behaviour) {
            cell.invokes.pause(handle, now);
        }
    }

    /// Resumes one invoke at now plus its captured remainder.
    pub fn resume_invoke(&mut self, behaviour: BehaviourId, handle: InvokeHandle) {
        let now = self.clock.now();
        if let Some(cell) = self.behaviours.get_mut(&behaviour) {
            cell.invokes.resume(handle, now);
        }
    }

    /// Re-arms one invoke at its original delay from now.
    pub fn restart_invoke(&mut self, behaviour: BehaviourId, handle: InvokeHandle) {
        let now = self.clock.now();
        if let Some(cell) = self.behaviours.get_mut(&behaviour) {
            cell.invokes.restart(handle, now);
        }
    }

    /// Pauses every invoke on the behaviour.
    pub fn pause_all_invokes(&mut self, behaviour: BehaviourId) {
        let now = self.clock.now();
        if let Some(cell) = self.behaviours.get_mut(&behaviour) {
            cell.invokes.pause_all(now);
        }
    }

    /// Resumes every invoke on the behaviour the enabled policy allows.
    pub fn resume_all_invokes(&mut self, behaviour: BehaviourId) {
        let now = self.clock.now();
        if let Some(cell) = self.behaviours.get_mut(&behaviour) {
            cell.invokes.resume_all(now);
        }
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
