//=========================================================================
// Scene System
//=========================================================================
//
// The lifecycle coordinator and its user-facing surface.
//
// Architecture:
//   Scene
//     ├─ registry:   ObjectRegistry            (ids + destroy queue)
//     ├─ objects:    BTreeMap<ObjectId, GameObject>
//     ├─ behaviours: BTreeMap<BehaviourId, BehaviourCell>
//     ├─ pending:    PendingSet                (Awake/OnEnable/Start batch)
//     └─ clock:      Box<dyn TimeSource>
//
// Flow per frame:
//   drain_lifecycle() → per active object: invoke ticking + update()
//     → late_update() pass → drain_lifecycle() → process_destroy_queue()
//
// User code implements [`Behaviour`] and talks back through [`Context`].
//
//=========================================================================

//=== Module Declarations =================================================

mod activation;
mod context;
mod dispatch;
mod object;
#[allow(clippy::module_inception)]
mod scene;

//=== Public API ==========================================================

pub use context::Context;
pub use dispatch::{CollisionEvent, ContactPhase, TriggerEvent};
pub use object::BehaviourId;
pub use scene::Scene;

pub(crate) use dispatch::Hook;

//=== Behaviour Trait =====================================================

/// User hook surface dispatched by the lifecycle coordinator.
///
/// Every hook has a default empty implementation; implement only what the
/// behaviour needs. Hooks receive a [`Context`] with full access to the
/// scene; creating, destroying, enabling and scheduling from inside any
/// hook is supported, and the coordinator guarantees nothing is skipped
/// or double-processed as a result.
///
/// # Guarantees
///
/// - `awake` fires at most once, strictly before any `on_enable`/`start`.
/// - `on_enable`/`on_disable` strictly alternate, starting with enable.
/// - `start` fires at most once, only while the behaviour is effectively
///   active, after its first `on_enable`.
/// - `on_destroy` fires at most once; an enabled behaviour receives
///   `on_disable` immediately before it.
///
/// # Example
///
/// ```
/// use orrery_engine::prelude::*;
///
/// struct Blinker {
///     visible: bool,
/// }
///
/// impl Behaviour for Blinker {
///     fn type_tag(&self) -> &'static str {
///         "blinker"
///     }
///
///     fn start(&mut self, ctx: &mut Context) {
///         ctx.invoke_repeating("blink", 1.0, 0.5);
///     }
///
///     fn on_invoke(&mut self, method: &str, _ctx: &mut Context) -> bool {
///         match method {
///             "blink" => {
///                 self.visible = !self.visible;
///                 true
///             }
///             _ => false,
///         }
///     }
/// }
/// ```
pub trait Behaviour: 'static {
    /// Type tag used by [`Scene::find_objects_by_tag`]. Untagged by
    /// default.
    fn type_tag(&self) -> &'static str {
        ""
    }

    /// One-time initialization, before any other hook.
    fn awake(&mut self, _ctx: &mut Context) {}

    /// The behaviour became effectively active.
    fn on_enable(&mut self, _ctx: &mut Context) {}

    /// One-time hook after the first `on_enable`, while still active.
    fn start(&mut self, _ctx: &mut Context) {}

    /// Once per frame while effectively active.
    fn update(&mut self, _ctx: &mut Context) {}

    /// Once per fixed-timestep step while effectively active.
    fn fixed_update(&mut self, _ctx: &mut Context) {}

    /// After every behaviour's `update` in the same frame.
    fn late_update(&mut self, _ctx: &mut Context) {}

    /// The behaviour stopped being effectively active.
    fn on_disable(&mut self, _ctx: &mut Context) {}

    /// The owning object is being finalized.
    fn on_destroy(&mut self, _ctx: &mut Context) {}

    /// Contact reported by the external physics collaborator.
    fn on_collision(&mut self, _event: CollisionEvent, _ctx: &mut Context) {}

    /// Trigger overlap reported by the external physics collaborator.
    fn on_trigger(&mut self, _event: TriggerEvent, _ctx: &mut Context) {}

    /// Named-method invoke dispatch. Return `true` when the name was
    /// handled; an unhandled name is a silent no-op.
    fn on_invoke(&mut self, _method: &str, _ctx: &mut Context) -> bool {
        false
    }
}
