//=========================================================================
// Game Object & Behaviour Cell
//=========================================================================
//
// Containment data for the scene's two tables.
//
// Ownership is strictly downward: the scene owns objects and behaviour
// cells; an object refers to its parent, children and behaviours by id
// only, and a cell refers to its owner by id only. No cycles, no shared
// ownership.
//
//=========================================================================

//=== Internal Dependencies ===============================================

use crate::core::invoke::InvokeScheduler;
use crate::core::lifecycle::LifecycleState;
use crate::core::registry::ObjectId;

use super::Behaviour;

//=== Behaviour Id ========================================================

/// Unique, monotonically allocated behaviour identity within a scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BehaviourId(pub(crate) u64);

//=== GameObject ==========================================================

/// One containment node: identity, activation flags, and the ids of its
/// relatives and behaviours.
///
/// `active_in_hierarchy` is a cache of the AND of `active_self` over this
/// object and all ancestors, refreshed by the scene whenever an
/// `active_self` value or a parent link changes.
pub(crate) struct GameObject {
    pub name: String,
    pub active_self: bool,
    pub active_in_hierarchy: bool,
    pub parent: Option<ObjectId>,
    pub children: Vec<ObjectId>,
    pub behaviours: Vec<BehaviourId>,
}

impl GameObject {
    pub fn new(name: String, parent: Option<ObjectId>, active_in_hierarchy: bool) -> Self {
        Self {
            name,
            active_self: true,
            active_in_hierarchy,
            parent,
            children: Vec::new(),
            behaviours: Vec::new(),
        }
    }
}

//=== BehaviourCell =======================================================

/// Scene-side bookkeeping for one behaviour.
///
/// The user hook object sits in `hooks` and is taken out for the duration
/// of each callback (take-and-put-back), so the callback can mutate the
/// scene freely. An empty slot therefore means "currently executing one
/// of its own callbacks".
pub(crate) struct BehaviourCell {
    pub owner: ObjectId,
    pub tag: &'static str,
    pub enabled_self: bool,
    pub lifecycle: LifecycleState,
    pub invokes: InvokeScheduler,
    pub hooks: Option<Box<dyn Behaviour>>,
}

impl BehaviourCell {
    pub fn new(owner: ObjectId, tag: &'static str, hooks: Box<dyn Behaviour>) -> Self {
        Self {
            owner,
            tag,
            enabled_self: true,
            lifecycle: LifecycleState::new(),
            invokes: InvokeScheduler::new(),
            hooks: Some(hooks),
        }
    }
}
