//=========================================================================
// Lifecycle System
//=========================================================================
//
// Per-behaviour one-shot and alternating hook bookkeeping.
//
// Architecture:
//   LifecycleState  - pure guard-flag machine (Awake/Enable/Start/Destroy)
//   PendingSet      - de-duplicated batch of behaviours awaiting their
//                     Awake/OnEnable/Start pass
//
// The flag machine decides *whether* a hook may fire; the scene
// coordinator decides *when*, draining the pending set once per frame
// boundary.
//
//=========================================================================

//=== Module Declarations =================================================

mod pending;
mod state;

//=== Public API ==========================================================

pub use pending::PendingSet;
pub use state::{DestroySteps, LifecycleState};
