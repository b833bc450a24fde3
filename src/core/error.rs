//=========================================================================
// Lifecycle Errors
//=========================================================================
//
// The runtime absorbs recoverable misuse silently (double destroy,
// cancelling an unknown invoke handle, and so on; those are logged
// no-ops). An error is raised only when an invariant the caller must fix
// is actually broken.
//
//=========================================================================

//=== External Dependencies ===============================================

use thiserror::Error;

//=== Internal Dependencies ===============================================

use crate::core::registry::ObjectId;
use crate::core::scene::BehaviourId;

//=== LifecycleError ======================================================

/// Invariant violations surfaced by the lifecycle coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LifecycleError {
    /// A behaviour is still registered although its owning object has been
    /// finalized. The two tables are torn down together, so this means the
    /// containment rules were bypassed.
    #[error("behaviour {behaviour:?} outlived its finalized owner {owner:?}")]
    OrphanedBehaviour {
        behaviour: BehaviourId,
        owner: ObjectId,
    },

    /// A destroy-queue entry came due for an object that was finalized
    /// through another path: the object table and the registry's live
    /// table disagree about it.
    #[error("destroy queue entry targets {0:?}, which was already finalized outside the queue")]
    AlreadyFinalized(ObjectId),
}
