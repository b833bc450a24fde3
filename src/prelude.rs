//=========================================================================
// Prelude
//=========================================================================
//
// Convenience module that re-exports commonly used types and traits.
//
// Usage:
//   use orrery_engine::prelude::*;
//
//=========================================================================

//=== Public API ==========================================================

// Scene runtime
pub use crate::core::scene::{Behaviour, BehaviourId, Context, Scene};

// Object identity
pub use crate::core::registry::ObjectId;

// Invoke scheduling
pub use crate::core::invoke::{InvokeHandle, InvokeTarget, TickPolicy};

// Time sources
pub use crate::core::time::{ManualClock, ScaledClock, TimeSource};

// Contact events
pub use crate::core::scene::{CollisionEvent, ContactPhase, TriggerEvent};

// Errors
pub use crate::core::error::LifecycleError;
