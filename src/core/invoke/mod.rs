//=========================================================================
// Invoke System
//=========================================================================
//
// Per-behaviour timed callbacks over the scaled clock.
//
// Architecture:
//   InvokeScheduler
//     └─ entries: Vec<InvokeRequest>   (mark-and-compact, never removed
//                                       mid-pass)
//
// Flow:
//   schedule() → due_handles(now) → take_target/restore_target per firing
//     → complete_firing() → compact()
//
// Nothing here blocks: a "delay" is a stored timestamp compared against
// the clock each tick.
//
//=========================================================================

//=== Module Declarations =================================================

mod request;
mod scheduler;

//=== Public API ==========================================================

pub use request::{InvokeHandle, InvokeTarget, TickPolicy};
pub use scheduler::InvokeScheduler;
