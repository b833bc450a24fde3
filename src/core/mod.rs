//=========================================================================
// Core Runtime Systems
//
// The subsystems behind the scene runtime:
//
// - `registry`:  object identity, liveness and the deferred destroy queue
// - `lifecycle`: per-behaviour hook guard state and the pending batch
// - `invoke`:    per-behaviour timed callback scheduling
// - `scene`:     the coordinator tying the tables together, plus the
//                user-facing `Behaviour`/`Context` surface
// - `time`:      the clock abstraction (scaled real time or manual)
// - `error`:     invariant-breach errors surfaced by the frame drivers
//
// Everything here is single-threaded per scene. There is no global
// state; hosts may run any number of independent scenes.
//
//=========================================================================

pub mod error;
pub mod invoke;
pub mod lifecycle;
pub mod registry;
pub mod scene;
pub mod time;
