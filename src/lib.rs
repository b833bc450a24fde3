//=========================================================================
// Orrery Engine — Library Root
//
// This crate defines the public API surface of the Orrery Engine: a
// component lifecycle and deferred-scheduling runtime for game objects.
//
// Responsibilities:
// - Expose the scene runtime (`Scene`), the user hook trait
//   (`Behaviour`) and the in-hook scene handle (`Context`)
// - Keep scene-internal bookkeeping (tables, pending batches, hook
//   dispatch) hidden from end users
// - Provide clean separation between the host-facing frame drivers
//   and the behaviour-facing callback surface
//
// Typical usage:
// ```no_run
// use orrery_engine::prelude::*;
//
// struct Spinner;
//
// impl Behaviour for Spinner {
//     fn update(&mut self, ctx: &mut Context) {
//         log::trace!("spinning at t={}", ctx.now());
//     }
// }
//
// fn main() {
//     let mut scene = Scene::new();
//     let obj = scene.spawn("wheel");
//     scene.add_behaviour(obj, Spinner);
//     loop {
//         scene.tick().expect("scene tables diverged");
//     }
// }
// ```
//
//=========================================================================

//--- Public Modules ------------------------------------------------------
//
// `core` contains the runtime systems (registry, lifecycle, invoke
// scheduling, time). It is exposed publicly for host-level
// extensibility, but normal application code will mostly use the
// types re-exported from `prelude`.
//
pub mod core;

pub mod prelude;
