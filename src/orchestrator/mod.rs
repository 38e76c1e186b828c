//! Action orchestration.
//!
//! Owns the run launch chain and the controller that executes dashboard commands off the UI
//! thread. The dashboard and the CLI both call into this module so a launch behaves the same
//! from either surface.

mod controller;
mod run_chain;

pub(crate) use controller::{run_controller, UiCommand};
pub(crate) use run_chain::launch_and_collect;
