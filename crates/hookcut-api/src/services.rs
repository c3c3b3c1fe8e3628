//! Background services.

pub mod simulated_worker;

pub use simulated_worker::{SimulatedWorker, RENDER_STEPS};
