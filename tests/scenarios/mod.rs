//! Scenario-based tests for substep

mod construction;
mod declaration_errors;
mod design_mode;
mod disambiguation;
mod input_resolution;
mod tensorboard_logs;
mod tmp_round_trip;
