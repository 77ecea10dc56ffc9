//! Integration tests for weighted question planning and generation sessions

mod config_layering;
mod driver_sessions;
mod generate_run;
mod planner_properties;
mod test_utils;
