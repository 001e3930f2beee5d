//! Integration test modules

mod config_tests;
mod controller_tests;
