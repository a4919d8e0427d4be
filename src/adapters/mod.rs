//! Concrete adapter implementations for ports.

pub mod csv_data_adapter;
pub mod file_config_adapter;
pub mod json_rules_adapter;
pub mod synthetic_data_adapter;
