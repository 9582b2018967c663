//! Naming helpers.

use convert_case::{Case, Casing};

/// Convert a string to snake_case
pub fn to_snake_case(s: &str) -> String {
    s.to_case(Case::Snake)
}

/// File name for an output's rendered config (`es-App` -> `es_app.conf`)
pub fn config_file_name(output_name: &str) -> String {
    format!("{}.conf", to_snake_case(output_name))
}
