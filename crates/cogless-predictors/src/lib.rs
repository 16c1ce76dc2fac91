//! cogless-predictors: built-in predictors resolved by module and class name.
//!
//! `create_predictor("sleep", "Predictor")` looks a predictor up by the module
//! and class names the worker was started with. Dotted names resolve by their
//! last segment, so `tests.runners.sleep` loads the same predictor as `sleep`.

pub mod builtin;

use cogless::LoadedPredictor;

/// Class name every built-in module exports.
pub const CLASS_NAME: &str = "Predictor";

/// Names of the built-in predictor modules.
pub const MODULES: &[&str] = &[
    "sleep",
    "weights",
    "iterator",
    "concat",
    "constraints",
    "secrets",
    "paths",
    "object",
    "echo_list",
];

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("no predictor module named '{0}'")]
    UnknownModule(String),

    #[error("module '{module}' has no class '{class}'")]
    UnknownClass { module: String, class: String },
}

/// Resolve a built-in predictor and its declared shape.
pub fn create_predictor(module_name: &str, class_name: &str) -> Result<LoadedPredictor, LoadError> {
    let module = module_name
        .rsplit_once('.')
        .map_or(module_name, |(_, last)| last);

    let load: fn() -> LoadedPredictor = match module {
        "sleep" => builtin::sleep::load,
        "weights" => builtin::weights::load,
        "iterator" => builtin::streams::load_iterator,
        "concat" => builtin::streams::load_concat,
        "constraints" => builtin::constraints::load,
        "secrets" => builtin::secrets::load,
        "paths" => builtin::paths::load,
        "object" => builtin::object::load,
        "echo_list" => builtin::echo_list::load,
        _ => return Err(LoadError::UnknownModule(module_name.to_string())),
    };
    if class_name != CLASS_NAME {
        return Err(LoadError::UnknownClass {
            module: module_name.to_string(),
            class: class_name.to_string(),
        });
    }

    tracing::debug!(module_name, class_name, "Loaded built-in predictor");
    Ok(load())
}
