//! Built-in predictors.
//!
//! Each module exposes a `load` function returning the predictor together
//! with its declared shape.

pub mod constraints;
pub mod echo_list;
pub mod object;
pub mod paths;
pub mod secrets;
pub mod sleep;
pub mod streams;
pub mod weights;
