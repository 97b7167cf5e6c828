//! Content views rendered inside the main frame.

pub mod form;
pub mod recipes;
