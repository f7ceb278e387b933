//! Modals: ephemeral screens pushed on top of their invoking screen.
//! Each returns its result as a message to the parent instead of holding
//! a reference back to it.

pub mod batch;
pub mod confirm;
pub mod date_range;
pub mod help;
pub mod input;
pub mod query_result;
pub mod reset;
pub mod saved_filters;
pub mod templates;
pub mod theme_select;
pub mod visibility;
