//! Tool execution handlers.
//!
//! Each handler decodes its arguments, calls one service operation and
//! renders the result as a JSON text payload.

mod analytics;
mod documentation;
mod observations;

pub use analytics::{execute_analyze_pattern, execute_generate_insights, execute_store_metric};
pub use documentation::{
    execute_get_categories, execute_get_technologies, execute_search_documentation,
};
pub use observations::{execute_search_observations, execute_store_observation};
