//! Client-side state model for the JSON uplift playground.
//!
//! A pipeline is a linear chain of steps (input -> uplift -> output). Each step
//! tracks its own contents, derived output, errors and dirty flags, and only
//! re-executes when it is pending, modified or forced. Steps serialize to plain
//! records that can be packed into a shareable URL fragment and revived later.

pub mod errors;
pub mod execution;
pub mod output;
pub mod pipeline;
pub mod record;
pub mod share;
pub mod source;
pub mod state;
pub mod steps;

pub use errors::*;
pub use execution::*;
pub use output::*;
pub use pipeline::*;
pub use record::*;
pub use share::*;
pub use source::*;
pub use state::*;
pub use steps::*;
