pub mod adapters;
pub mod agents;
pub mod pipeline;
