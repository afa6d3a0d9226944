pub mod aggregator;
pub mod enrichment;
pub mod gateway;
pub mod pipeline;
pub mod presenter;
pub mod selector;
pub mod source;
