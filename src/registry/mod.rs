// Registry module: static DAG declarations and processor implementations

pub mod dag;
pub mod processor_registry;

pub use dag::{DagRegistry, FlowDag};
pub use processor_registry::ProcessorRegistry;
