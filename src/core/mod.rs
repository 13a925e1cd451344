pub mod builder;
pub mod engine;
pub mod pipeline;
pub mod ramps;
pub mod rules;
pub mod scanner;
pub mod transform;

pub use crate::domain::model::{ColorJob, ColorTable, Style, StyleChoice, TransformFlags, ValueDomain};
pub use crate::domain::ports::{ColorPipeline, ColorTableStore, DonorTableSource, HistogramSource, RecordSource};
pub use crate::utils::error::Result;
