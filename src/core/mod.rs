pub mod costs;
pub mod etl;
pub mod pipeline;
pub mod profile;
pub mod report;
pub mod resample;

pub use crate::domain::model::{CostAnalysis, SourceData};
pub use crate::domain::ports::{Pipeline, SeriesSource, Storage};
pub use crate::utils::error::Result;
