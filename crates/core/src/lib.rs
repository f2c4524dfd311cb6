//! Core of the trending-videos pipeline: domain types, ports, and the
//! fetch → validate → transform → write service.

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod ports;
pub mod transform;
pub mod utils;
pub mod validation;

pub use application::{PipelineReport, TrendingPipeline};
pub use domain::{MaxResults, RawPayload, RegionCode, TrendingQuery, VideoRecord};
pub use error::PipelineError;
pub use ports::{RecordWriter, Result, TrendingSource, WriteOutcome};
