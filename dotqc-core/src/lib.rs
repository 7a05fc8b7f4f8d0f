//! dotqc-core: Core types and traits for dot pattern quality control.
//!
//! This crate provides the foundational abstractions shared by the analysis
//! pipeline: points, blob candidates, clustering results, metrics records,
//! configuration, and the capability traits the algorithms implement.
//!

pub mod clustering;
pub mod config;
pub mod detection;
pub mod error;
pub mod metrics;
pub mod neighbors;
pub mod point;

pub use clustering::{Clustering, ClusteringStatistics, PointClusterer, NOISE};
pub use config::{
    AnalysisConfig, ClassifierConfig, MetricsConfig, RegionFillerConfig, SpotDetectorConfig,
};
pub use detection::{Blob, BlobDetector};
pub use error::{Error, Result};
pub use metrics::{Label, Metrics};
pub use neighbors::{BruteForceSearch, NeighborSearch};
pub use point::{Point, PointSet};
