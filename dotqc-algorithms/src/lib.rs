//! dotqc-algorithms: Dot pattern detection and distribution metrics.
//!
//! This crate provides the analysis pipeline:
//! - **Spot detection** - multi-threshold bright blob detection
//! - **Region filling** - grid sampling of large merged bright regions
//! - **DBSCAN** - density clustering with noise handling
//! - **Metrics** - overlap, clustering, grid uniformity, nearest-neighbor spread
//! - **Classification** - two-threshold acceptance rule
//!
#![warn(missing_docs)]

mod classify;
mod dbscan;
pub mod gray;
mod metrics;
pub mod morphology;
mod pipeline;
mod region;
pub mod spatial;
mod spot;

pub use classify::{classify, classify_metrics};
pub use dbscan::{DbscanClustering, DbscanConfig, DbscanState};
pub use metrics::{
    cluster_count, compute_metrics, grid_uniformity, has_overlap, has_overlap_with,
    max_cluster_size, nearest_neighbor_stats, nearest_neighbor_stats_with, MetricEngine,
    NeighborStats,
};
pub use pipeline::{analyse, analyse_batch, AnalysisResult, AnalysisSummary};
pub use region::{
    find_bright_regions, fill_large_bright_regions, BrightRegion, RegionMask, MARKER_COLOR,
};
pub use spatial::{GridNeighborSearch, SpatialGrid};
pub use spot::{detect_spots, SpotDetection, SpotDetector};

// Re-export core configuration types
pub use dotqc_core::config::{AnalysisConfig, MetricsConfig, RegionFillerConfig, SpotDetectorConfig};
