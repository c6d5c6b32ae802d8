//! A sliding time window trigger for faint, slow particles crossing a sparse sensor array.
//!
//! Hits are buffered in fixed length windows. Each window is put through
//! four cuts: hit count, velocity consistent sensor pairs ("doublets"),
//! clustering of those pairs by triplets or by direction, and the fraction
//! of low-gain hits. Runs of passing windows are merged and emitted as
//! candidate triggers.
pub mod accumulator;
pub mod classifier;
pub mod config;
pub mod detector;
pub mod doublets;
pub mod engine;
pub mod error;
pub mod histogram;
pub mod hit;
pub mod output;
pub mod services;
pub mod window;

pub use config::{ClusteringCut, TriggerConfig, TriggerConfigBuilder};
pub use detector::{DetectorDescription, SensorTable};
pub use engine::FaintParticleTrigger;
pub use error::{ConfigurationError, DetectorDescriptionError, TriggerError};
pub use hit::{Hit, HitKind, SharedHit};
pub use services::{CandidateTrigger, Geometry, HitClassifier, SensorSetFilter, TriggerSink};
