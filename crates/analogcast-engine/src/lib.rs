// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]
//! Analog forecasting engine.
//!
//! A target entity's recent window is compared by DTW against every
//! historical window in the archive; the continuations of the K closest
//! analogs form a weighted predictive mixture per horizon.

mod archive;
mod dtw;
mod error;
mod mixture;
mod propagate;
mod retrieval;
mod scoring;
mod series;
mod window;

pub use archive::Archive;
pub use dtw::{dtw, Alignment, Dtw};
pub use error::EngineError;
pub use mixture::{
    analog_weights, build_mixture, DistributionSummary, Exceedance, HorizonDistribution,
    HorizonMixture, Interval, PredictiveMixture, WeightedOutcome, INVERSE_DISTANCE_EPSILON,
};
pub use propagate::{propagate, Continuation, HorizonOutcome};
pub use retrieval::{retrieve, AnalogMatch, MatchSet, RetrievalQuery};
pub use scoring::{confidence, horizon_index, round_to};
pub use series::{SeriesStore, TimeSeries};
pub use window::{window, Normalization, Window};

pub const CRATE_NAME: &str = "analogcast-engine";
