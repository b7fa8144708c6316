//! RailRush: festival-season railway rush prediction and booking advisory.
//!
//! ## Architecture
//!
//! - **Generator**: seeded synthetic dataset encoding catalog heuristics
//! - **Encoding**: label encoders + per-model scalers behind one choke point
//! - **Model Trio**: rush classifier, confirmation regressor, booking-window
//!   regressor, each with its own feature subset and scaler
//! - **Advisor**: composes the trio into one advisory with rule-based advice
//! - **API**: thin Axum layer serializing the Advisory record

pub mod advisor;
pub mod api;
pub mod artifacts;
pub mod catalog;
pub mod config;
pub mod encoding;
pub mod error;
pub mod generator;
pub mod model;
pub mod training;
pub mod types;

// Re-export the service configuration
pub use config::AdvisorConfig;

// Re-export commonly used types
pub use types::{
    Advisory, BookingWindow, Festival, JourneyRequest, Quota, RushAnalysis, RushLevel,
    TicketStatus, TrainClass, TrainType, TrainingExample,
};

// Re-export the pipeline surface
pub use advisor::AdvisoryComposer;
pub use artifacts::{ArtifactStore, InferenceContext};
pub use error::AdvisorError;
pub use training::{TrainedArtifacts, TrainingConfig, TrainingReport};
