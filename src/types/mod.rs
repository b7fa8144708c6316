//! Core type definitions for the rush advisory system.
//!
//! Organized into submodules:
//! - `journey`: request-side types (JourneyRequest, festival/class/type enums)
//! - `training`: synthetic training rows and the corpus CSV schema
//! - `advisory`: composed advisory output types

pub mod advisory;
pub mod journey;
pub mod training;

pub use advisory::{Advisory, BookingWindow, RouteInfo, RushAnalysis, TrainDetails};
pub use journey::{
    Festival, JourneyRequest, Quota, RushLevel, TicketStatus, TrainClass, TrainType,
};
pub use training::{TrainingExample, CSV_COLUMNS};
