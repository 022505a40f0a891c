pub mod config;
pub mod error;
pub mod models;
pub mod services;

pub use config::OrganizerConfig;
pub use error::AppError;
pub use models::classify_types::{ClassificationResult, Prediction};
pub use models::organize_types::{Decision, ImageRef, OrganizeRecord, RunStats};
pub use services::classifier::{HomeworkClassifier, LabelOracle};
pub use services::organizer::Organizer;
