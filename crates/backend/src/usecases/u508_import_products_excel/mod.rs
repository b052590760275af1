pub mod category_validator;
pub mod correction_session;
pub mod error;
pub mod excel_reader;
pub mod executor;
pub mod field_normalizer;
pub mod flavor_validator;
pub mod general_validator;
pub mod progress_tracker;
pub mod upsert_processor;

#[cfg(test)]
mod test_support;

pub use error::{CorrectionError, ImportError};
pub use executor::ImportExecutor;
pub use progress_tracker::ProgressTracker;
