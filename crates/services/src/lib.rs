#![forbid(unsafe_code)]

pub mod app_services;
pub mod engine;
pub mod error;
pub mod progress_store;
pub mod registry;

pub use vocab_core::Clock;

pub use app_services::AppServices;
pub use engine::{ProgressOverview, Selection, SelectionEngine};
pub use error::{AppServicesError, SelectionError};
pub use progress_store::{Admission, Advance, FlushReport, ProgressStore, StoreSettings};
pub use registry::CategoryRegistry;
