// Configuration loading

pub mod bounds;
pub mod settings;

pub use bounds::{Bound, ValidationBounds};
pub use settings::{ApiSettings, IngestSettings, Settings, API_URL_ENV};
