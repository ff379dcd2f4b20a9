//! Bike plate recognition client

pub mod http;

pub use http::{HttpPlateRecognizer, RecognitionConfig};
