//! Business logic behind the sample routes.

mod sample;

pub use sample::{SampleService, THIRD_PARTY_RESPONSE};
