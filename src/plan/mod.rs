pub mod materializer;

pub use materializer::materialize;
