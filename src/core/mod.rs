pub mod cascade;
pub mod detector;
pub mod errors;
pub mod execution;
pub mod merge;
pub mod random;
pub mod record;
pub mod scheme;
pub mod transport;
pub mod types;
