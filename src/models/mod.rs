pub mod donation;
pub mod report;
