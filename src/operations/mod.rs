pub mod add;
pub mod export;
pub mod import;
pub mod list;
pub mod receipt;
pub mod remove;
pub mod report;
pub mod search_by_category;
pub mod stats;
pub mod update;
pub mod verify;
