pub mod anonymizer;
pub mod bot;
pub mod cache;
pub mod config;
pub mod device;
pub mod error;
pub mod hit;
pub mod referrer;
pub mod report;
pub mod store;
