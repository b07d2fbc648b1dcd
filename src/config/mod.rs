pub mod feeds;

pub use feeds::FeedsConfig;
