pub mod duckduckgo;
pub mod fixture;

pub use duckduckgo::DuckDuckGoProvider;
pub use fixture::FixtureProvider;
