pub mod aggregate;

pub use aggregate::{CategoryWithFlavors, Flavor, FlavorSummary};
