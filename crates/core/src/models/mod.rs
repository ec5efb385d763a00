pub mod analytics;
pub mod asset;
pub mod color;
pub mod holding;
pub mod portfolio;
pub mod price;
pub mod settings;
