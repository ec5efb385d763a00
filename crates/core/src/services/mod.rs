pub mod analytics_service;
pub mod currency_service;
pub mod portfolio_service;
pub mod price_sync_service;
pub mod scheduler;
