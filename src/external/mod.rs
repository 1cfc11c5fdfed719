pub mod alphavantage;
pub mod mock;
pub mod news_provider;
pub mod price_provider;
pub mod yahoo;
