mod event;
mod hpr;
mod news;
mod price;
mod ticker;

pub use event::{AlignDirection, AlignedEvent, EventGroup};
pub use hpr::{HprRecord, HprTable, OverlayMatrix, OverlayRow, Phase};
pub use news::{NewsArticle, ScoredArticle, SentimentLabel, SentimentSummary};
pub use price::{PriceBar, PricePoint, PriceSeries};
pub use ticker::TickerInfo;
