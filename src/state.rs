use std::sync::Arc;

use crate::external::news_provider::NewsProvider;
use crate::external::price_provider::PriceProvider;
use crate::services::reference::NameCache;

#[derive(Clone)]
pub struct AppState {
    pub price_provider: Arc<dyn PriceProvider>,
    pub news_provider: Option<Arc<dyn NewsProvider>>,
    pub name_cache: NameCache,
}
