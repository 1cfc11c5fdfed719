use serde::{Deserialize, Serialize};

/// An instrument symbol with a display name, as listed by the reference
/// data layer or returned by a provider symbol search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickerInfo {
    pub symbol: String,
    pub name: String,
}
