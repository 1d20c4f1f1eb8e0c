use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stocks on the watchlist handed to anonymous users, in display order.
const DEFAULT_STOCKS: [(&str, &str); 5] = [
    ("TSLA", "Tesla Inc."),
    ("AAPL", "Apple Inc."),
    ("AMZN", "Amazon.com Inc."),
    ("NFLX", "Netflix Inc."),
    ("FB", "Facebook Inc."),
];

/// A listed stock.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Stock {
    /// Ticker symbol.
    pub symbol: String,
    /// Company name.
    pub name: String,
}

impl Stock {
    /// Creates a stock.
    pub fn new(symbol: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            name: name.into(),
        }
    }
}

/// A named list of stocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Watchlist {
    /// Watchlist identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Stocks in the order they were added.
    pub stocks: Vec<Stock>,
    /// Creation timestamp.
    pub created_at: Timestamp,
}

impl Watchlist {
    /// Returns a fresh copy of the default watchlist.
    pub fn default_watchlist() -> Self {
        Self {
            id: Uuid::new_v4(),
            name: "Default".to_owned(),
            stocks: DEFAULT_STOCKS
                .iter()
                .map(|(symbol, name)| Stock::new(*symbol, *name))
                .collect(),
            created_at: Timestamp::now(),
        }
    }
}
