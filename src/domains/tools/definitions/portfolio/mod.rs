//! Portfolio tools: listing, holdings and scoring.

mod holdings;
mod list;
mod score;

pub use holdings::PortfolioHoldingsTool;
pub use list::ListPortfoliosTool;
pub use score::PortfolioScoreTool;
