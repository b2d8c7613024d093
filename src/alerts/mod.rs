pub mod dedup;
pub mod format;
pub mod portfolio;
pub mod price;
pub mod technical;
pub mod types;

pub use dedup::AlertHistory;
pub use format::{format_alert, format_summary};
pub use portfolio::check_portfolio_alerts;
pub use price::check_price_alerts;
pub use technical::check_technical_alerts;
pub use types::{Alert, AlertKind, EvalError, Priority};
