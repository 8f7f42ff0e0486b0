//! Domain types for SignalBoard

pub mod article;
pub mod indicators;
pub mod point;

pub use article::Article;
pub use indicators::{
    CrossEvent, CrossKind, CrossPair, CrossState, ExternalIndicators, MovingAverages,
    Recommendation, RsiZone, RSI_OVERBOUGHT, RSI_OVERSOLD,
};
pub use point::{parse_calendar_date, Dated, RawPoint, TimePoint};

/// Symbol type alias
pub type Symbol = String;
