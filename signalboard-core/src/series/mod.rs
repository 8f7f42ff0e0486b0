//! Series normalization, alignment and windowing.

pub mod align;
pub mod schema;
pub mod window;

pub use align::{align_series, attach_cross_markers, AlignedRecord, CrossMarker};
pub use schema::{FieldSpec, SourceSchema, SourceSeries};
pub use window::{window, ParsePeriodError, Period};
