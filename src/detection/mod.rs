//! Reference comparison and severity classification

mod comparator;
mod result;

pub use comparator::{Measurements, ReferenceComparator, SignalCharacteristics};
pub use result::{
    AdjustmentReason, ComparisonReport, ComparisonResult, Direction, SeverityTier,
    ToleranceAdjustment,
};
