//! Engine configuration and reference targets

mod profiles;
mod targets;

pub use profiles::{ConfigBuilder, EngineConfig, EnginePreset, FilterPreset, ToleranceRules};
pub use targets::{MetricKey, MetricTarget, ReferenceLibrary, TargetRange, TargetTable};
