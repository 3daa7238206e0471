pub mod action;
pub mod component;
pub mod envelope;

pub use action::{ActionKind, GridSize, ModificationAction, MoveDirection, ResolvedAction};
pub use component::{
    Component, ComponentKind, ComponentResult, CustomDateRange, DatePreset, DateRange,
    ExecutedComponent, Filter, LabeledPoint, Layout, MetricSpec, MetricValue,
    MetricsGridComponent, QueryComponent, ReportConfig, Row, ScatterPoint, SlicePoint,
    TableComponent, TimeSeriesPoint,
};
pub use envelope::{
    COMMAND_ENVELOPE_SCHEMA_VERSION, CommandEnvelope, CommandEnvelopeError,
    CommandEnvelopeFailure, FailureClass,
};
