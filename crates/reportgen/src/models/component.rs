use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub type Row = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Kpi,
    LineChart,
    BarChart,
    AreaChart,
    ScatterChart,
    HorizontalBarChart,
    PieChart,
    DonutChart,
    Table,
    MetricsGrid,
}

impl ComponentKind {
    pub const ALL: [Self; 10] = [
        Self::Kpi,
        Self::LineChart,
        Self::BarChart,
        Self::Table,
        Self::MetricsGrid,
        Self::PieChart,
        Self::AreaChart,
        Self::DonutChart,
        Self::ScatterChart,
        Self::HorizontalBarChart,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Kpi => "kpi",
            Self::LineChart => "line_chart",
            Self::BarChart => "bar_chart",
            Self::AreaChart => "area_chart",
            Self::ScatterChart => "scatter_chart",
            Self::HorizontalBarChart => "horizontal_bar_chart",
            Self::PieChart => "pie_chart",
            Self::DonutChart => "donut_chart",
            Self::Table => "table",
            Self::MetricsGrid => "metrics_grid",
        }
    }

    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == key)
    }

    #[must_use]
    pub const fn row_contract(self) -> &'static str {
        match self {
            Self::Kpi => "a single row with a 'value' column",
            Self::LineChart | Self::AreaChart => "rows with 'date' and 'value' columns",
            Self::BarChart | Self::HorizontalBarChart => "rows with 'label' and 'value' columns",
            Self::PieChart | Self::DonutChart => "rows with 'name' and 'value' columns",
            Self::ScatterChart => "rows with 'x' and 'y' columns",
            Self::Table => "rows with columns matching the columns array",
            Self::MetricsGrid => "one single-row 'value' query per metric",
        }
    }

    #[must_use]
    pub const fn default_size(self) -> (u32, u32) {
        match self {
            Self::Kpi => (1, 1),
            Self::Table => (4, 2),
            Self::MetricsGrid => (4, 1),
            _ => (2, 2),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum DatePreset {
    #[serde(rename = "last_7_days")]
    Last7Days,
    #[serde(rename = "last_30_days")]
    Last30Days,
    #[serde(rename = "last_90_days")]
    Last90Days,
    #[serde(rename = "this_month")]
    ThisMonth,
    #[serde(rename = "last_month")]
    LastMonth,
}

impl DatePreset {
    pub const ALL: [Self; 5] = [
        Self::Last7Days,
        Self::Last30Days,
        Self::Last90Days,
        Self::ThisMonth,
        Self::LastMonth,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Last7Days => "last_7_days",
            Self::Last30Days => "last_30_days",
            Self::Last90Days => "last_90_days",
            Self::ThisMonth => "this_month",
            Self::LastMonth => "last_month",
        }
    }

    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|preset| preset.as_str() == key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CustomDateRange {
    /// Start date in YYYY-MM-DD format
    pub start: String,
    /// End date in YYYY-MM-DD format
    pub end: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum DateRange {
    Preset(DatePreset),
    Custom(CustomDateRange),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Filter {
    pub field: String,
    pub operator: String,
    #[serde(default)]
    pub value: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layout {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            x: 0,
            y: 0,
            w: 2,
            h: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct QueryComponent {
    pub title: String,

    /// SQL query whose rows satisfy the column contract of the component type
    pub query: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRange>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<Vec<Filter>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(skip)]
    pub layout: Option<Layout>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TableComponent {
    pub title: String,

    #[schemars(length(min = 1))]
    pub columns: Vec<String>,

    /// SQL query that returns rows with columns matching the columns array
    pub query: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRange>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<Vec<Filter>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(skip)]
    pub layout: Option<Layout>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct MetricSpec {
    pub label: String,

    /// SQL query that returns a single row with a 'value' column
    pub query: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MetricsGridComponent {
    pub title: String,

    #[schemars(length(min = 1))]
    pub metrics: Vec<MetricSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRange>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<Vec<Filter>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(skip)]
    pub layout: Option<Layout>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Component {
    Kpi(QueryComponent),
    LineChart(QueryComponent),
    BarChart(QueryComponent),
    AreaChart(QueryComponent),
    ScatterChart(QueryComponent),
    HorizontalBarChart(QueryComponent),
    PieChart(QueryComponent),
    DonutChart(QueryComponent),
    Table(TableComponent),
    MetricsGrid(MetricsGridComponent),
}

impl Component {
    #[must_use]
    pub const fn kind(&self) -> ComponentKind {
        match self {
            Self::Kpi(_) => ComponentKind::Kpi,
            Self::LineChart(_) => ComponentKind::LineChart,
            Self::BarChart(_) => ComponentKind::BarChart,
            Self::AreaChart(_) => ComponentKind::AreaChart,
            Self::ScatterChart(_) => ComponentKind::ScatterChart,
            Self::HorizontalBarChart(_) => ComponentKind::HorizontalBarChart,
            Self::PieChart(_) => ComponentKind::PieChart,
            Self::DonutChart(_) => ComponentKind::DonutChart,
            Self::Table(_) => ComponentKind::Table,
            Self::MetricsGrid(_) => ComponentKind::MetricsGrid,
        }
    }

    #[must_use]
    pub fn title(&self) -> &str {
        match self {
            Self::Table(table) => &table.title,
            Self::MetricsGrid(grid) => &grid.title,
            Self::Kpi(inner)
            | Self::LineChart(inner)
            | Self::BarChart(inner)
            | Self::AreaChart(inner)
            | Self::ScatterChart(inner)
            | Self::HorizontalBarChart(inner)
            | Self::PieChart(inner)
            | Self::DonutChart(inner) => &inner.title,
        }
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        let title = title.into();
        match self {
            Self::Table(table) => table.title = title,
            Self::MetricsGrid(grid) => grid.title = title,
            Self::Kpi(inner)
            | Self::LineChart(inner)
            | Self::BarChart(inner)
            | Self::AreaChart(inner)
            | Self::ScatterChart(inner)
            | Self::HorizontalBarChart(inner)
            | Self::PieChart(inner)
            | Self::DonutChart(inner) => inner.title = title,
        }
    }

    #[must_use]
    pub fn layout(&self) -> Option<Layout> {
        match self {
            Self::Table(table) => table.layout,
            Self::MetricsGrid(grid) => grid.layout,
            Self::Kpi(inner)
            | Self::LineChart(inner)
            | Self::BarChart(inner)
            | Self::AreaChart(inner)
            | Self::ScatterChart(inner)
            | Self::HorizontalBarChart(inner)
            | Self::PieChart(inner)
            | Self::DonutChart(inner) => inner.layout,
        }
    }

    pub fn layout_mut(&mut self) -> &mut Option<Layout> {
        match self {
            Self::Table(table) => &mut table.layout,
            Self::MetricsGrid(grid) => &mut grid.layout,
            Self::Kpi(inner)
            | Self::LineChart(inner)
            | Self::BarChart(inner)
            | Self::AreaChart(inner)
            | Self::ScatterChart(inner)
            | Self::HorizontalBarChart(inner)
            | Self::PieChart(inner)
            | Self::DonutChart(inner) => &mut inner.layout,
        }
    }

    #[must_use]
    pub fn queries(&self) -> Vec<&str> {
        match self {
            Self::Table(table) => vec![table.query.as_str()],
            Self::MetricsGrid(grid) => grid
                .metrics
                .iter()
                .map(|metric| metric.query.as_str())
                .collect(),
            Self::Kpi(inner)
            | Self::LineChart(inner)
            | Self::BarChart(inner)
            | Self::AreaChart(inner)
            | Self::ScatterChart(inner)
            | Self::HorizontalBarChart(inner)
            | Self::PieChart(inner)
            | Self::DonutChart(inner) => vec![inner.query.as_str()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportConfig {
    /// Descriptive name for the report
    pub report_name: String,

    #[schemars(length(min = 1))]
    pub components: Vec<Component>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeriesPoint {
    pub date: Value,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabeledPoint {
    pub label: Value,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlicePoint {
    pub name: Value,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterPoint {
    pub x: Value,
    pub y: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricValue {
    pub label: String,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ComponentResult {
    Kpi(Value),
    TimeSeries(Vec<TimeSeriesPoint>),
    Bars(Vec<LabeledPoint>),
    Slices(Vec<SlicePoint>),
    Scatter(Vec<ScatterPoint>),
    Table(Vec<Row>),
    Metrics(Vec<MetricValue>),
}

impl ComponentResult {
    #[must_use]
    pub const fn field_name(&self) -> &'static str {
        match self {
            Self::Kpi(_) => "value",
            Self::Metrics(_) => "metrics",
            Self::TimeSeries(_)
            | Self::Bars(_)
            | Self::Slices(_)
            | Self::Scatter(_)
            | Self::Table(_) => "data",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExecutedComponent {
    pub component: Component,
    pub outcome: Result<ComponentResult, String>,
}

impl ExecutedComponent {
    pub fn to_json(&self) -> Result<Value, serde_json::Error> {
        let mut object = match serde_json::to_value(&self.component)? {
            Value::Object(object) => object,
            other => return Ok(other),
        };

        match &self.outcome {
            Ok(ComponentResult::Metrics(values)) => {
                let specs = match &self.component {
                    Component::MetricsGrid(grid) => grid.metrics.as_slice(),
                    _ => &[],
                };
                let merged = values
                    .iter()
                    .enumerate()
                    .map(|(index, metric)| {
                        let mut entry = Map::new();
                        entry.insert("label".to_string(), Value::String(metric.label.clone()));
                        if let Some(spec) = specs.get(index) {
                            entry.insert("query".to_string(), Value::String(spec.query.clone()));
                        }
                        entry.insert("value".to_string(), metric.value.clone());
                        Value::Object(entry)
                    })
                    .collect();
                object.insert("metrics".to_string(), Value::Array(merged));
            }
            Ok(result) => {
                object.insert(result.field_name().to_string(), serde_json::to_value(result)?);
            }
            Err(message) => {
                object.insert("error".to_string(), Value::String(message.clone()));
            }
        }

        Ok(Value::Object(object))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{Component, ComponentKind, ComponentResult, ExecutedComponent};

    #[test]
    fn kinds_round_trip_through_their_keys() {
        for kind in ComponentKind::ALL {
            assert_eq!(ComponentKind::from_key(kind.as_str()), Some(kind));
        }
        assert_eq!(ComponentKind::from_key("gauge"), None);
    }

    #[test]
    fn component_deserializes_by_type_tag() {
        let component: Component = serde_json::from_value(json!({
            "type": "horizontal_bar_chart",
            "title": "Top pages",
            "query": "SELECT path AS label, COUNT(*) AS value FROM views GROUP BY 1"
        }))
        .expect("component should decode");

        assert_eq!(component.kind(), ComponentKind::HorizontalBarChart);
        assert_eq!(component.title(), "Top pages");
        assert_eq!(component.queries().len(), 1);
    }

    #[test]
    fn executed_kpi_merges_value_field() {
        let component: Component = serde_json::from_value(json!({
            "type": "kpi",
            "title": "Users",
            "query": "SELECT COUNT(*) AS value FROM users"
        }))
        .expect("component should decode");
        let executed = ExecutedComponent {
            component,
            outcome: Ok(ComponentResult::Kpi(json!(12))),
        };

        let merged = executed.to_json().expect("component should encode");
        assert_eq!(merged.get("value"), Some(&json!(12)));
        assert_eq!(merged.get("type"), Some(&json!("kpi")));
    }
}
