use serde_json::Value;

use crate::models::{LabeledPoint, Row, ScatterPoint, SlicePoint, TimeSeriesPoint};

// A JSON `null` counts as a missing column.
fn pick(row: &Row, keys: &[&str]) -> Option<Value> {
    keys.iter()
        .filter_map(|key| row.get(*key))
        .find(|value| !value.is_null())
        .cloned()
}

fn pick_or(row: &Row, keys: &[&str], fallback: Value) -> Value {
    pick(row, keys).unwrap_or(fallback)
}

fn measure(row: &Row) -> Value {
    pick_or(row, &["value", "count"], Value::from(0))
}

#[must_use]
pub fn kpi_value(rows: &[Row]) -> Value {
    let Some(first) = rows.first() else {
        return Value::from(0);
    };
    match first.get("value") {
        Some(value) => value.clone(),
        None => first.values().next().cloned().unwrap_or_else(|| Value::from(0)),
    }
}

#[must_use]
pub fn time_series(rows: &[Row]) -> Vec<TimeSeriesPoint> {
    rows.iter()
        .map(|row| TimeSeriesPoint {
            date: row.get("date").cloned().unwrap_or(Value::Null),
            value: measure(row),
        })
        .collect()
}

#[must_use]
pub fn labeled(rows: &[Row]) -> Vec<LabeledPoint> {
    rows.iter()
        .map(|row| LabeledPoint {
            label: pick_or(row, &["label", "name"], Value::from("")),
            value: measure(row),
        })
        .collect()
}

#[must_use]
pub fn slices(rows: &[Row]) -> Vec<SlicePoint> {
    rows.iter()
        .map(|row| SlicePoint {
            name: pick_or(row, &["name", "label"], Value::from("")),
            value: measure(row),
        })
        .collect()
}

#[must_use]
pub fn scatter(rows: &[Row]) -> Vec<ScatterPoint> {
    rows.iter()
        .map(|row| ScatterPoint {
            x: pick_or(row, &["x"], Value::from(0)),
            y: pick_or(row, &["y"], Value::from(0)),
        })
        .collect()
}
