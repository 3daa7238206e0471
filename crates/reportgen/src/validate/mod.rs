use std::fmt::{Display, Formatter};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::models::{
    ActionKind, Component, ComponentKind, DatePreset, ModificationAction, MoveDirection,
    ReportConfig,
};
use crate::utils::time::{IsoDateError, parse_iso_date};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub path: String,
    pub message: String,
}

impl ValidationIssue {
    #[must_use]
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub struct ValidationErrors {
    issues: Vec<ValidationIssue>,
}

impl ValidationErrors {
    #[must_use]
    pub fn new(issues: Vec<ValidationIssue>) -> Self {
        Self { issues }
    }

    #[must_use]
    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    #[must_use]
    pub fn into_issues(self) -> Vec<ValidationIssue> {
        self.issues
    }

    #[must_use]
    pub fn feedback_lines(&self) -> String {
        feedback_lines(&self.issues)
    }
}

impl Display for ValidationErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} validation issue(s)", self.issues.len())?;
        for issue in &self.issues {
            write!(f, "; {}: {}", issue.path, issue.message)?;
        }
        Ok(())
    }
}

#[must_use]
pub fn feedback_lines(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(|issue| format!("- {}: {}", issue.path, issue.message))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn validate_report_config(candidate: &Value) -> Result<ReportConfig, ValidationErrors> {
    let mut walker = Walker::default();
    if let Some(object) = walker.object(candidate, "") {
        walker.non_empty_string(object, "", "reportName", "Report name is required");
        walker.component_list(object, "", "At least one component is required");
    }
    walker.finish(candidate)
}

pub fn validate_components_payload(candidate: &Value) -> Result<Vec<Component>, ValidationErrors> {
    #[derive(Deserialize)]
    struct ComponentsPayload {
        components: Vec<Component>,
    }

    let mut walker = Walker::default();
    if let Some(object) = walker.object(candidate, "") {
        walker.component_list(object, "", "Components array cannot be empty");
    }
    walker
        .finish::<ComponentsPayload>(candidate)
        .map(|payload| payload.components)
}

pub fn validate_modification_action(
    candidate: &Value,
) -> Result<ModificationAction, ValidationErrors> {
    let mut walker = Walker::default();
    if let Some(object) = walker.object(candidate, "") {
        walker.enum_value(
            object,
            "",
            "action",
            &ActionKind::ALL.map(ActionKind::as_str),
            true,
        );
        walker.string(object, "", "componentTitle", true);
        walker.string(object, "", "newTitle", false);
        walker.grid_size(object, "newSize");
        walker.enum_value(
            object,
            "",
            "direction",
            &[MoveDirection::Up.as_str(), MoveDirection::Down.as_str()],
            false,
        );
    }
    walker.finish(candidate)
}

fn child(path: &str, key: impl Display) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn expected_one_of(allowed: &[&str]) -> String {
    allowed
        .iter()
        .map(|value| format!("'{value}'"))
        .collect::<Vec<_>>()
        .join(" | ")
}

#[derive(Debug, Default)]
struct Walker {
    issues: Vec<ValidationIssue>,
}

impl Walker {
    fn push(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.issues.push(ValidationIssue::new(path, message));
    }

    fn finish<T: DeserializeOwned>(self, candidate: &Value) -> Result<T, ValidationErrors> {
        if !self.issues.is_empty() {
            return Err(ValidationErrors::new(self.issues));
        }
        serde_json::from_value(candidate.clone())
            .map_err(|error| ValidationErrors::new(vec![ValidationIssue::new("", error.to_string())]))
    }

    fn object<'a>(&mut self, value: &'a Value, path: &str) -> Option<&'a Map<String, Value>> {
        match value {
            Value::Object(object) => Some(object),
            other => {
                self.push(path, format!("Expected object, received {}", type_name(other)));
                None
            }
        }
    }

    fn field<'a>(
        &mut self,
        object: &'a Map<String, Value>,
        path: &str,
        key: &str,
        required: bool,
    ) -> Option<&'a Value> {
        match object.get(key) {
            Some(Value::Null) | None => {
                if required {
                    self.push(child(path, key), "Required");
                }
                None
            }
            Some(value) => Some(value),
        }
    }

    fn string<'a>(
        &mut self,
        object: &'a Map<String, Value>,
        path: &str,
        key: &str,
        required: bool,
    ) -> Option<&'a str> {
        match self.field(object, path, key, required)? {
            Value::String(text) => Some(text.as_str()),
            other => {
                self.push(
                    child(path, key),
                    format!("Expected string, received {}", type_name(other)),
                );
                None
            }
        }
    }

    fn non_empty_string(
        &mut self,
        object: &Map<String, Value>,
        path: &str,
        key: &str,
        empty_message: &str,
    ) {
        if let Some(text) = self.string(object, path, key, true)
            && text.is_empty()
        {
            self.push(child(path, key), empty_message);
        }
    }

    fn array<'a>(
        &mut self,
        object: &'a Map<String, Value>,
        path: &str,
        key: &str,
        required: bool,
        empty_message: &str,
    ) -> Option<&'a [Value]> {
        match self.field(object, path, key, required)? {
            Value::Array(items) if items.is_empty() => {
                self.push(child(path, key), empty_message);
                None
            }
            Value::Array(items) => Some(items.as_slice()),
            other => {
                self.push(
                    child(path, key),
                    format!("Expected array, received {}", type_name(other)),
                );
                None
            }
        }
    }

    fn enum_value(
        &mut self,
        object: &Map<String, Value>,
        path: &str,
        key: &str,
        allowed: &[&str],
        required: bool,
    ) {
        if let Some(text) = self.string(object, path, key, required)
            && !allowed.contains(&text)
        {
            self.push(
                child(path, key),
                format!(
                    "Invalid enum value. Expected {}, received '{text}'",
                    expected_one_of(allowed)
                ),
            );
        }
    }

    fn component_list(&mut self, object: &Map<String, Value>, path: &str, empty_message: &str) {
        let list_path = child(path, "components");
        if let Some(items) = self.array(object, path, "components", true, empty_message) {
            for (index, item) in items.iter().enumerate() {
                self.component(item, &child(&list_path, index));
            }
        }
    }

    fn component(&mut self, value: &Value, path: &str) {
        let Some(object) = self.object(value, path) else {
            return;
        };

        let kind = object
            .get("type")
            .and_then(Value::as_str)
            .and_then(ComponentKind::from_key);
        let Some(kind) = kind else {
            let allowed = ComponentKind::ALL.map(ComponentKind::as_str);
            self.push(
                child(path, "type"),
                format!(
                    "Invalid discriminator value. Expected {}",
                    expected_one_of(&allowed)
                ),
            );
            return;
        };

        self.non_empty_string(object, path, "title", "Title is required");
        self.date_range(object, path);
        self.filters(object, path);
        self.layout(object, path);

        match kind {
            ComponentKind::MetricsGrid => self.metrics(object, path),
            ComponentKind::Table => {
                self.columns(object, path);
                self.non_empty_string(object, path, "query", "SQL query is required");
            }
            _ => self.non_empty_string(object, path, "query", "SQL query is required"),
        }
    }

    fn columns(&mut self, object: &Map<String, Value>, path: &str) {
        let list_path = child(path, "columns");
        let Some(items) = self.array(object, path, "columns", true, "At least one column is required")
        else {
            return;
        };
        for (index, item) in items.iter().enumerate() {
            match item {
                Value::String(text) if text.is_empty() => self.push(
                    child(&list_path, index),
                    "String must contain at least 1 character(s)",
                ),
                Value::String(_) => {}
                other => self.push(
                    child(&list_path, index),
                    format!("Expected string, received {}", type_name(other)),
                ),
            }
        }
    }

    fn metrics(&mut self, object: &Map<String, Value>, path: &str) {
        let list_path = child(path, "metrics");
        let Some(items) = self.array(object, path, "metrics", true, "At least one metric is required")
        else {
            return;
        };
        for (index, item) in items.iter().enumerate() {
            let entry_path = child(&list_path, index);
            if let Some(entry) = self.object(item, &entry_path) {
                self.non_empty_string(entry, &entry_path, "label", "Label is required");
                self.non_empty_string(entry, &entry_path, "query", "SQL query is required");
            }
        }
    }

    fn date_range(&mut self, object: &Map<String, Value>, path: &str) {
        let range_path = child(path, "dateRange");
        match self.field(object, path, "dateRange", false) {
            None => {}
            Some(Value::String(preset)) => {
                if DatePreset::from_key(preset).is_none() {
                    let allowed = DatePreset::ALL.map(DatePreset::as_str);
                    self.push(
                        range_path,
                        format!(
                            "Invalid enum value. Expected {}, received '{preset}'",
                            expected_one_of(&allowed)
                        ),
                    );
                }
            }
            Some(Value::Object(custom)) => {
                let start = self.iso_date(custom, &range_path, "start", "Start");
                let end = self.iso_date(custom, &range_path, "end", "End");
                if let (Some(start), Some(end)) = (start, end)
                    && start > end
                {
                    self.push(range_path, "Start date must be before or equal to end date");
                }
            }
            Some(other) => self.push(
                range_path,
                format!(
                    "Expected a date range preset or {{start, end}}, received {}",
                    type_name(other)
                ),
            ),
        }
    }

    fn iso_date(
        &mut self,
        object: &Map<String, Value>,
        path: &str,
        key: &str,
        label: &str,
    ) -> Option<time::Date> {
        let raw = self.string(object, path, key, true)?;
        match parse_iso_date(raw) {
            Ok(date) => Some(date),
            Err(IsoDateError::Format) => {
                self.push(
                    child(path, key),
                    format!("{label} date must be in YYYY-MM-DD format"),
                );
                None
            }
            Err(IsoDateError::Calendar) => {
                self.push(
                    child(path, key),
                    format!("{label} date is not a valid calendar date"),
                );
                None
            }
        }
    }

    fn filters(&mut self, object: &Map<String, Value>, path: &str) {
        let list_path = child(path, "filters");
        let items = match self.field(object, path, "filters", false) {
            None => return,
            Some(Value::Array(items)) => items,
            Some(other) => {
                self.push(
                    list_path,
                    format!("Expected array, received {}", type_name(other)),
                );
                return;
            }
        };
        for (index, item) in items.iter().enumerate() {
            let entry_path = child(&list_path, index);
            if let Some(entry) = self.object(item, &entry_path) {
                self.string(entry, &entry_path, "field", true);
                self.string(entry, &entry_path, "operator", true);
            }
        }
    }

    fn layout(&mut self, object: &Map<String, Value>, path: &str) {
        let layout_path = child(path, "layout");
        let Some(value) = self.field(object, path, "layout", false) else {
            return;
        };
        let Some(layout) = self.object(value, &layout_path) else {
            return;
        };
        for key in ["x", "y", "w", "h"] {
            if let Some(value) = self.field(layout, &layout_path, key, true) {
                let fits = value
                    .as_u64()
                    .is_some_and(|number| u32::try_from(number).is_ok());
                if !fits {
                    self.push(child(&layout_path, key), "Expected non-negative integer");
                }
            }
        }
    }

    fn grid_size(&mut self, object: &Map<String, Value>, key: &str) {
        let Some(value) = self.field(object, "", key, false) else {
            return;
        };
        let Some(size) = self.object(value, key) else {
            return;
        };
        for (dimension, max) in [("w", Some(4_u64)), ("h", None)] {
            let Some(value) = self.field(size, key, dimension, true) else {
                continue;
            };
            let path = child(key, dimension);
            let Some(number) = value.as_f64() else {
                self.push(path, format!("Expected number, received {}", type_name(value)));
                continue;
            };
            if number < 1.0 {
                self.push(path, "Number must be greater than or equal to 1");
            } else if max.is_some_and(|max| number > max as f64) {
                self.push(path, "Number must be less than or equal to 4");
            } else if value.as_u64().is_none() {
                self.push(path, "Expected integer, received float");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{feedback_lines, validate_modification_action, validate_report_config};

    #[test]
    fn collects_every_issue_with_paths() {
        let errors = validate_report_config(&json!({
            "reportName": "",
            "components": [
                { "type": "kpi", "title": "Users", "query": "SELECT 1 AS value" },
                { "type": "line_chart", "title": "" },
                { "type": "table", "title": "Rows", "columns": [], "query": "SELECT 1" }
            ]
        }))
        .expect_err("config should fail");

        let paths = errors
            .issues()
            .iter()
            .map(|issue| issue.path.as_str())
            .collect::<Vec<_>>();
        assert_eq!(
            paths,
            vec![
                "reportName",
                "components.1.title",
                "components.1.query",
                "components.2.columns"
            ]
        );
        assert_eq!(errors.issues()[2].message, "Required");
    }

    #[test]
    fn no_type_coercion() {
        let errors = validate_report_config(&json!({
            "reportName": "R",
            "components": [{ "type": "kpi", "title": 7, "query": "SELECT 1" }]
        }))
        .expect_err("numeric title must fail");
        assert_eq!(errors.issues()[0].path, "components.0.title");
        assert_eq!(errors.issues()[0].message, "Expected string, received number");
    }

    #[test]
    fn feedback_lines_use_dash_path_message() {
        let errors = validate_report_config(&json!({"reportName": "R", "components": []}))
            .expect_err("empty components must fail");
        assert_eq!(
            feedback_lines(errors.issues()),
            "- components: At least one component is required"
        );
    }

    #[test]
    fn action_optional_fields_may_be_null() {
        let action = validate_modification_action(&json!({
            "action": "move",
            "componentTitle": "Revenue",
            "newTitle": null,
            "newSize": null,
            "direction": "up"
        }))
        .expect("action should validate");
        assert!(action.new_title.is_none());
        assert!(action.direction.is_some());
    }

    #[test]
    fn action_grid_size_bounds() {
        let errors = validate_modification_action(&json!({
            "action": "resize",
            "componentTitle": "Revenue",
            "newSize": { "w": 5, "h": 0 }
        }))
        .expect_err("out of range size must fail");
        let messages = errors
            .issues()
            .iter()
            .map(|issue| format!("{}: {}", issue.path, issue.message))
            .collect::<Vec<_>>();
        assert_eq!(
            messages,
            vec![
                "newSize.w: Number must be less than or equal to 4",
                "newSize.h: Number must be greater than or equal to 1"
            ]
        );
    }
}
