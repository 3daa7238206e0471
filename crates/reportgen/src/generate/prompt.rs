use time::Date;

use crate::llm::ChatMessage;
use crate::models::{ComponentKind, DatePreset, ReportConfig};
use crate::utils::time::format_iso_date;
use crate::validate::{ValidationIssue, feedback_lines};

pub const GENERATION_TOOL: &str = "generate_report_config";
pub const GENERATION_TOOL_DESCRIPTION: &str =
    "Generate a valid report configuration with components";
pub const VERIFICATION_TOOL: &str = "verify_report_config";
pub const VERIFICATION_TOOL_DESCRIPTION: &str =
    "Report whether the configuration answers the user's request";

pub const RETRY_ACKNOWLEDGEMENT: &str = "Let me try again with the correct format.";

const NOW_PLACEHOLDER: &str = "{{NOW}}";

const PROMPT_HEADER: &str = "You are an analytics report configuration generator. \
Your job is to convert user requests into report configurations made of predefined \
analytics components, each backed by a read-only SQL query.

Current date: {{NOW}}
Use this date to calculate relative date ranges and understand time-based requests.";

const SQL_RULES: &str = "SQL rules:
- Every query must be a single SELECT statement (a WITH ... SELECT is allowed)
- Never write INSERT, UPDATE, DELETE, DDL, transaction control or SET statements
- Alias result columns exactly as the component contract requires (value, date, label, name, x, y)
- Only reference tables and columns listed in the database schema
- Filter by date inside the query; the dateRange field only documents the window";

const FEW_SHOT_EXAMPLES: &str = r#"Examples:

User: "Show me daily active users for the last week"
Tool input:
{
  "reportName": "Daily Active Users - Last 7 Days",
  "components": [
    {
      "type": "kpi",
      "title": "Total Active Users",
      "query": "SELECT COUNT(DISTINCT user_id) AS value FROM events WHERE created_at >= CURRENT_DATE - INTERVAL '7 days'",
      "dateRange": "last_7_days"
    },
    {
      "type": "line_chart",
      "title": "DAU Trend",
      "query": "SELECT DATE(created_at) AS date, COUNT(DISTINCT user_id) AS value FROM events WHERE created_at >= CURRENT_DATE - INTERVAL '7 days' GROUP BY 1 ORDER BY 1",
      "dateRange": "last_7_days"
    }
  ]
}

User: "Show me event distribution by type"
Tool input:
{
  "reportName": "Event Type Distribution",
  "components": [
    {
      "type": "pie_chart",
      "title": "Events by Type",
      "query": "SELECT event_name AS name, COUNT(*) AS value FROM events GROUP BY 1 ORDER BY 2 DESC",
      "dateRange": "last_30_days"
    }
  ]
}

User: "Give me an overview of signups and activity"
Tool input:
{
  "reportName": "Signup and Activity Overview",
  "components": [
    {
      "type": "metrics_grid",
      "title": "Overview",
      "metrics": [
        { "label": "Total Users", "query": "SELECT COUNT(*) AS value FROM users" },
        { "label": "Events Today", "query": "SELECT COUNT(*) AS value FROM events WHERE created_at >= CURRENT_DATE" }
      ]
    },
    {
      "type": "table",
      "title": "Most Active Users",
      "columns": ["email", "events"],
      "query": "SELECT u.email, COUNT(e.id) AS events FROM users u JOIN events e ON e.user_id = u.id GROUP BY u.email ORDER BY events DESC LIMIT 10"
    }
  ]
}

User: "Show me Q1 2024 performance"
Tool input:
{
  "reportName": "Q1 2024 Performance",
  "components": [
    {
      "type": "kpi",
      "title": "Total Users",
      "query": "SELECT COUNT(DISTINCT user_id) AS value FROM events WHERE created_at >= '2024-01-01' AND created_at < '2024-04-01'",
      "dateRange": { "start": "2024-01-01", "end": "2024-03-31" }
    }
  ]
}"#;

const GUIDELINES: &str = "Guidelines:
- Choose the visualization that best represents the data type and user intent
- Use KPIs for single important numbers
- Use line/area charts for trends over time
- Use bar charts for comparisons across categories, horizontal bars for rankings with long labels
- Use pie/donut charts for proportions and distributions
- Use scatter charts when exploring relationships between two metrics
- Use tables for detailed multi-column data
- Use metrics_grid for dashboard overviews with multiple KPIs
- When the user specifies dates or quarters, use a custom dateRange with start/end
- When the user asks for relative periods (last week, last month), use a predefined dateRange
- Use the current date ({{NOW}}) to calculate custom date ranges";

const VERIFICATION_PROMPT: &str = "You are a quality assurance agent reviewing analytics report configurations.

Your job is to verify that the generated report configuration correctly answers the user's original request.

Evaluate:
1. Does the report include all components needed to answer the user's question?
2. Do the SQL queries compute the metrics the user asked for?
3. Are the date ranges sensible for the user's request?
4. Are the visualization types appropriate for the data being shown?
5. Is the report name descriptive and accurate?

Call the verify_report_config tool with isValid, feedback (an explanation of issues if invalid, \
or a confirmation if valid) and suggestions (specific improvements if needed).";

fn kind_summary(kind: ComponentKind) -> (&'static str, &'static str) {
    match kind {
        ComponentKind::Kpi => (
            "Single metric display card showing one key value prominently",
            "single important numbers like total users, revenue, conversion rate",
        ),
        ComponentKind::LineChart => (
            "Time-series line graph",
            "trends over time, showing progression and patterns",
        ),
        ComponentKind::BarChart => (
            "Vertical bar chart for categorical comparison",
            "comparing values across categories or time periods",
        ),
        ComponentKind::Table => (
            "Tabular data display with rows and columns",
            "detailed data with multiple attributes, lists of items",
        ),
        ComponentKind::MetricsGrid => (
            "Grid of several KPI cards displayed together",
            "dashboard overviews with several key metrics at once",
        ),
        ComponentKind::PieChart => (
            "Circular chart showing parts of a whole",
            "distribution and composition",
        ),
        ComponentKind::AreaChart => (
            "Filled area chart showing volume over time",
            "cumulative values, magnitude and trend together",
        ),
        ComponentKind::DonutChart => (
            "Ring-shaped pie chart",
            "proportions, such as traffic sources or user types",
        ),
        ComponentKind::ScatterChart => (
            "Scatter plot of two variables",
            "correlation between two metrics",
        ),
        ComponentKind::HorizontalBarChart => (
            "Horizontal bars for category comparison",
            "rankings and categories with long labels",
        ),
    }
}

fn component_catalog() -> String {
    let mut lines = vec!["Available components:".to_string()];
    for (index, kind) in ComponentKind::ALL.into_iter().enumerate() {
        let (summary, use_for) = kind_summary(kind);
        lines.push(format!("{}. \"{}\" - {summary}", index + 1, kind.as_str()));
        lines.push(format!("   - Use for: {use_for}"));
        lines.push(format!("   - Query contract: {}", kind.row_contract()));
    }
    lines.join("\n")
}

fn date_range_rules() -> String {
    let presets = DatePreset::ALL
        .iter()
        .map(|preset| preset.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "Date ranges:\n\
         - Predefined: {presets}\n\
         - Custom: {{ \"start\": \"YYYY-MM-DD\", \"end\": \"YYYY-MM-DD\" }} with start on or before end"
    )
}

#[must_use]
pub fn build_system_prompt(schema_text: &str, today: Date) -> String {
    let sections = [
        PROMPT_HEADER.to_string(),
        schema_text.trim_end().to_string(),
        component_catalog(),
        date_range_rules(),
        SQL_RULES.to_string(),
        FEW_SHOT_EXAMPLES.to_string(),
        GUIDELINES.to_string(),
    ];
    sections
        .join("\n\n")
        .replace(NOW_PLACEHOLDER, &format_iso_date(today))
}

#[must_use]
pub fn retry_instruction(issues: &[ValidationIssue]) -> String {
    format!(
        "The previous configuration had validation errors. Please fix these issues and regenerate:\n\n{}\n\nGenerate a valid configuration that addresses all these errors.",
        feedback_lines(issues)
    )
}

#[must_use]
pub fn generation_messages(prompt: &str, last_issues: Option<&[ValidationIssue]>) -> Vec<ChatMessage> {
    let mut messages = vec![ChatMessage::user(prompt)];
    if let Some(issues) = last_issues {
        messages.push(ChatMessage::assistant(RETRY_ACKNOWLEDGEMENT));
        messages.push(ChatMessage::user(retry_instruction(issues)));
    }
    messages
}

#[must_use]
pub fn verification_system_prompt() -> &'static str {
    VERIFICATION_PROMPT
}

#[must_use]
pub fn verification_message(prompt: &str, config_json: &str) -> String {
    format!(
        "Original user request: \"{prompt}\"\n\nGenerated configuration:\n{config_json}\n\nIs this configuration correct and appropriate for the user's request?"
    )
}

pub fn render_config(config: &ReportConfig) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(config)
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use super::{build_system_prompt, generation_messages};
    use crate::llm::MessageRole;
    use crate::validate::ValidationIssue;

    #[test]
    fn system_prompt_embeds_schema_date_and_catalog() {
        let prompt = build_system_prompt("## Database Schema\n\n### Tables\n", date!(2024 - 05 - 09));
        assert!(prompt.contains("Current date: 2024-05-09"));
        assert!(!prompt.contains("{{NOW}}"));
        assert!(prompt.contains("## Database Schema"));
        assert!(prompt.contains("10. \"horizontal_bar_chart\""));
        assert!(prompt.contains("a single row with a 'value' column"));
    }

    #[test]
    fn first_attempt_sends_only_the_request() {
        let messages = generation_messages("revenue by week", None);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, MessageRole::User);
    }

    #[test]
    fn retry_appends_acknowledgement_and_feedback() {
        let issues = vec![ValidationIssue::new("components.0.query", "Required")];
        let messages = generation_messages("revenue by week", Some(&issues));
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1].role, MessageRole::Assistant);
        assert!(messages[2].content.contains("- components.0.query: Required"));
    }
}
