pub mod apply;

use std::sync::Arc;

use serde_json::Value;

use crate::llm::{ChatMessage, LanguageModel, ModelCallError, StructuredRequest, ToolSpec};
use crate::models::{ActionKind, Component, ComponentKind, ModificationAction, ResolvedAction};
use crate::validate::{ValidationErrors, validate_modification_action};

pub use apply::{ApplyError, apply_action};

pub const MODIFY_TOOL: &str = "modify_component";
pub const MODIFY_TOOL_DESCRIPTION: &str = "Modify a dashboard component";
pub const MODIFY_MAX_TOKENS: u32 = 1000;

#[derive(Debug, thiserror::Error)]
pub enum ModifyError {
    #[error("Prompt is required")]
    EmptyPrompt,

    #[error("Components array is required")]
    NoComponents,

    #[error("Failed to parse modification action: {0}")]
    ModelCall(#[source] ModelCallError),

    #[error("Invalid action data: {errors}")]
    InvalidAction {
        errors: ValidationErrors,
        received: Value,
    },

    #[error("{} is required for {} action", .action.required_field(), .action.as_str())]
    MissingActionField { action: ActionKind },

    #[error("Component \"{title}\" not found")]
    ComponentNotFound { title: String, available: Vec<String> },

    #[error("Component \"{title}\" matches more than one component")]
    AmbiguousComponent { title: String, candidates: Vec<String> },
}

impl ModifyError {
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::EmptyPrompt => "prompt_required",
            Self::NoComponents => "components_required",
            Self::ModelCall(_) => "model_call_failed",
            Self::InvalidAction { .. } => "invalid_action",
            Self::MissingActionField { .. } => "missing_action_field",
            Self::ComponentNotFound { .. } => "component_not_found",
            Self::AmbiguousComponent { .. } => "ambiguous_component",
        }
    }

    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        !matches!(self, Self::ModelCall(_))
    }
}

fn system_prompt() -> String {
    let size = |kind: ComponentKind| {
        let (w, h) = kind.default_size();
        format!("{w}x{h}")
    };
    format!(
        "You are a dashboard modification assistant. Your job is to understand user requests to modify dashboard components and return structured actions.

Available actions:
1. \"rename\" - Change the title of a component
   - Requires: componentTitle (current title), newTitle (new title)
   - Example: \"rename Daily Active Users to DAU\"

2. \"resize\" - Change the size of a component
   - Requires: componentTitle, newSize with w (width 1-4) and h (height minimum 1)
   - Example: \"make the User Growth chart bigger\" or \"resize Daily Active Users to 2x3\"
   - Default sizes: KPI ({kpi}), Charts ({chart}), Table ({table}), Metrics Grid ({grid})

3. \"move\" - Move a component up or down in the layout
   - Requires: componentTitle, direction ('up' or 'down')
   - Example: \"move Daily Active Users up\" or \"move the first chart down\"

IMPORTANT:
- Identify components by their EXACT title as provided in the components list
- For resize, if the user says \"bigger\" or \"smaller\", infer reasonable new dimensions
- For move, \"up\" means earlier in the list (lower index), \"down\" means later (higher index)
- Grid layout: width is 1-4 units, height is minimum 1 unit
- Always return valid action types and required fields",
        kpi = size(ComponentKind::Kpi),
        chart = size(ComponentKind::LineChart),
        table = size(ComponentKind::Table),
        grid = size(ComponentKind::MetricsGrid),
    )
}

#[must_use]
pub fn component_listing(components: &[Component]) -> String {
    components
        .iter()
        .enumerate()
        .map(|(index, component)| {
            let layout = component
                .layout()
                .map(|layout| {
                    format!(
                        " (position: {},{}, size: {}x{})",
                        layout.x, layout.y, layout.w, layout.h
                    )
                })
                .unwrap_or_default();
            format!(
                "{}. \"{}\" - Type: {}{layout}",
                index + 1,
                component.title(),
                component.kind().as_str()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn user_message(prompt: &str, components: &[Component]) -> String {
    format!(
        "User request: \"{prompt}\"\n\nCurrent dashboard components:\n{}\n\nWhat action should be performed? Identify the component by its exact title and return the appropriate action.",
        component_listing(components)
    )
}

pub fn check_action_requirements(action: &ModificationAction) -> Result<(), ModifyError> {
    let present = match action.action {
        ActionKind::Rename => action
            .new_title
            .as_deref()
            .is_some_and(|title| !title.trim().is_empty()),
        ActionKind::Resize => action.new_size.is_some(),
        ActionKind::Move => action.direction.is_some(),
    };
    if present {
        Ok(())
    } else {
        Err(ModifyError::MissingActionField {
            action: action.action,
        })
    }
}

// Finds the component a requested title refers to. Passes run in order
// (exact, case-insensitive, substring either way) and the first pass with any
// candidate decides: one candidate resolves, several are ambiguous.
pub fn resolve_component_title(
    requested: &str,
    components: &[Component],
) -> Result<usize, ModifyError> {
    let titles = components.iter().map(Component::title).collect::<Vec<_>>();
    let requested_lower = requested.to_lowercase();

    let exact = |title: &str| title == requested;
    let case_insensitive = |title: &str| title.to_lowercase() == requested_lower;
    let substring = |title: &str| {
        if title.trim().is_empty() || requested_lower.trim().is_empty() {
            return false;
        }
        let title_lower = title.to_lowercase();
        title_lower.contains(&requested_lower) || requested_lower.contains(&title_lower)
    };
    let passes: [&dyn Fn(&str) -> bool; 3] = [&exact, &case_insensitive, &substring];

    for matches in passes {
        let candidates = titles
            .iter()
            .enumerate()
            .filter(|(_, title)| matches(title))
            .map(|(index, _)| index)
            .collect::<Vec<_>>();
        match candidates.as_slice() {
            [] => continue,
            [index] => return Ok(*index),
            many => {
                return Err(ModifyError::AmbiguousComponent {
                    title: requested.to_string(),
                    candidates: many.iter().map(|index| titles[*index].to_string()).collect(),
                });
            }
        }
    }

    Err(ModifyError::ComponentNotFound {
        title: requested.to_string(),
        available: titles.iter().map(ToString::to_string).collect(),
    })
}

pub struct ModificationParser {
    model: Arc<dyn LanguageModel>,
}

impl ModificationParser {
    #[must_use]
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    pub async fn parse(
        &self,
        prompt: &str,
        components: &[Component],
    ) -> Result<ResolvedAction, ModifyError> {
        if prompt.trim().is_empty() {
            return Err(ModifyError::EmptyPrompt);
        }
        if components.is_empty() {
            return Err(ModifyError::NoComponents);
        }

        let request = StructuredRequest {
            system: system_prompt(),
            messages: vec![ChatMessage::user(user_message(prompt, components))],
            tool: ToolSpec::for_type::<ModificationAction>(MODIFY_TOOL, MODIFY_TOOL_DESCRIPTION),
            max_tokens: MODIFY_MAX_TOKENS,
        };
        let raw = self
            .model
            .call_structured(request)
            .await
            .map_err(ModifyError::ModelCall)?;
        tracing::debug!(action = %raw, "modification action returned by model");

        let action = validate_modification_action(&raw).map_err(|errors| {
            ModifyError::InvalidAction {
                errors,
                received: raw.clone(),
            }
        })?;
        check_action_requirements(&action)?;

        let index = resolve_component_title(&action.component_title, components)?;
        let resolved = ResolvedAction::new(action, index, components[index].title());
        tracing::info!(
            action = resolved.action.as_str(),
            component = %resolved.component_title,
            index,
            "modification action resolved"
        );
        Ok(resolved)
    }
}
