use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Rename,
    Resize,
    Move,
}

impl ActionKind {
    pub const ALL: [Self; 3] = [Self::Rename, Self::Resize, Self::Move];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Rename => "rename",
            Self::Resize => "resize",
            Self::Move => "move",
        }
    }

    #[must_use]
    pub const fn required_field(self) -> &'static str {
        match self {
            Self::Rename => "newTitle",
            Self::Resize => "newSize",
            Self::Move => "direction",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum MoveDirection {
    Up,
    Down,
}

impl MoveDirection {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct GridSize {
    /// New width in grid units (1-4)
    #[schemars(range(min = 1, max = 4))]
    pub w: u32,

    /// New height in grid units (minimum 1)
    #[schemars(range(min = 1))]
    pub h: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ModificationAction {
    /// The type of modification to perform
    pub action: ActionKind,

    /// The exact title of the component to modify (must match one of the component titles provided)
    pub component_title: String,

    /// The new title for the component (required only for rename action)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_title: Option<String>,

    /// New size for the component (required only for resize action)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_size: Option<GridSize>,

    /// Direction to move the component (required only for move action)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<MoveDirection>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedAction {
    pub action: ActionKind,
    pub component_title: String,

    #[serde(default)]
    pub component_index: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_size: Option<GridSize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<MoveDirection>,

    #[serde(default)]
    pub message: String,
}

impl ResolvedAction {
    #[must_use]
    pub fn new(action: ModificationAction, component_index: usize, matched_title: &str) -> Self {
        let message = format!(
            "Action parsed: {} on \"{}\"",
            action.action.as_str(),
            matched_title
        );
        Self {
            action: action.action,
            component_title: matched_title.to_string(),
            component_index,
            new_title: action.new_title,
            new_size: action.new_size,
            direction: action.direction,
            message,
        }
    }
}
