use crate::models::{ActionKind, Component, Layout, MoveDirection, ResolvedAction};

pub const MIN_WIDTH: u32 = 1;
pub const MAX_WIDTH: u32 = 4;
pub const MIN_HEIGHT: u32 = 1;
pub const MAX_HEIGHT: u32 = 10;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApplyError {
    #[error("Component \"{title}\" not found")]
    ComponentNotFound { title: String },

    #[error("Cannot move further")]
    CannotMove,

    #[error("newTitle is required for rename action")]
    EmptyTitle,

    #[error("{field} is required for {action} action")]
    MissingField {
        field: &'static str,
        action: &'static str,
    },
}

fn locate(components: &[Component], action: &ResolvedAction) -> Result<usize, ApplyError> {
    let wanted = action.component_title.trim();
    if let Some(component) = components.get(action.component_index)
        && component.title().trim() == wanted
    {
        return Ok(action.component_index);
    }
    components
        .iter()
        .position(|component| component.title().trim() == wanted)
        .ok_or_else(|| ApplyError::ComponentNotFound {
            title: action.component_title.clone(),
        })
}

const fn missing(action: ActionKind) -> ApplyError {
    ApplyError::MissingField {
        field: action.required_field(),
        action: action.as_str(),
    }
}

// Applies one resolved action to the component list in place. On error the
// list is left untouched.
pub fn apply_action(
    components: &mut [Component],
    action: &ResolvedAction,
) -> Result<(), ApplyError> {
    let index = locate(components, action)?;

    match action.action {
        ActionKind::Rename => {
            let title = action
                .new_title
                .as_deref()
                .map(str::trim)
                .filter(|title| !title.is_empty())
                .ok_or(ApplyError::EmptyTitle)?;
            components[index].set_title(title);
        }
        ActionKind::Resize => {
            let size = action.new_size.ok_or(missing(ActionKind::Resize))?;
            let layout = components[index].layout_mut().get_or_insert_with(Layout::default);
            layout.w = size.w.clamp(MIN_WIDTH, MAX_WIDTH);
            layout.h = size.h.clamp(MIN_HEIGHT, MAX_HEIGHT);
        }
        ActionKind::Move => {
            let direction = action.direction.ok_or(missing(ActionKind::Move))?;
            let target = match direction {
                MoveDirection::Up => index.checked_sub(1),
                MoveDirection::Down => Some(index + 1).filter(|next| *next < components.len()),
            }
            .ok_or(ApplyError::CannotMove)?;
            components.swap(index, target);
        }
    }

    tracing::debug!(
        action = action.action.as_str(),
        component = %action.component_title,
        "modification applied"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{ApplyError, apply_action};
    use crate::models::{
        ActionKind, Component, GridSize, Layout, MoveDirection, ResolvedAction,
    };

    fn dashboard() -> Vec<Component> {
        serde_json::from_value(json!([
            {"type": "kpi", "title": "Users", "query": "SELECT 1 AS value"},
            {"type": "line_chart", "title": "Signups", "query": "SELECT 1 AS value",
             "layout": {"x": 1, "y": 0, "w": 2, "h": 2}},
            {"type": "table", "title": "Recent", "columns": ["id"], "query": "SELECT 1 AS id"}
        ]))
        .expect("fixture components should decode")
    }

    fn action(kind: ActionKind, title: &str, index: usize) -> ResolvedAction {
        ResolvedAction {
            action: kind,
            component_title: title.to_string(),
            component_index: index,
            new_title: None,
            new_size: None,
            direction: None,
            message: String::new(),
        }
    }

    #[test]
    fn resize_creates_default_layout_and_clamps() {
        let mut components = dashboard();
        let mut resize = action(ActionKind::Resize, "Users", 0);
        resize.new_size = Some(GridSize { w: 9, h: 40 });

        apply_action(&mut components, &resize).expect("resize should apply");
        assert_eq!(
            components[0].layout(),
            Some(Layout {
                x: 0,
                y: 0,
                w: 4,
                h: 10
            })
        );
    }

    #[test]
    fn move_swaps_with_neighbour_and_stops_at_edges() {
        let mut components = dashboard();
        let mut up = action(ActionKind::Move, "Signups", 1);
        up.direction = Some(MoveDirection::Up);
        apply_action(&mut components, &up).expect("move should apply");
        assert_eq!(components[0].title(), "Signups");

        let mut again = action(ActionKind::Move, "Signups", 0);
        again.direction = Some(MoveDirection::Up);
        assert_eq!(apply_action(&mut components, &again), Err(ApplyError::CannotMove));

        let mut down = action(ActionKind::Move, "Recent", 2);
        down.direction = Some(MoveDirection::Down);
        assert_eq!(apply_action(&mut components, &down), Err(ApplyError::CannotMove));
    }

    #[test]
    fn rename_trims_and_rejects_blank_titles() {
        let mut components = dashboard();
        let mut rename = action(ActionKind::Rename, "Recent", 2);
        rename.new_title = Some("   ".to_string());
        assert_eq!(apply_action(&mut components, &rename), Err(ApplyError::EmptyTitle));

        rename.new_title = Some("  Latest rows ".to_string());
        apply_action(&mut components, &rename).expect("rename should apply");
        assert_eq!(components[2].title(), "Latest rows");
    }

    #[test]
    fn stale_index_falls_back_to_title_lookup() {
        let mut components = dashboard();
        let mut rename = action(ActionKind::Rename, "Users", 2);
        rename.new_title = Some("People".to_string());
        apply_action(&mut components, &rename).expect("rename should apply");
        assert_eq!(components[0].title(), "People");

        let missing = action(ActionKind::Rename, "Revenue", 0);
        assert!(matches!(
            apply_action(&mut components, &missing),
            Err(ApplyError::ComponentNotFound { .. })
        ));
    }
}
