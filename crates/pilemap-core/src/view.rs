//! Render list projection.
//!
//! The editor never draws anything itself. Hosts call [`project`] after each
//! dispatch and paint the returned items in order.

use crate::editor::Editor;
use crate::geometry::{self, Corner};
use crate::handles::HANDLE_SIZE;
use crate::pile::{PileId, Scheme};
use kurbo::{Affine, Point, Rect};
use peniko::Color;

/// Everything needed to paint one pile, in screen coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct PileView {
    pub id: PileId,
    /// Bounding box of the circle.
    pub bounds: Rect,
    pub border_radius: f64,
    pub scheme: Scheme,
    pub font_size: f64,
    pub line_height: f64,
    /// Label text; hidden while its editor is open.
    pub label: Option<String>,
    pub selected: bool,
    /// Corner handle squares, present on the selected pile.
    pub handles: Vec<Rect>,
}

/// Project the scene to a paint list, bottom-most pile first.
pub fn project(editor: &Editor) -> Vec<PileView> {
    let to_screen = Affine::translate(editor.camera().offset);
    let editing = editor.editing_pile();
    let selection = editor.selection();

    editor
        .scene()
        .piles_ordered()
        .map(|pile| {
            let bounds = pile.bounds();
            let selected = selection == Some(pile.id());
            let scheme = if editor.is_muted(pile.id()) { Scheme::muted() } else { pile.scheme };
            let handles = if selected {
                Corner::ALL
                    .iter()
                    .map(|corner| handle_rect(to_screen * bounds.corner(*corner)))
                    .collect()
            } else {
                Vec::new()
            };
            PileView {
                id: pile.id().clone(),
                bounds: to_screen.transform_rect_bbox(bounds.to_rect()),
                border_radius: bounds.border_radius(),
                scheme,
                font_size: geometry::font_size(pile.diameter),
                line_height: geometry::line_height(pile.diameter),
                label: (editing != Some(pile.id())).then(|| pile.label().to_string()),
                selected,
                handles,
            }
        })
        .collect()
}

impl PileView {
    pub fn fill(&self) -> Color {
        self.scheme.fill_color()
    }

    pub fn border(&self) -> Color {
        self.scheme.border_color()
    }
}

fn handle_rect(center: Point) -> Rect {
    Rect::from_center_size(center, (HANDLE_SIZE, HANDLE_SIZE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EditorConfig;
    use crate::editor::EditorCommand;
    use crate::scene::PileRecord;

    fn record(id: &str, label: &str, x: f64) -> PileRecord {
        PileRecord {
            id: PileId::from(id),
            label: label.to_string(),
            category_id: "a".to_string(),
            geometry: format!(
                r##"{{"center":{{"x":{x},"y":100.0}},"size":40.0,"scheme":{{"bgColor":"#ffffff","borderColor":"#000000"}}}}"##
            ),
        }
    }

    #[test]
    fn test_projection_applies_camera_and_metrics() {
        let mut editor = Editor::new(EditorConfig::new("a,Bored,2"));
        editor.import(&[record("p1", "P-01", 100.0)]);

        let views = project(&editor);
        assert_eq!(views.len(), 1);
        let view = &views[0];
        assert_eq!(view.bounds, Rect::new(80.0, 80.0, 120.0, 120.0));
        assert_eq!(view.font_size, 8.0);
        assert_eq!(view.line_height, 36.0);
        assert_eq!(view.label.as_deref(), Some("P-01"));
        assert!(!view.selected);
        assert!(view.handles.is_empty());
        assert_eq!(view.scheme.fill.to_css(), "#ffffff");
    }

    #[test]
    fn test_highlight_greys_out_other_piles() {
        let mut editor = Editor::new(EditorConfig::new("a,Bored,2").with_highlight("p-02"));
        editor.import(&[record("p1", "P-01", 100.0), record("p2", "P-02", 300.0)]);

        let views = project(&editor);
        assert_eq!(views[0].scheme, Scheme::muted());
        assert_eq!(views[1].scheme.fill.to_css(), "#ffffff");
        // the model keeps its colours
        let pile = editor.scene().get(&PileId::from("p1")).unwrap();
        assert_eq!(pile.scheme.fill.to_css(), "#ffffff");
    }

    #[test]
    fn test_label_hidden_while_editing() {
        let mut editor = Editor::new(EditorConfig::new("a,Bored,2").with_focus("p-01"));
        editor.import(&[record("p1", "P-01", 100.0), record("p2", "P-02", 300.0)]);
        editor.dispatch(EditorCommand::EditLabel);

        let views = project(&editor);
        assert!(views[0].selected);
        assert_eq!(views[0].label, None);
        assert_eq!(views[0].handles.len(), 4);
        assert_eq!(views[1].label.as_deref(), Some("P-02"));
    }
}
