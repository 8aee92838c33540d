//! Parameter panel and on-screen overlay state.
//!
//! The panel is a flat, keyboard-navigable list of controls grouped under the
//! folders from [`ParamGroup`]. Numeric controls read and write their field
//! through the accessor pair in [`PARAMS`]; every change is clamped to the
//! control's domain and pushed to the uniforms in the same call.

use tracing::debug;

use crate::params::{ParamGroup, ParamId, PARAMS};
use crate::render_loop::VisualState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelAction {
    RefreshPattern,
    ToggleZen,
}

impl PanelAction {
    pub fn label(self) -> &'static str {
        match self {
            PanelAction::RefreshPattern => "Refresh Pattern",
            PanelAction::ToggleZen => "Toggle Zen Mode",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Numeric(ParamId),
    Action(PanelAction),
}

impl Control {
    pub fn label(self) -> &'static str {
        match self {
            Control::Numeric(id) => id.spec().label,
            Control::Action(action) => action.label(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ControlGroup {
    pub title: &'static str,
    pub controls: Vec<Control>,
}

/// Result of stepping a numeric control.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelChange {
    pub id: ParamId,
    pub value: f32,
}

#[derive(Debug, Clone)]
pub struct ControlPanel {
    groups: Vec<ControlGroup>,
    order: Vec<Control>,
    expanded: bool,
    selected: usize,
}

impl Default for ControlPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl ControlPanel {
    /// Builds the parameter folders followed by the action buttons. Starts collapsed.
    pub fn new() -> Self {
        let mut groups: Vec<ControlGroup> = ParamGroup::ALL
            .into_iter()
            .map(|group| ControlGroup {
                title: group.title(),
                controls: PARAMS
                    .iter()
                    .filter(|spec| spec.group == group)
                    .map(|spec| Control::Numeric(spec.id))
                    .collect(),
            })
            .collect();
        groups.push(ControlGroup {
            title: "Actions",
            controls: vec![
                Control::Action(PanelAction::RefreshPattern),
                Control::Action(PanelAction::ToggleZen),
            ],
        });

        let order = groups
            .iter()
            .flat_map(|group| group.controls.iter().copied())
            .collect();

        Self {
            groups,
            order,
            expanded: false,
            selected: 0,
        }
    }

    pub fn groups(&self) -> &[ControlGroup] {
        &self.groups
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    pub fn toggle_expanded(&mut self) -> bool {
        self.expanded = !self.expanded;
        self.expanded
    }

    pub fn selected(&self) -> Control {
        self.order[self.selected]
    }

    /// Moves the selection by `delta`, wrapping at either end.
    pub fn select_next(&mut self, delta: isize) {
        let len = self.order.len() as isize;
        self.selected = (self.selected as isize + delta).rem_euclid(len) as usize;
    }

    /// Steps the selected numeric control by `steps` increments.
    pub fn adjust(&mut self, state: &mut VisualState, steps: i32) -> Option<PanelChange> {
        let Control::Numeric(id) = self.selected() else {
            return None;
        };
        let current = state.params().get(id);
        let step = id.spec().domain.step;
        Some(self.set_value(state, id, current + step * steps as f32))
    }

    /// Clamps `value` into the control's domain, stores it and pushes all uniforms.
    pub fn set_value(&self, state: &mut VisualState, id: ParamId, value: f32) -> PanelChange {
        let value = id.spec().domain.clamp(value);
        state.set_param(id, value);
        debug!(parameter = id.key(), value, "parameter changed");
        PanelChange { id, value }
    }

    /// The selected action, if the selection is a button.
    pub fn activate(&self) -> Option<PanelAction> {
        match self.selected() {
            Control::Action(action) => Some(action),
            Control::Numeric(_) => None,
        }
    }

    /// Text rendering of the panel for the status display.
    pub fn lines(&self, state: &VisualState) -> Vec<String> {
        if !self.expanded {
            return vec!["Open Controls [Tab]".to_string()];
        }

        let selected = self.selected();
        let mut lines = Vec::with_capacity(self.order.len() + self.groups.len() + 1);
        for group in &self.groups {
            lines.push(format!("[{}]", group.title));
            for control in &group.controls {
                let marker = if *control == selected { '>' } else { ' ' };
                let line = match control {
                    Control::Numeric(id) => {
                        format!("{marker} {}: {:.2}", control.label(), state.params().get(*id))
                    }
                    Control::Action(_) => format!("{marker} {}", control.label()),
                };
                lines.push(line);
            }
        }
        lines.push("Close Controls [Tab]".to_string());
        lines
    }
}

/// Visibility of the FPS indicator and the panel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Overlay {
    zen: bool,
    fps: Option<u32>,
}

impl Overlay {
    pub fn new(zen: bool) -> Self {
        Self { zen, fps: None }
    }

    pub fn is_zen(&self) -> bool {
        self.zen
    }

    pub fn toggle_zen(&mut self) -> bool {
        self.zen = !self.zen;
        self.zen
    }

    pub fn panel_visible(&self) -> bool {
        !self.zen
    }

    pub fn indicator_visible(&self) -> bool {
        !self.zen
    }

    pub fn set_fps(&mut self, fps: u32) {
        self.fps = Some(fps);
    }

    pub fn fps(&self) -> Option<u32> {
        self.fps
    }

    pub fn fps_text(&self) -> String {
        match self.fps {
            Some(fps) => format!("FPS: {fps}"),
            None => "FPS: --".to_string(),
        }
    }
}

/// Where the overlay is shown. `None` means hidden.
pub trait StatusDisplay {
    fn show_indicator(&mut self, text: Option<&str>);
    fn show_panel(&mut self, lines: Option<&[String]>);
}
