/// Chapter panel viewer
///
/// Holds one chapter's panels and the reading position. The viewer is
/// pure state: it decides which panel URLs should be displayed and which
/// should be preloaded, and the screen hands those to the image tracker.
use super::data::Panel;

/// How the chapter is laid out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    /// All panels in one scrollable column
    #[default]
    List,
    /// One panel at a time with Previous/Next
    Paged,
}

/// Images a screen should request after a viewer state change
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadPlan {
    /// Panels that are on screen right now
    pub display: Vec<String>,
    /// Neighbors fetched ahead of navigation
    pub preload: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct PanelViewer {
    panels: Vec<Panel>,
    mode: ViewMode,
    /// Only meaningful in Paged mode; always inside [0, len-1]
    current: usize,
}

impl PanelViewer {
    pub fn new(panels: Vec<Panel>) -> Self {
        Self {
            panels,
            mode: ViewMode::List,
            current: 0,
        }
    }

    /// True when the chapter has nothing to show ("no panels found")
    pub fn is_empty(&self) -> bool {
        self.panels.is_empty()
    }

    pub fn len(&self) -> usize {
        self.panels.len()
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    /// Switch layout. Entering Paged mode resumes at the previous position.
    pub fn switch_mode(&mut self, mode: ViewMode) {
        self.mode = mode;
    }

    /// Advance one panel. Returns false (and does nothing) on the last panel.
    pub fn next(&mut self) -> bool {
        if self.current + 1 < self.panels.len() {
            self.current += 1;
            true
        } else {
            false
        }
    }

    /// Go back one panel. Returns false (and does nothing) on the first panel.
    pub fn prev(&mut self) -> bool {
        if self.current > 0 {
            self.current -= 1;
            true
        } else {
            false
        }
    }

    /// Jump straight to a panel; out-of-range targets are ignored
    pub fn jump_to(&mut self, index: usize) -> bool {
        if index < self.panels.len() && index != self.current {
            self.current = index;
            true
        } else {
            false
        }
    }

    pub fn has_prev(&self) -> bool {
        self.current > 0
    }

    pub fn has_next(&self) -> bool {
        self.current + 1 < self.panels.len()
    }

    /// Panels that should be rendered for the current mode
    pub fn visible_panels(&self) -> &[Panel] {
        match self.mode {
            ViewMode::List => &self.panels,
            ViewMode::Paged => self
                .panels
                .get(self.current..self.current + 1)
                .unwrap_or(&[]),
        }
    }

    /// Which images to request for the current state.
    ///
    /// List mode displays every panel. Paged mode displays the current
    /// panel and preloads at most one panel on each side of it.
    pub fn load_plan(&self) -> LoadPlan {
        if self.panels.is_empty() {
            return LoadPlan::default();
        }

        match self.mode {
            ViewMode::List => LoadPlan {
                display: self.panels.iter().map(|p| p.image.clone()).collect(),
                preload: Vec::new(),
            },
            ViewMode::Paged => {
                let mut preload = Vec::with_capacity(2);
                if let Some(before) = self.current.checked_sub(1) {
                    preload.push(self.panels[before].image.clone());
                }
                if let Some(after) = self.panels.get(self.current + 1) {
                    preload.push(after.image.clone());
                }

                LoadPlan {
                    display: vec![self.panels[self.current].image.clone()],
                    preload,
                }
            }
        }
    }

    /// "3 / 22" style position for the pager controls
    pub fn position_label(&self) -> String {
        if self.panels.is_empty() {
            return "0 / 0".to_string();
        }
        format!("{} / {}", self.current + 1, self.panels.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chapter(count: usize) -> PanelViewer {
        let panels = (0..count)
            .map(|i| Panel {
                image: format!("https://cdn.example/ch1/{i}.png"),
            })
            .collect();
        PanelViewer::new(panels)
    }

    #[test]
    fn test_initial_state() {
        let viewer = chapter(4);
        assert_eq!(viewer.mode(), ViewMode::List);
        assert_eq!(viewer.current_index(), 0);
        assert_eq!(viewer.visible_panels().len(), 4);
    }

    #[test]
    fn test_pager_bounds() {
        let mut viewer = chapter(3);
        viewer.switch_mode(ViewMode::Paged);

        assert!(!viewer.prev());
        assert_eq!(viewer.current_index(), 0);

        assert!(viewer.next());
        assert!(viewer.next());
        assert_eq!(viewer.current_index(), 2);

        assert!(!viewer.next());
        assert_eq!(viewer.current_index(), 2);
    }

    #[test]
    fn test_preload_window() {
        let mut viewer = chapter(5);
        viewer.switch_mode(ViewMode::Paged);
        viewer.next();
        viewer.next();

        let plan = viewer.load_plan();
        assert_eq!(plan.display, vec!["https://cdn.example/ch1/2.png"]);
        assert_eq!(
            plan.preload,
            vec![
                "https://cdn.example/ch1/1.png",
                "https://cdn.example/ch1/3.png",
            ]
        );
    }

    #[test]
    fn test_preload_window_clamped_at_edges() {
        let mut viewer = chapter(3);
        viewer.switch_mode(ViewMode::Paged);
        assert_eq!(viewer.load_plan().preload, vec!["https://cdn.example/ch1/1.png"]);

        viewer.next();
        viewer.next();
        assert_eq!(viewer.load_plan().preload, vec!["https://cdn.example/ch1/1.png"]);
    }

    #[test]
    fn test_switch_mode_keeps_position() {
        let mut viewer = chapter(6);
        viewer.switch_mode(ViewMode::Paged);
        viewer.next();
        viewer.next();

        viewer.switch_mode(ViewMode::List);
        assert_eq!(viewer.visible_panels().len(), 6);

        viewer.switch_mode(ViewMode::Paged);
        assert_eq!(viewer.current_index(), 2);
        assert_eq!(viewer.visible_panels()[0].image, "https://cdn.example/ch1/2.png");
    }

    #[test]
    fn test_list_mode_displays_everything() {
        let viewer = chapter(4);
        let plan = viewer.load_plan();
        assert_eq!(plan.display.len(), 4);
        assert!(plan.preload.is_empty());
    }

    #[test]
    fn test_empty_chapter() {
        let mut viewer = chapter(0);
        assert!(viewer.is_empty());
        assert!(viewer.visible_panels().is_empty());
        assert_eq!(viewer.load_plan(), LoadPlan::default());

        viewer.switch_mode(ViewMode::Paged);
        assert!(viewer.visible_panels().is_empty());
        assert!(!viewer.next());
        assert!(!viewer.prev());
        assert_eq!(viewer.load_plan(), LoadPlan::default());
        assert_eq!(viewer.position_label(), "0 / 0");
    }

    #[test]
    fn test_jump_to() {
        let mut viewer = chapter(4);
        assert!(viewer.jump_to(3));
        assert_eq!(viewer.position_label(), "4 / 4");
        assert!(!viewer.jump_to(9));
        assert_eq!(viewer.current_index(), 3);
    }
}
