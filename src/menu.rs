//! Main menu

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    StartGame,
    ViewRating,
    Quit,
}

#[derive(Debug, Clone)]
pub struct MenuItem {
    pub label: &'static str,
    pub action: MenuAction,
}

/// Menu items and the selection cursor
#[derive(Debug, Clone)]
pub struct Menu {
    pub selected: usize,
    pub items: Vec<MenuItem>,
}

impl Default for Menu {
    fn default() -> Self {
        Self::new()
    }
}

impl Menu {
    pub fn new() -> Self {
        Self {
            selected: 0,
            items: vec![
                MenuItem {
                    label: "Start Game",
                    action: MenuAction::StartGame,
                },
                MenuItem {
                    label: "View Rating",
                    action: MenuAction::ViewRating,
                },
                MenuItem {
                    label: "Exit",
                    action: MenuAction::Quit,
                },
            ],
        }
    }

    /// Move selection up (wraps)
    pub fn move_up(&mut self) {
        self.selected = self
            .selected
            .checked_sub(1)
            .unwrap_or(self.items.len() - 1);
    }

    /// Move selection down (wraps)
    pub fn move_down(&mut self) {
        self.selected = (self.selected + 1) % self.items.len();
    }

    /// Point the cursor at an item, ignoring out-of-range indices
    pub fn select_index(&mut self, index: usize) -> bool {
        if index < self.items.len() {
            self.selected = index;
            true
        } else {
            false
        }
    }

    pub fn selected_action(&self) -> MenuAction {
        self.items[self.selected].action
    }
}
