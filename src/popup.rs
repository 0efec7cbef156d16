pub const HEADING: &str = "Camera Streams";
pub const FIELD_LABEL: &str = "Stream: ";
pub const CLOSE_LABEL: &str = "Close";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuOption {
    pub value: String,
    pub text: String,
    pub selected: bool,
}

/// The stream selection form: a heading, one `<select>` and a close button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Menu {
    pub heading: String,
    pub field_label: String,
    pub options: Vec<MenuOption>,
    pub close_label: String,
}

impl Menu {
    pub fn new(options: Vec<MenuOption>) -> Self {
        Menu {
            heading: HEADING.to_string(),
            field_label: FIELD_LABEL.to_string(),
            options,
            close_label: CLOSE_LABEL.to_string(),
        }
    }

    pub fn selected(&self) -> Option<&MenuOption> {
        self.options.iter().find(|option| option.selected)
    }

    /// Moves the selection to `value`. Returns `false` if no option has it.
    pub fn select(&mut self, value: &str) -> bool {
        if !self.options.iter().any(|option| option.value == value) {
            return false;
        }
        for option in self.options.iter_mut() {
            option.selected = option.value == value;
        }
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub top: f64,
    pub left: f64,
    pub width: f64,
}

/// The floating container the menu is built into. Each view owns one.
#[derive(Debug, Clone, Default)]
pub struct Popup {
    menu: Option<Menu>,
    placement: Option<Placement>,
    visible: bool,
}

impl Popup {
    pub fn show(&mut self, menu: Menu, placement: Placement) {
        self.menu = Some(menu);
        self.placement = Some(placement);
        self.visible = true;
    }

    /// Empties and hides the popup.
    pub fn clear(&mut self) {
        self.menu = None;
        self.visible = false;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn menu(&self) -> Option<&Menu> {
        self.menu.as_ref()
    }

    pub fn menu_mut(&mut self) -> Option<&mut Menu> {
        self.menu.as_mut()
    }

    pub fn placement(&self) -> Option<Placement> {
        self.placement
    }
}
