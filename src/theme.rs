//! Process-wide theme consumed by the attribute templates

use std::sync::OnceLock;

use crate::defaults::FIND_RADIUS;
use crate::errors::ModelError;

/// Default colors, fonts and sizes that attribute templates start from.
///
/// Install a custom theme with [`Theme::install`] before the first template
/// is built; afterwards the theme is fixed for the life of the process.
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub fill_color: String,
    pub line_color: String,
    pub line_width: f64,
    pub font_name: String,
    pub font_size: f64,
    pub font_color: String,
    pub cell_line_color: String,
    pub cell_font_size: f64,
    pub grid_color: String,
    /// Border distance still counted as a hit, in 1/100 mm
    pub find_radius: f64,
}

impl Default for Theme {
    fn default() -> Self {
        Theme {
            fill_color: "#FFFFFF".into(),
            line_color: "#000000".into(),
            line_width: 1.0,
            font_name: "Verdana".into(),
            font_size: 10.0,
            font_color: "#000000".into(),
            cell_line_color: "#CCCCCC".into(),
            cell_font_size: 9.0,
            grid_color: "#E0E0E0".into(),
            find_radius: FIND_RADIUS,
        }
    }
}

static THEME: OnceLock<Theme> = OnceLock::new();

impl Theme {
    /// Fix the process theme. Fails once any theme is in place, including
    /// the default one installed by the first [`Theme::current`] call.
    pub fn install(theme: Theme) -> Result<(), ModelError> {
        THEME.set(theme).map_err(|_| ModelError::ThemeInstalled)
    }

    pub fn current() -> &'static Theme {
        THEME.get_or_init(Theme::default)
    }
}
