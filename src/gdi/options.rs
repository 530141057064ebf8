//! Engine configuration.

use serde::{Deserialize, Serialize};

use super::color::Color;
use super::dc::BackgroundMode;
use super::rop::Rop2;

/// What deleting a still-selected object does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeletePolicy {
    /// Refuse with `Error::ObjectInUse`
    #[default]
    Reject,
    /// Delete anyway and null every device-context reference to the object
    Orphan,
}

/// Options for a [`Gdi`](super::Gdi) instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GdiOptions {
    /// Handling of deletes that hit a selected object
    pub delete_policy: DeletePolicy,
    /// Intersect targets with the surface instead of rejecting out-of-bounds geometry
    pub clamp_to_surface: bool,
    /// Reject `line_to` before the pen position has been set
    pub strict_pen_position: bool,
    /// Background color of new device contexts
    pub default_bk_color: Color,
    /// Text color of new device contexts
    pub default_text_color: Color,
    /// Background mode of new device contexts
    pub default_bk_mode: BackgroundMode,
    /// Draw mode of new device contexts
    pub default_rop2: Rop2,
}

impl Default for GdiOptions {
    fn default() -> Self {
        Self {
            delete_policy: DeletePolicy::Reject,
            clamp_to_surface: false,
            strict_pen_position: false,
            default_bk_color: Color::WHITE,
            default_text_color: Color::BLACK,
            default_bk_mode: BackgroundMode::Opaque,
            default_rop2: Rop2::COPYPEN,
        }
    }
}
