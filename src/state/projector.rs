//! Maps button settings onto what the button shows

use super::ButtonSettings;

/// Title and image for one button face
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonFace {
    pub title: String,
    pub image: String,
}

/// Project settings onto the button face. Never touches the filesystem.
pub fn project(settings: &ButtonSettings) -> ButtonFace {
    let title = settings
        .title
        .clone()
        .unwrap_or_else(|| format!("button {}", settings.index_number().unwrap_or(0) + 1));

    if settings.pressed {
        ButtonFace {
            title: format!("{} *", title),
            image: settings.image_url_pressed.clone(),
        }
    } else {
        ButtonFace {
            title,
            image: settings.image_url.clone(),
        }
    }
}
