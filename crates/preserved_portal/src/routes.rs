//! Demo routes.

use std::fmt;

/// Known videos and their sources. Unknown ids play the first one.
pub const VIDEO_SOURCES: &[(&str, &str)] = &[
    ("1", "/media/big-buck-bunny.mp4"),
    ("2", "/media/elephants-dream.mp4"),
];

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Route {
    Home,
    About,
    Video(String),
}

impl Route {
    /// Parse a location path. Query strings and trailing slashes are ignored.
    pub fn parse(path: &str) -> Option<Self> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        match segments.as_slice() {
            [] => Some(Self::Home),
            ["about"] => Some(Self::About),
            ["video", id] => Some(Self::Video((*id).to_string())),
            _ => None,
        }
    }

    pub fn path(&self) -> String {
        match self {
            Self::Home => "/".to_string(),
            Self::About => "/about".to_string(),
            Self::Video(id) => format!("/video/{}", id),
        }
    }

    pub fn title(&self) -> String {
        match self {
            Self::Home => "Home".to_string(),
            Self::About => "About".to_string(),
            Self::Video(id) => format!("Video {}", id),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

pub fn video_source(id: &str) -> &'static str {
    VIDEO_SOURCES
        .iter()
        .find(|(known, _)| *known == id)
        .or_else(|| VIDEO_SOURCES.first())
        .map(|(_, source)| *source)
        .unwrap_or_default()
}
