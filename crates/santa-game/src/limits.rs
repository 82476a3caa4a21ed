//! Length limits for free-text game fields.
//!
//! The aggregate stores whatever it is given; callers clip user input
//! with [`GameLimits`] before calling the setters.

/// Default maximum title length, in characters.
pub const DEFAULT_TITLE_LIMIT: usize = 40;

/// Default maximum description length, in characters.
pub const DEFAULT_DESCRIPTION_LIMIT: usize = 100;

/// Maximum lengths for the game title and description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameLimits {
    /// Maximum title length, in characters.
    pub title: usize,
    /// Maximum description length, in characters.
    pub description: usize,
}

impl Default for GameLimits {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE_LIMIT,
            description: DEFAULT_DESCRIPTION_LIMIT,
        }
    }
}

impl GameLimits {
    /// Truncate a title to the configured limit.
    pub fn clip_title(&self, title: &str) -> String {
        clip(title, self.title)
    }

    /// Truncate a description to the configured limit.
    pub fn clip_description(&self, description: &str) -> String {
        clip(description, self.description)
    }
}

fn clip(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}
