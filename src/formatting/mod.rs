//! Terminal styling for command output, and TestRail formatting tables.

pub mod testrail;

pub use testrail::{
    format_for_testrail, priority_display_name, testrail_priority_id, testrail_type_id,
    type_display_name,
};

use colored::*;
use std::env;
use std::io::IsTerminal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    Auto,   // Detect based on terminal
    Always, // Force colors on
    Never,  // Force colors off
}

impl ColorMode {
    pub fn should_use_color(&self) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Auto => std::io::stdout().is_terminal(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmojiMode {
    Auto,   // Use emoji if terminal supports Unicode
    Always, // Always use emoji
    Never,  // Never use emoji
}

impl EmojiMode {
    pub fn should_use_emoji(&self) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Auto => detect_emoji_support(),
        }
    }
}

fn detect_emoji_support() -> bool {
    if env::var("TERM").is_ok_and(|term| term == "dumb") {
        return false;
    }
    env::var("LANG")
        .or_else(|_| env::var("LC_ALL"))
        .map(|lang| lang.to_uppercase().contains("UTF-8") || lang.to_uppercase().contains("UTF8"))
        .unwrap_or(cfg!(not(windows)))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormattingConfig {
    pub color: ColorMode,
    pub emoji: EmojiMode,
}

impl Default for FormattingConfig {
    fn default() -> Self {
        Self {
            color: ColorMode::Auto,
            emoji: EmojiMode::Auto,
        }
    }
}

impl FormattingConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        // Check NO_COLOR environment variable (per no-color.org standard)
        if env::var("NO_COLOR").is_ok() {
            config.color = ColorMode::Never;
        }

        // Check CLICOLOR_FORCE environment variable
        if let Ok(val) = env::var("CLICOLOR_FORCE") {
            if val == "1" {
                config.color = ColorMode::Always;
            }
        }

        config
    }

    /// ASCII-only, no colors, no emoji
    pub fn plain() -> Self {
        Self {
            color: ColorMode::Never,
            emoji: EmojiMode::Never,
        }
    }
}

/// Status lines printed by the commands.
#[derive(Debug, Clone, Copy)]
pub struct Console {
    color: bool,
    emoji: bool,
}

impl Console {
    pub fn new(config: FormattingConfig) -> Self {
        let color = config.color.should_use_color();
        colored::control::set_override(color);
        Self {
            color,
            emoji: config.emoji.should_use_emoji(),
        }
    }

    pub fn plain() -> Self {
        Self {
            color: false,
            emoji: false,
        }
    }

    fn line(&self, emoji: &str, fallback: &str, text: &str, paint: fn(&str) -> ColoredString) -> String {
        let marker = if self.emoji { emoji } else { fallback };
        if self.color {
            format!("{} {}", marker, paint(text))
        } else {
            format!("{} {}", marker, text)
        }
    }

    pub fn success(&self, text: &str) -> String {
        self.line("✅", "[ok]", text, |t| t.green())
    }

    pub fn error(&self, text: &str) -> String {
        self.line("❌", "[error]", text, |t| t.red())
    }

    pub fn warning(&self, text: &str) -> String {
        self.line("⚠️ ", "[warn]", text, |t| t.yellow())
    }

    pub fn info(&self, text: &str) -> String {
        self.line("📋", "-", text, |t| t.cyan())
    }

    pub fn header(&self, text: &str) -> String {
        if self.color {
            format!("=== {} ===", text).blue().bold().to_string()
        } else {
            format!("=== {} ===", text)
        }
    }
}
