use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use ::serde::Deserialize;
use serde_with::serde_as;

use crate::Result;
use crate::error::ConfigError;
use crate::surface::Surface;
use crate::types::{HorizontalPosition, Politeness, TextDirection, VerticalPosition};

mod defaults;
mod env;
mod raw;
mod serde;

pub(crate) use self::serde::HumantimeDuration;

/// Process-wide queue settings: created once, read-only afterwards.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default)]
pub struct QueueConfig {
    /// Maximum number of concurrently displayed bars. Must be at least 1.
    pub max_open: usize,
    /// Optional style class applied to the shared display surface.
    pub wrapper_class: Option<String>,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_open: defaults::default_max_open(),
            wrapper_class: None,
        }
    }
}

impl QueueConfig {
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidField`] when `max_open` is zero.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.max_open == 0 {
            return Err(ConfigError::InvalidField {
                field: "queue.max_open",
                message: "must allow at least one open bar".to_string(),
            });
        }
        Ok(())
    }
}

/// Fully resolved per-open settings. Immutable once a bar is opened.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BarConfig {
    /// Auto-dismiss delay, counted from the opened event. `None` or zero
    /// means the bar stays until explicitly dismissed.
    pub duration: Option<Duration>,
    pub horizontal_position: HorizontalPosition,
    pub vertical_position: VerticalPosition,
    pub direction: TextDirection,
    pub politeness: Politeness,
    /// Text announced for assistive technology when the bar opens.
    pub announcement: Option<String>,
    /// Arbitrary payload forwarded to the rendered content.
    pub data: Option<serde_json::Value>,
}

impl BarConfig {
    pub fn is_timed(&self) -> bool {
        self.duration.is_some_and(|duration| !duration.is_zero())
    }
}

/// Per-open overrides. Every field is optional; unset fields fall back to the
/// service defaults, set fields win.
#[serde_as]
#[derive(Deserialize)]
#[serde(default, bound = "")]
pub struct BarOptions<C> {
    #[serde_as(as = "Option<HumantimeDuration>")]
    pub duration: Option<Duration>,
    pub horizontal_position: Option<HorizontalPosition>,
    pub vertical_position: Option<VerticalPosition>,
    pub direction: Option<TextDirection>,
    pub politeness: Option<Politeness>,
    pub announcement: Option<String>,
    pub data: Option<serde_json::Value>,
    /// Render onto this surface instead of the shared one. The bar still
    /// participates in the shared queue and active-set bookkeeping.
    #[serde(skip)]
    pub target: Option<Arc<dyn Surface<C>>>,
}

impl<C> BarOptions<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge these overrides onto `defaults`, per-call values winning, and
    /// split off the custom target surface.
    #[must_use]
    pub fn resolve(self, defaults: &BarConfig) -> (BarConfig, Option<Arc<dyn Surface<C>>>) {
        let Self {
            duration,
            horizontal_position,
            vertical_position,
            direction,
            politeness,
            announcement,
            data,
            target,
        } = self;
        let config = BarConfig {
            duration: duration.or(defaults.duration),
            horizontal_position: horizontal_position.unwrap_or(defaults.horizontal_position),
            vertical_position: vertical_position.unwrap_or(defaults.vertical_position),
            direction: direction.unwrap_or(defaults.direction),
            politeness: politeness.unwrap_or(defaults.politeness),
            announcement: announcement.or_else(|| defaults.announcement.clone()),
            data: data.or_else(|| defaults.data.clone()),
        };
        (config, target)
    }
}

impl<C> Default for BarOptions<C> {
    fn default() -> Self {
        Self {
            duration: None,
            horizontal_position: None,
            vertical_position: None,
            direction: None,
            politeness: None,
            announcement: None,
            data: None,
            target: None,
        }
    }
}

impl<C> Clone for BarOptions<C> {
    fn clone(&self) -> Self {
        Self {
            duration: self.duration,
            horizontal_position: self.horizontal_position,
            vertical_position: self.vertical_position,
            direction: self.direction,
            politeness: self.politeness,
            announcement: self.announcement.clone(),
            data: self.data.clone(),
            target: self.target.clone(),
        }
    }
}

impl<C> fmt::Debug for BarOptions<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BarOptions")
            .field("duration", &self.duration)
            .field("horizontal_position", &self.horizontal_position)
            .field("vertical_position", &self.vertical_position)
            .field("direction", &self.direction)
            .field("politeness", &self.politeness)
            .field("announcement", &self.announcement)
            .field("data", &self.data)
            .field("target", &self.target.as_ref().map(|_| "<surface>"))
            .finish()
    }
}

/// Demo binary settings.
#[derive(Clone, Debug)]
pub struct DemoSettings {
    pub appname: String,
    pub channel_bound: usize,
}

/// Everything the demo binary needs: global queue settings, default bar
/// settings, and its own plumbing.
#[derive(Clone, Debug)]
pub struct Config {
    pub queue: QueueConfig,
    pub bar: BarConfig,
    pub demo: DemoSettings,
}

impl Config {
    /// Load configuration from a TOML file and the environment.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be parsed, when environment
    /// overrides are invalid, or when the resulting values fail validation.
    pub fn from_env_and_file(path: impl AsRef<Path>) -> Result<Self> {
        let mut raw = raw::load(path).map_err(crate::error::Error::from)?;
        raw.apply_env_overrides()
            .map_err(crate::error::Error::from)?;
        raw.validate_and_build()
    }
}

#[cfg(test)]
mod tests {
    use super::{BarConfig, BarOptions, QueueConfig};
    use crate::service::SimpleBarContent;
    use crate::types::{HorizontalPosition, Politeness, VerticalPosition};
    use std::time::Duration;

    #[test]
    fn validate_rejects_zero_max_open() {
        let config = QueueConfig {
            max_open: 0,
            wrapper_class: None,
        };
        assert!(config.validate().is_err());
        assert!(QueueConfig::default().validate().is_ok());
        assert_eq!(QueueConfig::default().max_open, 4);
    }

    #[test]
    fn resolve_prefers_per_call_values() {
        let defaults = BarConfig {
            duration: Some(Duration::from_secs(3)),
            vertical_position: VerticalPosition::Top,
            announcement: Some("default".to_string()),
            ..BarConfig::default()
        };
        let options = BarOptions::<SimpleBarContent> {
            duration: Some(Duration::ZERO),
            horizontal_position: Some(HorizontalPosition::End),
            politeness: Some(Politeness::Assertive),
            ..BarOptions::default()
        };
        let (resolved, target) = options.resolve(&defaults);
        assert!(target.is_none());
        // An explicit zero overrides a timed default and means "untimed".
        assert_eq!(resolved.duration, Some(Duration::ZERO));
        assert!(!resolved.is_timed());
        assert_eq!(resolved.horizontal_position, HorizontalPosition::End);
        assert_eq!(resolved.vertical_position, VerticalPosition::Top);
        assert_eq!(resolved.politeness, Politeness::Assertive);
        assert_eq!(resolved.announcement.as_deref(), Some("default"));
    }

    #[test]
    fn is_timed_requires_a_positive_duration() {
        let mut config = BarConfig::default();
        assert!(!config.is_timed());
        config.duration = Some(Duration::ZERO);
        assert!(!config.is_timed());
        config.duration = Some(Duration::from_millis(1));
        assert!(config.is_timed());
    }
}
