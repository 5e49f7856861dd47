use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use serde_with::serde_as;

use crate::Result;
use crate::error::ConfigError;
use crate::types::{HorizontalPosition, Politeness, TextDirection, VerticalPosition};

use super::defaults::{default_appname, default_channel_bound, default_max_open};
use super::env::{env_duration, env_parse, env_string};
use super::{BarConfig, Config, DemoSettings, HumantimeDuration, QueueConfig};

pub(super) fn load(path: impl AsRef<Path>) -> std::result::Result<RawConfig, ConfigError> {
    let mut builder = ::config::Config::builder();
    let path = path.as_ref();
    builder = builder.add_source(::config::File::from(path).required(false));
    builder = builder.add_source(
        ::config::Environment::with_prefix("QUEUEBAR")
            .separator("__")
            .try_parsing(true),
    );

    builder
        .build()
        .map_err(|err| ConfigError::Other(err.to_string()))?
        .try_deserialize()
        .map_err(|err| ConfigError::Parse(err.to_string()))
}

#[derive(Debug, Deserialize)]
pub(super) struct RawConfig {
    #[serde(default)]
    pub(super) queue: RawQueue,
    #[serde(default)]
    pub(super) bar: RawBar,
    #[serde(default)]
    pub(super) demo: RawDemo,
}

#[derive(Debug, Deserialize)]
pub(super) struct RawQueue {
    #[serde(default = "default_max_open")]
    pub(super) max_open: usize,
    #[serde(default)]
    pub(super) wrapper_class: Option<String>,
}

#[serde_as]
#[derive(Debug, Deserialize)]
pub(super) struct RawBar {
    #[serde(default)]
    #[serde_as(as = "Option<HumantimeDuration>")]
    pub(super) duration: Option<Duration>,
    #[serde(default)]
    pub(super) horizontal_position: Option<HorizontalPosition>,
    #[serde(default)]
    pub(super) vertical_position: Option<VerticalPosition>,
    #[serde(default)]
    pub(super) direction: Option<TextDirection>,
    #[serde(default)]
    pub(super) politeness: Option<Politeness>,
    #[serde(default)]
    pub(super) announcement: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct RawDemo {
    #[serde(default = "default_appname")]
    pub(super) appname: String,
    #[serde(default = "default_channel_bound")]
    pub(super) channel_bound: usize,
}

impl RawConfig {
    pub(super) fn apply_env_overrides(&mut self) -> std::result::Result<(), ConfigError> {
        if let Some(max_open) = env_parse::<usize>("QUEUEBAR_MAX_OPEN")? {
            self.queue.max_open = max_open;
        }
        if let Some(class) = env_string("QUEUEBAR_WRAPPER_CLASS")? {
            self.queue.wrapper_class = Some(class);
        }
        if let Some(duration) = env_duration("QUEUEBAR_DURATION")? {
            self.bar.duration = Some(duration);
        }
        if let Some(horizontal) = env_parse::<HorizontalPosition>("QUEUEBAR_HORIZONTAL")? {
            self.bar.horizontal_position = Some(horizontal);
        }
        if let Some(vertical) = env_parse::<VerticalPosition>("QUEUEBAR_VERTICAL")? {
            self.bar.vertical_position = Some(vertical);
        }
        if let Some(direction) = env_parse::<TextDirection>("QUEUEBAR_DIRECTION")? {
            self.bar.direction = Some(direction);
        }
        if let Some(politeness) = env_parse::<Politeness>("QUEUEBAR_POLITENESS")? {
            self.bar.politeness = Some(politeness);
        }
        if let Some(announcement) = env_string("QUEUEBAR_ANNOUNCEMENT")? {
            self.bar.announcement = Some(announcement);
        }
        if let Some(appname) = env_string("QUEUEBAR_APPNAME")? {
            self.demo.appname = appname;
        }
        if let Some(bound) = env_parse::<usize>("QUEUEBAR_CHANNEL_BOUND")? {
            self.demo.channel_bound = bound;
        }
        Ok(())
    }

    pub(super) fn validate_and_build(self) -> Result<Config> {
        let queue = QueueConfig {
            max_open: self.queue.max_open,
            wrapper_class: self.queue.wrapper_class,
        };
        queue.validate()?;

        if self.demo.channel_bound == 0 {
            return Err(ConfigError::InvalidField {
                field: "demo.channel_bound",
                message: "channel bound must be greater than zero".to_string(),
            }
            .into());
        }
        if self.demo.appname.trim().is_empty() {
            return Err(ConfigError::InvalidField {
                field: "demo.appname",
                message: "appname cannot be empty".to_string(),
            }
            .into());
        }

        let bar = BarConfig {
            duration: self.bar.duration,
            horizontal_position: self.bar.horizontal_position.unwrap_or_default(),
            vertical_position: self.bar.vertical_position.unwrap_or_default(),
            direction: self.bar.direction.unwrap_or_default(),
            politeness: self.bar.politeness.unwrap_or_default(),
            announcement: self.bar.announcement,
            data: None,
        };

        Ok(Config {
            queue,
            bar,
            demo: DemoSettings {
                appname: self.demo.appname,
                channel_bound: self.demo.channel_bound,
            },
        })
    }
}

impl Default for RawQueue {
    fn default() -> Self {
        Self {
            max_open: default_max_open(),
            wrapper_class: None,
        }
    }
}

impl Default for RawBar {
    fn default() -> Self {
        Self {
            duration: None,
            horizontal_position: None,
            vertical_position: None,
            direction: None,
            politeness: None,
            announcement: None,
        }
    }
}

impl Default for RawDemo {
    fn default() -> Self {
        Self {
            appname: default_appname(),
            channel_bound: default_channel_bound(),
        }
    }
}
