use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One repeat cycle per user toggle; nothing else transitions this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum RepeatMode {
    #[default]
    Off,
    One,
    All,
}

impl RepeatMode {
    pub fn next(self) -> Self {
        match self {
            Self::Off => Self::One,
            Self::One => Self::All,
            Self::All => Self::Off,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Off => "OFF",
            Self::One => "1",
            Self::All => "ALL",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub path: PathBuf,
    pub display_name: String,
}

impl Track {
    pub fn from_path(path: PathBuf) -> Self {
        let display_name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        Self { path, display_name }
    }
}

/// Stream facts reported by the engine once a track is ready. Any missing
/// field renders as a placeholder instead of failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StreamInfo {
    pub sample_rate_hz: Option<u32>,
    pub channels: Option<u16>,
    pub bitrate_kbps: Option<u32>,
}

impl StreamInfo {
    pub fn bitrate_text(&self) -> String {
        match self.bitrate_kbps {
            Some(kbps) if kbps > 0 => format!("{kbps} kbps"),
            _ => String::from("--- kbps"),
        }
    }

    pub fn sample_rate_text(&self) -> String {
        match self.sample_rate_hz {
            Some(hz) if hz > 0 => format!("{} kHz", hz / 1000),
            _ => String::from("-- kHz"),
        }
    }

    pub fn channels_text(&self) -> String {
        match self.channels {
            Some(1) => String::from("mono"),
            Some(2) => String::from("stereo"),
            Some(n) if n > 0 => format!("{n}ch"),
            _ => String::from("---"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub repeat_mode: RepeatMode,
    #[serde(default = "default_saved_volume")]
    pub saved_volume: f32,
    #[serde(default = "default_seek_step_secs")]
    pub seek_step_secs: u16,
    #[serde(default)]
    pub start_dir: Option<PathBuf>,
}

fn default_saved_volume() -> f32 {
    1.0
}

fn default_seek_step_secs() -> u16 {
    10
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            repeat_mode: RepeatMode::Off,
            saved_volume: default_saved_volume(),
            seek_step_secs: default_seek_step_secs(),
            start_dir: None,
        }
    }
}
