use crate::controls::ViewState;
use crate::scene::DEFAULT_STAR_COUNT;
use anyhow::{Context, Result};
use clap::Parser;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs, io,
    path::{Path, PathBuf},
};
use tracing::warn;

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "solarscope")]
#[command(about = "Interactive solar system orrery for the terminal", long_about = None)]
pub(crate) struct Args {
    /// Frame rate cap
    #[arg(long)]
    pub(crate) fps: Option<u32>,

    /// Seed for planet start angles and the starfield
    #[arg(long)]
    pub(crate) seed: Option<u64>,

    /// Number of background stars
    #[arg(long)]
    pub(crate) stars: Option<usize>,

    /// Start in light mode
    #[arg(long, default_value_t = false)]
    pub(crate) light: bool,

    /// Start with orbit paths hidden
    #[arg(long, default_value_t = false)]
    pub(crate) hide_orbits: bool,

    /// Start with labels hidden
    #[arg(long, default_value_t = false)]
    pub(crate) hide_labels: bool,

    /// Settings file (defaults to settings.json in the config dir)
    #[arg(long)]
    pub(crate) config: Option<PathBuf>,

    /// Log file (defaults to solarscope.log in the data dir)
    #[arg(long)]
    pub(crate) log_file: Option<PathBuf>,

    /// Log filter, e.g. "debug" or "info,solarscope::frame=debug"; RUST_LOG wins
    #[arg(long)]
    pub(crate) log_level: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct Settings {
    pub(crate) fps_cap: u32,
    pub(crate) seed: Option<u64>,
    pub(crate) star_count: usize,
    pub(crate) dark_mode: bool,
    pub(crate) show_orbits: bool,
    pub(crate) show_labels: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            fps_cap: 30,
            seed: None,
            star_count: DEFAULT_STAR_COUNT,
            dark_mode: true,
            show_orbits: true,
            show_labels: true,
        }
    }
}

impl Settings {
    pub(crate) fn with_args(mut self, args: &Args) -> Self {
        if let Some(fps) = args.fps {
            self.fps_cap = fps;
        }
        if args.seed.is_some() {
            self.seed = args.seed;
        }
        if let Some(n) = args.stars {
            self.star_count = n;
        }
        if args.light {
            self.dark_mode = false;
        }
        if args.hide_orbits {
            self.show_orbits = false;
        }
        if args.hide_labels {
            self.show_labels = false;
        }
        self
    }

    pub(crate) fn fps(&self) -> u32 {
        self.fps_cap.clamp(5, 240)
    }

    pub(crate) fn initial_view(&self) -> ViewState {
        ViewState {
            paused: false,
            show_orbits: self.show_orbits,
            show_labels: self.show_labels,
            dark_mode: self.dark_mode,
        }
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "solarscope", "Solarscope")
}

pub(crate) fn default_settings_path() -> Option<PathBuf> {
    project_dirs().map(|p| p.config_dir().join("settings.json"))
}

pub(crate) fn default_log_path() -> Option<PathBuf> {
    project_dirs().map(|p| p.data_local_dir().join("solarscope.log"))
}

/// `Ok(None)` when there is no file; an error when it exists but is unusable.
pub(crate) fn load_settings(path: &Path) -> Result<Option<Settings>> {
    let text = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e).with_context(|| format!("reading {}", path.display())),
    };
    let settings = serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
    Ok(Some(settings))
}

pub(crate) fn resolve(args: &Args) -> Settings {
    let path = args.config.clone().or_else(default_settings_path);
    let base = match path.as_deref().map(load_settings) {
        Some(Ok(Some(s))) => s,
        Some(Ok(None)) | None => Settings::default(),
        Some(Err(e)) => {
            warn!("settings file ignored, using defaults: {e:#}");
            Settings::default()
        }
    };
    base.with_args(args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert_eq!(s.fps_cap, 30);
        assert_eq!(s.star_count, 10_000);
        assert_eq!(s.initial_view(), ViewState::default());
    }

    #[test]
    fn test_missing_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(load_settings(&dir.path().join("nope.json")).unwrap(), None);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, r#"{{ "dark_mode": false, "star_count": 50 }}"#).unwrap();
        let s = load_settings(f.path()).unwrap().unwrap();
        assert!(!s.dark_mode);
        assert_eq!(s.star_count, 50);
        assert_eq!(s.fps_cap, 30);
    }

    #[test]
    fn test_malformed_file_falls_back_to_defaults() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, "{{ not json").unwrap();
        assert!(load_settings(f.path()).is_err());
        let args = Args {
            config: Some(f.path().to_path_buf()),
            ..Args::default()
        };
        assert_eq!(resolve(&args), Settings::default());
    }

    #[test]
    fn test_cli_overrides_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, r#"{{ "fps_cap": 60, "seed": 1, "show_labels": true }}"#).unwrap();
        let args = Args::parse_from([
            "solarscope",
            "--config",
            f.path().to_str().unwrap(),
            "--seed",
            "9",
            "--hide-labels",
            "--light",
        ]);
        let s = resolve(&args);
        assert_eq!(s.fps_cap, 60);
        assert_eq!(s.seed, Some(9));
        assert!(!s.show_labels);
        assert!(!s.dark_mode);
        assert!(s.show_orbits);
    }

    #[test]
    fn test_fps_is_clamped() {
        let s = Settings {
            fps_cap: 0,
            ..Settings::default()
        };
        assert_eq!(s.fps(), 5);
    }
}
