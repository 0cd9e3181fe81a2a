use std::path::Path;

use anyhow::Context as _;

use crate::{
    anim_ease::Ease,
    foundation::error::{VitrineError, VitrineResult},
    observe::RootMargin,
};

/// Tunables for every component, loaded from JSON. Every section and field is
/// optional; omitted values fall back to the page's stock behavior.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub media: MediaConfig,
    pub hero: HeroConfig,
    pub reveal: RevealConfig,
    pub nav: NavConfig,
    pub snap: SnapConfig,
    pub title: TitleConfig,
    pub scroll_reveal: ScrollRevealConfig,
}

/// What happens to the playhead when a paused video re-enters the playback margin.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResumePolicy {
    /// Continue from the paused position (ended videos still rewind).
    #[default]
    Resume,
    /// Always rewind to 0 before replaying.
    Restart,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    pub preload_margin: String,
    pub playback_margin: String,
    pub stall_interval_ms: f64,
    pub resume_policy: ResumePolicy,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            preload_margin: "200% 0px".to_string(),
            playback_margin: "50% 0px".to_string(),
            stall_interval_ms: 3000.0,
            resume_policy: ResumePolicy::Resume,
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct HeroConfig {
    /// Progress below this is treated as "no bleed" and the override is removed.
    pub min_progress: f64,
    pub ease: Ease,
}

impl Default for HeroConfig {
    fn default() -> Self {
        Self {
            min_progress: 0.005,
            ease: Ease::Smoothstep,
        }
    }
}

/// Grid reveal parameters. Lengths are fractions of the viewport width.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RevealConfig {
    pub cell: f64,
    pub gap: f64,
    pub max_distance: f64,
    pub max_scale: f64,
    /// Sprites scaled below this are skipped.
    pub min_scale: f64,
    /// Focus smoothing rate per millisecond.
    pub ease_rate: f64,
    pub max_dt_ms: f64,
    /// Horizontal drift in px/s.
    pub drift: f64,
    /// Vertical drift as a multiple of the horizontal drift.
    pub drift_y_ratio: f64,
    /// Touch orbit radius as a fraction of `min(width, height)`.
    pub orbit_radius: f64,
    /// Touch orbit angular speed in rad/s.
    pub orbit_speed: f64,
    pub max_device_pixel_ratio: f64,
    pub activation_threshold: f64,
    pub ease: Ease,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            cell: 0.075,
            gap: 0.06,
            max_distance: 0.3,
            max_scale: 4.0,
            min_scale: 0.01,
            ease_rate: 0.005,
            max_dt_ms: 50.0,
            drift: 50.0,
            drift_y_ratio: -0.7,
            orbit_radius: 0.35,
            orbit_speed: 0.75,
            max_device_pixel_ratio: 2.0,
            activation_threshold: 0.05,
            ease: Ease::Smoothstep,
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct NavConfig {
    pub expand_offset: f64,
    /// `at-end` engages once the end section is this fraction of a viewport away.
    pub end_fraction: f64,
    pub mobile_breakpoint: f64,
    /// Nav evaluation is skipped while the first section sits above this offset.
    pub min_section_top: f64,
    pub hash_offset: f64,
    pub click_lock_ms: f64,
    pub active_ratio_min: f64,
    pub ratio_thresholds: Vec<f64>,
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            expand_offset: 100.0,
            end_fraction: 0.5,
            mobile_breakpoint: 768.0,
            min_section_top: 200.0,
            hash_offset: 120.0,
            click_lock_ms: 800.0,
            active_ratio_min: 0.02,
            ratio_thresholds: vec![0.0, 0.1, 0.2, 0.4, 0.6, 0.8, 1.0],
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SnapConfig {
    /// The title area spans this fraction of the viewport from the top.
    pub title_fraction: f64,
    pub touch_threshold_px: f64,
    pub header_offset_px: f64,
}

impl Default for SnapConfig {
    fn default() -> Self {
        Self {
            title_fraction: 0.5,
            touch_threshold_px: 10.0,
            header_offset_px: 64.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TitleConfig {
    pub hold_ms: f64,
}

impl Default for TitleConfig {
    fn default() -> Self {
        Self { hold_ms: 600.0 }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ScrollRevealConfig {
    pub threshold: f64,
}

impl Default for ScrollRevealConfig {
    fn default() -> Self {
        Self { threshold: 0.1 }
    }
}

impl EngineConfig {
    pub fn from_json_str(s: &str) -> VitrineResult<Self> {
        let cfg: Self = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_path(path: &Path) -> VitrineResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config '{}'", path.display()))?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> VitrineResult<()> {
        self.media
            .preload_margin
            .parse::<RootMargin>()
            .map_err(|e| VitrineError::config(format!("media.preload_margin: {e}")))?;
        self.media
            .playback_margin
            .parse::<RootMargin>()
            .map_err(|e| VitrineError::config(format!("media.playback_margin: {e}")))?;
        positive("media.stall_interval_ms", self.media.stall_interval_ms)?;

        unit("hero.min_progress", self.hero.min_progress)?;

        let r = &self.reveal;
        positive("reveal.cell", r.cell)?;
        non_negative("reveal.gap", r.gap)?;
        positive("reveal.max_distance", r.max_distance)?;
        positive("reveal.max_scale", r.max_scale)?;
        non_negative("reveal.min_scale", r.min_scale)?;
        non_negative("reveal.ease_rate", r.ease_rate)?;
        positive("reveal.max_dt_ms", r.max_dt_ms)?;
        finite("reveal.drift", r.drift)?;
        finite("reveal.drift_y_ratio", r.drift_y_ratio)?;
        non_negative("reveal.orbit_radius", r.orbit_radius)?;
        finite("reveal.orbit_speed", r.orbit_speed)?;
        positive("reveal.max_device_pixel_ratio", r.max_device_pixel_ratio)?;
        unit("reveal.activation_threshold", r.activation_threshold)?;

        let n = &self.nav;
        non_negative("nav.click_lock_ms", n.click_lock_ms)?;
        unit("nav.end_fraction", n.end_fraction)?;
        unit("nav.active_ratio_min", n.active_ratio_min)?;
        if n.ratio_thresholds.is_empty() {
            return Err(VitrineError::config("nav.ratio_thresholds must be non-empty"));
        }
        for t in &n.ratio_thresholds {
            unit("nav.ratio_thresholds[]", *t)?;
        }

        unit("snap.title_fraction", self.snap.title_fraction)?;
        non_negative("snap.touch_threshold_px", self.snap.touch_threshold_px)?;
        non_negative("title.hold_ms", self.title.hold_ms)?;
        unit("scroll_reveal.threshold", self.scroll_reveal.threshold)?;
        Ok(())
    }
}

fn finite(name: &str, v: f64) -> VitrineResult<()> {
    if !v.is_finite() {
        return Err(VitrineError::config(format!("{name} must be finite")));
    }
    Ok(())
}

fn positive(name: &str, v: f64) -> VitrineResult<()> {
    finite(name, v)?;
    if v <= 0.0 {
        return Err(VitrineError::config(format!("{name} must be > 0")));
    }
    Ok(())
}

fn non_negative(name: &str, v: f64) -> VitrineResult<()> {
    finite(name, v)?;
    if v < 0.0 {
        return Err(VitrineError::config(format!("{name} must be >= 0")));
    }
    Ok(())
}

fn unit(name: &str, v: f64) -> VitrineResult<()> {
    finite(name, v)?;
    if !(0.0..=1.0).contains(&v) {
        return Err(VitrineError::config(format!("{name} must be in [0, 1]")));
    }
    Ok(())
}
