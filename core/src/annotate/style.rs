use std::fmt::Write;

use chrono::DateTime;
use palette::{LinSrgb, Mix, Srgb};
use serde::Serialize;

use crate::blame::BlameCommit;
use crate::config::{AnnotationKind, AnnotationOptions, HeatmapOptions};
use crate::error::{Error, Result};

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;
const FALLBACK_DATE_FORMAT: &str = "%Y-%m-%d";

/// Visual payload of a decoration, shared by every line of the same commit.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DecorationStyle {
    pub sha: String,
    /// `#rrggbb`
    pub color: String,
    /// Gutter text; heatmap decorations have none.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    pub hover: String,
}

/// Age-to-color scale between a hot (new) and a cold (old) stop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeatmapScale {
    hot: LinSrgb<f32>,
    cold: LinSrgb<f32>,
    threshold_secs: u64,
}

impl HeatmapScale {
    pub fn new(options: &HeatmapOptions) -> Result<Self> {
        Ok(Self {
            hot: parse_color(&options.hot_color)?,
            cold: parse_color(&options.cold_color)?,
            threshold_secs: u64::from(options.age_threshold_days.max(1)) * SECONDS_PER_DAY,
        })
    }

    /// 0.0 for a commit made at `now`, 1.0 at or beyond the age threshold.
    /// Commits dated in the future count as new.
    pub fn heat(&self, commit_time: u64, now: u64) -> f32 {
        let age = now.saturating_sub(commit_time).min(self.threshold_secs);
        (age as f64 / self.threshold_secs as f64) as f32
    }

    pub fn color(&self, commit_time: u64, now: u64) -> String {
        let t = self.heat(commit_time, now);
        to_hex(self.hot.mix(self.cold, t))
    }

    pub fn hot_color(&self) -> String {
        to_hex(self.hot)
    }
}

fn parse_color(value: &str) -> Result<LinSrgb<f32>> {
    let rgb: Srgb<u8> = value
        .trim()
        .parse()
        .map_err(|_| Error::InvalidColor(value.to_string()))?;
    Ok(rgb.into_format::<f32>().into_linear())
}

fn to_hex(color: LinSrgb<f32>) -> String {
    let srgb: Srgb<f32> = Srgb::from_linear(color);
    let (r, g, b) = srgb.into_format::<u8>().into_components();
    format!("#{:02x}{:02x}{:02x}", r, g, b)
}

/// Turns a commit into its decoration style for one annotation kind.
#[derive(Debug, Clone)]
pub struct StyleBuilder {
    kind: AnnotationKind,
    scale: HeatmapScale,
    date_format: String,
}

impl StyleBuilder {
    pub fn new(options: &AnnotationOptions) -> Result<Self> {
        Ok(Self {
            kind: options.kind,
            scale: HeatmapScale::new(&options.heatmap)?,
            date_format: options.gutter.date_format.clone(),
        })
    }

    pub fn kind(&self) -> AnnotationKind {
        self.kind
    }

    pub fn build(&self, commit: &BlameCommit, now: u64) -> DecorationStyle {
        if commit.is_uncommitted() {
            return DecorationStyle {
                sha: commit.sha.clone(),
                color: self.scale.hot_color(),
                text: match self.kind {
                    AnnotationKind::Heatmap => None,
                    AnnotationKind::Gutter => Some("Uncommitted".to_string()),
                },
                hover: "Uncommitted changes".to_string(),
            };
        }

        let date = self.format_date(commit.author_date);
        let text = match self.kind {
            AnnotationKind::Heatmap => None,
            AnnotationKind::Gutter => Some(format!(
                "{}  {}  {}",
                commit.short_sha(),
                commit.author_name,
                date
            )),
        };

        DecorationStyle {
            sha: commit.sha.clone(),
            color: self.scale.color(commit.author_date, now),
            text,
            hover: format!("{}, {}\n\n{}", commit.author_name, date, commit.summary),
        }
    }

    fn format_date(&self, epoch: u64) -> String {
        let Some(time) = i64::try_from(epoch).ok().and_then(|secs| DateTime::from_timestamp(secs, 0)) else {
            return String::new();
        };
        let mut out = String::new();
        // chrono reports bad format strings as a fmt error at write time
        if write!(out, "{}", time.format(&self.date_format)).is_err() {
            out.clear();
            let _ = write!(out, "{}", time.format(FALLBACK_DATE_FORMAT));
        }
        out
    }
}
