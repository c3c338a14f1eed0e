//! Redaction geometry policies and supporting types.
//!
//! A [`GeometryPolicy`] turns one located label into the rectangles that must
//! be destroyed. The matching code never looks at geometry beyond the match
//! box, so new heuristics only need a new policy.

use crate::domain::{Color, Match, Rect};
use crate::error::RedactorError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Visible label drawn over a standard mark. Never derived from page content.
pub const REDACTED_LABEL: &str = "[REDACTED]";

/// Width of the aggressive mark to the right of a match.
pub const RIGHT_EXTENT: f32 = 150.0;
/// Vertical padding above and below the right-hand aggressive mark.
pub const RIGHT_VERTICAL_PAD: f32 = 2.0;
/// How far the aggressive mark below a match starts left of it.
pub const BELOW_LEFT_INSET: f32 = 10.0;
/// How far the aggressive mark below a match extends right of it.
pub const BELOW_EXTENT: f32 = 150.0;
/// Height of the aggressive mark below a match.
pub const BELOW_HEIGHT: f32 = 20.0;

/// A rectangle queued for destructive redaction on a page.
#[derive(Debug, Clone, PartialEq)]
pub struct RedactionMark {
    pub rect: Rect,
    pub label: Option<String>,
    pub fill: Color,
}

impl RedactionMark {
    /// Opaque black mark carrying the fixed `[REDACTED]` label.
    pub fn labelled(rect: Rect) -> Self {
        Self {
            rect,
            label: Some(REDACTED_LABEL.to_string()),
            fill: Color::BLACK,
        }
    }

    /// Opaque black mark without visible text.
    pub fn blank(rect: Rect) -> Self {
        Self {
            rect,
            label: None,
            fill: Color::BLACK,
        }
    }
}

/// Run-wide redaction mode, fixed before a run starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RedactionMode {
    /// Redact only the matched label.
    #[default]
    Standard,
    /// Also blank the regions right of and below the label, where its value
    /// usually sits.
    Aggressive,
}

impl RedactionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Aggressive => "aggressive",
        }
    }

    /// The geometry policy implementing this mode.
    pub fn policy(&self) -> Box<dyn GeometryPolicy> {
        match self {
            Self::Standard => Box::new(StandardPolicy),
            Self::Aggressive => Box::new(AggressivePolicy::default()),
        }
    }
}

impl fmt::Display for RedactionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RedactionMode {
    type Err = RedactorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(Self::Standard),
            "aggressive" => Ok(Self::Aggressive),
            other => Err(RedactorError::InvalidInput {
                parameter: "mode".to_string(),
                reason: format!("unknown mode '{}', expected standard or aggressive", other),
            }),
        }
    }
}

/// Converts a match into the marks to apply.
///
/// Marks are independent rectangles. They are not clipped to the page or
/// merged with each other; overlaps are resolved when the page commits.
pub trait GeometryPolicy: Send + Sync {
    fn marks_for(&self, found: &Match) -> Vec<RedactionMark>;

    /// Returns a human-readable name for this policy.
    fn name(&self) -> &str;
}

/// One labelled mark over the match.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardPolicy;

impl GeometryPolicy for StandardPolicy {
    fn marks_for(&self, found: &Match) -> Vec<RedactionMark> {
        vec![RedactionMark::labelled(found.rect)]
    }

    fn name(&self) -> &str {
        "standard"
    }
}

/// Standard mark plus blank marks right of and below the match.
///
/// The offsets are page units with no relation to font size; they assume a
/// label is immediately followed by its value on the same line or the next.
#[derive(Debug, Clone, Copy)]
pub struct AggressivePolicy {
    pub right_extent: f32,
    pub right_vertical_pad: f32,
    pub below_left_inset: f32,
    pub below_extent: f32,
    pub below_height: f32,
}

impl Default for AggressivePolicy {
    fn default() -> Self {
        Self {
            right_extent: RIGHT_EXTENT,
            right_vertical_pad: RIGHT_VERTICAL_PAD,
            below_left_inset: BELOW_LEFT_INSET,
            below_extent: BELOW_EXTENT,
            below_height: BELOW_HEIGHT,
        }
    }
}

impl AggressivePolicy {
    pub fn right_of(&self, rect: &Rect) -> Rect {
        Rect::new(
            rect.x1,
            rect.y0 - self.right_vertical_pad,
            rect.x1 + self.right_extent,
            rect.y1 + self.right_vertical_pad,
        )
    }

    pub fn below(&self, rect: &Rect) -> Rect {
        Rect::new(
            rect.x0 - self.below_left_inset,
            rect.y1,
            rect.x1 + self.below_extent,
            rect.y1 + self.below_height,
        )
    }
}

impl GeometryPolicy for AggressivePolicy {
    fn marks_for(&self, found: &Match) -> Vec<RedactionMark> {
        vec![
            RedactionMark::labelled(found.rect),
            RedactionMark::blank(self.right_of(&found.rect)),
            RedactionMark::blank(self.below(&found.rect)),
        ]
    }

    fn name(&self) -> &str {
        "aggressive"
    }
}

/// Statistics about a completed run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RedactionSummary {
    /// Pages processed
    pub pages_processed: usize,

    /// Pages with at least one mark
    pub pages_modified: usize,

    /// Label occurrences found
    pub matches: usize,

    /// Marks committed
    pub marks_applied: usize,

    /// Where the sanitized document was written
    pub output: PathBuf,
}

impl RedactionSummary {
    /// Returns true if any redactions were applied.
    pub fn has_redactions(&self) -> bool {
        self.marks_applied > 0
    }
}
