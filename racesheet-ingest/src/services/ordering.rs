//! Screenshot reading order
//!
//! Result screenshots are re-posted in canonical order: heat rank
//! ("1" < "2"/"2a" < "2b" < "3" < unknown), then page. Each posted image
//! carries a heat marker and a page marker from which its metadata can be
//! recovered later.

use serde::{Deserialize, Serialize};

use crate::models::HeatLabel;

/// Rank of heats outside the known vocabulary
const UNKNOWN_HEAT_RANK: u32 = 99;
/// Key of items without metadata (sort after everything)
const NO_META_KEY: (u32, u32) = (999, 999);

/// Marker for an unknown heat or page
pub const UNKNOWN_MARKER: &str = "❓";

const PAGE_ONE_MARKER: &str = "🔼";
const PAGE_TWO_MARKER: &str = "🔽";

/// Heat and page of a posted screenshot
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScreenshotMeta {
    pub heat: String,
    pub page: u32,
}

impl ScreenshotMeta {
    pub fn new(heat: impl Into<String>, page: u32) -> Self {
        Self {
            heat: heat.into(),
            page,
        }
    }
}

fn heat_rank(label: &HeatLabel) -> u32 {
    match label {
        HeatLabel::One => 0,
        HeatLabel::Two | HeatLabel::TwoA => 1,
        HeatLabel::TwoB => 2,
        HeatLabel::Three => 3,
        HeatLabel::Other(_) => UNKNOWN_HEAT_RANK,
    }
}

/// Total-order key; items without metadata sort last
pub fn order_key(meta: Option<&ScreenshotMeta>) -> (u32, u32) {
    match meta {
        Some(m) => (heat_rank(&HeatLabel::parse(&m.heat)), m.page),
        None => NO_META_KEY,
    }
}

/// Stable sort of items by their screenshot metadata
pub fn sort_screenshots<T, F>(items: &mut [T], meta: F)
where
    F: Fn(&T) -> Option<ScreenshotMeta>,
{
    items.sort_by_cached_key(|item| order_key(meta(item).as_ref()));
}

fn heat_marker(label: &HeatLabel) -> &'static str {
    match label {
        HeatLabel::One => "🟡",
        HeatLabel::Two | HeatLabel::TwoA => "🔵",
        HeatLabel::TwoB => "🔴",
        HeatLabel::Three => "🟢",
        HeatLabel::Other(_) => UNKNOWN_MARKER,
    }
}

fn page_marker(page: u32) -> &'static str {
    match page {
        1 => PAGE_ONE_MARKER,
        2 => PAGE_TWO_MARKER,
        _ => UNKNOWN_MARKER,
    }
}

/// (heat marker, page marker) for a posted screenshot
pub fn markers_for(heat: &str, page: u32) -> (&'static str, &'static str) {
    (heat_marker(&HeatLabel::parse(heat)), page_marker(page))
}

/// Recover metadata from the markers on a posted screenshot
///
/// The first heat marker wins; the blue marker reads back as "2". Both a heat
/// and a page marker are required.
pub fn meta_from_markers<'a, I>(markers: I) -> Option<ScreenshotMeta>
where
    I: IntoIterator<Item = &'a str>,
{
    let known_heats = [
        HeatLabel::One,
        HeatLabel::Two,
        HeatLabel::TwoB,
        HeatLabel::Three,
    ];

    let mut heat: Option<&HeatLabel> = None;
    let mut page: Option<u32> = None;
    for marker in markers {
        if heat.is_none() {
            heat = known_heats.iter().find(|h| heat_marker(h) == marker);
        }
        if marker == PAGE_ONE_MARKER {
            page = Some(1);
        } else if marker == PAGE_TWO_MARKER {
            page = Some(2);
        }
    }

    Some(ScreenshotMeta::new(heat?.as_str(), page?))
}
