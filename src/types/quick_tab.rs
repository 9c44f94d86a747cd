use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// One floating Quick Tab overlay instance.
///
/// `id` and `origin_tab_id` are assigned at creation and never change;
/// everything else is mutated through the live state store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuickTabRecord {
    pub id: String,
    pub url: String,
    pub title: String,
    /// Browser tab that created this record; used for isolation filtering.
    pub origin_tab_id: i64,
    pub position: Position,
    pub size: Size,
    pub visibility: Visibility,
    /// Browser tabs on which this record has elevated visibility.
    #[serde(default)]
    pub soloed_on_tabs: BTreeSet<i64>,
    /// Browser tabs on which this record is suppressed.
    #[serde(default)]
    pub muted_on_tabs: BTreeSet<i64>,
}

/// Overlay position in page pixels.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
pub struct Position {
    pub left: f64,
    pub top: f64,
}

/// Overlay size in page pixels.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Default for Size {
    fn default() -> Self {
        Self {
            width: 400.0,
            height: 300.0,
        }
    }
}

/// Visibility state flags, independent of solo/mute semantics.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
pub struct Visibility {
    pub minimized: bool,
}

/// Partial update applied through `StateStore::update`.
///
/// `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickTabPatch {
    pub url: Option<String>,
    pub title: Option<String>,
    pub position: Option<Position>,
    pub size: Option<Size>,
    pub minimized: Option<bool>,
}

impl QuickTabRecord {
    /// Builds a fresh record with default geometry for a newly created Quick Tab.
    pub fn new(id: String, url: &str, title: &str, origin_tab_id: i64) -> Self {
        Self {
            id,
            url: url.to_string(),
            title: title.to_string(),
            origin_tab_id,
            position: Position::default(),
            size: Size::default(),
            visibility: Visibility::default(),
            soloed_on_tabs: BTreeSet::new(),
            muted_on_tabs: BTreeSet::new(),
        }
    }

    /// Applies a patch in place, returning true if anything changed.
    pub fn apply_patch(&mut self, patch: &QuickTabPatch) -> bool {
        let mut changed = false;
        if let Some(ref url) = patch.url {
            if &self.url != url {
                self.url = url.clone();
                changed = true;
            }
        }
        if let Some(ref title) = patch.title {
            if &self.title != title {
                self.title = title.clone();
                changed = true;
            }
        }
        if let Some(position) = patch.position {
            if self.position != position {
                self.position = position;
                changed = true;
            }
        }
        if let Some(size) = patch.size {
            if self.size != size {
                self.size = size;
                changed = true;
            }
        }
        if let Some(minimized) = patch.minimized {
            if self.visibility.minimized != minimized {
                self.visibility.minimized = minimized;
                changed = true;
            }
        }
        changed
    }
}
