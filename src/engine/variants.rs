//! Variant selection: turns `--variants=[...]` and `--no-*` flags into a total
//! enabled/disabled mapping.
//!
//! Resolution order is fixed: start from "everything on", apply the inclusion
//! set if one was given, then apply negations. Negations always win.

use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt;

use crate::error::{Error, Result};

/// A user-selectable output family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Variant {
    Webm,
    H265,
    H264,
    P720,
    P480,
    P360,
    Hls,
    Dash,
    Posters,
}

impl Variant {
    pub const COUNT: usize = 9;

    pub const ALL: [Variant; Variant::COUNT] = [
        Variant::Webm,
        Variant::H265,
        Variant::H264,
        Variant::P720,
        Variant::P480,
        Variant::P360,
        Variant::Hls,
        Variant::Dash,
        Variant::Posters,
    ];

    /// Members of the `mp4` pseudo-variant
    pub const MP4: [Variant; 5] = [
        Variant::H265,
        Variant::H264,
        Variant::P720,
        Variant::P480,
        Variant::P360,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Variant::Webm => "webm",
            Variant::H265 => "h265",
            Variant::H264 => "h264",
            Variant::P720 => "720",
            Variant::P480 => "480",
            Variant::P360 => "360",
            Variant::Hls => "hls",
            Variant::Dash => "dash",
            Variant::Posters => "posters",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.name() == name)
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One token of a selection: a single variant or a group name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector {
    One(Variant),
    Mp4,
    All,
}

impl Selector {
    /// Parse a single token; case and surrounding whitespace are ignored
    pub fn parse(token: &str) -> Option<Self> {
        let token = token.trim().to_ascii_lowercase();
        match token.as_str() {
            "mp4" => Some(Selector::Mp4),
            "all" => Some(Selector::All),
            other => Variant::from_name(other).map(Selector::One),
        }
    }

    pub fn variants(self) -> Vec<Variant> {
        match self {
            Selector::One(v) => vec![v],
            Selector::Mp4 => Variant::MP4.to_vec(),
            Selector::All => Variant::ALL.to_vec(),
        }
    }
}

/// Total mapping of every variant to enabled/disabled.
///
/// Backed by a fixed array indexed by [`Variant`], so no variant can ever be
/// missing from the mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnabledVariants([bool; Variant::COUNT]);

impl EnabledVariants {
    pub fn all() -> Self {
        Self([true; Variant::COUNT])
    }

    pub fn none() -> Self {
        Self([false; Variant::COUNT])
    }

    pub fn is_enabled(&self, variant: Variant) -> bool {
        self.0[variant.index()]
    }

    pub fn set(&mut self, variant: Variant, enabled: bool) {
        self.0[variant.index()] = enabled;
    }

    fn apply(&mut self, selector: Selector, enabled: bool) {
        for variant in selector.variants() {
            self.set(variant, enabled);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Variant, bool)> + '_ {
        Variant::ALL.into_iter().map(|v| (v, self.is_enabled(v)))
    }

    pub fn enabled(&self) -> impl Iterator<Item = Variant> + '_ {
        self.iter().filter_map(|(v, on)| on.then_some(v))
    }
}

impl Default for EnabledVariants {
    fn default() -> Self {
        Self::all()
    }
}

impl Serialize for EnabledVariants {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Variant::COUNT))?;
        for (variant, enabled) in self.iter() {
            map.serialize_entry(variant.name(), &enabled)?;
        }
        map.end()
    }
}

/// Raw selection as it arrives from the command line
#[derive(Debug, Clone, Default)]
pub struct VariantRequest {
    /// Inclusion set, e.g. `[webm,h265,posters]`
    pub inclusion: Option<String>,
    /// Targets of `--no-*` flags
    pub negations: Vec<Selector>,
}

/// Split an inclusion set into recognized selectors and unknown tokens.
/// Brackets are optional and empty tokens are dropped.
pub fn parse_inclusion(raw: &str) -> (Vec<Selector>, Vec<String>) {
    let body = raw.trim().trim_start_matches('[').trim_end_matches(']');

    let mut selectors = Vec::new();
    let mut unknown = Vec::new();
    for token in body.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        match Selector::parse(token) {
            Some(selector) => selectors.push(selector),
            None => unknown.push(token.to_string()),
        }
    }
    (selectors, unknown)
}

/// Resolve a request into the final mapping.
///
/// Unknown inclusion tokens are skipped with a warning; with `strict` they are
/// a configuration error instead.
pub fn resolve(request: &VariantRequest, strict: bool) -> Result<EnabledVariants> {
    let mut enabled = EnabledVariants::all();

    if let Some(raw) = &request.inclusion {
        let (selectors, unknown) = parse_inclusion(raw);
        if let Some(first) = unknown.first() {
            if strict {
                return Err(Error::UnknownVariant(first.clone()));
            }
            for token in &unknown {
                tracing::warn!("ignoring unknown variant '{}'", token);
            }
        }

        enabled = EnabledVariants::none();
        for selector in selectors {
            enabled.apply(selector, true);
        }
    }

    for &selector in &request.negations {
        enabled.apply(selector, false);
    }

    Ok(enabled)
}
