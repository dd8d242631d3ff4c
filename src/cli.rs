use clap::Parser;
use std::path::PathBuf;

use webvariants::engine::variants::{Selector, Variant, VariantRequest};

#[derive(Parser, Debug)]
#[command(name = "webvariants")]
#[command(
    about = "Encode one video into web variants, HLS/DASH packages and posters",
    long_about = None
)]
pub struct Cli {
    /// Video file to process; outputs go to a sibling directory named after it
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Only produce these variants, e.g. --variants=[webm,h265,posters]
    #[arg(long, value_name = "LIST")]
    pub variants: Option<String>,

    /// Skip the VP9 WebM encode
    #[arg(long)]
    pub no_webm: bool,

    /// Skip the H.265 MP4 encode
    #[arg(long)]
    pub no_h265: bool,

    /// Skip the full-resolution H.264 MP4 encode
    #[arg(long)]
    pub no_h264: bool,

    /// Skip the 720p H.264 encode
    #[arg(long = "no-720")]
    pub no_720: bool,

    /// Skip the 480p H.264 encode
    #[arg(long = "no-480")]
    pub no_480: bool,

    /// Skip the 360p H.264 encode
    #[arg(long = "no-360")]
    pub no_360: bool,

    /// Skip the HLS package
    #[arg(long)]
    pub no_hls: bool,

    /// Skip the DASH package
    #[arg(long)]
    pub no_dash: bool,

    /// Skip poster extraction, resizing and optimization
    #[arg(long)]
    pub no_posters: bool,

    /// Skip every MP4 output (h265, h264, 720, 480, 360)
    #[arg(long)]
    pub no_mp4: bool,

    /// Print the commands that would run and exit
    #[arg(long)]
    pub dry_run: bool,

    /// Print the final report as JSON
    #[arg(long)]
    pub json: bool,

    /// Settings file (defaults to <config dir>/webvariants/config.toml)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// `--no-*` flags as selectors in declaration order; negations commute
    pub fn negations(&self) -> Vec<Selector> {
        [
            (self.no_webm, Selector::One(Variant::Webm)),
            (self.no_h265, Selector::One(Variant::H265)),
            (self.no_h264, Selector::One(Variant::H264)),
            (self.no_720, Selector::One(Variant::P720)),
            (self.no_480, Selector::One(Variant::P480)),
            (self.no_360, Selector::One(Variant::P360)),
            (self.no_hls, Selector::One(Variant::Hls)),
            (self.no_dash, Selector::One(Variant::Dash)),
            (self.no_posters, Selector::One(Variant::Posters)),
            (self.no_mp4, Selector::Mp4),
        ]
        .into_iter()
        .filter_map(|(set, selector)| set.then_some(selector))
        .collect()
    }

    pub fn variant_request(&self) -> VariantRequest {
        VariantRequest {
            inclusion: self.variants.clone(),
            negations: self.negations(),
        }
    }
}

pub fn parse() -> Cli {
    Cli::parse()
}
