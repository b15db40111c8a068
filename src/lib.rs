#![forbid(unsafe_code)]

pub mod assets;
pub mod config;
pub mod fonts;
pub mod foundation;
pub mod layout;
pub mod render;
pub mod richtext;
pub mod split;

pub use assets::SlideAssets;
pub use config::{
    CarouselFormat, CarouselType, FinalSlideConfig, FontPair, RenderConfig, Slide, SplitMethod,
    Template, ValidationResult,
};
pub use fonts::{FontLibrary, TextMeasure};
pub use foundation::color::Rgba8;
pub use foundation::error::{KaruselError, KaruselResult};
pub use render::compositor::RenderedImage;
pub use render::pipeline::{CarouselOutput, CarouselRenderer};
pub use split::{assemble_slides, split_slides};
