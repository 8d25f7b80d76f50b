pub mod image_filter;
pub mod inference;
pub mod media;
pub mod recharge;

pub use image_filter::{FilterKind, ImageFilter, LocalImageFilter};
pub use inference::{InferenceService, OpenAiClient};
pub use media::{MediaCatalog, VideoEntry};
pub use recharge::{RechargeDesk, RechargeForm};
