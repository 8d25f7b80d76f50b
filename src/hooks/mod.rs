pub mod context;
pub mod file_logger;
pub mod registry;
pub mod traits;

pub use context::{ActionContext, OutcomeContext};
pub use file_logger::FileLoggerHook;
pub use registry::HookRegistry;
