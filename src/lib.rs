pub mod config;
pub mod decoder;
pub mod engine;
pub mod error;
pub mod linker;
pub mod paths;
pub mod progress;
pub mod scanner;

pub use config::LinkerConfig;
pub use decoder::CaptureDir;
pub use engine::{LinkEngine, RunSummary};
pub use error::{Error, Result};
pub use linker::{DiskFs, LinkFs, Linker, MemoryFs};
pub use progress::{CreatedLink, LinkKind, LinkReporter, SilentReporter};
