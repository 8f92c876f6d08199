pub mod loader;
pub mod settings;

pub use loader::ConfigLoader;
pub use settings::*;
