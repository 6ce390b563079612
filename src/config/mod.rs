// Backend, session store and logging sections, plus the versioned loader.
pub mod backend;
pub mod config;
pub mod logging;
pub mod store;

pub use backend::*;
pub use config::*;
pub use logging::*;
pub use store::*;
