//! Dispatcher configuration
//!
//! Settings are read from the `dispatcher:` section of `config.yaml` in the
//! module root, the same file the analysis tools load. Anything missing falls
//! back to compiled defaults.

pub mod loader;
pub mod settings;
pub mod validator;

pub use loader::{ConfigLoader, CONFIG_FILE_NAME, CONFIG_SECTION};
pub use settings::{DispatcherConfig, MANIFEST_PATH_TOKEN};
pub use validator::ConfigValidator;
