mod config;
mod layout;
mod platform;

pub use config::{BuildSettings, ConfigError, GlobalConfig, ModuleSpec, OperatingMode};
pub use layout::{
    AOT_GROUP, AOT_LIBRARY_SET, CODE_GROUP, ContentLayout, DEFAULT_MODULE_NAME, PACKED_SUFFIX,
    module_binary_file, module_binary_key, module_symbol_file, packed_artifact_name,
    strip_packed_suffix,
};
pub use platform::resolve_platform_folder;
