pub const APP_NAME: &str = "nbake";

/// Configuration file looked up in the project root when `--config` is not given.
pub const CONFIG_FILENAME: &str = "nbake.toml";

pub const DEFAULT_CONFIGURATION: &str = "Release";
pub const DEFAULT_RUNTIME_LAUNCHER: &str = "mono";
pub const DEFAULT_VARIANT_SUFFIX: &str = "x86";

pub const NUGET_PATH: &str = ".nuget/NuGet.exe";
pub const NUGET_DOWNLOAD_URL: &str = "http://nuget.org/nuget.exe";
pub const PRIMARY_FEED: &str = "https://nuget.org/api/v2";
pub const PRERELEASE_FEED: &str = "http://www.myget.org/F/b4ff5f68eccf4f6bbfed74f055f88d8f";

pub const TEST_RESULTS_DIR: &str = "TestResults";
pub const ARTIFACTS_DIR: &str = "artifacts";
pub const VERSION_FILENAME: &str = "VERSION";

/// Placeholder replaced by the configuration name in path templates.
pub const CONFIG_PLACEHOLDER: &str = "{config}";
