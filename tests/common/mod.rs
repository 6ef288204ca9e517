// Shared test helpers for integration tests
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{TempDir, tempdir};

/// Creates a small cargo project in a temporary directory whose features
/// mirror an actor library: two exclusive runtimes and two exclusive error
/// libraries, plus switches that break the build or the tests on demand.
pub fn setup_sample_project() -> TempDir {
    let temp_dir = tempdir().expect("Failed to create temporary directory");
    let project = temp_dir.path();
    let src_path = project.join("src");
    fs::create_dir_all(&src_path).expect("Failed to create src directory");

    let cargo_toml_content = r#"[package]
name = "sample_actors"
version = "0.1.0"
edition = "2021"

[workspace]

[lib]
path = "src/lib.rs"

[features]
default = ["runtime-async-std", "anyhow"]
runtime-async-std = []
runtime-tokio = []
anyhow = []
eyre = []
broken-build = []
broken-test = []
"#;
    fs::write(project.join("Cargo.toml"), cargo_toml_content).expect("Failed to write Cargo.toml");

    let lib_rs_content = r#"
#[cfg(all(feature = "runtime-async-std", feature = "runtime-tokio"))]
compile_error!("only one runtime may be enabled");

#[cfg(all(feature = "anyhow", feature = "eyre"))]
compile_error!("only one error library may be enabled");

#[cfg(feature = "broken-build")]
compile_error!("This is a deliberate build failure for testing purposes.");

pub fn runtime() -> &'static str {
    if cfg!(feature = "runtime-tokio") { "tokio" } else { "async-std" }
}

#[cfg(test)]
mod tests {
    #[test]
    fn runtime_is_named() {
        assert!(!super::runtime().is_empty());
    }

    #[cfg(feature = "broken-test")]
    #[test]
    fn it_fails() {
        panic!("This is a deliberate test failure for testing purposes.");
    }
}
"#;
    fs::write(src_path.join("lib.rs"), lib_rs_content).expect("Failed to write lib.rs");

    temp_dir
}

/// Writes a `Pipeline.toml` with the given content into `dir`.
pub fn write_pipeline(dir: &Path, content: &str) -> PathBuf {
    let path = dir.join("Pipeline.toml");
    fs::write(&path, content).expect("Failed to write Pipeline.toml");
    path
}

/// A single-configuration pipeline that builds and tests with the default features.
pub const SINGLE_DEFAULT_PIPELINE: &str = r#"
language = "en"

[defaults]
features = ["runtime-async-std", "anyhow"]

[[configurations]]
name = "default"
"#;

/// A pipeline whose first build fails.
pub const BROKEN_BUILD_PIPELINE: &str = r#"
language = "en"

[[configurations]]
name = "default"
features = ["broken-build"]

[[configurations]]
name = "tokio-anyhow"
no_default_features = true
features = ["runtime-tokio", "anyhow"]
"#;

/// A pipeline whose test step fails after a successful build.
pub const BROKEN_TEST_PIPELINE: &str = r#"
language = "en"

[[configurations]]
name = "default"
features = ["broken-test"]
"#;

/// A pipeline that is not valid TOML.
pub const INVALID_TOML_PIPELINE: &str = r#"
[[configurations]
name = "default"
"#;
