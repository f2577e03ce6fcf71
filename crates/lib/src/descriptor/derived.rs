//! The derived descriptor used for the variant build.
//!
//! `prepare` copies `<name>.csproj` to `<name>.<suffix>.csproj` and patches the
//! copy; `cleanup` fixes up the runtime config produced by the variant build and
//! deletes the copy. The file is owned by a [`DerivedDescriptor`] guard, so an
//! early return or a failed build in between still removes it.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::{DescriptorError, ProjectDescriptor};

/// Owns a derived descriptor file for the duration of one build.
///
/// Dropping the guard deletes the file unless [`keep`](Self::keep) or
/// [`cleanup`](Self::cleanup) consumed it.
#[derive(Debug)]
pub struct DerivedDescriptor {
  path: PathBuf,
  armed: bool,
}

impl DerivedDescriptor {
  /// Copy `source` to its derived sibling and patch the copy.
  ///
  /// The assembly `<name>` becomes `<name>.<suffix>` and every configuration's
  /// output directory moves to `bin\<Config>.<suffix>\`.
  pub fn prepare(source: &Path, suffix: &str) -> Result<Self, DescriptorError> {
    if !source.exists() {
      return Err(DescriptorError::NotFound {
        path: source.to_path_buf(),
      });
    }

    let target = derived_path(source, suffix);
    fs::copy(source, &target).map_err(|e| DescriptorError::Copy {
      from: source.to_path_buf(),
      to: target.clone(),
      source: e,
    })?;

    // Armed from here on: a failed patch removes the copy.
    let guard = Self {
      path: target,
      armed: true,
    };

    let project = project_name(source);
    let mut descriptor = ProjectDescriptor::load(&guard.path)?;

    if !descriptor.set_assembly_name(&project, &format!("{}.{}", project, suffix))? {
      warn!(path = %guard.path.display(), assembly = %project, "assembly name not found in derived descriptor");
    }
    let redirected = descriptor.redirect_output_paths(suffix)?;
    if redirected == 0 {
      warn!(path = %guard.path.display(), "no output path redirected in derived descriptor");
    }
    descriptor.save()?;

    info!(path = %guard.path.display(), redirected, "prepared derived descriptor");
    Ok(guard)
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  /// Release ownership; the file stays on disk.
  pub fn keep(mut self) -> PathBuf {
    self.armed = false;
    std::mem::take(&mut self.path)
  }

  /// Rewrite the generated config and delete the derived descriptor.
  ///
  /// The guard stays armed until cleanup succeeds, so a failure still removes
  /// the file when `self` drops.
  pub fn cleanup(mut self, generated_config: &Path, rewrite: &QualifiedNameRewrite) -> Result<(), DescriptorError> {
    cleanup_derived_descriptor(&self.path, generated_config, rewrite)?;
    self.armed = false;
    Ok(())
  }
}

impl Drop for DerivedDescriptor {
  fn drop(&mut self) {
    if !self.armed {
      return;
    }
    match fs::remove_file(&self.path) {
      Ok(()) => debug!(path = %self.path.display(), "removed derived descriptor"),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
      Err(e) => warn!(path = %self.path.display(), error = %e, "failed to remove derived descriptor"),
    }
  }
}

/// The assembly-qualified type name rewritten in a generated runtime config.
///
/// `"<type_name>, <old_assembly>"` becomes `"<type_name>, <new_assembly>"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualifiedNameRewrite {
  pub type_name: String,
  pub old_assembly: String,
  pub new_assembly: String,
}

impl QualifiedNameRewrite {
  pub fn old_name(&self) -> String {
    format!("{}, {}", self.type_name, self.old_assembly)
  }

  pub fn new_name(&self) -> String {
    format!("{}, {}", self.type_name, self.new_assembly)
  }
}

/// Rewrite the qualified name in `config_path`. Returns whether it was found.
pub fn rewrite_qualified_name(config_path: &Path, rewrite: &QualifiedNameRewrite) -> Result<bool, DescriptorError> {
  if !config_path.exists() {
    return Err(DescriptorError::NotFound {
      path: config_path.to_path_buf(),
    });
  }
  let content = fs::read_to_string(config_path).map_err(|source| DescriptorError::Read {
    path: config_path.to_path_buf(),
    source,
  })?;

  let old = rewrite.old_name();
  if !content.contains(&old) {
    return Ok(false);
  }

  let updated = content.replace(&old, &rewrite.new_name());
  fs::write(config_path, updated).map_err(|source| DescriptorError::Write {
    path: config_path.to_path_buf(),
    source,
  })?;
  Ok(true)
}

/// Fix up the generated config and delete the derived descriptor.
///
/// Both files must exist; nothing is touched if either is missing.
pub fn cleanup_derived_descriptor(
  derived: &Path,
  generated_config: &Path,
  rewrite: &QualifiedNameRewrite,
) -> Result<(), DescriptorError> {
  for path in [derived, generated_config] {
    if !path.exists() {
      return Err(DescriptorError::NotFound {
        path: path.to_path_buf(),
      });
    }
  }

  if !rewrite_qualified_name(generated_config, rewrite)? {
    warn!(
      path = %generated_config.display(),
      name = %rewrite.old_name(),
      "qualified name not found in generated config"
    );
  }

  fs::remove_file(derived).map_err(|source| DescriptorError::Remove {
    path: derived.to_path_buf(),
    source,
  })?;

  info!(path = %derived.display(), "cleaned up derived descriptor");
  Ok(())
}

/// Derive the `<suffix>` variant of `source`; see [`DerivedDescriptor::prepare`].
pub fn prepare_derived_descriptor(source: &Path, suffix: &str) -> Result<DerivedDescriptor, DescriptorError> {
  DerivedDescriptor::prepare(source, suffix)
}

/// `dir/name.csproj` -> `dir/name.<suffix>.csproj`
pub fn derived_path(source: &Path, suffix: &str) -> PathBuf {
  let stem = project_name(source);
  let file_name = match source.extension() {
    Some(ext) => format!("{}.{}.{}", stem, suffix, ext.to_string_lossy()),
    None => format!("{}.{}", stem, suffix),
  };
  source.with_file_name(file_name)
}

fn project_name(source: &Path) -> String {
  source
    .file_stem()
    .map(|s| s.to_string_lossy().into_owned())
    .unwrap_or_default()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::util::testutil::{descriptor_xml, write_file};
  use tempfile::TempDir;

  const SECTION: &str = "Xunit.ConsoleClient.XunitConsoleConfigurationSection";

  fn rewrite() -> QualifiedNameRewrite {
    QualifiedNameRewrite {
      type_name: SECTION.to_string(),
      old_assembly: "xunit.console".to_string(),
      new_assembly: "xunit.console.x86".to_string(),
    }
  }

  fn config_xml() -> String {
    format!(
      r#"<configuration><configSections><section name="xunit" type="{}, xunit.console" /></configSections></configuration>"#,
      SECTION
    )
  }

  #[test]
  fn derived_path_inserts_suffix() {
    assert_eq!(
      derived_path(Path::new("src/xunit.console/xunit.console.csproj"), "x86"),
      PathBuf::from("src/xunit.console/xunit.console.x86.csproj")
    );
  }

  #[test]
  fn prepare_creates_patched_copy() {
    let temp = TempDir::new().unwrap();
    let source = write_file(
      temp.path(),
      "src/xunit.console/xunit.console.csproj",
      &descriptor_xml("xunit.console", &[]),
    );

    let derived = DerivedDescriptor::prepare(&source, "x86").unwrap();
    let text = fs::read_to_string(derived.path()).unwrap();

    assert_eq!(derived.path(), temp.path().join("src/xunit.console/xunit.console.x86.csproj"));
    assert!(text.contains("<AssemblyName>xunit.console.x86</AssemblyName>"));
    assert!(text.contains(r"<OutputPath>bin\Release.x86\</OutputPath>"));
    assert!(!text.contains(r"<OutputPath>bin\Release</OutputPath>"));

    // The source is untouched.
    assert_eq!(fs::read_to_string(&source).unwrap(), descriptor_xml("xunit.console", &[]));
  }

  #[test]
  fn dropping_guard_removes_file() {
    let temp = TempDir::new().unwrap();
    let source = write_file(temp.path(), "app/app.csproj", &descriptor_xml("app", &[]));

    let path = {
      let derived = DerivedDescriptor::prepare(&source, "x86").unwrap();
      let path = derived.path().to_path_buf();
      assert!(path.exists());
      path
    };

    assert!(!path.exists());
    assert!(source.exists());
  }

  #[test]
  fn keep_leaves_file_on_disk() {
    let temp = TempDir::new().unwrap();
    let source = write_file(temp.path(), "app/app.csproj", &descriptor_xml("app", &[]));

    let path = DerivedDescriptor::prepare(&source, "x86").unwrap().keep();
    assert!(path.exists());
  }

  #[test]
  fn prepare_missing_source_creates_nothing() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("app/app.csproj");

    let result = DerivedDescriptor::prepare(&source, "x86");
    assert!(matches!(result, Err(DescriptorError::NotFound { .. })));
    assert!(!derived_path(&source, "x86").exists());
  }

  #[test]
  fn prepare_malformed_source_removes_copy() {
    let temp = TempDir::new().unwrap();
    let source = write_file(temp.path(), "app/app.csproj", "<Project><PropertyGroup>");

    let result = DerivedDescriptor::prepare(&source, "x86");
    assert!(matches!(result, Err(DescriptorError::Parse { .. })));
    assert!(!derived_path(&source, "x86").exists());
  }

  #[test]
  fn cleanup_rewrites_config_and_deletes_descriptor() {
    let temp = TempDir::new().unwrap();
    let source = write_file(
      temp.path(),
      "src/xunit.console/xunit.console.csproj",
      &descriptor_xml("xunit.console", &[]),
    );
    let config = write_file(
      temp.path(),
      "src/xunit.console/bin/Release.x86/xunit.console.x86.exe.config",
      &config_xml(),
    );

    let derived = DerivedDescriptor::prepare(&source, "x86").unwrap();
    let derived_file = derived.path().to_path_buf();
    derived.cleanup(&config, &rewrite()).unwrap();

    assert!(!derived_file.exists());
    let content = fs::read_to_string(&config).unwrap();
    assert!(content.contains(&format!("type=\"{}, xunit.console.x86\"", SECTION)));
  }

  #[test]
  fn failed_cleanup_still_removes_guarded_file() {
    let temp = TempDir::new().unwrap();
    let source = write_file(temp.path(), "app/app.csproj", &descriptor_xml("app", &[]));

    let derived = DerivedDescriptor::prepare(&source, "x86").unwrap();
    let derived_file = derived.path().to_path_buf();
    let result = derived.cleanup(&temp.path().join("missing.config"), &rewrite());

    assert!(matches!(result, Err(DescriptorError::NotFound { .. })));
    assert!(!derived_file.exists());
  }

  #[test]
  fn cleanup_fails_when_config_missing() {
    let temp = TempDir::new().unwrap();
    let derived = write_file(temp.path(), "app/app.x86.csproj", "<Project />");

    let result = cleanup_derived_descriptor(&derived, &temp.path().join("missing.config"), &rewrite());
    assert!(matches!(result, Err(DescriptorError::NotFound { .. })));
    // Nothing deleted when the config is absent.
    assert!(derived.exists());
  }

  #[test]
  fn cleanup_fails_when_descriptor_missing() {
    let temp = TempDir::new().unwrap();
    let config = write_file(temp.path(), "app.exe.config", &config_xml());

    let result = cleanup_derived_descriptor(&temp.path().join("app.x86.csproj"), &config, &rewrite());
    assert!(matches!(result, Err(DescriptorError::NotFound { .. })));
    assert_eq!(fs::read_to_string(&config).unwrap(), config_xml());
  }

  #[test]
  fn rewrite_reports_missing_name() {
    let temp = TempDir::new().unwrap();
    let config = write_file(temp.path(), "app.exe.config", "<configuration />");
    assert!(!rewrite_qualified_name(&config, &rewrite()).unwrap());
  }
}
