//! `build:prepare` / `build:cleanup` integration tests.

use predicates::prelude::*;
use serial_test::serial;

use super::common::TestEnv;

const DERIVED: &str = "src/xunit.console/xunit.console.x86.csproj";

#[test]
#[serial]
fn prepare_writes_the_x86_descriptor() {
  let env = TestEnv::project(&[]);

  env
    .nbake_cmd()
    .arg("build:prepare")
    .assert()
    .success()
    .stderr(predicate::str::contains("Derived descriptor left in place"));

  let derived = env.read_file(DERIVED);
  assert!(derived.contains("<AssemblyName>xunit.console.x86</AssemblyName>"));
  assert!(derived.contains(r"<OutputPath>bin\Release.x86\</OutputPath>"));

  let source = env.read_file("src/xunit.console/xunit.console.csproj");
  assert!(source.contains("<AssemblyName>xunit.console</AssemblyName>"));
}

#[test]
#[serial]
fn cleanup_rewrites_config_and_removes_descriptor() {
  let env = TestEnv::project(&[]);
  env.nbake_cmd().arg("build:prepare").assert().success();
  env.write_file(
    "src/xunit.console/bin/Release.x86/xunit.console.x86.exe.config",
    r#"<section name="xunit" type="Xunit.ConsoleClient.XunitConsoleConfigurationSection, xunit.console" />"#,
  );

  env.nbake_cmd().arg("build:cleanup").assert().success();

  assert!(!env.path(DERIVED).exists());
  let config = env.read_file("src/xunit.console/bin/Release.x86/xunit.console.x86.exe.config");
  assert!(config.contains("Xunit.ConsoleClient.XunitConsoleConfigurationSection, xunit.console.x86"));
}

#[test]
#[serial]
fn failed_build_leaves_no_derived_descriptor() {
  let env = TestEnv::project(&[]);

  env
    .nbake_cmd()
    .arg("build:mono")
    .assert()
    .failure()
    .stderr(predicate::str::contains("build:mono failed"));

  assert!(!env.path(DERIVED).exists());
}
