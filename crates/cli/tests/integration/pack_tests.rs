//! `version` / `pack` integration tests.

use serial_test::serial;

use super::common::TestEnv;

#[test]
#[serial]
fn version_increments_build_number() {
  let env = TestEnv::project(&[]);

  env.nbake_cmd().arg("version").assert().success();
  assert_eq!(env.read_file("VERSION").trim(), "0.1.0.1");

  env.nbake_cmd().arg("version").assert().success();
  assert_eq!(env.read_file("VERSION").trim(), "0.1.0.2");

  let info = env.read_file("src/CommonAssemblyInfo.cs");
  assert!(info.contains("AssemblyFileVersion(\"0.1.0.2\")"));
}

#[test]
#[serial]
fn version_then_pack_writes_archive() {
  let env = TestEnv::project(&[]);
  env.write_file("src/xunit.console/bin/Release/xunit.console.exe", "exe");
  env.write_file("src/xunit.console/bin/Release/xunit.console.xml", "docs");

  let assert = env
    .nbake_cmd()
    .args(["-o", "json", "version", "pack"])
    .assert()
    .success();
  let json: serde_json::Value = serde_json::from_slice(&assert.get_output().stdout).unwrap();

  let artifacts = json["artifacts"].as_array().unwrap();
  let archive = artifacts.last().unwrap().as_str().unwrap();
  assert!(archive.ends_with("xunit-NoWpa-0.1.0.1-0000000.zip"), "{}", archive);
  assert!(env.path("artifacts/xunit-NoWpa-0.1.0.1-0000000.zip").exists());
}

#[test]
#[serial]
fn pack_without_build_output_fails() {
  let env = TestEnv::project(&[]);

  env.nbake_cmd().arg("pack").assert().failure();
}
