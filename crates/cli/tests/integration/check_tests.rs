//! `nuget:check` integration tests.

use predicates::prelude::*;
use serial_test::serial;

use super::common::TestEnv;

#[test]
#[serial]
fn check_passes_when_every_binary_is_present() {
  let env = TestEnv::project(&[r"..\..\packages\a\lib\a.dll"]);
  env.write_file("packages/a/lib/a.dll", "");

  env
    .nbake_cmd()
    .arg("nuget:check")
    .assert()
    .success()
    .stdout(predicate::str::contains("is missing").not())
    .stderr(predicate::str::contains("restore command(s) did not succeed"))
    .stderr(predicate::str::contains("Restore command failed: nbake-missing-launcher"))
    .stderr(predicate::str::contains("failed to start 'nbake-missing-launcher'"));
}

#[test]
#[serial]
fn check_reports_each_missing_binary_once() {
  let env = TestEnv::project(&[r"..\..\packages\a\lib\a.dll", r"..\..\packages\b\lib\b.dll"]);
  env.write_file("packages/a/lib/a.dll", "");

  let assert = env
    .nbake_cmd()
    .arg("nuget:check")
    .assert()
    .failure()
    .stderr(predicate::str::contains("Not every NuGet package is present, 1 files missing"));

  let stdout = String::from_utf8_lossy(&assert.get_output().stdout).to_string();
  let missing: Vec<&str> = stdout.lines().filter(|l| l.contains("missing")).collect();
  assert_eq!(missing.len(), 1, "stdout:\n{}", stdout);
  assert!(missing[0].starts_with("Binary file "));
  assert!(missing[0].ends_with("b.dll is missing"));
}

#[test]
#[serial]
fn check_ignores_descriptors_under_build_output() {
  let env = TestEnv::project(&[]);
  env.write_file(
    "src/xunit.console/obj/stale.csproj",
    &super::common::descriptor_xml("stale", &[r"..\nothing.dll"]),
  );

  env.nbake_cmd().arg("nuget:check").assert().success();
}
