//! Assemble, link and run generated programs against `fixtures/runtime.s`.
//!
//! Needs GNU `as` and `ld` on x86-64 Linux; the tests print a note and
//! return early when the tools are not installed.

#![cfg(all(target_os = "linux", target_arch = "x86_64"))]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use ec1::{AsmOptions, evaluate_source, generate_assembly};

fn tool_available(name: &str) -> bool {
  Command::new(name)
    .arg("--version")
    .output()
    .is_ok_and(|out| out.status.success())
}

/// Build and run `src`, returning trimmed stdout, or `None` when the
/// toolchain is missing.
fn execute(name: &str, src: &str) -> Option<String> {
  if !tool_available("as") || !tool_available("ld") {
    eprintln!("as/ld not found - skipping execution test");
    return None;
  }

  let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures");
  let scratch: PathBuf = Path::new(env!("CARGO_TARGET_TMPDIR")).join("ec1_exec");
  fs::create_dir_all(&scratch).expect("create scratch dir");

  let asm_path = scratch.join(format!("{name}.s"));
  let obj_path = scratch.join(format!("{name}.o"));
  let exe_path = scratch.join(name);

  let asm = generate_assembly(src, &AsmOptions::default()).expect("compile");
  fs::write(&asm_path, asm).expect("write assembly");

  let ok = Command::new("as")
    .arg("-I")
    .arg(&fixtures)
    .arg("-o")
    .arg(&obj_path)
    .arg(&asm_path)
    .status()
    .expect("run as")
    .success();
  assert!(ok, "as failed for {name}");

  let ok = Command::new("ld")
    .arg("-o")
    .arg(&exe_path)
    .arg(&obj_path)
    .status()
    .expect("run ld")
    .success();
  assert!(ok, "ld failed for {name}");

  let out = Command::new(&exe_path).output().expect("run program");
  assert!(out.status.success(), "{name} exited with {}", out.status);
  Some(String::from_utf8_lossy(&out.stdout).trim_end().to_string())
}

fn check(name: &str, src: &str) {
  let expected = evaluate_source(src).expect("interpret");
  if let Some(stdout) = execute(name, src) {
    assert_eq!(stdout, expected.to_string(), "source: {src}");
  }
}

#[test]
fn literal_program() {
  check("literal", "42");
}

#[test]
fn nested_program() {
  check("nested", "(3 + (4 * 5))");
}

#[test]
fn subtraction_program() {
  check("subtraction", "(10 - 3)");
  check("negative", "(3 - 10)");
}

#[test]
fn division_program() {
  check("division", "((10 - 3) / 2)");
  check("negative_division", "((0 - 7) / 2)");
}

#[test]
fn deep_program() {
  check(
    "deep",
    "((((1 + 2) * (3 + 4)) - ((5 * 6) / (7 - 5))) * (((8 / 2) + 9) - (10 * 1)))",
  );
}
