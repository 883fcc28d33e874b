use std::fs;
use std::process::{Command, Output};

fn hostgen(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_hostgen"))
        .args(args)
        .output()
        .unwrap()
}

fn assert_usage_error(out: &Output) {
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("Usage:"), "stderr: {}", stderr);
}

#[test]
fn test_too_few_arguments() {
    assert_usage_error(&hostgen(&["only_one.xml"]));
    assert_usage_error(&hostgen(&[]));
}

#[test]
fn test_too_many_arguments() {
    assert_usage_error(&hostgen(&["a.xml", "b.c", "c.c"]));
}

#[test]
fn test_manifest_error_exits_with_one() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = dir.path().join("bad.xml");
    fs::write(&manifest, "<kernels>").unwrap();
    let out = hostgen(&[
        manifest.to_str().unwrap(),
        dir.path().join("host.c").to_str().unwrap(),
    ]);
    assert_eq!(out.status.code(), Some(1));
}

#[test]
fn test_writes_program() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = dir.path().join("k.xml");
    let output = dir.path().join("host.c");
    fs::write(
        &manifest,
        r#"<kernels program="k.aocx"><kernel name="k"><ndrange><global>1</global></ndrange></kernel></kernels>"#,
    )
    .unwrap();
    let out = hostgen(&[manifest.to_str().unwrap(), output.to_str().unwrap()]);
    assert!(out.status.success());
    assert!(fs::read_to_string(&output).unwrap().contains("int main("));
}
