use std::path::PathBuf;

use culebra::interpreter::Interpreter;
use culebra::{Error, run_file};
use rstest::rstest;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("fixtures")
        .join(name)
}

fn run_fixture(name: &str) -> Result<String, (Error, String)> {
    let mut interp = Interpreter::with_writer(Box::new(std::io::sink()));
    match run_file(fixture(name), "main", &mut interp) {
        Ok(_) => Ok(interp.output()),
        Err(e) => Err((e, interp.output())),
    }
}

#[rstest]
#[case("hello.clb", include_str!("../fixtures/hello.expected"))]
#[case("arithmetic.clb", include_str!("../fixtures/arithmetic.expected"))]
#[case("scoping.clb", include_str!("../fixtures/scoping.expected"))]
#[case("loops.clb", include_str!("../fixtures/loops.expected"))]
#[case("fib.clb", include_str!("../fixtures/fib.expected"))]
#[case("includes/main.clb", include_str!("../fixtures/includes/main.expected"))]
fn fixture_output(#[case] name: &str, #[case] expected: &str) {
    let output = run_fixture(name).unwrap_or_else(|(e, _)| panic!("{name} failed: {e}"));
    assert_eq!(output, expected);
}

#[test]
fn main_return_value_is_reported() {
    let mut interp = Interpreter::with_writer(Box::new(std::io::sink()));
    let value = run_file(fixture("hello.clb"), "main", &mut interp).expect("run");
    assert_eq!(value, Some(culebra::interpreter::value::Value::Int(0)));
}

#[test]
fn wrong_arity_stops_execution() {
    let (err, output) = run_fixture("error_arity.clb").expect_err("arity error");
    assert_eq!(output, "before\n");
    match err {
        Error::Runtime(e) => {
            assert!(e.message.contains("expects 2 arguments but got 1"), "{e}");
            assert_eq!(e.line, Some(7));
        }
        other => panic!("expected runtime error, got {other}"),
    }
}

#[test]
fn top_level_statement_is_load_error() {
    let (err, output) = run_fixture("error_top_level.clb").expect_err("load error");
    assert!(output.is_empty());
    assert!(
        matches!(err, Error::Compile(culebra::CompileError::Load { line: 1, .. })),
        "{err}"
    );
}

#[test]
fn custom_entry_point() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("entry.clb");
    std::fs::write(
        &path,
        "func main(): void { print(\"main\"); }\nfunc setup(): void { print(\"setup\"); }",
    )
    .expect("write");

    let mut interp = Interpreter::with_writer(Box::new(std::io::sink()));
    run_file(&path, "setup", &mut interp).expect("run");
    assert_eq!(interp.output(), "setup");
}
