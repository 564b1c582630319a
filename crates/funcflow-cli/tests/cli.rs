use assert_cmd::Command;
use funcflow_core::{Constant, ElementType, FuncCursor, Function, FunctionSignature, Module, Type};
use predicates::prelude::*;
use std::path::PathBuf;
use tempfile::TempDir;

fn callee(name: &str) -> Function {
    let mut func = Function::new(FunctionSignature::new(
        name,
        vec![Type::int(32)],
        vec![Type::int(32)],
    ));
    let entry = func.entry_block();
    let args = func.params();
    let mut cursor = FuncCursor::new(&mut func.body).at_bottom(entry);
    let results = cursor.ins().generic(name, args, vec![Type::int(32)]).unwrap();
    cursor.ins().return_values(results).unwrap();
    func
}

fn if_module(else_branch: &str) -> Module {
    let mut module = Module::new("cli");
    module.add_function(callee("addOne"));
    module.add_function(callee("subOne"));

    let mut main = Function::new(FunctionSignature::new(
        "main",
        vec![Type::int(32)],
        vec![Type::int(32)],
    ));
    let entry = main.entry_block();
    let x = main.params()[0];
    let mut cursor = FuncCursor::new(&mut main.body).at_bottom(entry);
    let c = cursor
        .ins()
        .constant(Constant::bool_tensor(true), Type::scalar_tensor(ElementType::Bool))
        .unwrap();
    let r = cursor
        .ins()
        .if_op(c, "addOne", else_branch, vec![x], vec![Type::int(32)])
        .unwrap();
    cursor.ins().return_values(r).unwrap();
    module.add_function(main);
    module
}

fn write_module(dir: &TempDir, module: &Module) -> PathBuf {
    let path = dir.path().join("module.json");
    std::fs::write(&path, serde_json::to_string(module).unwrap()).unwrap();
    path
}

fn funcflow() -> Command {
    Command::cargo_bin("funcflow").unwrap()
}

#[test]
fn test_lower_prints_cfg() {
    let dir = TempDir::new().unwrap();
    let input = write_module(&dir, &if_module("subOne"));

    funcflow()
        .arg("lower")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("call @addOne(%0)"))
        .stdout(predicate::str::contains("extract_element"))
        .stdout(predicate::str::contains(" = if ").not());
}

#[test]
fn test_lower_writes_json() {
    let dir = TempDir::new().unwrap();
    let input = write_module(&dir, &if_module("subOne"));
    let output = dir.path().join("lowered.json");

    funcflow()
        .arg("lower")
        .arg(&input)
        .arg("--format")
        .arg("json")
        .arg("-o")
        .arg(&output)
        .assert()
        .success();

    let lowered: Module =
        serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    let main = lowered.get_function("main").unwrap();
    assert!(!main.has_structured_ops());
    assert_eq!(main.body.blocks.len(), 4);
}

#[test]
fn test_lower_reports_missing_callee() {
    let dir = TempDir::new().unwrap();
    let input = write_module(&dir, &if_module("negate"));

    funcflow()
        .arg("lower")
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("@negate is not defined"))
        .stderr(predicate::str::contains("LOWERING FAILED"));
}

#[test]
fn test_lower_rejects_bad_config() {
    let dir = TempDir::new().unwrap();
    let input = write_module(&dir, &if_module("subOne"));
    let config = dir.path().join("config.json");
    std::fs::write(&config, "{\"verify_after\": \"sometimes\"}").unwrap();

    funcflow()
        .arg("lower")
        .arg(&input)
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid lowering config"));
}

#[test]
fn test_print_shows_functional_ops() {
    let dir = TempDir::new().unwrap();
    let input = write_module(&dir, &if_module("subOne"));

    funcflow()
        .arg("print")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("; module cli"))
        .stdout(predicate::str::contains("if %1 then @addOne else @subOne(%0)"));
}

#[test]
fn test_verify_notes_unlowered_functions() {
    let dir = TempDir::new().unwrap();
    let input = write_module(&dir, &if_module("subOne"));

    funcflow()
        .arg("verify")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("@main still contains functional control flow"))
        .stdout(predicate::str::contains("VALID"));
}

#[test]
fn test_verify_rejects_unterminated_block() {
    let dir = TempDir::new().unwrap();
    let mut module = Module::new("broken");
    module.add_function(Function::new(FunctionSignature::new("empty", vec![], vec![])));
    let input = write_module(&dir, &module);

    funcflow()
        .arg("verify")
        .arg(&input)
        .assert()
        .failure()
        .stdout(predicate::str::contains("INVALID"))
        .stdout(predicate::str::contains("block0 has no terminator"));
}

#[test]
fn test_verbose_lower_reports_counts() {
    let dir = TempDir::new().unwrap();
    let input = write_module(&dir, &if_module("subOne"));

    funcflow()
        .arg("lower")
        .arg(&input)
        .arg("-v")
        .assert()
        .success()
        .stderr(predicate::str::contains("@main: 1 if(s), 0 loop(s)"));
}

#[test]
fn test_verbose_verify_counts_instructions() {
    let dir = TempDir::new().unwrap();
    let input = write_module(&dir, &if_module("subOne"));

    funcflow()
        .arg("verify")
        .arg(&input)
        .arg("-v")
        .assert()
        .success()
        .stdout(predicate::str::contains("@main: 1 block(s), 2 instruction(s)"));
}
