use anyhow::{anyhow, Result};
use funcflow::core::{ElementType, FunctionSignature};
use funcflow::{
    format_function, verify_function, FuncCursor, Function, FunctionalControlFlowToCfg, Module,
    PassManager, Type,
};

fn main() -> Result<()> {
    println!("Building a counting loop...\n");

    let mut module = Module::new("counter");
    module.add_function(opaque("lessThanTen", vec![Type::scalar_tensor(ElementType::Bool)])?);
    module.add_function(opaque("increment", vec![Type::int(32)])?);

    let mut main = Function::new(FunctionSignature::new(
        "main",
        vec![Type::int(32)],
        vec![Type::int(32)],
    ));
    let entry = main.entry_block();
    let start = main.params()[0];
    let mut cursor = FuncCursor::new(&mut main.body).at_bottom(entry);
    let result = cursor
        .ins()
        .while_op("lessThanTen", "increment", vec![start], vec![Type::int(32)])?;
    cursor.ins().return_values(result)?;

    println!("=== Before ===");
    print!("{}", format_function(&main));
    module.add_function(main);

    let mut manager = PassManager::new();
    manager.enable_statistics();
    manager.register_pass(FunctionalControlFlowToCfg::new());
    manager.run_all(&mut module)?;

    let main = module
        .get_function("main")
        .ok_or_else(|| anyhow!("main disappeared"))?;
    verify_function(main)?;

    println!("\n=== After ===");
    print!("{}", format_function(main));

    for stat in manager.statistics() {
        println!("\n{} took {:?}", stat.name, stat.duration);
    }
    Ok(())
}

/// A one-parameter function whose body is an opaque op.
fn opaque(name: &str, returns: Vec<Type>) -> Result<Function> {
    let mut func = Function::new(FunctionSignature::new(
        name,
        vec![Type::int(32)],
        returns.clone(),
    ));
    let entry = func.entry_block();
    let args = func.params();
    let mut cursor = FuncCursor::new(&mut func.body).at_bottom(entry);
    let results = cursor.ins().generic(name, args, returns)?;
    cursor.ins().return_values(results)?;
    Ok(func)
}
