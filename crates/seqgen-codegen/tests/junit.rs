//! Rendering demo sequences as JUnit sources.

use seqgen_check::condition::parse_specifications;
use seqgen_check::{
    ConditionOptions, ContractCheckingVisitor, DummyVisitor, ExecutableSequence, ExecutionContext, Executor,
    ForwardGenerator, GenConfig, MultiVisitor, SpecificationCollection,
};
use seqgen_codegen::{write_tests, JUnitOptions, SequencePrinter};
use seqgen_core::{OperationRegistry, Sequence, TypeRegistry};

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

fn run_with_contracts(types: &TypeRegistry, ops: &OperationRegistry, text: &str) -> ExecutableSequence {
    let ctx = ExecutionContext::new(types, Executor::inline());
    let mut eseq = ExecutableSequence::new(Sequence::parse(text, types, ops).unwrap());
    eseq.execute(&ctx, &mut MultiVisitor::new().with(ContractCheckingVisitor::new(types))).unwrap();
    eseq
}

/// `new ClassWithConditions(5).category(value)` checked against the demo
/// specifications.
fn run_category(value: i32) -> Vec<String> {
    let (types, ops) = seqgen_demo::build_conditions_only().unwrap();
    let specs = SpecificationCollection::new(
        &types,
        &ops,
        parse_specifications(seqgen_demo::SPECS_JSON).unwrap(),
        ConditionOptions::default(),
    )
    .unwrap();
    let ctx = ExecutionContext::new(&types, Executor::inline()).with_specifications(&specs);
    let text = format!(
        "var0 = literal int 5\n\
         var1 = call demo.ClassWithConditions.<init>(int) : var0\n\
         var2 = literal int {value}\n\
         var3 = call demo.ClassWithConditions.category(int) : var1 var2\n"
    );
    let mut eseq = ExecutableSequence::new(Sequence::parse(&text, &types, &ops).unwrap());
    eseq.execute(&ctx, &mut DummyVisitor).unwrap();
    SequencePrinter::new(&types).print(&eseq).unwrap()
}

// ---------------------------------------------------------------------------
// Printer
// ---------------------------------------------------------------------------

#[test]
fn statements_use_type_derived_names() {
    let (types, ops) = seqgen_demo::build().unwrap();
    let text = "\
var0 = call demo.Counter.<init>()
var1 = literal int 5
var2 = call demo.MathUtil.negate(int) : var1
var3 = call demo.Counter.add(int) : var0 var2
";
    let eseq = run_with_contracts(&types, &ops, text);
    let lines = SequencePrinter::new(&types).print(&eseq).unwrap();
    assert_eq!(
        lines,
        vec![
            "demo.Counter counter0 = new demo.Counter();".to_string(),
            "int i0 = 5;".to_string(),
            "int i1 = demo.MathUtil.negate(i0);".to_string(),
            "counter0.add(i1);".to_string(),
            "// During test generation this statement threw an exception of type java.lang.AssertionError in error"
                .to_string(),
        ]
    );
}

#[test]
fn primitive_passed_as_object_is_cast() {
    let (types, ops) = seqgen_demo::build().unwrap();
    let text = "\
var0 = call demo.Bag.<init>()
var1 = literal int 3
var2 = call demo.Bag.add(java.lang.Object) : var0 var1
";
    let eseq = run_with_contracts(&types, &ops, text);
    let lines = SequencePrinter::new(&types).print(&eseq).unwrap();
    assert_eq!(lines[2], "boolean b0 = bag0.add((java.lang.Object)i0);");
}

#[test]
fn expected_exception_wraps_the_call() {
    let lines = run_category(21);
    let start = lines.iter().position(|l| l == "try {").unwrap();
    assert_eq!(lines[start + 1], "    demo.ClassWithConditions.Range range0 = classWithConditions0.category(i1);");
    assert!(lines[start + 2]
        .starts_with("    org.junit.Assert.fail(\"Expected exception of type java.lang.IllegalArgumentException"));
    assert_eq!(lines[start + 3], "} catch (java.lang.IllegalArgumentException e) {");
    assert_eq!(lines[start + 4], "    // Expected exception.");
    assert_eq!(lines[start + 5], "}");
}

#[test]
fn post_condition_follows_the_call() {
    let lines = run_category(6);
    let call = lines
        .iter()
        .position(|l| l == "demo.ClassWithConditions.Range range0 = classWithConditions0.category(i1);")
        .unwrap();
    assert!(lines[call + 1].starts_with("// Checks the post-condition: "));
    assert!(lines[call + 2].starts_with("org.junit.Assert.assertTrue( \"Post-condition: "));
    assert!(lines[call + 2].ends_with(",range0.equals(demo.ClassWithConditions.Range.TWO));"));
}

// ---------------------------------------------------------------------------
// Writer
// ---------------------------------------------------------------------------

#[test]
fn generated_suite_is_written_and_rewritten_only_on_change() {
    let (types, ops) = seqgen_demo::build().unwrap();
    let config = GenConfig { seed: 5, input_limit: 200, timeout_ms: 0, ..GenConfig::default() };
    let ctx = ExecutionContext::new(&types, config.executor());
    let result = ForwardGenerator::new(ctx, &ops, config).unwrap().generate().unwrap();
    assert!(!result.regression.is_empty());
    let tests: Vec<&ExecutableSequence> = result.regression.iter().collect();

    let dir = tempfile::tempdir().unwrap();
    let options = JUnitOptions {
        output_dir: dir.path().to_path_buf(),
        package: Some("demo.tests".to_string()),
        tests_per_file: 10,
        ..JUnitOptions::default()
    };
    let first = write_tests(&types, &tests, &options).unwrap();
    let classes = tests.len().div_ceil(10);
    assert_eq!(first.files.len(), classes + 1);
    assert_eq!(first.written, classes + 1);
    assert_eq!(first.tests, tests.len());

    let package_dir = dir.path().join("demo").join("tests");
    let suite = std::fs::read_to_string(package_dir.join("RegressionTest.java")).unwrap();
    assert!(suite.starts_with("package demo.tests;"));
    assert!(suite.contains("RegressionTest0.class"));
    let first_class = std::fs::read_to_string(package_dir.join("RegressionTest0.java")).unwrap();
    assert!(first_class.contains("public class RegressionTest0 {"));
    assert!(first_class.contains("@Test"));

    let second = write_tests(&types, &tests, &options).unwrap();
    assert_eq!(second.written, 0);
    assert_eq!(second.unchanged, classes + 1);
}

#[test]
fn empty_list_writes_nothing() {
    let (types, _ops) = seqgen_demo::build().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let options = JUnitOptions { output_dir: dir.path().join("out"), ..JUnitOptions::default() };
    let result = write_tests(&types, &[], &options).unwrap();
    assert!(result.files.is_empty());
    assert!(!dir.path().join("out").exists());
}
