//! Specifications of `demo.ClassWithConditions.category(int)` applied to
//! single calls and to executed sequences.

use seqgen_check::condition::{parse_specifications, write_specifications, NameReplacementMap};
use seqgen_check::{
    CheckKind, ConditionOptions, DummyVisitor, ExecutableSequence, ExecutionContext, Executor,
    SpecificationCollection,
};
use seqgen_core::{OperationRegistry, Sequence, TypeRegistry, Value};

const CATEGORY: &str = "demo.ClassWithConditions.category(int)";

fn registries() -> (TypeRegistry, OperationRegistry) {
    seqgen_demo::build_conditions_only().unwrap()
}

fn collection<'a>(types: &'a TypeRegistry, ops: &'a OperationRegistry) -> SpecificationCollection<'a> {
    let specs = parse_specifications(seqgen_demo::SPECS_JSON).unwrap();
    SpecificationCollection::new(types, ops, specs, ConditionOptions::default()).unwrap()
}

fn receiver(value: i32) -> Value {
    Value::object(seqgen_demo::conditions::ClassWithConditions::new(value))
}

/// `new ClassWithConditions(5).category(value)`.
fn category_sequence(types: &TypeRegistry, ops: &OperationRegistry, value: i32) -> Sequence {
    let text = format!(
        "var0 = literal int 5\n\
         var1 = call demo.ClassWithConditions.<init>(int) : var0\n\
         var2 = literal int {value}\n\
         var3 = call {CATEGORY} : var1 var2\n"
    );
    Sequence::parse(&text, types, ops).unwrap()
}

fn run(types: &TypeRegistry, ops: &OperationRegistry, value: i32) -> ExecutableSequence {
    let specs = collection(types, ops);
    let ctx = ExecutionContext::new(types, Executor::inline()).with_specifications(&specs);
    let mut eseq = ExecutableSequence::new(category_sequence(types, ops, value));
    eseq.execute(&ctx, &mut DummyVisitor).unwrap();
    eseq
}

fn post_condition_code(eseq: &ExecutableSequence) -> Vec<String> {
    eseq.checks()
        .iter()
        .flat_map(|c| match &c.kind {
            CheckKind::PostCondition { conditions, .. } => conditions.iter().map(|p| p.code.clone()).collect(),
            _ => Vec::new(),
        })
        .collect()
}

#[test]
fn failed_precondition_marks_call_invalid() {
    let (types, ops) = registries();
    let specs = collection(&types, &ops);
    let op = ops.by_descriptor(CATEGORY).unwrap();
    let spec = specs.executable_specification(op).unwrap().unwrap();

    let table = spec.check_prestate(&[receiver(5), Value::Int(-1)]).unwrap();
    assert!(table.is_invalid_call());
    assert!(!table.has_post_conditions());
    assert!(!table.has_expected_exception());

    let eseq = run(&types, &ops, -1);
    assert!(eseq.has_invalid_behavior());
    assert!(!eseq.has_failure());
    assert!(eseq.checks().iter().all(|c| matches!(c.kind, CheckKind::InvalidValue { .. })));
    assert!(eseq.outcome(3).is_some_and(|o| !o.is_normal()));
}

#[test]
fn throws_condition_expects_illegal_argument() {
    let (types, ops) = registries();
    let specs = collection(&types, &ops);
    let op = ops.by_descriptor(CATEGORY).unwrap();
    let spec = specs.executable_specification(op).unwrap().unwrap();

    let table = spec.check_prestate(&[receiver(5), Value::Int(21)]).unwrap();
    assert!(!table.is_invalid_call());
    assert_eq!(table.throws_candidates(), vec!["java.lang.IllegalArgumentException"]);

    let eseq = run(&types, &ops, 21);
    assert!(!eseq.has_invalid_behavior());
    assert!(!eseq.has_failure());
    let expected = eseq.checks().iter().find_map(|c| match &c.kind {
        CheckKind::ExpectedException { thrown, candidates, .. } => Some((thrown.clone(), candidates.clone(), c.passed)),
        _ => None,
    });
    let (thrown, candidates, passed) = expected.unwrap();
    assert_eq!(thrown.as_deref(), Some("java.lang.IllegalArgumentException"));
    assert_eq!(candidates, vec!["java.lang.IllegalArgumentException".to_string()]);
    assert!(passed);
}

#[test]
fn exclusive_post_conditions_select_one_range() {
    let (types, ops) = registries();
    for (value, expected, fails) in [(1, "ONE", false), (6, "TWO", false), (11, "THREE", true), (16, "FOUR", false)] {
        let eseq = run(&types, &ops, value);
        assert!(!eseq.has_invalid_behavior(), "value {value}");
        assert_eq!(eseq.has_failure(), fails, "value {value}");
        assert_eq!(
            post_condition_code(&eseq),
            vec![format!("x2.equals(demo.ClassWithConditions.Range.{expected})")],
            "value {value}"
        );
    }
}

#[test]
fn post_condition_binds_inputs_then_result() {
    let (types, ops) = registries();
    let eseq = run(&types, &ops, 6);
    let vars = eseq.checks().iter().find_map(|c| match &c.kind {
        CheckKind::PostCondition { vars, .. } => Some(vars.clone()),
        _ => None,
    });
    assert_eq!(vars, Some(vec![1, 2, 3]));
}

#[test]
fn replacement_respects_word_boundaries() {
    let mut map = NameReplacementMap::new();
    map.add("e", "x1");
    map.add("result", "x2");
    assert_eq!(map.replace_names("result.equals(e)"), "x2.equals(x1)");
}

#[test]
fn specification_json_round_trips() {
    let specs = parse_specifications(seqgen_demo::SPECS_JSON).unwrap();
    let text = write_specifications(&specs).unwrap();
    let back = parse_specifications(&text).unwrap();
    assert_eq!(specs, back);
    assert_eq!(back[0].identifiers.parameters, vec!["value".to_string()]);
    assert_eq!(back[0].post.len(), 4);
}

#[test]
fn specifications_compile_once_and_are_cached() {
    let (types, ops) = registries();
    let specs = collection(&types, &ops);
    assert_eq!(specs.compile_all().unwrap(), 1);
    let op = ops.by_descriptor(CATEGORY).unwrap();
    let a = specs.executable_specification(op).unwrap().unwrap();
    let b = specs.executable_specification(op).unwrap().unwrap();
    assert!(std::rc::Rc::ptr_eq(&a, &b));
    let getter = ops.by_descriptor("demo.ClassWithConditions.getValue()").unwrap();
    assert!(specs.executable_specification(getter).unwrap().is_none());
}
