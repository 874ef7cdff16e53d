use super::*;
use num_bigint::BigInt;
use pretty_assertions::assert_eq;
use som_ir::{BinaryOp, ConstId, ExprRange, Method};
use som_value::{EvalErrorKind, Instance};

fn int(arena: &mut ExprArena, n: i64) -> ExprId {
    arena.alloc_literal(Constant::Integer(n), Span::DUMMY)
}

fn binary(arena: &mut ExprArena, op: BinaryOp, left: ExprId, right: ExprId) -> ExprId {
    arena.alloc(ExprKind::Binary { op, left, right }, Span::DUMMY)
}

fn field_read(arena: &mut ExprArena, field_index: u32, context_level: u32) -> ExprId {
    arena.alloc(
        ExprKind::FieldRead {
            field_index,
            context_level,
        },
        Span::DUMMY,
    )
}

fn field_write(arena: &mut ExprArena, field_index: u32, context_level: u32, value: ExprId) -> ExprId {
    arena.alloc(
        ExprKind::FieldWrite {
            field_index,
            context_level,
            value,
        },
        Span::DUMMY,
    )
}

/// root <- middle <- leaf, slot 0 holding 100, 200 and 300.
fn three_level_chain() -> (Activation, Activation, Activation) {
    let root = Activation::with_slots(None, Value::Nil, vec![], vec![Value::int(100)]);
    let middle = Activation::with_slots(Some(&root), Value::Nil, vec![], vec![Value::int(200)]);
    let leaf = Activation::with_slots(Some(&middle), Value::Nil, vec![], vec![Value::int(300)]);
    (root, middle, leaf)
}

// Field access

#[test]
fn field_write_at_level_two_changes_only_target_slot() {
    let mut arena = ExprArena::new();
    let seven = int(&mut arena, 7);
    let write = field_write(&mut arena, 0, 2, seven);
    let (root, middle, leaf) = three_level_chain();

    let result = Interpreter::new(&arena).evaluate(write, &leaf).unwrap();

    assert_eq!(result, Value::int(7));
    assert_eq!(root.read_slot(0), Ok(Value::int(7)));
    assert_eq!(middle.read_slot(0), Ok(Value::int(200)));
    assert_eq!(leaf.read_slot(0), Ok(Value::int(300)));
}

#[test]
fn field_read_walks_context_levels() {
    let mut arena = ExprArena::new();
    let reads: Vec<_> = (0..3).map(|level| field_read(&mut arena, 0, level)).collect();
    let (_, _, leaf) = three_level_chain();
    let mut interp = Interpreter::new(&arena);

    let values: Vec<_> = reads
        .iter()
        .map(|&id| interp.evaluate(id, &leaf).unwrap())
        .collect();
    assert_eq!(values, vec![Value::int(300), Value::int(200), Value::int(100)]);
}

#[test]
fn field_write_evaluates_value_in_current_activation() {
    let mut arena = ExprArena::new();
    let own = field_read(&mut arena, 0, 0);
    let write = field_write(&mut arena, 0, 2, own);
    let (root, _, leaf) = three_level_chain();

    Interpreter::new(&arena).evaluate(write, &leaf).unwrap();
    assert_eq!(root.read_slot(0), Ok(Value::int(300)));
}

#[test]
fn field_write_is_an_expression() {
    // (slot0 := 4) + 1, with slot0 initially 100
    let mut arena = ExprArena::new();
    let four = int(&mut arena, 4);
    let write = field_write(&mut arena, 0, 0, four);
    let one = int(&mut arena, 1);
    let sum = binary(&mut arena, BinaryOp::Add, write, one);
    let (root, _, _) = three_level_chain();

    let result = Interpreter::new(&arena).evaluate(sum, &root).unwrap();
    assert_eq!(result, Value::int(5));
    assert_eq!(root.read_slot(0), Ok(Value::int(4)));
}

#[test]
fn context_level_past_root_is_internal_fault() {
    let mut arena = ExprArena::new();
    let read = arena.alloc(
        ExprKind::FieldRead {
            field_index: 0,
            context_level: 3,
        },
        Span::new(10, 14),
    );
    let (_, _, leaf) = three_level_chain();

    let err = Interpreter::new(&arena).evaluate(read, &leaf).unwrap_err();
    assert_eq!(
        err.kind,
        EvalErrorKind::InvalidAddress {
            node: "FieldRead",
            context_level: 3,
            index: 0,
            fault: AddressFault::ContextChainExhausted { reached: 2 },
        }
    );
    assert!(err.is_internal_fault());
    assert_eq!(err.span, Some(Span::new(10, 14)));
    assert_eq!(
        err.notes[0].message,
        "executing activation has 2 enclosing level(s), 1 slot(s), 0 argument(s)"
    );
}

#[test]
fn field_index_out_of_bounds_is_internal_fault() {
    let mut arena = ExprArena::new();
    let one = int(&mut arena, 1);
    let write = field_write(&mut arena, 4, 1, one);
    let (_, middle, leaf) = three_level_chain();

    let err = Interpreter::new(&arena).evaluate(write, &leaf).unwrap_err();
    assert!(matches!(
        err.kind,
        EvalErrorKind::InvalidAddress {
            node: "FieldWrite",
            fault: AddressFault::SlotOutOfBounds { len: 1 },
            ..
        }
    ));
    assert_eq!(middle.read_slot(0), Ok(Value::int(200)));
}

#[test]
fn foreign_value_write_is_type_coercion() {
    let mut arena = ExprArena::new();
    let foreign = arena.alloc_literal(Constant::Foreign(42), Span::DUMMY);
    let write = field_write(&mut arena, 0, 1, foreign);
    let (_, middle, leaf) = three_level_chain();

    let err = Interpreter::new(&arena).evaluate(write, &leaf).unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::TypeCoercion { .. }));
    assert!(err.is_recoverable());
    assert_eq!(middle.read_slot(0), Ok(Value::int(200)));
}

#[test]
fn coerce_to_runtime_passes_runtime_values() {
    assert_eq!(coerce_to_runtime(Value::int(1)).ok(), Some(Value::int(1)));
    assert!(coerce_to_runtime(Value::Foreign(ForeignHandle(1))).is_err());
}

// Instance fields

#[test]
fn instance_field_write_then_read() {
    let mut arena = ExprArena::new();
    let five = int(&mut arena, 5);
    let write = arena.alloc(
        ExprKind::InstanceFieldWrite {
            field_index: 1,
            context_level: 1,
            value: five,
        },
        Span::DUMMY,
    );
    let read = arena.alloc(
        ExprKind::InstanceFieldRead {
            field_index: 1,
            context_level: 1,
        },
        Span::DUMMY,
    );
    let class = ClassRef::new("Account", 2, false, None);
    let object = Instance::new(class);
    let method = Activation::root(Value::Instance(object.clone()), vec![], 0);
    let block = Activation::nested(&method, Value::Nil, vec![], 0);
    let mut interp = Interpreter::new(&arena);

    assert_eq!(interp.evaluate(write, &block).unwrap(), Value::int(5));
    assert_eq!(object.field(1), Ok(Value::int(5)));
    assert_eq!(interp.evaluate(read, &block).unwrap(), Value::int(5));
}

#[test]
fn instance_field_on_non_object_receiver_is_internal_fault() {
    let mut arena = ExprArena::new();
    let read = arena.alloc(
        ExprKind::InstanceFieldRead {
            field_index: 0,
            context_level: 0,
        },
        Span::DUMMY,
    );
    let activation = Activation::root(Value::int(3), vec![], 0);

    let err = Interpreter::new(&arena).evaluate(read, &activation).unwrap_err();
    assert!(matches!(
        err.kind,
        EvalErrorKind::InvalidAddress {
            fault: AddressFault::NotAnInstance {
                type_name: "Integer"
            },
            ..
        }
    ));
}

#[test]
fn value_object_fields_are_immutable() {
    let mut arena = ExprArena::new();
    let one = int(&mut arena, 1);
    let write = arena.alloc(
        ExprKind::InstanceFieldWrite {
            field_index: 0,
            context_level: 0,
            value: one,
        },
        Span::DUMMY,
    );
    let point = ClassRef::new("Point", 2, true, None);
    let object = Instance::new(point);
    let activation = Activation::root(Value::Instance(object.clone()), vec![], 0);

    let err = Interpreter::new(&arena).evaluate(write, &activation).unwrap_err();
    assert_eq!(
        err.kind,
        EvalErrorKind::ImmutableValue {
            class_name: "Point".to_string()
        }
    );
    assert_eq!(object.field(0), Ok(Value::Nil));
}

// Closures and invocation

/// `makeCounter`: slot 0 := 0, then answer `[ slot0(level 1) := slot0 + 1 ]`.
fn counter_method(arena: &mut ExprArena) -> Method {
    let zero = int(arena, 0);
    let init = field_write(arena, 0, 0, zero);
    let current = field_read(arena, 0, 1);
    let one = int(arena, 1);
    let next = binary(arena, BinaryOp::Add, current, one);
    let bump = field_write(arena, 0, 1, next);
    let block = arena.alloc(
        ExprKind::Block {
            body: bump,
            num_args: 0,
            num_slots: 0,
        },
        Span::DUMMY,
    );
    let list = arena.alloc_expr_list([init, block]);
    let body = arena.alloc(ExprKind::Sequence(list), Span::DUMMY);
    Method::new("makeCounter", body, 0, 1)
}

#[test]
fn closure_outlives_creating_invocation() {
    let mut arena = ExprArena::new();
    let method = counter_method(&mut arena);
    let mut interp = Interpreter::new(&arena);

    let Value::Block(counter) = interp.invoke(&method, Value::Nil, []).unwrap() else {
        panic!("makeCounter should answer a block");
    };
    assert_eq!(interp.call_depth(), 0);

    let results: Vec<_> = (0..3)
        .map(|_| interp.invoke_block(&counter, [], None).unwrap())
        .collect();
    assert_eq!(results, vec![Value::int(1), Value::int(2), Value::int(3)]);
}

#[test]
fn separate_invocations_get_separate_activations() {
    let mut arena = ExprArena::new();
    let method = counter_method(&mut arena);
    let mut interp = Interpreter::new(&arena);

    let a = interp.invoke(&method, Value::Nil, []).unwrap();
    let b = interp.invoke(&method, Value::Nil, []).unwrap();
    let (Value::Block(a), Value::Block(b)) = (a, b) else {
        panic!("expected blocks");
    };
    interp.invoke_block(&a, [], None).unwrap();
    interp.invoke_block(&a, [], None).unwrap();
    assert_eq!(interp.invoke_block(&b, [], None).unwrap(), Value::int(1));
}

#[test]
fn block_invoke_passes_arguments() {
    let mut arena = ExprArena::new();
    let x = arena.alloc(
        ExprKind::ArgumentRead {
            index: 0,
            context_level: 0,
        },
        Span::DUMMY,
    );
    let y = arena.alloc(
        ExprKind::ArgumentRead {
            index: 1,
            context_level: 0,
        },
        Span::DUMMY,
    );
    let product = binary(&mut arena, BinaryOp::Mul, x, y);
    let block = arena.alloc(
        ExprKind::Block {
            body: product,
            num_args: 2,
            num_slots: 0,
        },
        Span::DUMMY,
    );
    let three = int(&mut arena, 3);
    let four = int(&mut arena, 4);
    let args = arena.alloc_expr_list([three, four]);
    let call = arena.alloc(ExprKind::BlockInvoke { block, args }, Span::DUMMY);
    let activation = Activation::root(Value::Nil, [], 0);

    assert_eq!(
        Interpreter::new(&arena).evaluate(call, &activation).unwrap(),
        Value::int(12)
    );
}

#[test]
fn block_arity_mismatch_is_recoverable() {
    let mut arena = ExprArena::new();
    let body = int(&mut arena, 1);
    let block = arena.alloc(
        ExprKind::Block {
            body,
            num_args: 1,
            num_slots: 0,
        },
        Span::DUMMY,
    );
    let call = arena.alloc(
        ExprKind::BlockInvoke {
            block,
            args: ExprRange::EMPTY,
        },
        Span::new(0, 6),
    );
    let activation = Activation::root(Value::Nil, [], 0);

    let err = Interpreter::new(&arena).evaluate(call, &activation).unwrap_err();
    assert_eq!(err.kind, EvalErrorKind::ArityMismatch { expected: 1, got: 0 });
    assert_eq!(err.span, Some(Span::new(0, 6)));
    assert!(err.is_recoverable());
}

#[test]
fn invoking_a_non_block_is_not_callable() {
    let mut arena = ExprArena::new();
    let block = int(&mut arena, 3);
    let call = arena.alloc(
        ExprKind::BlockInvoke {
            block,
            args: ExprRange::EMPTY,
        },
        Span::DUMMY,
    );
    let activation = Activation::root(Value::Nil, [], 0);

    let err = Interpreter::new(&arena).evaluate(call, &activation).unwrap_err();
    assert_eq!(err.kind, EvalErrorKind::NotCallable { type_name: "Integer" });
}

#[test]
fn self_read_inside_block_reaches_method_receiver() {
    let mut arena = ExprArena::new();
    let outer_self = arena.alloc(ExprKind::SelfRead { context_level: 1 }, Span::DUMMY);
    let block_self = arena.alloc(ExprKind::SelfRead { context_level: 0 }, Span::DUMMY);
    let activation = Activation::root(Value::string("receiver"), [], 0);
    let mut interp = Interpreter::new(&arena);

    let block = BlockValue::new(outer_self, 0, 0, activation.clone());
    assert_eq!(
        interp.invoke_block(&block, [], None).unwrap(),
        Value::string("receiver")
    );

    let block = BlockValue::new(block_self, 0, 0, activation);
    let result = interp.invoke_block(&block, [], None).unwrap();
    assert_eq!(result, Value::Block(block));
}

#[test]
fn each_block_literal_evaluation_is_a_distinct_closure() {
    let mut arena = ExprArena::new();
    let body = int(&mut arena, 1);
    let literal = arena.alloc(
        ExprKind::Block {
            body,
            num_args: 0,
            num_slots: 0,
        },
        Span::DUMMY,
    );
    let activation = Activation::root(Value::Nil, [], 0);
    let mut interp = Interpreter::new(&arena);

    let first = interp.evaluate(literal, &activation).unwrap();
    let second = interp.evaluate(literal, &activation).unwrap();
    assert_ne!(first, second);
    assert_eq!(
        crate::operators::evaluate_binary(&first, &second, BinaryOp::Eq).unwrap(),
        Value::Bool(false)
    );
    assert_eq!(
        crate::operators::evaluate_binary(&first, &first.clone(), BinaryOp::Eq).unwrap(),
        Value::Bool(true)
    );
}

#[test]
fn method_arity_is_checked() {
    let mut arena = ExprArena::new();
    let body = int(&mut arena, 0);
    let method = Method::new("twoArgs", body, 2, 0);

    let err = Interpreter::new(&arena)
        .invoke(&method, Value::Nil, [Value::int(1)])
        .unwrap_err();
    assert_eq!(err.kind, EvalErrorKind::ArityMismatch { expected: 2, got: 1 });
}

// Guard

#[test]
fn guard_intercepts_recoverable_error() {
    let mut arena = ExprArena::new();
    let one = int(&mut arena, 1);
    let zero = int(&mut arena, 0);
    let body = binary(&mut arena, BinaryOp::Div, one, zero);
    let handler = field_read(&mut arena, 0, 0);
    let guard = arena.alloc(
        ExprKind::Guard {
            body,
            handler,
            error_slot: 0,
        },
        Span::DUMMY,
    );
    let activation = Activation::root(Value::Nil, [], 1);
    let mut interp = Interpreter::builder(&arena).profile(true).build();

    assert_eq!(
        interp.evaluate(guard, &activation).unwrap(),
        Value::string("division by zero in division")
    );
    assert_eq!(interp.counters().map(|c| c.errors_intercepted), Some(1));
}

#[test]
fn guard_passes_success_through() {
    let mut arena = ExprArena::new();
    let body = int(&mut arena, 9);
    let handler = int(&mut arena, -1);
    let guard = arena.alloc(
        ExprKind::Guard {
            body,
            handler,
            error_slot: 0,
        },
        Span::DUMMY,
    );
    let activation = Activation::root(Value::Nil, [], 1);

    assert_eq!(
        Interpreter::new(&arena).evaluate(guard, &activation).unwrap(),
        Value::int(9)
    );
    assert_eq!(activation.read_slot(0), Ok(Value::Nil));
}

#[test]
fn guard_does_not_intercept_internal_faults() {
    let mut arena = ExprArena::new();
    let body = field_read(&mut arena, 0, 5);
    let handler = int(&mut arena, -1);
    let guard = arena.alloc(
        ExprKind::Guard {
            body,
            handler,
            error_slot: 0,
        },
        Span::DUMMY,
    );
    let activation = Activation::root(Value::Nil, [], 1);

    let err = Interpreter::new(&arena).evaluate(guard, &activation).unwrap_err();
    assert!(err.is_internal_fault());
    assert_eq!(activation.read_slot(0), Ok(Value::Nil));
}

// Modes and diagnostics

/// Method whose slot 0 holds a block that invokes itself forever.
fn runaway_method(arena: &mut ExprArena) -> Method {
    let again = field_read(arena, 0, 1);
    let recurse = arena.alloc(
        ExprKind::BlockInvoke {
            block: again,
            args: ExprRange::EMPTY,
        },
        Span::new(20, 30),
    );
    let block = arena.alloc(
        ExprKind::Block {
            body: recurse,
            num_args: 0,
            num_slots: 0,
        },
        Span::DUMMY,
    );
    let store = field_write(arena, 0, 0, block);
    let first = field_read(arena, 0, 0);
    let start = arena.alloc(
        ExprKind::BlockInvoke {
            block: first,
            args: ExprRange::EMPTY,
        },
        Span::DUMMY,
    );
    let list = arena.alloc_expr_list([store, start]);
    let body = arena.alloc(ExprKind::Sequence(list), Span::DUMMY);
    Method::new("runaway", body, 0, 1)
}

#[test]
fn bounded_mode_reports_stack_overflow() {
    let mut arena = ExprArena::new();
    let method = runaway_method(&mut arena);
    let mut interp = Interpreter::builder(&arena)
        .mode(EvalMode::Bounded { max_depth: 16 })
        .build();

    let err = interp.invoke(&method, Value::Nil, []).unwrap_err();
    assert_eq!(err.kind, EvalErrorKind::StackOverflow { depth: 16 });
    assert!(err.is_recoverable());
    assert_eq!(err.span, Some(Span::new(20, 30)));
    let backtrace = err.backtrace.unwrap();
    assert_eq!(backtrace.len(), 16);
    assert_eq!(backtrace.frames()[15].name, "runaway");
    assert_eq!(interp.call_depth(), 0);
}

#[test]
fn error_inside_method_carries_backtrace() {
    let mut arena = ExprArena::new();
    let one = int(&mut arena, 1);
    let zero = int(&mut arena, 0);
    let body = binary(&mut arena, BinaryOp::Mod, one, zero);
    let method = Method::new("broken", body, 0, 0);

    let err = Interpreter::new(&arena)
        .invoke(&method, Value::Nil, [])
        .unwrap_err();
    let names: Vec<_> = err
        .backtrace
        .map(|b| b.frames().iter().map(|f| f.name.clone()).collect())
        .unwrap_or_default();
    assert_eq!(names, vec!["broken".to_string()]);
}

#[test]
fn unknown_expression_is_unsupported_state() {
    let arena = ExprArena::new();
    let activation = Activation::root(Value::Nil, [], 0);

    let err = Interpreter::new(&arena)
        .evaluate(ExprId::new(99), &activation)
        .unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::UnsupportedState { .. }));
}

#[test]
fn dangling_constant_is_internal_fault() {
    let mut arena = ExprArena::new();
    let literal = arena.alloc(ExprKind::Literal(ConstId::new(99)), Span::new(4, 9));
    let activation = Activation::root(Value::Nil, [], 0);

    let err = Interpreter::new(&arena)
        .evaluate(literal, &activation)
        .unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::UnsupportedState { .. }));
    assert!(err.is_internal_fault());
    assert_eq!(err.span, Some(Span::new(4, 9)));
}

#[test]
fn dangling_sequence_range_is_internal_fault() {
    let mut arena = ExprArena::new();
    let seq = arena.alloc(ExprKind::Sequence(ExprRange::new(5, 3)), Span::DUMMY);
    let activation = Activation::root(Value::Nil, [], 0);

    let err = Interpreter::new(&arena)
        .evaluate(seq, &activation)
        .unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::UnsupportedState { .. }));
}

#[test]
fn dangling_argument_list_is_internal_fault() {
    let mut arena = ExprArena::new();
    let body = int(&mut arena, 1);
    let block = arena.alloc(
        ExprKind::Block {
            body,
            num_args: 0,
            num_slots: 0,
        },
        Span::DUMMY,
    );
    let call = arena.alloc(
        ExprKind::BlockInvoke {
            block,
            args: ExprRange::new(7, 1),
        },
        Span::DUMMY,
    );
    let activation = Activation::root(Value::Nil, [], 0);

    let err = Interpreter::new(&arena)
        .evaluate(call, &activation)
        .unwrap_err();
    assert!(err.is_internal_fault());
}

#[test]
fn big_integer_literal_demotes() {
    let mut arena = ExprArena::new();
    let small = arena.alloc_literal(Constant::BigInteger(BigInt::from(12)), Span::DUMMY);
    let activation = Activation::root(Value::Nil, [], 0);

    assert_eq!(
        Interpreter::new(&arena).evaluate(small, &activation).unwrap(),
        Value::int(12)
    );
}

#[test]
fn empty_sequence_is_nil() {
    let mut arena = ExprArena::new();
    let seq = arena.alloc(ExprKind::Sequence(ExprRange::EMPTY), Span::DUMMY);
    let activation = Activation::root(Value::Nil, [], 0);

    assert_eq!(
        Interpreter::new(&arena).evaluate(seq, &activation).unwrap(),
        Value::Nil
    );
}

#[test]
fn describe_through_interpreter() {
    let arena = ExprArena::new();
    let mut interp = Interpreter::new(&arena);
    let foo = interp.universe_mut().define_class("Foo", 0, false, None);

    assert_eq!(interp.describe(&Value::Instance(Instance::new(foo))), "a Foo");
    assert_eq!(
        interp.describe(&Value::Instance(Instance::uninitialized(0))),
        "an Object(class==null)"
    );
    assert!(interp.universe().lookup_class("Foo").is_some());
    let class = interp.class_of(&Value::int(3)).unwrap();
    assert!(ClassRef::same(&class, interp.universe().integer_class()));
}

#[test]
fn profile_counts_invocations() {
    let mut arena = ExprArena::new();
    let method = counter_method(&mut arena);
    let mut interp = Interpreter::builder(&arena).profile(true).build();

    let Value::Block(counter) = interp.invoke(&method, Value::Nil, []).unwrap() else {
        panic!("expected block");
    };
    interp.invoke_block(&counter, [], None).unwrap();

    let counters = interp.counters().cloned().unwrap_or_default();
    assert_eq!(counters.method_invocations, 1);
    assert_eq!(counters.block_invocations, 1);
    assert!(counters.expressions_evaluated >= 8);
    assert!(Interpreter::new(&arena).counters_report().is_none());
}
