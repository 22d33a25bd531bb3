use super::*;

#[test]
fn test_statement_mode_rejects_branch_and_suspend() {
    let mut recorder = OperationRecorder::new(LoweringMode::Statements);
    for operation in [
        Operation::Break(Label(1)),
        Operation::BreakIfTrue {
            label: Label(1),
            condition: IRNode::id("x"),
        },
        Operation::BreakIfFalse {
            label: Label(1),
            condition: IRNode::id("x"),
        },
        Operation::Yield(None),
        Operation::YieldStar(Some(IRNode::id("it"))),
        Operation::Endfinally,
    ] {
        let opcode = operation.opcode();
        assert_eq!(
            recorder.record(operation),
            Err(LoweringError::UnexpectedOperation(opcode))
        );
    }
    assert!(recorder.is_empty());
}

#[test]
fn test_statement_mode_accepts_plain_operations() {
    let mut recorder = OperationRecorder::new(LoweringMode::Statements);
    assert_eq!(
        recorder.record(Operation::Assign {
            target: IRNode::id("a"),
            value: IRNode::number("1"),
        }),
        Ok(true)
    );
    assert_eq!(
        recorder.record(Operation::Statement(IRNode::call(IRNode::id("f"), vec![]))),
        Ok(true)
    );
    assert_eq!(recorder.record(Operation::Throw(IRNode::id("e"))), Ok(true));
    assert_eq!(recorder.record(Operation::Return(None)), Ok(true));
    assert_eq!(recorder.len(), 4);
}

#[test]
fn test_unexpected_operation_message_names_the_opcode() {
    let err = LoweringError::UnexpectedOperation(OpCode::YieldStar);
    assert_eq!(err.to_string(), "Unexpected OpCode: YieldStar");
}

#[test]
fn test_empty_statement_is_dropped() {
    let mut recorder = OperationRecorder::new(LoweringMode::StateMachine);
    recorder.write_location(Span::new(1, 2));
    assert_eq!(recorder.record(Operation::Statement(IRNode::EmptyStatement)), Ok(false));
    assert!(recorder.is_empty());
    // the pending location is consumed regardless
    assert_eq!(recorder.pending_location(), None);
}

#[test]
fn test_location_is_attached_to_next_operation_only() {
    let mut recorder = OperationRecorder::new(LoweringMode::StateMachine);
    recorder.write_location(Span::new(10, 20));
    recorder.record(Operation::Yield(None)).unwrap();
    recorder.record(Operation::Return(None)).unwrap();

    let ops = recorder.operations();
    assert_eq!(ops[0].location, Some(Span::new(10, 20)));
    assert_eq!(ops[1].location, None);
    assert_eq!(recorder.position(), 2);
}

#[test]
fn test_branch_target() {
    assert_eq!(Operation::Break(Label(2)).branch_target(), Some(Label(2)));
    assert_eq!(
        Operation::BreakIfFalse {
            label: Label(5),
            condition: IRNode::id("c"),
        }
        .branch_target(),
        Some(Label(5))
    );
    assert_eq!(Operation::Yield(None).branch_target(), None);
}
