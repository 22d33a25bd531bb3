use super::*;

fn break_region(labels: &[&str], require_label: bool, native: bool) -> Region {
    Region::Break(BreakRegion {
        break_label: Label::NONE,
        label_names: labels.iter().map(|l| l.to_string()).collect(),
        require_label,
        native,
    })
}

fn continue_region(labels: &[&str], continue_label: Label, native: bool) -> Region {
    Region::Continue(ContinueRegion {
        target: BreakRegion {
            break_label: Label::NONE,
            label_names: labels.iter().map(|l| l.to_string()).collect(),
            require_label: false,
            native,
        },
        continue_label,
    })
}

fn with_region(expression: &str) -> Region {
    Region::With(WithRegion {
        expression: expression.to_string(),
        start_label: Label(1),
        end_label: Label(2),
    })
}

#[test]
fn test_begin_end_records_events() {
    let mut blocks = BlockStack::new();
    let outer = blocks.begin(with_region("_a"), 0);
    let inner = blocks.begin(break_region(&[], false, false), 2);
    assert_eq!(blocks.depth(), 2);

    assert_eq!(blocks.end(RegionKind::Break, 5), Ok(inner));
    assert_eq!(blocks.end(RegionKind::With, 6), Ok(outer));
    assert_eq!(blocks.depth(), 0);

    let events: Vec<_> = blocks
        .events()
        .iter()
        .map(|e| (e.action, e.region, e.offset))
        .collect();
    assert_eq!(
        events,
        vec![
            (BlockAction::Open, outer, 0),
            (BlockAction::Open, inner, 2),
            (BlockAction::Close, inner, 5),
            (BlockAction::Close, outer, 6),
        ]
    );
}

#[test]
fn test_end_with_wrong_kind_fails() {
    let mut blocks = BlockStack::new();
    blocks.begin(with_region("_a"), 0);
    assert_eq!(
        blocks.end(RegionKind::Exception, 1),
        Err(LoweringError::RegionMismatch {
            expected: RegionKind::Exception,
            found: Some(RegionKind::With),
        })
    );
    // the region is still open
    assert_eq!(blocks.depth(), 1);
}

#[test]
fn test_end_on_empty_stack_fails() {
    let mut blocks = BlockStack::new();
    let err = blocks.end(RegionKind::Continue, 0).unwrap_err();
    assert_eq!(
        err,
        LoweringError::RegionMismatch {
            expected: RegionKind::Continue,
            found: None,
        }
    );
    assert!(err.to_string().contains("no open region"));
}

#[test]
fn test_native_and_dispatched_regions_have_distinct_kinds() {
    let mut blocks = BlockStack::new();
    blocks.begin(break_region(&[], false, true), 0);
    assert!(blocks.end(RegionKind::Break, 0).is_err());
    assert!(blocks.end(RegionKind::ScriptBreak, 0).is_ok());

    blocks.begin(continue_region(&[], Label::NONE, true), 0);
    assert!(blocks.end(RegionKind::Continue, 0).is_err());
    assert!(blocks.end(RegionKind::ScriptContinue, 0).is_ok());
}

#[test]
fn test_protected_regions_flag() {
    let mut blocks = BlockStack::new();
    assert!(!blocks.has_protected_regions());
    blocks.begin(
        Region::Exception(ExceptionRegion {
            phase: ExceptionPhase::Try,
            start_label: Label(1),
            catch_variable: None,
            catch_label: Label::NONE,
            finally_label: Label::NONE,
            end_label: Label(2),
        }),
        0,
    );
    blocks.end(RegionKind::Exception, 0).unwrap();
    // stays set after the region closes
    assert!(blocks.has_protected_regions());
}

#[test]
fn test_unlabeled_break_skips_regions_requiring_a_label() {
    let mut blocks = BlockStack::new();
    let loop_region = blocks.begin(continue_region(&[], Label(1), false), 0);
    let _labeled_block = blocks.begin(break_region(&["outer"], true, false), 0);

    assert_eq!(blocks.find_break_target(None), Some(loop_region));
}

#[test]
fn test_labeled_break_finds_region_by_name() {
    let mut blocks = BlockStack::new();
    let outer = blocks.begin(continue_region(&["outer"], Label(1), false), 0);
    let inner = blocks.begin(continue_region(&["inner"], Label(2), false), 0);
    blocks.begin(with_region("_a"), 0);

    assert_eq!(blocks.find_break_target(Some("outer")), Some(outer));
    assert_eq!(blocks.find_break_target(Some("inner")), Some(inner));
    assert_eq!(blocks.find_break_target(None), Some(inner));
    assert_eq!(blocks.find_break_target(Some("missing")), None);
}

#[test]
fn test_continue_skips_break_only_regions() {
    let mut blocks = BlockStack::new();
    let loop_region = blocks.begin(continue_region(&["l"], Label(1), false), 0);
    blocks.begin(break_region(&[], false, false), 0);

    assert_eq!(blocks.find_continue_target(None), Some(loop_region));
    assert_eq!(blocks.find_continue_target(Some("l")), Some(loop_region));
    assert_eq!(blocks.find_continue_target(Some("x")), None);
}

#[test]
fn test_phase_ordering() {
    assert!(ExceptionPhase::Try < ExceptionPhase::Catch);
    assert!(ExceptionPhase::Catch < ExceptionPhase::Finally);
    assert!(ExceptionPhase::Finally < ExceptionPhase::Done);
}
