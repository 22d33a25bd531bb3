use super::*;

#[test]
fn test_labels_are_one_based_and_sequential() {
    let mut labels = LabelTable::new();
    assert!(labels.is_empty());
    let a = labels.define();
    let b = labels.define();
    assert_eq!(a, Label(1));
    assert_eq!(b, Label(2));
    assert_eq!(labels.len(), 2);
    assert!(Label::NONE.is_none());
    assert!(a.is_some());
}

#[test]
fn test_mark_binds_position() {
    let mut labels = LabelTable::new();
    let label = labels.define();
    assert_eq!(labels.position(label), None);
    labels.mark(label, 4).unwrap();
    assert_eq!(labels.position(label), Some(4));
}

#[test]
fn test_mark_twice_is_an_error() {
    let mut labels = LabelTable::new();
    let label = labels.define();
    labels.mark(label, 0).unwrap();
    assert_eq!(
        labels.mark(label, 3),
        Err(LoweringError::LabelAlreadyMarked(label, 0))
    );
}

#[test]
fn test_mark_undefined_label_is_an_error() {
    let mut labels = LabelTable::new();
    assert_eq!(
        labels.mark(Label(1), 0),
        Err(LoweringError::UndefinedLabel(Label(1)))
    );
    assert_eq!(
        labels.mark(Label::NONE, 0),
        Err(LoweringError::UndefinedLabel(Label::NONE))
    );
    assert_eq!(
        labels.note_reference(Label(7)),
        Err(LoweringError::UndefinedLabel(Label(7)))
    );
}

#[test]
fn test_first_unmarked_covers_unreferenced_labels() {
    let mut labels = LabelTable::new();
    let unused = labels.define();
    let forward = labels.define();
    labels.note_reference(forward).unwrap();

    assert_eq!(labels.unmarked(), vec![unused, forward]);
    assert_eq!(labels.first_unmarked(), Some(unused));

    labels.mark(unused, 0).unwrap();
    assert_eq!(labels.first_unmarked(), Some(forward));
    labels.mark(forward, 2).unwrap();
    assert_eq!(labels.first_unmarked(), None);
    assert!(labels.is_referenced(forward));
    assert!(!labels.is_referenced(unused));
}

#[test]
fn test_label_display() {
    assert_eq!(Label(3).to_string(), "L3");
}
