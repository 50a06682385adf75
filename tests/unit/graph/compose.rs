use super::*;

#[test]
fn indices_zero_through_five_are_accepted() {
    for i in 0..=5 {
        let op = select_compose_operation(i).unwrap();
        assert_eq!(op.index(), i);
        assert_eq!(ComposeOp::ALL[i as usize], op);
    }
    assert_eq!(
        ComposeOp::from_index(3).unwrap().operation_name(),
        "gegl:overlay"
    );
}

#[test]
fn out_of_range_indices_are_rejected() {
    for i in [-1, 6, 7, i64::MIN, i64::MAX] {
        match select_compose_operation(i) {
            Err(PixError::UnknownComposeOp(v)) => assert_eq!(v, i),
            other => panic!("expected UnknownComposeOp for {i}, got {other:?}"),
        }
    }
    assert!(ComposeOp::try_from(6).is_err());
}

#[test]
fn blend_functions_match_their_definitions() {
    assert_eq!(ComposeOp::Multiply.blend(0.5, 0.5), 0.25);
    assert_eq!(ComposeOp::Difference.blend(0.25, 0.75), 0.5);
    assert_eq!(ComposeOp::Screen.blend(0.5, 0.5), 0.75);
    assert_eq!(ComposeOp::Overlay.blend(0.25, 0.5), 0.25);
    assert_eq!(ComposeOp::Overlay.blend(0.75, 0.5), 0.75);
    assert_eq!(ComposeOp::Subtract.blend(0.25, 0.5), 0.0);
    assert_eq!(ComposeOp::Exclusion.blend(0.5, 0.5), 0.5);
}
