use super::*;

fn shape(draw: i32, data: i32, idx: usize) -> EntryShape {
    select(draw, data, idx).shape
}

#[test]
fn pointer_draw_types_always_read_pointers() {
    for draw in [10, 15, 21] {
        for idx in [0, 3, 11] {
            assert_eq!(shape(draw, 64, idx), EntryShape::Pointer);
        }
    }
}

#[test]
fn index_splits_for_draw100_and_digits() {
    assert_eq!(shape(100, 0, 6), EntryShape::Literal);
    assert_eq!(shape(100, 0, 7), EntryShape::ImagePair);
    for draw in 71..=76 {
        assert_eq!(shape(draw, 0, 1), EntryShape::Literal);
        assert_eq!(shape(draw, 0, 2), EntryShape::ImagePair);
    }
    assert_eq!(shape(77, 0, 2), EntryShape::Heuristic);
}

#[test]
fn earlier_rows_win_over_data_type_rows() {
    // dataType 64 asks for literals at 10 and 11, but digits claim idx >= 2 first.
    assert_eq!(shape(71, 64, 10), EntryShape::ImagePair);
    assert_eq!(shape(100, 65, 11), EntryShape::ImagePair);
    assert_eq!(shape(0, 65, 11), EntryShape::Literal);
    assert_eq!(shape(0, 65, 12), EntryShape::Heuristic);
}

#[test]
fn draw55_text_only_at_index_two() {
    assert_eq!(shape(55, 0, 0), EntryShape::Heuristic);
    assert_eq!(shape(55, 0, 2), EntryShape::FixedText);
    assert_eq!(shape(55, 0, 3), EntryShape::Heuristic);
    assert_eq!(select(55, 0, 2).name, "draw55-text");
}

#[test]
fn draw8_literals_then_fallback() {
    assert_eq!(shape(8, 0, 2), EntryShape::Literal);
    assert_eq!(shape(8, 0, 3), EntryShape::Heuristic);
    assert_eq!(select(8, 0, 3), &FALLBACK_RULE);
}

#[test]
fn known_draw_types() {
    assert!(draw_type_is_known(55));
    assert!(draw_type_is_known(76));
    assert!(!draw_type_is_known(0));
    assert!(!draw_type_is_known(64));
}
