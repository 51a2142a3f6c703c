use super::*;

fn diag(kind: DiagnosticKind, layer: Option<usize>) -> Diagnostic {
    Diagnostic {
        kind,
        layer,
        entry: None,
        offset: 0x40,
        message: "m".into(),
    }
}

#[test]
fn filters_by_layer_and_kind() {
    let mut diags = Diagnostics::default();
    diags.push(diag(DiagnosticKind::AmbiguousEntry, Some(0)));
    diags.push(diag(DiagnosticKind::UnknownField, Some(0)));
    diags.push(diag(DiagnosticKind::AmbiguousEntry, Some(2)));
    diags.push(diag(DiagnosticKind::TrailingData, None));

    assert_eq!(diags.len(), 4);
    assert_eq!(diags.for_layer(0).count(), 2);
    assert_eq!(diags.for_layer(1).count(), 0);
    assert_eq!(diags.of_kind(DiagnosticKind::AmbiguousEntry).count(), 2);
    assert_eq!(diags.items()[3].layer, None);
}

#[test]
fn json_omits_absent_indices() {
    let json = serde_json::to_value(diag(DiagnosticKind::AreaCount, None)).unwrap();
    assert_eq!(json["kind"], "area_count");
    assert!(json.get("layer").is_none());
    assert!(json.get("entry").is_none());
}
