use super::*;

#[test]
fn header_validation_tracks_data_type() {
    let mut header = LayerHeader::new(0, 59, 0, 0, 0);
    assert!(header.validate().is_err());
    header.interval = Some(100);
    assert!(header.validate().is_ok());

    let mut header = LayerHeader::new(0, 112, 0, 0, 0);
    assert!(header.validate().is_err());
    header.area_num = Some(vec![]);
    assert!(header.validate().is_ok());
    header.interval = Some(1);
    assert!(header.validate().unwrap_err().is_structural());
}

#[test]
fn json_shape_is_flat_and_tagged() {
    let mut header = LayerHeader::new(10, 130, 1, 227, 227);
    header.interval = Some(40);
    let record = LayerRecord {
        header,
        entries: vec![
            LayerEntry::Pointer {
                x_off: 12,
                y_off: 200,
                pool: Pool::ZImage,
                ref_id: 3,
            },
            LayerEntry::int(5),
            LayerEntry::IntParam {
                value: -1,
                shape: ParamShape::Inferred,
            },
        ],
    };
    let json = serde_json::to_value(&record).unwrap();
    assert_eq!(json["drawType"], 10);
    assert_eq!(json["interval"], 40);
    assert!(json.get("area_num").is_none());
    assert_eq!(json["entries"][0]["kind"], "pointer");
    assert_eq!(json["entries"][0]["pool"], "z_image");
    assert!(json["entries"][1].get("shape").is_none());
    assert_eq!(json["entries"][2]["shape"], "inferred");

    let back: LayerRecord = serde_json::from_value(json).unwrap();
    assert_eq!(back, record);
}

#[test]
fn entry_images_and_lengths() {
    let entries = [
        LayerEntry::reference(Pool::Image, 1),
        LayerEntry::reference(Pool::ZImage, 2),
        LayerEntry::text("x"),
    ];
    assert_eq!(entries[0].image(), Some((Pool::Image, 1)));
    assert_eq!(entries[1], LayerEntry::ZImageRef { ref_id: 2 });
    assert_eq!(entries[2].image(), None);
    let lens: Vec<_> = entries.iter().map(LayerEntry::encoded_len).collect();
    assert_eq!(lens, vec![8, 8, TEXT_FIELD_LEN]);

    let record = LayerRecord {
        header: LayerHeader::new(0, 0, 0, 0, 0),
        entries: entries.to_vec(),
    };
    assert_eq!(record.num(), 3);
    assert_eq!(
        record.images().collect::<Vec<_>>(),
        vec![(Pool::Image, 1), (Pool::ZImage, 2)]
    );
}

#[test]
fn int_equality_ignores_shape() {
    let inferred = LayerEntry::IntParam {
        value: 42,
        shape: ParamShape::Inferred,
    };
    assert_eq!(LayerEntry::int(42), inferred);
    assert_ne!(LayerEntry::int(41), inferred);
    assert_ne!(
        LayerEntry::ImageRef { ref_id: 1 },
        LayerEntry::ZImageRef { ref_id: 1 }
    );
    assert_ne!(LayerEntry::text("a"), LayerEntry::text("b"));
}
