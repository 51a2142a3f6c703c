use super::*;

// thumb 32..40, image pool 40..140 (img_len 100), z pool 140..300.
fn layout() -> SectionLayout {
    SectionLayout {
        thumb_start: 32,
        thumb_len: 8,
        img_start: 40,
        img_len: 100,
        z_img_start: 140,
        layer_start: 300,
        file_len: 400,
    }
}

#[test]
fn classification_boundaries() {
    let l = layout();
    assert_eq!(classify(0, &l), Some(Pool::Image));
    assert_eq!(classify(100, &l), Some(Pool::Image));
    // img_len + 1 is below z_img_start here, so it is unclassifiable.
    assert_eq!(classify(101, &l), None);
    assert_eq!(classify(139, &l), None);
    assert_eq!(classify(140, &l), Some(Pool::ZImage));
    assert_eq!(classify(300, &l), Some(Pool::ZImage));
    assert_eq!(classify(301, &l), None);
}

#[test]
fn img_len_plus_one_can_be_z_pool() {
    // Image pool starting at 0 makes img_len + 1 land inside the z pool.
    let l = SectionLayout {
        thumb_start: 0,
        thumb_len: 0,
        img_start: 0,
        img_len: 50,
        z_img_start: 50,
        layer_start: 80,
        file_len: 100,
    };
    assert_eq!(classify(51, &l), Some(Pool::ZImage));
}

#[test]
fn empty_image_pool_degenerates_to_zero() {
    let l = SectionLayout {
        img_len: 0,
        z_img_start: 40,
        ..layout()
    };
    assert_eq!(classify(0, &l), Some(Pool::Image));
    assert_eq!(classify(1, &l), None);
    assert_eq!(classify(40, &l), Some(Pool::ZImage));
}

#[test]
fn spans_use_asymmetric_addressing() {
    let l = layout();
    let img = resolve(10, 20, &l).unwrap();
    assert_eq!(img.pool, Pool::Image);
    assert_eq!(img.span(&l), 50..70);

    let z = resolve(150, 20, &l).unwrap();
    assert_eq!(z.pool, Pool::ZImage);
    assert_eq!(z.span(&l), 150..170);

    assert_eq!(emit_offset(Pool::Image, 10, &l).unwrap(), 10);
    assert_eq!(emit_offset(Pool::ZImage, 10, &l).unwrap(), 150);
    assert_eq!(classify(emit_offset(Pool::ZImage, 0, &l).unwrap(), &l), Some(Pool::ZImage));
}

#[test]
fn resolve_rejects_overruns_and_strays() {
    let l = layout();
    assert!(resolve(90, 11, &l).unwrap_err().is_structural());
    assert!(resolve(90, 10, &l).is_ok());
    assert!(resolve(290, 11, &l).is_err());
    assert!(resolve(120, 4, &l).is_err());
    assert!(fits_pool(0, 100, Pool::Image, &l));
    assert!(!fits_pool(u32::MAX, 2, Pool::ZImage, &l));
}

#[test]
fn ref_table_identity_is_the_raw_pair() {
    let mut table = RefTable::new();
    let a = ImageReference {
        offset: 0,
        length: 16,
        pool: Pool::Image,
    };
    let b = ImageReference {
        offset: 16,
        length: 16,
        pool: Pool::Image,
    };
    let a_longer = ImageReference { length: 32, ..a };

    assert_eq!(table.intern(a), (0, true));
    assert_eq!(table.intern(b), (1, true));
    assert_eq!(table.intern(a), (0, false));
    assert_eq!(table.intern(a_longer), (2, true));
    assert_eq!(table.intern(b), (1, false));

    assert_eq!(table.len(), 3);
    assert_eq!(table.get(16, 16), Some(1));
    assert_eq!(table.get(16, 17), None);
    assert_eq!(table.reference(2), Some(&a_longer));
    assert_eq!(table.references(), &[a, b, a_longer]);
}

#[test]
fn ref_table_sequence_property() {
    // Pseudo-random pair stream: equal pairs share ids, distinct pairs never do.
    let mut table = RefTable::new();
    let mut seen = std::collections::HashMap::<(u32, u32), RefId>::new();
    let mut state = 0x1234_5678u32;
    for _ in 0..500 {
        state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        let pair = ((state >> 8) % 13, (state >> 20) % 5);
        let (id, _) = table.intern(ImageReference {
            offset: pair.0,
            length: pair.1,
            pool: Pool::Image,
        });
        let expected = *seen.entry(pair).or_insert(id);
        assert_eq!(id, expected);
    }
    let mut ids: Vec<_> = seen.values().copied().collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), seen.len());
    assert_eq!(table.len(), seen.len());
}
