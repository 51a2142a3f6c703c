use super::*;
use crate::format::header::Magic;

fn header(img_start: u32, img_len: u32, layer_start: u32) -> ResourceHeader {
    ResourceHeader {
        magic: Magic::Standard,
        clock_id: 0,
        thumb_start: 32,
        thumb_len: img_start - 32,
        img_start,
        img_len,
        layer_start,
    }
}

#[test]
fn z_pool_starts_where_image_pool_ends() {
    let layout = SectionLayout::from_header(&header(40, 100, 300), 400).unwrap();
    assert_eq!(layout.z_img_start, 140);
    assert_eq!(layout.thumb(), 32..40);
    assert_eq!(layout.img(), 40..140);
    assert_eq!(layout.z_img(), 140..300);
    assert_eq!(layout.z_img_len(), 160);
    assert_eq!(layout.layers(), 300..400);
}

#[test]
fn image_pool_past_layer_start_is_rejected() {
    let err = SectionLayout::from_header(&header(40, 300, 300), 400).unwrap_err();
    assert!(err.is_structural());
    // Touching layer_start exactly is fine: empty z pool.
    let layout = SectionLayout::from_header(&header(40, 260, 300), 400).unwrap();
    assert_eq!(layout.z_img_len(), 0);
}

#[test]
fn offsets_beyond_file_are_rejected() {
    assert!(SectionLayout::from_header(&header(40, 10, 500), 400).is_err());

    let mut h = header(40, 10, 60);
    h.thumb_len = 1000;
    assert!(SectionLayout::from_header(&h, 400).is_err());

    let h = header(40, u32::MAX, 60);
    assert!(SectionLayout::from_header(&h, 400).is_err());
}

#[test]
fn packed_layout_is_contiguous() {
    let layout = SectionLayout::packed(32, 5, 20, 7, 48).unwrap();
    assert_eq!(layout.img_start, 37);
    assert_eq!(layout.z_img_start, 57);
    assert_eq!(layout.layer_start, 64);
    assert_eq!(layout.file_len, 112);
    assert_eq!(layout.z_img_start, layout.img_start + layout.img_len);
}
