use super::*;

fn sample() -> ResourceHeader {
    ResourceHeader {
        magic: Magic::Idle,
        clock_id: 0x0007_C350,
        thumb_start: 32,
        thumb_len: 10,
        img_start: 42,
        img_len: 100,
        layer_start: 200,
    }
}

#[test]
fn write_then_parse_is_identity() {
    let header = sample();
    let mut w = BeWriter::new();
    header.write(&mut w);
    let bytes = w.into_inner();
    assert_eq!(bytes.len(), HEADER_LEN);
    assert_eq!(&bytes[..8], b"II@*24dG");
    assert_eq!(&bytes[8..12], &[0x00, 0x07, 0xC3, 0x50]);
    assert_eq!(ResourceHeader::parse(&bytes).unwrap(), header);
    assert_eq!(header.clock().base_id, 50000);
}

#[test]
fn unknown_magic_is_structural() {
    let mut bytes = vec![0u8; HEADER_LEN];
    bytes[..8].copy_from_slice(b"NOTMAGIC");
    let err = ResourceHeader::parse(&bytes).unwrap_err();
    assert!(err.is_structural());
    assert!(err.to_string().contains("magic"));
}

#[test]
fn truncated_header_is_structural() {
    let mut bytes = Magic::Standard.bytes().to_vec();
    bytes.extend_from_slice(&[0, 0, 0, 1, 0, 0]);
    let err = ResourceHeader::parse(&bytes).unwrap_err();
    assert!(err.is_structural());
}

#[test]
fn magic_lookup() {
    assert_eq!(Magic::from_bytes(b"Sb@*O2GG"), Some(Magic::Standard));
    assert_eq!(Magic::from_bytes(b"II@*24dG"), Some(Magic::Idle));
    assert_eq!(Magic::from_bytes(b"II@*24d"), None);
}
