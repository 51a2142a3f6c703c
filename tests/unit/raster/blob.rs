use std::io::Cursor;

use super::*;
use crate::raster::chunk::ImgType;

#[test]
fn chunk_span_is_a_chunk_and_roundtrips() {
    let chunk = ImageChunk::from_payload(ImgType::Rgb565, 1, 1, vec![0x00, 0xF8], false).unwrap();
    let span = chunk.to_bytes().unwrap();
    let blob = ImageBlob::from_span(&span);
    assert_eq!(blob.as_chunk(), Some(&chunk));
    assert_eq!(blob.to_bytes().unwrap(), span);
    assert_eq!(blob.span_len(), 18);
    assert_eq!(blob.kind(), "chunk:rgb565");
    assert_eq!(blob.decode_rgba().unwrap().get_pixel(0, 0).0, [0xFF, 0, 0, 0xFF]);
}

#[test]
fn raw_png_is_sniffed_and_decoded() {
    let img = image::RgbaImage::from_raw(1, 1, vec![1, 2, 3, 255]).unwrap();
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img.clone())
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();

    let blob = ImageBlob::from_span(&buf);
    assert!(matches!(
        blob,
        ImageBlob::Raw {
            format: RawFormat::Png,
            ..
        }
    ));
    assert_eq!(blob.to_bytes().unwrap(), buf);
    assert_eq!(blob.decode_rgba().unwrap(), img);
}

#[test]
fn unknown_raw_bytes_are_kept_but_not_decodable() {
    let blob = ImageBlob::from_span(&[0xAB; 5]);
    assert_eq!(blob.kind(), "raw:bin");
    assert_eq!(blob.to_bytes().unwrap(), vec![0xAB; 5]);
    assert!(blob.decode_rgba().is_err());
}
