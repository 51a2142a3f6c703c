use super::*;
use crate::{
    container::opts::DecodeOpts,
    export::unpack::write_dir,
    format::{clock_id::ClockId, header::Magic},
    layer::record::{LayerEntry, LayerHeader},
    raster::chunk::ImgType,
    resolve::refs::Pool,
};

fn temp_dir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "watchres_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ))
}

fn sample_model() -> ResourceModel {
    let mut model = ResourceModel::new(Magic::Idle, ClockId::generated(50003, 466, 466).unwrap());
    let raster = image::RgbaImage::from_fn(3, 2, |x, y| {
        image::Rgba([x as u8 * 40, y as u8 * 90, 7, if x == 0 { 128 } else { 255 }])
    });
    let a = model.push_image(
        Pool::Image,
        ImageBlob::Chunk(ImageChunk::encode_rgba(&raster, ImgType::Rgb8888, true).unwrap()),
    );
    let b = model.push_image(Pool::ZImage, ImageBlob::from_span(&[0x5A; 24]));
    model.layers.push(LayerRecord {
        header: LayerHeader::new(21, 0, 1, 2, 3),
        entries: vec![
            LayerEntry::Pointer {
                x_off: 4,
                y_off: 5,
                pool: Pool::Image,
                ref_id: a,
            },
            LayerEntry::Pointer {
                x_off: 6,
                y_off: 7,
                pool: Pool::ZImage,
                ref_id: b,
            },
        ],
    });
    model
}

#[test]
fn read_dir_inverts_write_dir() {
    let tmp = temp_dir("pack_roundtrip");
    let model = sample_model();
    write_dir(&model, None, &tmp).unwrap();
    assert_eq!(read_dir(&tmp).unwrap(), model);

    let out = tmp.join("packed").join("Clock50003_res");
    let summary = pack_dir(&tmp, &out, &EncodeOpts::default()).unwrap();
    assert_eq!(summary.layers, 1);
    let bytes = std::fs::read(&out).unwrap();
    assert_eq!(bytes.len(), summary.bytes);
    assert_eq!(
        codec::decode(&bytes, &DecodeOpts::default()).unwrap().model,
        model
    );

    std::fs::remove_dir_all(&tmp).ok();
}

#[test]
fn missing_bin_is_rebuilt_from_png() {
    let tmp = temp_dir("pack_from_png");
    let model = sample_model();
    write_dir(&model, None, &tmp).unwrap();
    std::fs::remove_file(tmp.join("images/0.bin")).unwrap();

    let rebuilt = read_dir(&tmp).unwrap();
    assert_eq!(rebuilt.images[0], model.images[0]);

    // The raw z-pool blob has no png and no chunk header to fall back on.
    std::fs::remove_file(tmp.join("images/1.bin")).unwrap();
    let err = read_dir(&tmp).unwrap_err();
    assert!(err.is_structural());
    assert!(err.to_string().contains("image 1"));

    std::fs::remove_dir_all(&tmp).ok();
}

#[test]
fn malformed_manifest_is_a_serde_error() {
    let tmp = temp_dir("pack_bad_manifest");
    write_dir(&sample_model(), None, &tmp).unwrap();
    std::fs::write(tmp.join(MANIFEST_FILE), b"{ \"magic\": 3 }").unwrap();
    assert!(matches!(read_dir(&tmp), Err(ResError::Serde(_))));
    std::fs::remove_dir_all(&tmp).ok();
}

#[test]
fn gaps_in_the_image_table_are_rejected() {
    let tmp = temp_dir("pack_gap");
    write_dir(&sample_model(), None, &tmp).unwrap();
    let path = tmp.join(MANIFEST_FILE);
    let mut manifest: Manifest = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
    manifest.images.remove(0);
    std::fs::write(&path, serde_json::to_vec(&manifest).unwrap()).unwrap();
    assert!(read_dir(&tmp).unwrap_err().is_structural());
    std::fs::remove_dir_all(&tmp).ok();
}
