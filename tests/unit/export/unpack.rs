use super::*;
use crate::{
    container::opts::EncodeOpts,
    layer::record::{LayerEntry, LayerHeader, LayerRecord},
    raster::chunk::{ImageChunk, ImgType},
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

fn sample_container() -> Vec<u8> {
    let mut model = ResourceModel::new(Magic::Standard, ClockId::decode(0x000E_C352));
    let raster = image::RgbaImage::from_pixel(2, 2, image::Rgba([10, 20, 30, 255]));
    model.thumbnail = Some(ImageBlob::Chunk(
        ImageChunk::encode_rgba(&raster, ImgType::Rgb565, false).unwrap(),
    ));
    let id = model.push_image(
        Pool::Image,
        ImageBlob::Chunk(ImageChunk::encode_rgba(&raster, ImgType::Rgb8888, true).unwrap()),
    );
    model.layers.push(LayerRecord {
        header: LayerHeader::new(71, 0, 0, 5, 5),
        entries: vec![
            LayerEntry::int(1),
            LayerEntry::int(2),
            LayerEntry::ImageRef { ref_id: id },
        ],
    });
    model.trailer = vec![7, 7];
    codec::encode(&model, &EncodeOpts::default()).unwrap()
}

#[test]
fn unpack_writes_manifest_layers_and_images() {
    let tmp = temp_dir("unpack_layout");
    std::fs::create_dir_all(&tmp).unwrap();
    let src = tmp.join("Clock50002_res");
    std::fs::write(&src, sample_container()).unwrap();

    let out = tmp.join("out");
    let summary = unpack_file(&src, &out, &DecodeOpts::default()).unwrap();
    assert_eq!(summary.layers, 1);
    assert_eq!(summary.images, 1);
    assert_eq!(summary.pngs, 2);
    assert_eq!(summary.diagnostics, 1);

    for file in [
        MANIFEST_FILE,
        LAYERS_FILE,
        TRAILER_FILE,
        "thumbnail.bin",
        "thumbnail.png",
        "images/0.bin",
        "images/0.png",
    ] {
        assert!(out.join(file).is_file(), "missing {file}");
    }

    let manifest: Manifest =
        serde_json::from_slice(&std::fs::read(out.join(MANIFEST_FILE)).unwrap()).unwrap();
    assert_eq!(manifest.clock_id_raw, 0x000E_C352);
    assert_eq!(manifest.resolution, Some((400, 400)));
    assert_eq!(manifest.area_num_count, Some(4));
    assert_eq!(manifest.images[0].offset, Some(0));
    assert_eq!(manifest.images[0].asset.kind, "chunk:rgb8888");
    assert!(manifest.images[0].asset.chunk.unwrap().compressed);

    let png = image::open(out.join("images/0.png")).unwrap().to_rgba8();
    assert_eq!(png.get_pixel(1, 1).0, [10, 20, 30, 255]);

    let layers: serde_json::Value =
        serde_json::from_slice(&std::fs::read(out.join(LAYERS_FILE)).unwrap()).unwrap();
    assert_eq!(layers[0]["drawType"], 71);
    assert_eq!(layers[0]["entries"][2]["kind"], "image_ref");

    std::fs::remove_dir_all(&tmp).ok();
}

#[test]
fn unpack_reports_missing_and_corrupt_sources() {
    let tmp = temp_dir("unpack_errors");
    std::fs::create_dir_all(&tmp).unwrap();

    let missing = unpack_file(&tmp.join("nope"), &tmp.join("out"), &DecodeOpts::default());
    assert!(matches!(missing, Err(ResError::Other(_))));

    let junk = tmp.join("junk_res");
    std::fs::write(&junk, b"not a container at all, definitely").unwrap();
    let err = unpack_file(&junk, &tmp.join("out"), &DecodeOpts::default()).unwrap_err();
    assert!(err.is_structural());
    assert!(err.to_string().contains("junk_res"));

    std::fs::remove_dir_all(&tmp).ok();
}
