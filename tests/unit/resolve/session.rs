use super::*;
use crate::raster::chunk::{ImageChunk, ImgType};

// thumb 32..40, image pool 40..140, z pool 140..300, layers 300..400.
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

fn chunk() -> ImageChunk {
    ImageChunk::from_payload(ImgType::Rgb565, 1, 1, vec![0x00, 0xF8], false).unwrap()
}

// A valid 18-byte chunk at image-pool local 0 and z-pool absolute 140.
fn file() -> Vec<u8> {
    let mut file = vec![0u8; 400];
    let span = chunk().to_bytes().unwrap();
    file[40..58].copy_from_slice(&span);
    file[140..158].copy_from_slice(&span);
    file
}

#[test]
fn intern_copies_each_span_once() {
    let file = file();
    let opts = DecodeOpts::default();
    let mut ctx = DecodeContext::new(&file, layout(), &opts);

    let img = refs::resolve(0, 18, &layout()).unwrap();
    let z = refs::resolve(140, 18, &layout()).unwrap();
    assert_eq!(ctx.intern(img).unwrap(), 0);
    assert_eq!(ctx.intern(z).unwrap(), 1);
    assert_eq!(ctx.intern(img).unwrap(), 0);

    let (images, origins, diagnostics) = ctx.finish();
    assert_eq!(images.len(), 2);
    assert_eq!(images[0].pool, Pool::Image);
    assert_eq!(images[1].pool, Pool::ZImage);
    assert_eq!(images[0].blob.as_chunk(), Some(&chunk()));
    assert_eq!(origins, vec![img, z]);
    assert!(diagnostics.is_empty());
}

#[test]
fn judge_accepts_signed_spans_and_rejects_the_rest() {
    let file = file();
    let opts = DecodeOpts::default();
    let ctx = DecodeContext::new(&file, layout(), &opts);

    assert!(matches!(
        ctx.judge(0, 18),
        Verdict::Reference { confident: true, .. }
    ));
    assert!(matches!(
        ctx.judge(140, 18),
        Verdict::Reference { confident: true, .. }
    ));
    // Zeroed bytes carry no signature.
    assert!(matches!(
        ctx.judge(60, 20),
        Verdict::Literal { plausible: true, .. }
    ));
    assert!(matches!(
        ctx.judge(0, 0),
        Verdict::Literal { plausible: false, .. }
    ));
    assert!(matches!(
        ctx.judge(120, 20),
        Verdict::Literal { plausible: false, .. }
    ));
    assert!(matches!(
        ctx.judge(0, 8),
        Verdict::Literal { plausible: true, .. }
    ));
    assert!(matches!(
        ctx.judge(90, 20),
        Verdict::Literal { plausible: true, .. }
    ));
}

#[test]
fn lenient_policy_accepts_without_signature() {
    let file = file();
    let opts = DecodeOpts {
        plausibility: Plausibility::Lenient,
        ..DecodeOpts::default()
    };
    let ctx = DecodeContext::new(&file, layout(), &opts);
    assert!(matches!(
        ctx.judge(60, 20),
        Verdict::Reference { confident: false, .. }
    ));
}

#[test]
fn known_pairs_are_accepted_even_when_short() {
    let file = file();
    let opts = DecodeOpts {
        min_chunk_len: 64,
        ..DecodeOpts::default()
    };
    let mut ctx = DecodeContext::new(&file, layout(), &opts);
    assert!(matches!(ctx.judge(0, 18), Verdict::Literal { .. }));
    ctx.intern(refs::resolve(0, 18, &layout()).unwrap()).unwrap();
    assert!(matches!(
        ctx.judge(0, 18),
        Verdict::Reference { confident: true, .. }
    ));
}

#[test]
fn pool_builder_places_in_first_use_order() {
    let blob = ImageBlob::from_span(&chunk().to_bytes().unwrap());
    let raw = ImageBlob::from_span(&[0xAB; 4]);
    let images = vec![
        PooledImage {
            pool: Pool::Image,
            blob: blob.clone(),
        },
        PooledImage {
            pool: Pool::ZImage,
            blob,
        },
        PooledImage {
            pool: Pool::Image,
            blob: raw,
        },
    ];
    let mut pools = PoolBuilder::new(&images);
    pools.place(Pool::Image, 2).unwrap();
    pools.place(Pool::ZImage, 1).unwrap();
    pools.place(Pool::Image, 0).unwrap();
    pools.place(Pool::Image, 2).unwrap();
    assert!(pools.is_placed(0));
    assert_eq!(pools.img_len(), 22);
    assert_eq!(pools.z_img_len(), 18);

    let layout = SectionLayout::packed(32, 0, 22, 18, 0).unwrap();
    assert_eq!(pools.address(2, &layout).unwrap(), (0, 4));
    assert_eq!(pools.address(0, &layout).unwrap(), (4, 18));
    assert_eq!(pools.address(1, &layout).unwrap(), (layout.z_img_start, 18));

    assert_eq!(&pools.img_bytes()[..4], &[0xAB; 4]);
    assert_eq!(pools.z_img_bytes().len(), 18);
}

#[test]
fn pool_builder_rejects_bad_references() {
    let images = vec![PooledImage {
        pool: Pool::ZImage,
        blob: ImageBlob::from_span(&[1, 2, 3]),
    }];
    let mut pools = PoolBuilder::new(&images);
    assert!(pools.place(Pool::Image, 0).unwrap_err().is_structural());
    assert!(pools.place(Pool::ZImage, 5).unwrap_err().is_structural());
    let layout = SectionLayout::packed(32, 0, 0, 0, 0).unwrap();
    assert!(pools.address(0, &layout).is_err());
}
