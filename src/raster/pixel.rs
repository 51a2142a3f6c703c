use std::{collections::HashMap, io::Cursor};

use anyhow::Context;
use byteorder::{ByteOrder, LittleEndian};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};

use crate::{
    foundation::error::{ResError, ResResult},
    raster::chunk::ImgType,
};

/// Maximum palette size for [`ImgType::Index8`].
pub const INDEX8_MAX_COLORS: usize = 256;

/// Convert a decompressed chunk payload to straight-alpha RGBA8.
pub fn decode(img_type: ImgType, width: u32, height: u32, payload: &[u8]) -> ResResult<RgbaImage> {
    let pixels = width as usize * height as usize;
    match img_type {
        ImgType::Gif | ImgType::Jpg => decode_file(payload),
        ImgType::Rgb8888 => map_pixels(width, height, payload, 4, |s| {
            Rgba([s[2], s[1], s[0], s[3]])
        }),
        ImgType::Rgb8565 => map_pixels(width, height, payload, 3, |s| {
            let [r, g, b] = unpack_565(LittleEndian::read_u16(&s[..2]));
            Rgba([r, g, b, s[2]])
        }),
        ImgType::Rgb565 => map_pixels(width, height, payload, 2, |s| {
            let [r, g, b] = unpack_565(LittleEndian::read_u16(s));
            Rgba([r, g, b, 0xFF])
        }),
        ImgType::Rgb1555 => map_pixels(width, height, payload, 2, |s| {
            let v = LittleEndian::read_u16(s);
            let a = if v & 0x8000 != 0 { 0xFF } else { 0 };
            Rgba([
                expand5((v >> 10) & 0x1F),
                expand5((v >> 5) & 0x1F),
                expand5(v & 0x1F),
                a,
            ])
        }),
        ImgType::Index8 => {
            let palette_bytes = payload.len().checked_sub(pixels).ok_or_else(|| {
                ResError::pixel(format!(
                    "index8 payload of {} bytes is smaller than {pixels} indices",
                    payload.len()
                ))
            })?;
            let colors = palette_bytes / 4;
            if palette_bytes % 4 != 0 || colors == 0 || colors > INDEX8_MAX_COLORS {
                return Err(ResError::pixel(format!(
                    "index8 palette of {palette_bytes} bytes is not 1..=256 BGRA entries"
                )));
            }
            let (palette, indices) = payload.split_at(palette_bytes);
            let palette: Vec<Rgba<u8>> = palette
                .chunks_exact(4)
                .map(|c| Rgba([c[2], c[1], c[0], c[3]]))
                .collect();

            let mut out = RgbaImage::new(width, height);
            for (px, idx) in out.pixels_mut().zip(indices) {
                *px = *palette.get(*idx as usize).ok_or_else(|| {
                    ResError::pixel(format!(
                        "index8 index {idx} outside palette of {colors} colors"
                    ))
                })?;
            }
            Ok(out)
        }
    }
}

/// Quantize `raster` into the payload layout for `img_type`.
pub fn encode(raster: &RgbaImage, img_type: ImgType) -> ResResult<Vec<u8>> {
    let pixels = raster.pixels();
    let out = match img_type {
        ImgType::Gif => encode_file(raster, ImageFormat::Gif)?,
        ImgType::Jpg => encode_file(raster, ImageFormat::Jpeg)?,
        ImgType::Rgb8888 => pixels.flat_map(|p| [p[2], p[1], p[0], p[3]]).collect(),
        ImgType::Rgb8565 => {
            let mut out = Vec::with_capacity(raster.len() / 4 * 3);
            for p in pixels {
                let mut tmp = [0u8; 2];
                LittleEndian::write_u16(&mut tmp, pack_565(p));
                out.extend_from_slice(&[tmp[0], tmp[1], p[3]]);
            }
            out
        }
        ImgType::Rgb565 => {
            let mut out = vec![0u8; raster.len() / 2];
            for (dst, p) in out.chunks_exact_mut(2).zip(pixels) {
                LittleEndian::write_u16(dst, pack_565(p));
            }
            out
        }
        ImgType::Rgb1555 => {
            let mut out = vec![0u8; raster.len() / 2];
            for (dst, p) in out.chunks_exact_mut(2).zip(pixels) {
                let mut v = ((u16::from(p[0]) & 0xF8) << 7)
                    | ((u16::from(p[1]) & 0xF8) << 2)
                    | (u16::from(p[2]) >> 3);
                if p[3] == 0xFF {
                    v |= 0x8000;
                }
                LittleEndian::write_u16(dst, v);
            }
            out
        }
        ImgType::Index8 => {
            let mut palette = Vec::<[u8; 4]>::new();
            let mut slots = HashMap::<[u8; 4], u8>::new();
            let mut indices = Vec::with_capacity(raster.len() / 4);
            for p in pixels {
                let idx = match slots.get(&p.0) {
                    Some(idx) => *idx,
                    None => {
                        if palette.len() == INDEX8_MAX_COLORS {
                            return Err(ResError::pixel(
                                "index8 raster has more than 256 distinct colors",
                            ));
                        }
                        let idx = palette.len() as u8;
                        palette.push(p.0);
                        slots.insert(p.0, idx);
                        idx
                    }
                };
                indices.push(idx);
            }
            // An empty raster still needs one entry for the palette to read back.
            if palette.is_empty() {
                palette.push([0; 4]);
            }
            let mut out: Vec<u8> = palette.iter().flat_map(|c| [c[2], c[1], c[0], c[3]]).collect();
            out.extend_from_slice(&indices);
            out
        }
    };
    Ok(out)
}

/// Decode a complete image file (thumbnail blobs, embedded GIF/JPEG chunks).
pub fn decode_file(bytes: &[u8]) -> ResResult<RgbaImage> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    Ok(dyn_img.to_rgba8())
}

fn encode_file(raster: &RgbaImage, format: ImageFormat) -> ResResult<Vec<u8>> {
    let dyn_img = DynamicImage::ImageRgba8(raster.clone());
    // JPEG has no alpha channel.
    let dyn_img = if format == ImageFormat::Jpeg {
        DynamicImage::ImageRgb8(dyn_img.to_rgb8())
    } else {
        dyn_img
    };
    let mut buf = Vec::new();
    dyn_img
        .write_to(&mut Cursor::new(&mut buf), format)
        .with_context(|| format!("encode {format:?}"))?;
    Ok(buf)
}

fn map_pixels(
    width: u32,
    height: u32,
    payload: &[u8],
    bpp: usize,
    f: impl Fn(&[u8]) -> Rgba<u8>,
) -> ResResult<RgbaImage> {
    let need = width as usize * height as usize * bpp;
    if payload.len() < need {
        return Err(ResError::pixel(format!(
            "{width}x{height} at {bpp} bytes/pixel needs {need} bytes, payload has {}",
            payload.len()
        )));
    }
    let mut out = RgbaImage::new(width, height);
    for (px, src) in out.pixels_mut().zip(payload.chunks_exact(bpp)) {
        *px = f(src);
    }
    Ok(out)
}

fn pack_565(p: &Rgba<u8>) -> u16 {
    ((u16::from(p[0]) & 0xF8) << 8) | ((u16::from(p[1]) & 0xFC) << 3) | (u16::from(p[2]) >> 3)
}

fn unpack_565(v: u16) -> [u8; 3] {
    [
        expand5((v >> 11) & 0x1F),
        expand6((v >> 5) & 0x3F),
        expand5(v & 0x1F),
    ]
}

fn expand5(v: u16) -> u8 {
    ((v << 3) | (v >> 2)) as u8
}

fn expand6(v: u16) -> u8 {
    ((v << 2) | (v >> 4)) as u8
}

#[cfg(test)]
#[path = "../../tests/unit/raster/pixel.rs"]
mod tests;
