//! Image decoding, collage compositing and data-URL encoding
//!
//! Decoding and resizing are CPU-bound and run on the blocking pool.

use std::io::Cursor;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use futures::future::join_all;
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use tracing::warn;

use super::photo_fetcher::FetchError;
use crate::models::PhotoInput;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const LABEL_RED: Rgb<u8> = Rgb([255, 0, 0]);

/// Top-left corner of a cell's position label
const LABEL_ORIGIN: (u32, u32) = (20, 15);
/// Pixel size of one font dot
const LABEL_SCALE: u32 = 6;

/// 3×5 dot patterns for 0-9, one row per entry, high bit on the left
const DIGIT_GLYPHS: [[u8; 5]; 10] = [
    [0b111, 0b101, 0b101, 0b101, 0b111],
    [0b010, 0b110, 0b010, 0b010, 0b111],
    [0b111, 0b001, 0b111, 0b100, 0b111],
    [0b111, 0b001, 0b111, 0b001, 0b111],
    [0b101, 0b101, 0b111, 0b001, 0b001],
    [0b111, 0b100, 0b111, 0b001, 0b111],
    [0b111, 0b100, 0b111, 0b101, 0b111],
    [0b111, 0b001, 0b010, 0b010, 0b010],
    [0b111, 0b101, 0b111, 0b101, 0b111],
    [0b111, 0b101, 0b111, 0b001, 0b111],
];

/// Decode downloaded bytes as RGB
pub fn decode_rgb(bytes: &[u8]) -> Result<RgbImage, FetchError> {
    image::load_from_memory(bytes)
        .map(|img| img.to_rgb8())
        .map_err(|e| FetchError::Decode(e.to_string()))
}

/// Decode every photo on the blocking pool, dropping the undecodable ones
///
/// Output keeps input order.
pub async fn decode_all(photos: Vec<(PhotoInput, Vec<u8>)>) -> Vec<(PhotoInput, RgbImage)> {
    let tasks = photos.into_iter().map(|(photo, bytes)| {
        tokio::task::spawn_blocking(move || {
            let decoded = decode_rgb(&bytes);
            (photo, decoded)
        })
    });

    join_all(tasks)
        .await
        .into_iter()
        .filter_map(|joined| match joined {
            Ok((photo, Ok(img))) => Some((photo, img)),
            Ok((photo, Err(e))) => {
                warn!(photo_id = %photo.id, error = %e, "Dropping photo");
                None
            }
            Err(e) => {
                warn!(error = %e, "Decode task failed");
                None
            }
        })
        .collect()
}

/// Fit `img` inside a `size`×`size` white square, centred
///
/// Images are only ever shrunk.
pub fn thumbnail_with_padding(img: &RgbImage, size: u32) -> RgbImage {
    let mut canvas = RgbImage::from_pixel(size, size, WHITE);

    let fitted = if img.width() > size || img.height() > size {
        DynamicImage::ImageRgb8(img.clone())
            .resize(size, size, FilterType::Lanczos3)
            .to_rgb8()
    } else {
        img.clone()
    };

    let x = (size - fitted.width()) / 2;
    let y = (size - fitted.height()) / 2;
    imageops::overlay(&mut canvas, &fitted, x as i64, y as i64);
    canvas
}

/// Draw `number` in red near the top-left corner
pub fn draw_position_label(img: &mut RgbImage, number: usize) {
    let (mut pen_x, pen_y) = LABEL_ORIGIN;
    for digit in number.to_string().bytes().map(|b| (b - b'0') as usize) {
        for (row, bits) in DIGIT_GLYPHS[digit].iter().enumerate() {
            for col in 0..3u32 {
                if bits & (0b100 >> col) != 0 {
                    fill_rect(
                        img,
                        pen_x + col * LABEL_SCALE,
                        pen_y + row as u32 * LABEL_SCALE,
                        LABEL_SCALE,
                    );
                }
            }
        }
        pen_x += 4 * LABEL_SCALE;
    }
}

fn fill_rect(img: &mut RgbImage, x0: u32, y0: u32, side: u32) {
    for y in y0..(y0 + side).min(img.height()) {
        for x in x0..(x0 + side).min(img.width()) {
            img.put_pixel(x, y, LABEL_RED);
        }
    }
}

/// Lay out labelled thumbnails on a `rows`×`cols` grid
///
/// Cells beyond `rows * cols` are ignored; unused cells stay white.
pub fn compose_collage(tiles: &[(&RgbImage, usize)], rows: u32, cols: u32, thumb_size: u32) -> RgbImage {
    let mut collage = RgbImage::from_pixel(cols * thumb_size, rows * thumb_size, WHITE);

    for (cell, (img, label)) in tiles.iter().take((rows * cols) as usize).enumerate() {
        let mut thumb = thumbnail_with_padding(img, thumb_size);
        draw_position_label(&mut thumb, *label);

        let cell = cell as u32;
        let x = (cell % cols) * thumb_size;
        let y = (cell / cols) * thumb_size;
        imageops::overlay(&mut collage, &thumb, x as i64, y as i64);
    }

    collage
}

/// Split numbered images into full grids, numbering from 1
pub fn compose_collages(images: &[RgbImage], grid: u32, thumb_size: u32) -> Vec<RgbImage> {
    let per_collage = (grid * grid) as usize;
    images
        .chunks(per_collage.max(1))
        .enumerate()
        .map(|(chunk_index, chunk)| {
            let tiles: Vec<(&RgbImage, usize)> = chunk
                .iter()
                .enumerate()
                .map(|(i, img)| (img, chunk_index * per_collage + i + 1))
                .collect();
            compose_collage(&tiles, grid, grid, thumb_size)
        })
        .collect()
}

/// Shrink to `width` keeping the aspect ratio
pub fn resize_to_width(img: &RgbImage, width: u32) -> RgbImage {
    if img.width() <= width || img.width() == 0 {
        return img.clone();
    }
    let height = ((img.height() as u64 * width as u64) / img.width() as u64).max(1) as u32;
    imageops::resize(img, width, height, FilterType::Lanczos3)
}

/// Encode as a `data:image/png;base64,...` URL
pub fn png_data_url(img: &RgbImage) -> Result<String, image::ImageError> {
    data_url(img, ImageFormat::Png, "image/png")
}

/// Encode as a `data:image/jpeg;base64,...` URL
pub fn jpeg_data_url(img: &RgbImage) -> Result<String, image::ImageError> {
    data_url(img, ImageFormat::Jpeg, "image/jpeg")
}

fn data_url(img: &RgbImage, format: ImageFormat, mime: &str) -> Result<String, image::ImageError> {
    let mut buffer = Cursor::new(Vec::new());
    img.write_to(&mut buffer, format)?;
    Ok(format!("data:{};base64,{}", mime, STANDARD.encode(buffer.into_inner())))
}
