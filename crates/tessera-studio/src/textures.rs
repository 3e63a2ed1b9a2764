//! Procedural textures registered with the world renderer.

use anyhow::Result;
use tessera_engine::draw::TextureHandle;
use tessera_engine::render::{RenderCtx, WorldRenderer};

pub const FLOOR_STONE: TextureHandle = TextureHandle(1);
pub const FLOOR_MOSS: TextureHandle = TextureHandle(2);
pub const DETAIL_GRIT: TextureHandle = TextureHandle(3);
pub const LIGHTMAP: TextureHandle = TextureHandle(4);
pub const LIGHT_GLOW: TextureHandle = TextureHandle(5);
pub const SHADOW_BLOB: TextureHandle = TextureHandle(6);
pub const SHINY_ENV: TextureHandle = TextureHandle(7);
pub const GLASS: TextureHandle = TextureHandle(8);
pub const PILLAR: TextureHandle = TextureHandle(9);

const SIZE: u32 = 64;

/// RGBA8 image, row-major.
pub struct Image {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

pub fn checker(size: u32, cell: u32, a: [u8; 4], b: [u8; 4]) -> Image {
    let cell = cell.max(1);
    let mut rgba = Vec::with_capacity((size * size * 4) as usize);
    for y in 0..size {
        for x in 0..size {
            let odd = ((x / cell) + (y / cell)) % 2 == 1;
            rgba.extend_from_slice(if odd { &b } else { &a });
        }
    }
    Image {
        width: size,
        height: size,
        rgba,
    }
}

/// Radial falloff from `center` color at the middle to `edge` at the border.
pub fn radial(size: u32, center: [u8; 4], edge: [u8; 4]) -> Image {
    let mut rgba = Vec::with_capacity((size * size * 4) as usize);
    let half = size as f32 * 0.5;
    for y in 0..size {
        for x in 0..size {
            let dx = (x as f32 + 0.5 - half) / half;
            let dy = (y as f32 + 0.5 - half) / half;
            let t = (dx * dx + dy * dy).sqrt().min(1.0);
            for k in 0..4 {
                let v = center[k] as f32 * (1.0 - t) + edge[k] as f32 * t;
                rgba.push(v.round() as u8);
            }
        }
    }
    Image {
        width: size,
        height: size,
        rgba,
    }
}

fn library() -> Vec<(TextureHandle, Image)> {
    vec![
        (FLOOR_STONE, checker(SIZE, 8, [120, 120, 128, 255], [96, 96, 104, 255])),
        (FLOOR_MOSS, checker(SIZE, 8, [70, 110, 60, 255], [52, 88, 44, 255])),
        (DETAIL_GRIT, checker(SIZE, 2, [255, 255, 255, 255], [200, 200, 200, 255])),
        (LIGHTMAP, radial(SIZE, [255, 240, 220, 255], [90, 90, 110, 255])),
        (LIGHT_GLOW, radial(SIZE, [255, 220, 160, 255], [0, 0, 0, 0])),
        (SHADOW_BLOB, radial(SIZE, [0, 0, 0, 200], [0, 0, 0, 0])),
        (SHINY_ENV, checker(SIZE, 16, [180, 200, 255, 96], [90, 110, 160, 64])),
        (GLASS, checker(SIZE, 32, [160, 220, 255, 110], [140, 200, 240, 90])),
        (PILLAR, checker(SIZE, 4, [150, 130, 100, 255], [130, 110, 80, 255])),
    ]
}

/// Uploads every texture the scene references.
pub fn register_all(renderer: &mut WorldRenderer, ctx: &RenderCtx<'_>) -> Result<()> {
    for (handle, image) in library() {
        renderer.register_texture(ctx, handle, image.width, image.height, &image.rgba)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn images_have_rgba8_size() {
        for (handle, image) in library() {
            assert_eq!(
                image.rgba.len(),
                (image.width * image.height * 4) as usize,
                "texture {}",
                handle.0
            );
        }
    }

    #[test]
    fn checker_alternates_cells() {
        let img = checker(4, 2, [1, 1, 1, 1], [2, 2, 2, 2]);
        assert_eq!(&img.rgba[0..4], &[1, 1, 1, 1]);
        // (2, 0) is the next cell over
        assert_eq!(&img.rgba[8..12], &[2, 2, 2, 2]);
    }

    #[test]
    fn radial_fades_to_edge() {
        let img = radial(16, [255, 255, 255, 255], [0, 0, 0, 0]);
        let center = ((8 * 16 + 8) * 4) as usize;
        assert!(img.rgba[center] > 200);
        assert!(img.rgba[0] < 40);
    }
}
