#![allow(dead_code)]

use image::{GrayImage, Luma, Rgb, RgbImage};
use std::fs;
use std::path::{Path, PathBuf};

/// A fresh, empty directory under the system temp dir, unique per test.
pub fn scratch_dir(name: &str) -> PathBuf {
   let dir = std::env::temp_dir().join(format!("idx-convert-{}-{}", name, std::process::id()));
   if dir.exists() {
      fs::remove_dir_all(&dir).unwrap();
   }
   fs::create_dir_all(&dir).unwrap();
   dir
}

/// Grayscale gradient where pixel (x, y) = `seed + x + y * width`.
pub fn gradient(width: u32, height: u32, seed: u8) -> GrayImage {
   GrayImage::from_fn(width, height, |x, y| {
      Luma([seed.wrapping_add((x + y * width) as u8)])
   })
}

pub fn write_gray(dir: &Path, name: &str, img: &GrayImage) -> PathBuf {
   let path = dir.join(name);
   img.save(&path).unwrap();
   path
}

pub fn write_rgb(dir: &Path, name: &str, width: u32, height: u32, color: [u8; 3]) -> PathBuf {
   let path = dir.join(name);
   RgbImage::from_pixel(width, height, Rgb(color)).save(&path).unwrap();
   path
}

/// Header plus `count` records of `rows x cols` bytes counting up from zero.
pub fn sequential_idx(magic: i32, count: u32, rows: u32, cols: u32) -> Vec<u8> {
   let mut data = Vec::new();
   data.extend_from_slice(&magic.to_be_bytes());
   data.extend_from_slice(&count.to_be_bytes());
   data.extend_from_slice(&rows.to_be_bytes());
   data.extend_from_slice(&cols.to_be_bytes());
   let record = (rows * cols) as usize;
   for _ in 0..count {
      data.extend((0..record).map(|i| (i % 256) as u8));
   }
   data
}
