use image::{GrayImage, Luma};
use ndarray::{Array2, ArrayView2};
use std::fmt;
use thiserror::Error;

pub const IMAGE_MAGIC_NUMBER: i32 = 2051;
pub const HEADER_LEN: usize = 16;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdxError {
   #[error("IDX data is truncated: need {needed} bytes, only {available} available")]
   Truncated { needed: u64, available: u64 },

   #[error(
      "image {index} is {}x{}, expected {}x{} like the first image",
      .found.0, .found.1, .expected.0, .expected.1
   )]
   DimensionMismatch {
      index: usize,
      expected: (u32, u32),
      found: (u32, u32),
   },

   #[error("image {index} holds {found} samples, expected {expected}")]
   InvalidLength {
      index: usize,
      expected: usize,
      found: usize,
   },

   #[error("images must have at least one row and column, got {rows}x{cols}")]
   EmptyRecord { rows: u32, cols: u32 },

   #[error("no images to encode")]
   EmptyInput,

   #[error("{0} does not fit in a 32-bit IDX header field")]
   TooLarge(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MagicMismatch {
   pub found: i32,
}

impl fmt::Display for MagicMismatch {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      write!(
         f,
         "magic number is {}, expected {} for image data",
         self.found, IMAGE_MAGIC_NUMBER
      )
   }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdxHeader {
   pub magic: i32,
   pub count: u32,
   pub rows: u32,
   pub cols: u32,
}

impl IdxHeader {
   pub fn new(count: u32, rows: u32, cols: u32) -> IdxHeader {
      IdxHeader {
         magic: IMAGE_MAGIC_NUMBER,
         count,
         rows,
         cols,
      }
   }

   pub fn parse<D: AsRef<[u8]> + ?Sized>(data: &D) -> Result<IdxHeader, IdxError> {
      let data = data.as_ref();
      if data.len() < HEADER_LEN {
         return Err(IdxError::Truncated {
            needed: HEADER_LEN as u64,
            available: data.len() as u64,
         });
      }

      Ok(IdxHeader {
         magic: i32::from_be_bytes([data[0], data[1], data[2], data[3]]),
         count: read_u32(data, 4),
         rows: read_u32(data, 8),
         cols: read_u32(data, 12),
      })
   }

   pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
      let mut bytes = [0u8; HEADER_LEN];
      bytes[0..4].copy_from_slice(&self.magic.to_be_bytes());
      bytes[4..8].copy_from_slice(&self.count.to_be_bytes());
      bytes[8..12].copy_from_slice(&self.rows.to_be_bytes());
      bytes[12..16].copy_from_slice(&self.cols.to_be_bytes());
      bytes
   }

   pub fn record_len(&self) -> u64 {
      self.rows as u64 * self.cols as u64
   }

   // Saturates so absurd headers compare as too long instead of overflowing.
   pub fn payload_len(&self) -> u64 {
      self.record_len()
         .saturating_mul(self.count as u64)
         .saturating_add(HEADER_LEN as u64)
   }

   pub fn magic_mismatch(&self) -> Option<MagicMismatch> {
      (self.magic != IMAGE_MAGIC_NUMBER).then_some(MagicMismatch { found: self.magic })
   }
}

fn read_u32(data: &[u8], at: usize) -> u32 {
   u32::from_be_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]])
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
   pub rows: u32,
   pub cols: u32,
   pub data: Vec<u8>,
}

impl Image {
   pub fn new(rows: u32, cols: u32, data: Vec<u8>) -> Result<Image, IdxError> {
      let expected = rows as usize * cols as usize;
      if data.len() != expected {
         return Err(IdxError::InvalidLength {
            index: 0,
            expected,
            found: data.len(),
         });
      }
      Ok(Image { rows, cols, data })
   }

   pub fn from_array(array: &Array2<u8>) -> Result<Image, IdxError> {
      let (rows, cols) = array.dim();
      let rows = u32::try_from(rows).map_err(|_| IdxError::TooLarge(rows))?;
      let cols = u32::try_from(cols).map_err(|_| IdxError::TooLarge(cols))?;
      // `iter` walks in logical row-major order whatever the memory layout.
      Ok(Image {
         rows,
         cols,
         data: array.iter().copied().collect(),
      })
   }

   pub fn from_gray(img: &GrayImage) -> Image {
      Image {
         rows: img.height(),
         cols: img.width(),
         data: img.as_raw().clone(),
      }
   }

   pub fn view(&self) -> Result<ArrayView2<'_, u8>, IdxError> {
      let shape = (self.rows as usize, self.cols as usize);
      ArrayView2::from_shape(shape, &self.data).map_err(|_| IdxError::InvalidLength {
         index: 0,
         expected: shape.0 * shape.1,
         found: self.data.len(),
      })
   }

   pub fn to_image(&self) -> Result<GrayImage, IdxError> {
      let samples = self.rows as usize * self.cols as usize;
      if self.data.len() != samples {
         return Err(IdxError::InvalidLength {
            index: 0,
            expected: samples,
            found: self.data.len(),
         });
      }
      let mut img = GrayImage::new(self.cols, self.rows);
      for (i, pixel) in self.data.iter().enumerate() {
         img.put_pixel(
            (i % self.cols as usize) as u32,
            (i / self.cols as usize) as u32,
            Luma([*pixel]),
         );
      }
      Ok(img)
   }

   pub fn dimensions(&self) -> (u32, u32) {
      (self.rows, self.cols)
   }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdxImages {
   pub header: IdxHeader,
   pub images: Vec<Image>,
}

impl IdxImages {
   pub fn magic_mismatch(&self) -> Option<MagicMismatch> {
      self.header.magic_mismatch()
   }

   pub fn len(&self) -> usize {
      self.images.len()
   }

   pub fn is_empty(&self) -> bool {
      self.images.is_empty()
   }
}

/// Decodes a complete IDX image payload.
///
/// A wrong magic number is tolerated; check [`IdxImages::magic_mismatch`].
/// The header is validated and the whole declared payload is length-checked
/// before any record is allocated. Bytes past the last record are ignored.
pub fn decode<D: AsRef<[u8]> + ?Sized>(data: &D) -> Result<IdxImages, IdxError> {
   let data = data.as_ref();
   let header = IdxHeader::parse(data)?;
   if header.rows == 0 || header.cols == 0 {
      return Err(IdxError::EmptyRecord {
         rows: header.rows,
         cols: header.cols,
      });
   }

   let needed = header.payload_len();
   let available = data.len() as u64;
   if available < needed {
      return Err(IdxError::Truncated { needed, available });
   }

   // Both fit in usize now: they are bounded by `data.len()`, and
   // `record_len` is non-zero so `count` records take real bytes.
   let record_len = header.record_len() as usize;
   let count = header.count as usize;
   let images = data[HEADER_LEN..HEADER_LEN + record_len * count]
      .chunks_exact(record_len)
      .map(|record| Image {
         rows: header.rows,
         cols: header.cols,
         data: record.to_vec(),
      })
      .collect();

   Ok(IdxImages { header, images })
}

/// Encodes equally sized images into an IDX image payload.
///
/// Every image is checked before the buffer is built, so an error never
/// leaves partial output behind.
pub fn encode(images: &[Image]) -> Result<Vec<u8>, IdxError> {
   let first = images.first().ok_or(IdxError::EmptyInput)?;
   let expected = first.dimensions();
   if expected.0 == 0 || expected.1 == 0 {
      return Err(IdxError::EmptyRecord {
         rows: expected.0,
         cols: expected.1,
      });
   }

   for (index, image) in images.iter().enumerate() {
      if image.dimensions() != expected {
         return Err(IdxError::DimensionMismatch {
            index,
            expected,
            found: image.dimensions(),
         });
      }
      let samples = image.rows as usize * image.cols as usize;
      if image.data.len() != samples {
         return Err(IdxError::InvalidLength {
            index,
            expected: samples,
            found: image.data.len(),
         });
      }
   }

   let count = u32::try_from(images.len()).map_err(|_| IdxError::TooLarge(images.len()))?;
   let header = IdxHeader::new(count, expected.0, expected.1);

   let mut out = Vec::with_capacity(header.payload_len() as usize);
   out.extend_from_slice(&header.to_bytes());
   for image in images {
      out.extend_from_slice(&image.data);
   }
   Ok(out)
}
