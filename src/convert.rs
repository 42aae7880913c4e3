use crate::config::ConvertConfig;
use crate::datasets::idx::{self, IdxHeader, IdxImages, Image, HEADER_LEN};
use crate::datasets::utils::{
   check_exists, ensure_parent_dir, index_width, list_images, progress_bar,
};
use anyhow::{Context, Result};
use image::imageops::{self, FilterType};
use image::{GrayImage, ImageFormat};
use std::fs::{self, File};
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum ConvertError {
   #[error("input \"{}\" does not exist", .0.display())]
   MissingInput(PathBuf),

   #[error("no readable images found in \"{}\"", .0.display())]
   NoImages(PathBuf),

   #[error("\"{}\" is not a file", .0.display())]
   NotAFile(PathBuf),

   #[error("cannot write images with extension \"{0}\"")]
   UnsupportedFormat(String),
}

#[derive(Debug, Clone)]
pub struct SkippedImage {
   pub path: PathBuf,
   pub reason: String,
}

#[derive(Debug)]
pub struct EncodeReport {
   pub output: PathBuf,
   pub manifest: PathBuf,
   pub encoded: usize,
   pub resized: usize,
   pub skipped: Vec<SkippedImage>,
}

#[derive(Debug)]
pub struct DecodeReport {
   pub output_dir: PathBuf,
   pub header: IdxHeader,
   pub written: Vec<PathBuf>,
}

#[derive(Debug)]
pub struct IdxInfo {
   pub header: IdxHeader,
   pub file_len: u64,
}

impl IdxInfo {
   pub fn is_complete(&self) -> bool {
      self.file_len >= self.header.payload_len()
   }
}

pub fn collect_sources(input: &Path, config: &ConvertConfig) -> Result<Vec<PathBuf>> {
   if !check_exists(input) {
      return Err(ConvertError::MissingInput(input.to_path_buf()).into());
   }
   if input.is_dir() {
      list_images(input, &config.input_extensions)
   } else {
      Ok(vec![input.to_path_buf()])
   }
}

/// Resizes to `target` (rows, cols) only when the dimensions differ.
pub fn normalize(gray: GrayImage, target: (u32, u32), filter: FilterType) -> (GrayImage, bool) {
   let (rows, cols) = target;
   if gray.dimensions() == (cols, rows) {
      (gray, false)
   } else {
      (imageops::resize(&gray, cols, rows, filter), true)
   }
}

pub fn load_source(path: &Path, config: &ConvertConfig) -> Result<(Image, bool)> {
   let gray = image::open(path)
      .with_context(|| format!("Failed to open {}", path.display()))?
      .into_luma8();
   let (gray, resized) = normalize(gray, config.target_size, config.filter);
   Ok((Image::from_gray(&gray), resized))
}

/// Encodes image files into an IDX binary and writes the filename manifest.
///
/// Sources that fail to load are skipped and listed in the report. Nothing is
/// written unless at least one image loads and the whole binary encodes.
pub fn images_to_idx(input: &Path, output: &Path, config: &ConvertConfig) -> Result<EncodeReport> {
   let sources = collect_sources(input, config)?;
   info!("Encoding {} file(s) from {}", sources.len(), input.display());

   let pb = progress_bar(sources.len() as u64, "Reading images", config.progress)?;
   let mut images = Vec::with_capacity(sources.len());
   let mut names = Vec::with_capacity(sources.len());
   let mut skipped = Vec::new();
   let mut resized = 0;

   for path in sources {
      match load_source(&path, config) {
         Ok((image, was_resized)) => {
            if was_resized {
               debug!("Resized {} to {}x{}", path.display(), image.rows, image.cols);
               resized += 1;
            }
            names.push(display_name(&path));
            images.push(image);
         }
         Err(e) => {
            warn!("Skipping {}: {:#}", path.display(), e);
            skipped.push(SkippedImage {
               path,
               reason: format!("{:#}", e),
            });
         }
      }
      pb.inc(1);
   }
   pb.finish_and_clear();

   if images.is_empty() {
      return Err(ConvertError::NoImages(input.to_path_buf()).into());
   }

   let bytes = idx::encode(&images).context("Failed to encode images")?;
   ensure_parent_dir(output)?;
   fs::write(output, &bytes).with_context(|| format!("Failed to write {}", output.display()))?;

   let manifest = config.manifest_path(output);
   fs::write(&manifest, render_manifest(&names))
      .with_context(|| format!("Failed to write {}", manifest.display()))?;

   Ok(EncodeReport {
      output: output.to_path_buf(),
      manifest,
      encoded: images.len(),
      resized,
      skipped,
   })
}

fn display_name(path: &Path) -> String {
   path
      .file_name()
      .map(|name| name.to_string_lossy().into_owned())
      .unwrap_or_else(|| path.display().to_string())
}

/// One `<index>\t<file name>` line per record, in record order.
pub fn render_manifest(names: &[String]) -> String {
   names
      .iter()
      .enumerate()
      .map(|(index, name)| format!("{}\t{}\n", index, name))
      .collect()
}

/// The format for `extension`, provided it can store 8-bit grayscale.
fn output_format(extension: &str) -> Result<ImageFormat> {
   let unsupported = || ConvertError::UnsupportedFormat(extension.to_string());
   let format = ImageFormat::from_extension(extension).ok_or_else(unsupported)?;
   if !format.writing_enabled() {
      return Err(unsupported().into());
   }
   let mut scratch = Cursor::new(Vec::new());
   GrayImage::new(1, 1)
      .write_to(&mut scratch, format)
      .map_err(|_| unsupported())?;
   Ok(format)
}

fn read_input(input: &Path) -> Result<Vec<u8>> {
   if !check_exists(input) {
      return Err(ConvertError::MissingInput(input.to_path_buf()).into());
   }
   if !input.is_file() {
      return Err(ConvertError::NotAFile(input.to_path_buf()).into());
   }
   fs::read(input).with_context(|| format!("Failed to read {}", input.display()))
}

pub fn load_idx(input: &Path) -> Result<IdxImages> {
   let data = read_input(input)?;
   let decoded =
      idx::decode(&data).with_context(|| format!("Failed to decode {}", input.display()))?;
   if let Some(mismatch) = decoded.magic_mismatch() {
      warn!("{}: {}; decoding anyway", input.display(), mismatch);
   }
   Ok(decoded)
}

/// Decodes an IDX binary into one grayscale image file per record.
///
/// The binary is decoded in full first, so a truncated file fails before any
/// image is written.
pub fn idx_to_images(
   input: &Path,
   output_dir: &Path,
   config: &ConvertConfig,
) -> Result<DecodeReport> {
   let format = output_format(&config.file_extension)?;

   let decoded = load_idx(input)?;
   let header = decoded.header;
   info!(
      "Decoding {} image(s) of {}x{} from {}",
      header.count,
      header.rows,
      header.cols,
      input.display()
   );

   fs::create_dir_all(output_dir)
      .with_context(|| format!("Failed to create {}", output_dir.display()))?;

   let width = index_width(decoded.len(), config.min_index_width);
   let pb = progress_bar(decoded.len() as u64, "Writing images", config.progress)?;
   let mut written = Vec::with_capacity(decoded.len());
   for (index, image) in decoded.images.iter().enumerate() {
      let path = output_dir.join(config.image_file_name(index, width));
      image
         .to_image()?
         .save_with_format(&path, format)
         .with_context(|| format!("Failed to save {}", path.display()))?;
      written.push(path);
      pb.inc(1);
   }
   pb.finish_and_clear();

   Ok(DecodeReport {
      output_dir: output_dir.to_path_buf(),
      header,
      written,
   })
}

/// Reads only the header of an IDX file.
pub fn inspect(input: &Path) -> Result<IdxInfo> {
   if !check_exists(input) {
      return Err(ConvertError::MissingInput(input.to_path_buf()).into());
   }
   if !input.is_file() {
      return Err(ConvertError::NotAFile(input.to_path_buf()).into());
   }

   let file = File::open(input).with_context(|| format!("Failed to open {}", input.display()))?;
   let file_len = file.metadata()?.len();
   let mut head = Vec::with_capacity(HEADER_LEN);
   file.take(HEADER_LEN as u64).read_to_end(&mut head)?;
   let header = IdxHeader::parse(&head)
      .with_context(|| format!("Failed to read header of {}", input.display()))?;

   Ok(IdxInfo { header, file_len })
}
