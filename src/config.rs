use image::imageops::FilterType;
use std::path::{Path, PathBuf};

pub const DEFAULT_ROWS: u32 = 28;
pub const DEFAULT_COLS: u32 = 28;

const IMAGE_EXTENSIONS: [&str; 12] = [
   "png", "jpg", "jpeg", "bmp", "gif", "tif", "tiff", "webp", "pgm", "pbm", "ppm", "pnm",
];

/// Everything a conversion needs that is not its input or output path.
#[derive(Debug, Clone)]
pub struct ConvertConfig {
   /// Shape every encoded record is resized to, as (rows, cols).
   pub target_size: (u32, u32),
   pub filter: FilterType,
   /// Decoded files are named `<prefix><index>.<extension>`.
   pub file_prefix: String,
   pub file_extension: String,
   pub min_index_width: usize,
   pub input_extensions: Vec<String>,
   /// Appended to the binary's file name to name the manifest.
   pub manifest_suffix: String,
   pub default_binary: PathBuf,
   pub default_image_dir: PathBuf,
   pub progress: bool,
}

impl Default for ConvertConfig {
   fn default() -> Self {
      ConvertConfig {
         target_size: (DEFAULT_ROWS, DEFAULT_COLS),
         filter: FilterType::Lanczos3,
         file_prefix: "image_".to_string(),
         file_extension: "png".to_string(),
         min_index_width: 5,
         input_extensions: IMAGE_EXTENSIONS.iter().map(|ext| ext.to_string()).collect(),
         manifest_suffix: ".manifest.txt".to_string(),
         default_binary: PathBuf::from("train-images-idx3-ubyte"),
         default_image_dir: PathBuf::from("images"),
         progress: true,
      }
   }
}

impl ConvertConfig {
   /// `<binary>.manifest.txt` next to the binary, keeping any extension it has.
   pub fn manifest_path(&self, binary: &Path) -> PathBuf {
      let mut name = binary
         .file_name()
         .map(|name| name.to_os_string())
         .unwrap_or_default();
      name.push(&self.manifest_suffix);
      binary.with_file_name(name)
   }

   pub fn image_file_name(&self, index: usize, width: usize) -> String {
      format!(
         "{}{:0width$}.{}",
         self.file_prefix,
         index,
         self.file_extension,
         width = width
      )
   }
}

/// Parses `28` or `28x32` (rows x cols) into a target size.
pub fn parse_size(s: &str) -> Result<(u32, u32), String> {
   let parse = |part: &str| -> Result<u32, String> {
      match part.trim().parse::<u32>() {
         Ok(0) => Err("size must be positive".to_string()),
         Ok(n) => Ok(n),
         Err(e) => Err(format!("invalid size \"{}\": {}", part, e)),
      }
   };
   match s.split_once(['x', 'X']) {
      Some((rows, cols)) => Ok((parse(rows)?, parse(cols)?)),
      None => {
         let n = parse(s)?;
         Ok((n, n))
      }
   }
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn defaults_match_mnist() {
      let config = ConvertConfig::default();
      assert_eq!(config.target_size, (28, 28));
      assert_eq!(config.image_file_name(7, 5), "image_00007.png");
   }

   #[test]
   fn manifest_sits_next_to_binary() {
      let config = ConvertConfig::default();
      assert_eq!(
         config.manifest_path(Path::new("out/t10k-images.idx3-ubyte")),
         PathBuf::from("out/t10k-images.idx3-ubyte.manifest.txt")
      );
   }

   #[test]
   fn size_forms() {
      assert_eq!(parse_size("28"), Ok((28, 28)));
      assert_eq!(parse_size("16x32"), Ok((16, 32)));
      assert!(parse_size("0x4").is_err());
      assert!(parse_size("ax4").is_err());
   }
}
