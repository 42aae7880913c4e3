use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};

pub fn check_exists<P: AsRef<Path> + ?Sized>(path: &P) -> bool {
   path.as_ref().exists()
}

/// A bar in the same style for every conversion; hidden when `visible` is off.
pub fn progress_bar(len: u64, message: &str, visible: bool) -> Result<ProgressBar> {
   if !visible {
      return Ok(ProgressBar::hidden());
   }

   let pb = ProgressBar::new(len);
   pb.set_style(
      ProgressStyle::default_bar()
         .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.green}] {pos}/{len} ({per_sec}, {eta})\n{msg}")?
         .progress_chars("#>-"),
   );
   pb.set_message(message.to_string());
   Ok(pb)
}

pub fn ensure_parent_dir(path: &Path) -> Result<()> {
   if let Some(parent) = path.parent() {
      if !parent.as_os_str().is_empty() {
         fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
      }
   }
   Ok(())
}

/// True when the file extension is one of `extensions`, ignoring case.
pub fn has_extension(path: &Path, extensions: &[String]) -> bool {
   path
      .extension()
      .and_then(|ext| ext.to_str())
      .map(|ext| extensions.iter().any(|allowed| allowed.eq_ignore_ascii_case(ext)))
      .unwrap_or(false)
}

/// Regular files directly inside `dir` with an accepted extension, sorted by name.
pub fn list_images(dir: &Path, extensions: &[String]) -> Result<Vec<PathBuf>> {
   let mut paths = Vec::new();
   for entry in fs::read_dir(dir).with_context(|| format!("Failed to read {}", dir.display()))? {
      let path = entry?.path();
      if path.is_file() && has_extension(&path, extensions) {
         paths.push(path);
      }
   }
   paths.sort();
   Ok(paths)
}

/// Width of the zero-padded index for `count` outputs, never below `min_width`.
pub fn index_width(count: usize, min_width: usize) -> usize {
   let digits = count.saturating_sub(1).to_string().len();
   digits.max(min_width)
}

#[cfg(test)]
mod tests {
   use super::*;

   fn exts() -> Vec<String> {
      vec!["png".to_string(), "jpg".to_string()]
   }

   #[test]
   fn extension_match_ignores_case() {
      assert!(has_extension(Path::new("a/b.PNG"), &exts()));
      assert!(has_extension(Path::new("c.jpg"), &exts()));
      assert!(!has_extension(Path::new("c.txt"), &exts()));
      assert!(!has_extension(Path::new("png"), &exts()));
   }

   #[test]
   fn index_width_grows_with_count() {
      assert_eq!(index_width(0, 5), 5);
      assert_eq!(index_width(100000, 5), 5);
      assert_eq!(index_width(100001, 5), 6);
      assert_eq!(index_width(11, 1), 2);
   }

   #[test]
   fn hidden_bar_when_disabled() {
      assert!(progress_bar(10, "x", false).unwrap().is_hidden());
   }
}
