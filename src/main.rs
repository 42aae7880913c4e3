use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use idx_convert::config::parse_size;
use idx_convert::{idx_to_images, images_to_idx, inspect, ConvertConfig};
use std::path::PathBuf;
use tracing::Level;

// Convert between an MNIST-style IDX image file and a directory of images.

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
   #[command(subcommand)]
   command: Command,

   /// Print debug output
   #[arg(short, long, global = true, conflicts_with = "quiet")]
   verbose: bool,

   /// Only print warnings and errors, and no progress bars
   #[arg(short, long, global = true)]
   quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
   /// Pack an image or a directory of images into an IDX binary
   Encode(EncodeArgs),

   /// Unpack an IDX binary into one image file per record
   Decode(DecodeArgs),

   /// Print the header of an IDX binary
   Info {
      /// IDX image file
      input: PathBuf,
   },
}

#[derive(Args, Debug)]
struct EncodeArgs {
   /// Image file or directory of images
   input: PathBuf,

   /// Output binary [default: train-images-idx3-ubyte]
   #[arg(short, long)]
   output: Option<PathBuf>,

   /// Record size as ROWSxCOLS, or a single number for square records [default: 28x28]
   #[arg(long, value_parser = parse_size)]
   size: Option<(u32, u32)>,
}

#[derive(Args, Debug)]
struct DecodeArgs {
   /// IDX image file
   input: PathBuf,

   /// Output directory [default: images]
   #[arg(short, long)]
   output: Option<PathBuf>,

   /// Output file name prefix [default: image_]
   #[arg(long)]
   prefix: Option<String>,

   /// Output image format, by extension [default: png]
   #[arg(long)]
   format: Option<String>,
}

fn main() -> Result<()> {
   let cli = Cli::parse();

   let level = if cli.verbose {
      Level::DEBUG
   } else if cli.quiet {
      Level::WARN
   } else {
      Level::INFO
   };
   tracing_subscriber::fmt()
      .with_max_level(level)
      .with_target(false)
      .init();

   let config = build_config(&cli);

   match cli.command {
      Command::Encode(args) => {
         let output = args.output.unwrap_or_else(|| config.default_binary.clone());
         let report = images_to_idx(&args.input, &output, &config)?;
         println!(
            "Wrote {} image(s) to {} ({} resized, {} skipped)",
            report.encoded,
            report.output.display(),
            report.resized,
            report.skipped.len()
         );
         println!("Manifest: {}", report.manifest.display());
      }
      Command::Decode(args) => {
         let output = args.output.unwrap_or_else(|| config.default_image_dir.clone());
         let report = idx_to_images(&args.input, &output, &config)?;
         println!(
            "Wrote {} image(s) of {}x{} to {}",
            report.written.len(),
            report.header.rows,
            report.header.cols,
            report.output_dir.display()
         );
      }
      Command::Info { input } => {
         let info = inspect(&input)?;
         let header = info.header;
         let magic = match header.magic_mismatch() {
            Some(_) => "unexpected",
            None => "ok",
         };
         println!("magic:   {} ({})", header.magic, magic);
         println!("images:  {}", header.count);
         println!("rows:    {}", header.rows);
         println!("cols:    {}", header.cols);
         println!(
            "size:    {} bytes (header declares {})",
            info.file_len,
            header.payload_len()
         );
         if !info.is_complete() {
            println!("file is shorter than its header declares");
         }
      }
   }

   Ok(())
}

/// Applies the flags that were given on top of the default configuration.
fn build_config(cli: &Cli) -> ConvertConfig {
   let mut config = ConvertConfig {
      progress: !cli.quiet,
      ..Default::default()
   };
   match &cli.command {
      Command::Encode(args) => {
         if let Some(size) = args.size {
            config.target_size = size;
         }
      }
      Command::Decode(args) => {
         if let Some(prefix) = &args.prefix {
            config.file_prefix = prefix.clone();
         }
         if let Some(format) = &args.format {
            config.file_extension = format.clone();
         }
      }
      Command::Info { .. } => {}
   }
   config
}
