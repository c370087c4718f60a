//! locoflight CLI - raw-pixel lossless codec command-line utility.
//!
//! Operates on flat raw pixel buffers only (never BMP/PNG); reading real
//! image file formats is left to the caller.

use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;

use locoflight::decoder::decompress;
use locoflight::encoder::compress;
use locoflight::{BitDepth, Image, ImageOut};

/// Lossless grayscale image codec with a segmented, loss-tolerant bitstream
#[derive(Parser)]
#[command(name = "locoflight")]
#[command(author = "locoflight contributors")]
#[command(version)]
#[command(about = "Segmented lossless grayscale codec for embedded/flight use", long_about = None)]
#[command(after_help = "EXAMPLES:
    locoflight encode -i pixels.raw -o out.bin -w 640 -H 480 -b 8 -n 8
    locoflight decode -i out.bin -o pixels.raw -w 640 -H 480 -b 8
    locoflight info -i out.bin -w 640 -H 480 -b 8")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode a raw pixel buffer into a segmented bitstream
    #[command(visible_alias = "e")]
    Encode {
        #[arg(short, long, help = "Path to raw pixel data (one i16 sample per pixel, native endian)")]
        input: PathBuf,
        #[arg(short, long, help = "Path for the encoded output file")]
        output: PathBuf,
        #[arg(short, long, help = "Image width in pixels")]
        width: u32,
        #[arg(short = 'H', long, help = "Image height in pixels")]
        height: u32,
        #[arg(short, long, default_value = "8", help = "Bit depth: 8 or 12")]
        bit_depth: u32,
        #[arg(short, long, default_value = "1", help = "Number of segments")]
        n_segs: u32,
    },

    /// Decode a segmented bitstream into a raw pixel buffer
    #[command(visible_alias = "d")]
    Decode {
        #[arg(short, long, help = "Path to the compressed bitstream")]
        input: PathBuf,
        #[arg(short, long, help = "Path for the decoded raw pixel output")]
        output: PathBuf,
    },

    /// Report per-segment status for a compressed bitstream
    Info {
        #[arg(short, long, help = "Path to the compressed bitstream")]
        input: PathBuf,
    },
}

fn parse_bit_depth(bits: u32) -> BitDepth {
    match bits {
        8 => BitDepth::Eight,
        12 => BitDepth::Twelve,
        other => {
            eprintln!("error: unsupported bit depth {other} (must be 8 or 12)");
            std::process::exit(1);
        }
    }
}

fn read_pixels(path: &PathBuf, count: usize) -> Vec<i16> {
    let bytes = fs::read(path).unwrap_or_else(|e| {
        eprintln!("error: failed to read {}: {e}", path.display());
        std::process::exit(1);
    });
    bytes
        .chunks_exact(2)
        .take(count)
        .map(|c| i16::from_le_bytes([c[0], c[1]]))
        .collect()
}

fn encode_image(input: PathBuf, output: PathBuf, width: u32, height: u32, bit_depth: u32, n_segs: u32) {
    let bit_depth = parse_bit_depth(bit_depth);
    let pixels = read_pixels(&input, (width * height) as usize);
    let image = Image::new(width, height, width, bit_depth, n_segs, &pixels).unwrap_or_else(|e| {
        eprintln!("error: {e}");
        std::process::exit(1);
    });

    let mut buf = vec![0u8; (width as usize) * (height as usize) * 4 + 4096];
    let (flags, compressed) = compress(&image, &mut buf);
    if flags.contains(locoflight::status::EncoderStatus::ABORT) {
        eprintln!("error: encode rejected, status = {flags:?}");
        std::process::exit(1);
    }

    // Container: bit_depth, width, height, n_segs, then each segment's
    // (start, bit_len) table, then the raw compressed bytes. This is a CLI
    // convenience framing, not part of the codec's own bitstream contract.
    let mut out = Vec::new();
    out.extend_from_slice(&width.to_le_bytes());
    out.extend_from_slice(&height.to_le_bytes());
    out.push(bit_depth.into());
    out.extend_from_slice(&(compressed.segments.len() as u32).to_le_bytes());
    for seg in &compressed.segments {
        out.extend_from_slice(&(seg.start as u32).to_le_bytes());
        out.extend_from_slice(&seg.bit_len.to_le_bytes());
    }
    out.extend_from_slice(&buf[..compressed.compressed_size_bytes]);

    fs::write(&output, &out).unwrap_or_else(|e| {
        eprintln!("error: failed to write {}: {e}", output.display());
        std::process::exit(1);
    });

    println!(
        "encoded {}x{} ({} segments) -> {} bytes, status = {:?}",
        width,
        height,
        compressed.segments.len(),
        compressed.compressed_size_bytes,
        flags
    );
}

struct Container {
    width: u32,
    height: u32,
    bit_depth: BitDepth,
    segments: Vec<(u32, u64)>,
    data_offset: usize,
}

fn read_container(input: &PathBuf) -> (Vec<u8>, Container) {
    let bytes = fs::read(input).unwrap_or_else(|e| {
        eprintln!("error: failed to read {}: {e}", input.display());
        std::process::exit(1);
    });
    let width = u32::from_le_bytes(bytes[0..4].try_into().unwrap());
    let height = u32::from_le_bytes(bytes[4..8].try_into().unwrap());
    let bit_depth = BitDepth::try_from(bytes[8]).unwrap_or_else(|_| {
        eprintln!("error: corrupt container (bad bit depth byte)");
        std::process::exit(1);
    });
    let n_segs = u32::from_le_bytes(bytes[9..13].try_into().unwrap());
    let mut segments = Vec::with_capacity(n_segs as usize);
    let mut off = 13usize;
    for _ in 0..n_segs {
        let start = u32::from_le_bytes(bytes[off..off + 4].try_into().unwrap());
        let bit_len = u64::from_le_bytes(bytes[off + 4..off + 12].try_into().unwrap());
        segments.push((start, bit_len));
        off += 12;
    }
    (bytes, Container { width, height, bit_depth, segments, data_offset: off })
}

fn decode_image(input: PathBuf, output: PathBuf) {
    let (bytes, container) = read_container(&input);
    let data = &bytes[container.data_offset..];

    let blobs: Vec<&[u8]> = container
        .segments
        .iter()
        .map(|&(start, bit_len)| {
            let start = start as usize;
            let byte_len = ((bit_len + 7) / 8) as usize;
            &data[start..start + byte_len]
        })
        .collect();

    let mut pixels = vec![0i16; (container.width * container.height) as usize];
    let mut image_out = ImageOut::new(container.width, container.height, container.width, container.bit_depth, &mut pixels)
        .unwrap_or_else(|e| {
            eprintln!("error: {e}");
            std::process::exit(1);
        });
    let (flags, results) = decompress(&blobs, &mut image_out);

    let mut out_bytes = Vec::with_capacity(pixels.len() * 2);
    for p in &pixels {
        out_bytes.extend_from_slice(&p.to_le_bytes());
    }
    fs::write(&output, &out_bytes).unwrap_or_else(|e| {
        eprintln!("error: failed to write {}: {e}", output.display());
        std::process::exit(1);
    });

    println!("decoded {}x{}, status = {:?}", container.width, container.height, flags);
    for (i, r) in results.iter().enumerate() {
        if !r.status.is_empty() {
            println!("  segment {i}: status = {:?}, missing = {}", r.status, r.n_missing_pixels);
        }
    }
}

fn show_info(input: PathBuf) {
    let (_bytes, container) = read_container(&input);
    println!(
        "{}x{}, bit_depth = {:?}, {} segments",
        container.width,
        container.height,
        container.bit_depth,
        container.segments.len()
    );
    for (i, (start, bit_len)) in container.segments.iter().enumerate() {
        println!("  segment {i}: start = {start}, bit_len = {bit_len}");
    }
}

fn main() {
    let cli = Cli::parse();
    match cli.command {
        Commands::Encode { input, output, width, height, bit_depth, n_segs } => {
            encode_image(input, output, width, height, bit_depth, n_segs);
        }
        Commands::Decode { input, output } => decode_image(input, output),
        Commands::Info { input } => show_info(input),
    }
}
