use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use watchres::container::batch;

#[derive(Parser, Debug)]
#[command(name = "watchres", version)]
struct Cli {
    /// Log debug detail (layer records, image references).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Unpack one container into a directory.
    Unpack(UnpackArgs),
    /// Pack an unpacked directory back into a container.
    Pack(PackArgs),
    /// Unpack every matching container in a folder, in parallel.
    Batch(BatchArgs),
    /// Print the header, section layout and diagnostics of a container.
    Info(InfoArgs),
}

#[derive(Args, Debug)]
struct DecodeFlags {
    /// Assumed count for the dataType 112 area_num list.
    #[arg(long, default_value_t = 4)]
    area_num_count: usize,

    /// Minimum length for an ambiguous pair to count as an image reference.
    #[arg(long, default_value_t = watchres::container::opts::DEFAULT_MIN_CHUNK_LEN)]
    min_chunk_len: u32,

    /// Accept ambiguous pairs without an image signature.
    #[arg(long)]
    lenient: bool,
}

impl DecodeFlags {
    fn opts(&self) -> watchres::DecodeOpts {
        watchres::DecodeOpts {
            area_num_count: self.area_num_count,
            min_chunk_len: self.min_chunk_len,
            plausibility: if self.lenient {
                watchres::Plausibility::Lenient
            } else {
                watchres::Plausibility::Signature
            },
        }
    }
}

#[derive(Parser, Debug)]
struct UnpackArgs {
    /// Input container.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output directory (default: `<input>_unpacked` next to the input).
    #[arg(short, long)]
    out: Option<PathBuf>,

    #[command(flatten)]
    decode: DecodeFlags,
}

#[derive(Parser, Debug)]
struct PackArgs {
    /// Unpacked directory.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output container.
    #[arg(short, long)]
    out: PathBuf,

    /// Thumbnail offset; must be at least 32.
    #[arg(long, default_value_t = 32)]
    thumb_start: u32,

    /// Minimum reference length the output must decode under.
    #[arg(long, default_value_t = watchres::container::opts::DEFAULT_MIN_CHUNK_LEN)]
    min_chunk_len: u32,
}

#[derive(Parser, Debug)]
struct BatchArgs {
    /// Folder to scan (not recursive).
    #[arg(long, default_value = ".")]
    folder: PathBuf,

    /// File name pattern; `*` and `?` are wildcards.
    #[arg(long, default_value = batch::DEFAULT_PATTERN)]
    pattern: String,

    /// Root for output directories (default: next to each source).
    #[arg(short, long)]
    out_root: Option<PathBuf>,

    /// Worker threads (default: one per core).
    #[arg(long)]
    threads: Option<usize>,

    #[command(flatten)]
    decode: DecodeFlags,
}

#[derive(Parser, Debug)]
struct InfoArgs {
    /// Input container.
    #[arg(long = "in")]
    in_path: PathBuf,

    #[command(flatten)]
    decode: DecodeFlags,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::Unpack(args) => cmd_unpack(args),
        Command::Pack(args) => cmd_pack(args),
        Command::Batch(args) => cmd_batch(args),
        Command::Info(args) => cmd_info(args),
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn cmd_unpack(args: UnpackArgs) -> anyhow::Result<()> {
    let out = args
        .out
        .unwrap_or_else(|| batch::out_dir_for(&args.in_path, None));
    let summary = watchres::export::unpack::unpack_file(&args.in_path, &out, &args.decode.opts())
        .with_context(|| format!("unpack '{}'", args.in_path.display()))?;
    eprintln!(
        "wrote {} ({} layers, {} images, {} diagnostics)",
        summary.dir.display(),
        summary.layers,
        summary.images,
        summary.diagnostics
    );
    Ok(())
}

fn cmd_pack(args: PackArgs) -> anyhow::Result<()> {
    let opts = watchres::EncodeOpts {
        thumb_start: args.thumb_start,
        min_chunk_len: args.min_chunk_len,
    };
    let summary = watchres::export::pack::pack_dir(&args.in_path, &args.out, &opts)
        .with_context(|| format!("pack '{}'", args.in_path.display()))?;
    eprintln!("wrote {} ({} bytes)", summary.out.display(), summary.bytes);
    Ok(())
}

fn cmd_batch(args: BatchArgs) -> anyhow::Result<()> {
    let sources = batch::find_sources(&args.folder, &args.pattern)
        .with_context(|| format!("scan '{}'", args.folder.display()))?;
    if sources.is_empty() {
        anyhow::bail!(
            "no files matching '{}' in '{}'",
            args.pattern,
            args.folder.display()
        );
    }

    let opts = watchres::BatchOpts {
        threads: args.threads,
        decode: args.decode.opts(),
    };
    let outcomes = batch::unpack_all(&sources, args.out_root.as_deref(), &opts)?;

    let mut failed = 0;
    for outcome in &outcomes {
        match &outcome.result {
            Ok(summary) => eprintln!("ok   {} -> {}", outcome.source.display(), summary.dir.display()),
            Err(err) => {
                failed += 1;
                eprintln!("FAIL {}: {err}", outcome.source.display());
            }
        }
    }
    eprintln!("{} ok, {failed} failed", outcomes.len() - failed);
    if failed > 0 {
        anyhow::bail!("{failed} of {} files failed", outcomes.len());
    }
    Ok(())
}

fn cmd_info(args: InfoArgs) -> anyhow::Result<()> {
    let bytes = read_file(&args.in_path)?;
    let header = watchres::ResourceHeader::parse(&bytes)?;
    let decoded = watchres::decode(&bytes, &args.decode.opts())
        .with_context(|| format!("decode '{}'", args.in_path.display()))?;
    let layout = decoded.report.layout;
    let clock = decoded.model.clock_id;

    println!("magic        {:?}", header.magic);
    println!("clock id     {clock} internal={}", clock.internal);
    match clock.resolution() {
        Some((w, h)) => println!("resolution   {w}x{h}"),
        None => println!("resolution   unknown prefix 0x{:02X}", clock.resolution_prefix),
    }
    println!(
        "thumbnail    0x{:08X} +{}",
        layout.thumb_start, layout.thumb_len
    );
    println!("image pool   0x{:08X} +{}", layout.img_start, layout.img_len);
    println!(
        "z-image pool 0x{:08X} +{}",
        layout.z_img_start,
        layout.z_img_len()
    );
    println!(
        "layers       0x{:08X} +{}",
        layout.layer_start,
        layout.file_len - layout.layer_start as usize
    );
    println!(
        "records      {} ({} images)",
        decoded.model.layers.len(),
        decoded.model.images.len()
    );
    for diag in decoded.report.diagnostics.items() {
        println!("{:?} @0x{:08X}: {}", diag.kind, diag.offset, diag.message);
    }
    Ok(())
}

fn read_file(path: &Path) -> anyhow::Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("read '{}'", path.display()))
}
