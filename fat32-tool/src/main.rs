use std::{
    fs::File,
    io::{self, Write},
    path::PathBuf,
    process,
};

use anyhow::{bail, Context, Result};
use block_device::impls::{BlockReader, FileBlockDevice};
use clap::{Parser, Subcommand};
use fat32_reader::{DeviceError, Node, OffsetRead, OpenOptions, Volume};
use log::debug;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(version, about = "Inspect FAT32 images without mounting them", long_about = None)]
struct Args {
    /// Byte offset of the volume inside the image, for whole-disk images
    #[arg(long, global = true, default_value_t = 0, value_name = "BYTES")]
    offset: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the volume geometry and FSInfo hints
    Info {
        #[arg(value_name = "IMAGE")]
        image: PathBuf,
    },
    /// List one directory
    Ls {
        #[arg(value_name = "IMAGE")]
        image: PathBuf,
        #[arg(default_value = "/")]
        path: String,
        /// Also show the volume label and `.`/`..` entries
        #[arg(short, long)]
        all: bool,
    },
    /// List a directory and everything below it
    Tree {
        #[arg(value_name = "IMAGE")]
        image: PathBuf,
        #[arg(default_value = "/")]
        path: String,
    },
    /// Write a file's content to stdout
    Cat {
        #[arg(value_name = "IMAGE")]
        image: PathBuf,
        path: String,
    },
}

impl Command {
    fn image(&self) -> &PathBuf {
        match self {
            Command::Info { image }
            | Command::Ls { image, .. }
            | Command::Tree { image, .. }
            | Command::Cat { image, .. } => image,
        }
    }
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    if let Err(e) = run(&args) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run(args: &Args) -> Result<()> {
    let image = args.command.image();
    debug!("fat32-tool {VERSION} opening {}", image.display());

    let file =
        File::open(image).with_context(|| format!("cannot open {}", image.display()))?;
    let volume = OpenOptions::new()
        .partition_offset(args.offset)
        .open(BlockReader::new(FileBlockDevice::new(file)))
        .with_context(|| format!("{} holds no FAT32 volume", image.display()))?;

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match &args.command {
        Command::Info { .. } => print_info(&volume, &mut out)?,
        Command::Ls { path, all, .. } => print_listing(&volume, path, *all, &mut out)?,
        Command::Tree { path, .. } => print_tree(&volume, path, &mut out)?,
        Command::Cat { path, .. } => {
            let node = volume.lookup(path).with_context(|| format!("cannot open {path}"))?;
            node.read_to(&mut out)
                .with_context(|| format!("cannot read {path}"))?;
        }
    }

    out.flush()?;
    Ok(())
}

fn print_info<D, W>(volume: &Volume<D>, out: &mut W) -> Result<()>
where
    D: OffsetRead,
    D::Error: DeviceError,
    W: Write,
{
    let record = volume.boot_record();

    writeln!(out, "Volume label:          {}", record.volume_label().unwrap_or("<none>"))?;
    match record.volume_serial_number() {
        Some(serial) => writeln!(out, "Volume serial number:  {serial:08X}")?,
        None => writeln!(out, "Volume serial number:  <none>")?,
    }
    writeln!(out, "Bytes per sector:      {}", record.bytes_per_sector())?;
    writeln!(out, "Sectors per cluster:   {}", record.sectors_per_cluster())?;
    writeln!(out, "Reserved sectors:      {}", record.num_reserved_sectors())?;
    writeln!(out, "Number of FATs:        {}", record.num_fats())?;
    writeln!(out, "Sectors per FAT:       {}", record.sectors_per_fat())?;
    writeln!(out, "Total sectors:         {}", record.num_sectors())?;
    writeln!(out, "Data clusters:         {}", record.cluster_count())?;
    writeln!(out, "Root directory cluster: {}", record.root_directory_cluster())?;

    match volume.fs_info()? {
        Some(info) => {
            writeln!(out, "Free clusters:         {}", hint(info.free_cluster_count()))?;
            writeln!(out, "Next free cluster:     {}", hint(info.next_free_cluster()))?;
        }
        None => writeln!(out, "FSInfo:                <not available>")?,
    }

    Ok(())
}

fn hint(value: Option<u32>) -> String {
    value.map_or_else(|| "<unknown>".to_string(), |v| v.to_string())
}

fn print_listing<D, W>(volume: &Volume<D>, path: &str, all: bool, out: &mut W) -> Result<()>
where
    D: OffsetRead,
    D::Error: DeviceError,
    W: Write,
{
    let dir = volume.lookup(path).with_context(|| format!("cannot open {path}"))?;

    for child in listed_children(&dir, all)? {
        writeln!(out, "{}", describe(&child)?)?;
    }

    Ok(())
}

fn print_tree<D, W>(volume: &Volume<D>, path: &str, out: &mut W) -> Result<()>
where
    D: OffsetRead,
    D::Error: DeviceError,
    W: Write,
{
    let dir = volume.lookup(path).with_context(|| format!("cannot open {path}"))?;
    writeln!(out, "{}", dir.display_name())?;

    let mut enclosing = vec![content_start(&dir)?];
    walk(&dir, 1, &mut enclosing, out)
}

/// Prints the subtree below `dir`. `enclosing` holds the start clusters of
/// `dir` and every directory above it.
fn walk<D, W>(
    dir: &Node<'_, D>,
    depth: usize,
    enclosing: &mut Vec<u32>,
    out: &mut W,
) -> Result<()>
where
    D: OffsetRead,
    D::Error: DeviceError,
    W: Write,
{
    for child in listed_children(dir, false)? {
        writeln!(out, "{:indent$}{}", "", child.display_name(), indent = depth * 2)?;

        if child.is_dir()? {
            let start = content_start(&child)?;
            if enclosing.contains(&start) {
                bail!(
                    "directory {} loops back to an enclosing directory",
                    child.display_name()
                );
            }

            enclosing.push(start);
            walk(&child, depth + 1, enclosing, out)
                .with_context(|| format!("cannot list {}", child.display_name()))?;
            enclosing.pop();
        }
    }

    Ok(())
}

/// First cluster of a directory's content, with the root's 0 resolved.
fn content_start<D>(dir: &Node<'_, D>) -> Result<u32>
where
    D: OffsetRead,
    D::Error: DeviceError,
{
    match dir.content_cluster()? {
        0 => Ok(dir.volume().boot_record().root_directory_cluster()),
        cluster => Ok(cluster),
    }
}

/// Children of `dir`, without the label and dot entries unless `all` is set.
fn listed_children<'v, D>(dir: &Node<'v, D>, all: bool) -> Result<Vec<Node<'v, D>>>
where
    D: OffsetRead,
    D::Error: DeviceError,
{
    let mut children = Vec::new();

    for child in dir.children()? {
        if all || !(child.is_volume_label()? || child.is_dot_entry()?) {
            children.push(child);
        }
    }

    Ok(children)
}

fn describe<D>(node: &Node<'_, D>) -> Result<String>
where
    D: OffsetRead,
    D::Error: DeviceError,
{
    let kind = if node.is_volume_label()? {
        "<VOL>"
    } else if node.is_dir()? {
        "<DIR>"
    } else {
        ""
    };

    let modified = match node.short_entry()? {
        Some(entry) => {
            let m = entry.modified();
            format!(
                "{:04}-{:02}-{:02} {:02}:{:02}",
                m.year, m.month, m.day, m.hour, m.minute
            )
        }
        None => String::new(),
    };

    Ok(format!(
        "{modified:16}  {kind:5}  {:>10}  {}",
        node.file_size()?,
        node.display_name()
    ))
}
