use clap::{Parser, Subcommand};
use log::{LevelFilter, error};
use std::path::PathBuf;

use lesionprep::{
    CANONICAL_SIZE, CanonicalResizer, Catalog, ExtractJob, FailurePolicy, JobReport, RasterKind, ResizeJob,
};

#[derive(Parser)]
#[command(name = "lesionprep")]
#[command(about = "Normalize endoscopy frames, masks and lesion boxes for training")]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resize every image of a folder to a canonical square
    Resize {
        /// Folder with the source images
        #[arg(value_name = "SRC")]
        source: PathBuf,

        /// Folder the resized images are written to
        #[arg(value_name = "DST")]
        destination: PathBuf,

        /// Treat inputs as single-channel masks
        #[arg(long)]
        masks: bool,

        /// Folder with one box file per image
        #[arg(long, value_name = "DIR", requires = "boxes_dst")]
        boxes_src: Option<PathBuf>,

        /// Folder the remapped box files are written to
        #[arg(long, value_name = "DIR", requires = "boxes_src")]
        boxes_dst: Option<PathBuf>,

        /// Side length of the output square
        #[arg(long, default_value_t = CANONICAL_SIZE, value_parser = clap::value_parser!(u32).range(1..))]
        size: u32,

        /// Keep going after a file fails and report failures at the end
        #[arg(long)]
        keep_going: bool,
    },

    /// Derive box files from per-category mask planes (`<image>_<category>.png`)
    Extract {
        /// Folder with the mask planes
        #[arg(value_name = "MASK_DIR")]
        mask_dir: PathBuf,

        /// Folder the box files are written to
        #[arg(value_name = "DST")]
        destination: PathBuf,

        /// Keep going after an image fails and report failures at the end
        #[arg(long)]
        keep_going: bool,
    },
}

fn policy(keep_going: bool) -> FailurePolicy {
    if keep_going {
        FailurePolicy::CollectAll
    } else {
        FailurePolicy::FailFast
    }
}

fn summarize(report: &JobReport) -> anyhow::Result<()> {
    println!("Files written: {}", report.written());

    let failures: Vec<_> = report.failures().collect();
    if failures.is_empty() {
        return Ok(());
    }

    for (path, err) in &failures {
        error!("{}: {}", path.display(), err);
    }
    anyhow::bail!("{} files failed", failures.len())
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let level = if args.verbose { LevelFilter::Debug } else { LevelFilter::Info };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    let catalog = Catalog::default();

    let report = match args.command {
        Command::Resize {
            source,
            destination,
            masks,
            boxes_src,
            boxes_dst,
            size,
            keep_going,
        } => {
            let kind = if masks { RasterKind::Mask } else { RasterKind::Color };
            let mut job = ResizeJob::new(source, destination)
                .with_kind(kind)
                .with_resizer(CanonicalResizer::new().with_size(size))
                .with_policy(policy(keep_going));

            if let (Some(src), Some(dst)) = (boxes_src, boxes_dst) {
                job = job.with_boxes(src, dst);
            }

            job.run(&catalog)?
        }
        Command::Extract {
            mask_dir,
            destination,
            keep_going,
        } => ExtractJob::new(mask_dir, destination)
            .with_policy(policy(keep_going))
            .run(&catalog)?,
    };

    summarize(&report)
}
