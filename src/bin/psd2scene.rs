use std::{
    fs::File,
    io::{BufWriter, Write as _},
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};

use psd2scene::{
    BuildOptions, FontDatabase, FontPolicy, FontResolver, ImageExport, ImageStore, ImportSession,
    MaterializeOptions, RasterOptions, SceneBuilder, SceneDocument, SceneHost, SourceDocument,
    SourceLayer,
};

#[derive(Parser, Debug)]
#[command(name = "psd2scene", version)]
struct Cli {
    /// Raise log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert a parsed layer document into a scene document.
    Build(BuildArgs),
    /// Materialize a scene document into the in-memory host.
    Import(ImportArgs),
    /// Print the layer tree of a parsed document.
    Tree(TreeArgs),
}

#[derive(Args, Debug)]
struct BuildArgs {
    /// Input layer document JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output directory for the scene JSON and its images.
    #[arg(long)]
    out: PathBuf,

    /// Write images to disk as they are met instead of holding them in memory.
    #[arg(long, conflicts_with = "inline_images")]
    stream_images: bool,

    /// Embed images as base64 in the scene JSON.
    #[arg(long)]
    inline_images: bool,

    /// Splice group contents into their parents.
    #[arg(long)]
    flatten_groups: bool,

    /// JSON file with option overrides.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ImportArgs {
    /// Input scene document JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Directory holding the scene's image files. Defaults to `images/` next to the input.
    #[arg(long, conflicts_with = "manifest")]
    images: Option<PathBuf>,

    /// JSON object mapping image file names to base64 payloads.
    #[arg(long)]
    manifest: Option<PathBuf>,

    /// Write the host tree as JSON.
    #[arg(long)]
    dump: Option<PathBuf>,

    /// Rasterize the imported tree to a PNG.
    #[arg(long)]
    render: Option<PathBuf>,

    /// Extra font directory, searched on top of system fonts.
    #[arg(long)]
    fonts: Option<PathBuf>,

    /// JSON file with option overrides.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct TreeArgs {
    /// Input layer document JSON.
    #[arg(long = "in")]
    in_path: PathBuf,
}

/// Option overrides read from `--config`.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct Config {
    build: BuildOptions,
    materialize: MaterializeOptions,
    fonts: FontPolicy,
    raster: RasterOptions,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::Build(args) => cmd_build(args),
        Command::Import(args) => cmd_import(args),
        Command::Tree(args) => cmd_tree(args),
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn read_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let f = File::open(path).with_context(|| format!("open config '{}'", path.display()))?;
    serde_json::from_reader(f).with_context(|| format!("parse config '{}'", path.display()))
}

fn cmd_build(args: BuildArgs) -> anyhow::Result<()> {
    let config = read_config(args.config.as_deref())?;
    let doc = SourceDocument::from_path(&args.in_path)
        .with_context(|| format!("read layer document '{}'", args.in_path.display()))?;

    std::fs::create_dir_all(&args.out)
        .with_context(|| format!("create output dir '{}'", args.out.display()))?;
    let images_dir = args.out.join("images");

    let mut options = config.build;
    if args.flatten_groups {
        options.preserve_groups = false;
    }
    if args.stream_images {
        options.images = ImageExport::Stream {
            dir: images_dir.clone(),
        };
    } else if args.inline_images {
        options.images = ImageExport::Inline;
    }

    let conversion = SceneBuilder::new(options.clone()).build(&doc)?;

    if matches!(options.images, ImageExport::Memory) && !conversion.images.is_empty() {
        std::fs::create_dir_all(&images_dir)
            .with_context(|| format!("create image dir '{}'", images_dir.display()))?;
        for (name, bytes) in &conversion.images {
            let path = images_dir.join(name);
            std::fs::write(&path, bytes)
                .with_context(|| format!("write image '{}'", path.display()))?;
        }
    }

    let scene_path = args.out.join(format!(
        "{}_scene.json",
        psd2scene::build::images::sanitize_file_name(&doc.name)
    ));
    conversion.document.to_path(&scene_path)?;
    eprintln!("wrote {}", scene_path.display());

    let s = conversion.summary;
    println!("layers:      {}", s.total_layers);
    println!("groups:      {}", s.groups);
    println!("text:        {}", s.text_layers);
    println!("images:      {}", s.image_layers);
    println!("shapes:      {}", s.shape_layers);
    println!("adjustments: {}", s.adjustment_layers);
    println!("smart:       {}", s.smart_filter_layers);
    println!("failed:      {}", s.failed_layers);
    Ok(())
}

fn cmd_import(args: ImportArgs) -> anyhow::Result<()> {
    let config = read_config(args.config.as_deref())?;
    let doc = SceneDocument::from_path(&args.in_path)
        .with_context(|| format!("read scene document '{}'", args.in_path.display()))?;

    let images = match (&args.images, &args.manifest) {
        (_, Some(manifest)) => ImageStore::from_manifest_path(manifest)?,
        (Some(dir), None) => ImageStore::directory(dir),
        (None, None) => {
            let dir = args
                .in_path
                .parent()
                .unwrap_or_else(|| Path::new("."))
                .join("images");
            if dir.is_dir() {
                ImageStore::directory(dir)
            } else {
                ImageStore::default()
            }
        }
    };

    let extra: Vec<&Path> = args.fonts.as_deref().into_iter().collect();
    let font_db = FontDatabase::system(&extra);
    let resolver = FontResolver::new(Arc::new(font_db.clone()), config.fonts);

    let mut host = SceneHost::new();
    let report = ImportSession::new(&mut host, images, resolver)
        .with_options(config.materialize)
        .import(&doc)?;

    println!("processed:   {}", report.processed);
    println!("created:     {}", report.created);
    println!("degraded:    {}", report.degraded.len());
    println!("missing img: {}", report.missing_images.len());
    for sub in &report.substitutions {
        println!("font: {} -> {} ({:?})", sub.requested, sub.resolved, sub.tier);
    }
    for d in &report.degraded {
        println!("degraded: {} ({})", d.name, d.reason);
    }

    if let Some(path) = &args.dump {
        let f = File::create(path).with_context(|| format!("create '{}'", path.display()))?;
        let mut w = BufWriter::new(f);
        host.write_dump(&mut w)?;
        w.flush().with_context(|| format!("flush '{}'", path.display()))?;
        eprintln!("wrote {}", path.display());
    }

    if let Some(path) = &args.render {
        let root = report.root.context("import finished without a root frame")?;
        let img = psd2scene::rasterize(&host, root, &font_db, &config.raster)?;
        psd2scene::write_png(&img, path)?;
        eprintln!("wrote {}", path.display());
    }
    Ok(())
}

fn cmd_tree(args: TreeArgs) -> anyhow::Result<()> {
    let doc = SourceDocument::from_path(&args.in_path)
        .with_context(|| format!("read layer document '{}'", args.in_path.display()))?;
    println!("{} ({}x{})", doc.name, doc.width, doc.height);
    let mut out = std::io::stdout().lock();
    print_layers(&mut out, &doc.layers, 1)?;
    Ok(())
}

fn print_layers(
    out: &mut impl std::io::Write,
    layers: &[SourceLayer],
    depth: usize,
) -> anyhow::Result<()> {
    // Topmost layer first, as layer panels list them.
    for layer in layers.iter().rev() {
        let mut tags = Vec::new();
        if layer.clipping {
            tags.push("clip");
        }
        if layer.mask.is_some() {
            tags.push("mask");
        }
        if layer.active_vector_paths().is_some() {
            tags.push("vmask");
        }
        if layer.effects.is_some() {
            tags.push("fx");
        }
        if !layer.visible {
            tags.push("hidden");
        }
        let tags = if tags.is_empty() {
            String::new()
        } else {
            format!(" [{}]", tags.join(", "))
        };
        writeln!(
            out,
            "{:indent$}{} <{:?}>{tags}",
            "",
            layer.name,
            layer.kind,
            indent = depth * 2
        )?;
        print_layers(out, &layer.children, depth + 1)?;
    }
    Ok(())
}
