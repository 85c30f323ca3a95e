//! inkpage CLI - handwritten note tool

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use inkpage::format::is_pdf;
use inkpage::{
    BackgroundFlags, CreateOptions, DocumentStore, Handle, ImageFormat, IngestTarget, PageFormat,
    PdfImportMode, RawPoint, RenderOptions, RulingStyle, StoreConfig, ToolKind,
};

#[derive(Parser)]
#[command(name = "inkpage")]
#[command(version)]
#[command(about = "Create, inspect and rasterize handwritten notes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a blank note
    New {
        /// Output note file
        #[arg(value_name = "FILE")]
        output: PathBuf,

        /// Paper size
        #[arg(long, value_enum, default_value = "a4")]
        paper: Paper,

        /// Page ruling
        #[arg(long, value_enum, default_value = "plain")]
        ruling: Ruling,

        /// Number of pages
        #[arg(short, long, default_value = "1")]
        pages: usize,

        /// Document title
        #[arg(long)]
        title: Option<String>,
    },

    /// Show note information
    Info {
        /// Input note or PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Build a note from the pages of a PDF
    #[command(name = "import-pdf")]
    ImportPdf {
        /// Input PDF file
        #[arg(value_name = "PDF")]
        pdf: PathBuf,

        /// Output note file
        #[arg(value_name = "FILE")]
        output: PathBuf,

        /// Append the PDF pages to this existing note instead
        #[arg(long, value_name = "NOTE")]
        append_to: Option<PathBuf>,
    },

    /// Render one page to an image
    Render {
        /// Input note or PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output image file
        #[arg(value_name = "IMAGE")]
        output: PathBuf,

        /// Page number (1-based)
        #[arg(short, long, default_value = "1")]
        page: usize,

        #[command(flatten)]
        raster: RasterArgs,
    },

    /// Render every page into a directory
    Export {
        /// Input note or PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output directory
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,

        #[command(flatten)]
        raster: RasterArgs,
    },

    /// Add a stroke to a note from a list of points
    Draw {
        /// Note file to modify
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Points as "x,y[,pressure];x,y[,pressure];..."
        #[arg(long)]
        points: String,

        /// Drawing tool
        #[arg(long, value_enum, default_value = "pen")]
        tool: Tool,

        /// Page number (1-based)
        #[arg(short, long, default_value = "1")]
        page: usize,
    },

    /// Show version information
    Version,
}

#[derive(clap::Args)]
struct RasterArgs {
    /// Target width in pixels (0 renders at 1 px per point)
    #[arg(long, default_value = "0")]
    width: u32,

    /// Target height in pixels (0 renders at 1 px per point)
    #[arg(long, default_value = "0")]
    height: u32,

    /// Image format
    #[arg(long, value_enum)]
    format: Option<Format>,

    /// Skip PDF backgrounds
    #[arg(long)]
    no_pdf: bool,

    /// Skip ruling on plain pages
    #[arg(long)]
    no_ruling: bool,

    /// Ignore pen pressure
    #[arg(long)]
    no_pressure: bool,
}

impl RasterArgs {
    fn options(&self, fallback: ImageFormat) -> RenderOptions {
        RenderOptions::new()
            .with_background(BackgroundFlags {
                show_pdf: !self.no_pdf,
                show_image: true,
                show_ruling: !self.no_ruling,
            })
            .with_format(self.format.map(Into::into).unwrap_or(fallback))
            .with_pressure(!self.no_pressure)
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Paper {
    A4,
    Letter,
}

impl From<Paper> for PageFormat {
    fn from(paper: Paper) -> Self {
        match paper {
            Paper::A4 => PageFormat::A4,
            Paper::Letter => PageFormat::Letter,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Ruling {
    Plain,
    Lined,
    Ruled,
    Graph,
    Dotted,
}

impl From<Ruling> for RulingStyle {
    fn from(ruling: Ruling) -> Self {
        match ruling {
            Ruling::Plain => RulingStyle::Plain,
            Ruling::Lined => RulingStyle::Lined,
            Ruling::Ruled => RulingStyle::Ruled,
            Ruling::Graph => RulingStyle::Graph,
            Ruling::Dotted => RulingStyle::Dotted,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Format {
    Png,
    Jpeg,
}

impl From<Format> for ImageFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Png => ImageFormat::Png,
            Format::Jpeg => ImageFormat::Jpeg,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Tool {
    Pen,
    Eraser,
    Highlighter,
    Pencil,
}

impl From<Tool> for ToolKind {
    fn from(tool: Tool) -> Self {
        match tool {
            Tool::Pen => ToolKind::Pen,
            Tool::Eraser => ToolKind::Eraser,
            Tool::Highlighter => ToolKind::Highlighter,
            Tool::Pencil => ToolKind::Pencil,
        }
    }
}

type CliResult = Result<(), Box<dyn std::error::Error>>;

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let store = DocumentStore::new();
    store.init(StoreConfig::default());

    let result = match cli.command {
        Commands::New {
            output,
            paper,
            ruling,
            pages,
            title,
        } => cmd_new(&store, &output, paper, ruling, pages, title),
        Commands::Info { input } => cmd_info(&store, &input),
        Commands::ImportPdf {
            pdf,
            output,
            append_to,
        } => cmd_import_pdf(&store, &pdf, &output, append_to.as_deref()),
        Commands::Render {
            input,
            output,
            page,
            raster,
        } => cmd_render(&store, &input, &output, page, &raster),
        Commands::Export {
            input,
            output,
            raster,
        } => cmd_export(&store, &input, output.as_deref(), &raster),
        Commands::Draw {
            input,
            points,
            tool,
            page,
        } => cmd_draw(&input, &points, tool, page),
        Commands::Version => {
            cmd_version();
            Ok(())
        }
    };

    store.shutdown();

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

/// Open a note container, or a PDF as a fresh note.
fn open_input(store: &DocumentStore, input: &Path) -> inkpage::Result<Handle> {
    log::debug!("Opening {}", input.display());
    if is_pdf(input) {
        store.open_pdf(input, false)
    } else {
        store.open(input)
    }
}

fn page_index(page: usize) -> Result<usize, String> {
    page.checked_sub(1)
        .ok_or_else(|| "Page numbers start at 1".to_string())
}

fn cmd_new(
    store: &DocumentStore,
    output: &Path,
    paper: Paper,
    ruling: Ruling,
    pages: usize,
    title: Option<String>,
) -> CliResult {
    if pages == 0 {
        return Err("A note needs at least one page".into());
    }
    let mut options = CreateOptions::new()
        .with_format(paper.into())
        .with_ruling(ruling.into());
    if let Some(title) = title {
        options = options.with_title(title);
    }

    let doc = store.create(&options)?;
    for _ in 1..pages {
        store.add_page(doc, &options)?;
    }
    store.save(doc, output)?;
    store.close(doc)?;

    println!("{} {} ({} pages)", "Created".green(), output.display(), pages);
    Ok(())
}

fn cmd_info(store: &DocumentStore, input: &Path) -> CliResult {
    let doc = open_input(store, input)?;
    let cached = store.pdf_cache_len(doc)?;

    store.with_document(doc, |document| {
        println!("{}", "Note Information".cyan().bold());
        println!("{}", "─".repeat(40).dimmed());
        println!("{}: {}", "File".bold(), input.display());
        println!("{}: {}", "Pages".bold(), document.page_count());
        println!("{}: {}", "Strokes".bold(), document.stroke_count());

        if let Some(ref title) = document.metadata.title {
            println!("{}: {}", "Title".bold(), title);
        }
        if let Some(ref created) = document.metadata.created {
            println!("{}: {}", "Created".bold(), created);
        }
        if let Some(ref modified) = document.metadata.modified {
            println!("{}: {}", "Modified".bold(), modified);
        }
        if let Some(ref pdf) = document.pdf_path {
            println!("{}: {} ({} pages cached)", "PDF".bold(), pdf.display(), cached);
        }

        println!();
        println!("{}", "Pages".cyan().bold());
        println!("{}", "─".repeat(40).dimmed());
        for (index, page) in document.pages.iter().enumerate() {
            let background = match page.pdf_page_number() {
                Some(n) => format!("PDF page {}", n + 1),
                None => format!("{:?}", page.background),
            };
            println!(
                "  {:>3}  {:.1} x {:.1} pt  {} strokes  {}",
                index + 1,
                page.width,
                page.height,
                page.element_count(),
                background.dimmed()
            );
        }
    })?;

    store.close(doc)?;
    Ok(())
}

fn cmd_import_pdf(
    store: &DocumentStore,
    pdf: &Path,
    output: &Path,
    append_to: Option<&Path>,
) -> CliResult {
    let doc = match append_to {
        Some(note) => {
            let doc = store.open(note)?;
            store.import_pdf(doc, pdf, PdfImportMode::Append)?;
            doc
        }
        None => store.open_pdf(pdf, true)?,
    };
    let pages = store.page_count(doc)?;
    store.save(doc, output)?;
    store.close(doc)?;

    println!("{} {} ({} pages)", "Saved to".green(), output.display(), pages);
    Ok(())
}

fn cmd_render(
    store: &DocumentStore,
    input: &Path,
    output: &Path,
    page: usize,
    raster: &RasterArgs,
) -> CliResult {
    let fallback = output
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(ImageFormat::from_extension)
        .unwrap_or_default();
    let options = raster.options(fallback);

    let doc = open_input(store, input)?;
    store.render(
        doc,
        page_index(page)?,
        output,
        raster.width,
        raster.height,
        &options,
    )?;
    store.close(doc)?;

    println!("{} {}", "Saved to".green(), output.display());
    Ok(())
}

fn cmd_export(
    store: &DocumentStore,
    input: &Path,
    output: Option<&Path>,
    raster: &RasterArgs,
) -> CliResult {
    let output_dir = output.map(|p| p.to_path_buf()).unwrap_or_else(|| {
        let stem = input.file_stem().unwrap_or_default().to_string_lossy();
        PathBuf::from(format!("{}_pages", stem))
    });
    let options = raster.options(ImageFormat::Png);

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.enable_steady_tick(Duration::from_millis(100));

    pb.set_message("Opening...");
    let doc = open_input(store, input)?;
    let pages = store.page_count(doc)?;

    pb.set_message(format!("Rendering {} pages...", pages));
    let paths = store.export(doc, &output_dir, raster.width, raster.height, &options)?;
    store.close(doc)?;

    pb.finish_with_message("Done!");

    println!("\n{}", "Output files:".green().bold());
    for (i, path) in paths.iter().enumerate() {
        let branch = if i + 1 == paths.len() { "└─" } else { "├─" };
        let name = path.file_name().unwrap_or_default().to_string_lossy();
        println!("  {} {}", branch.dimmed(), name);
    }
    Ok(())
}

/// Parse `"x,y[,pressure];..."` into pen samples.
fn parse_points(points: &str, tool: ToolKind) -> Result<Vec<RawPoint>, String> {
    points.split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .enumerate()
        .map(|(i, item)| {
            let values = item
                .split(',')
                .map(|v| v.trim().parse::<f64>())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| format!("Invalid point '{}': {}", item, e))?;
            let point = match values.as_slice() {
                [x, y] => RawPoint::new(*x, *y),
                [x, y, p] => RawPoint::new(*x, *y).with_pressure(*p),
                _ => return Err(format!("Invalid point '{}': expected x,y[,pressure]", item)),
            };
            Ok(point.with_tool(tool).at(i as i64))
        })
        .collect()
}

fn cmd_draw(input: &Path, points: &str, tool: Tool, page: usize) -> CliResult {
    let points = parse_points(points, tool.into())?;
    if points.is_empty() {
        return Err("No points given".into());
    }

    // A dedicated store so the ingest target can point at the requested page
    let store = DocumentStore::new();
    let target = IngestTarget::new(page_index(page)?, 0);
    store.init(StoreConfig::default().with_ingest_target(target));

    let doc = store.open(input)?;
    store.ingest(doc, &points)?;
    store.save(doc, input)?;
    store.close(doc)?;

    println!(
        "{} {}-point stroke to page {} of {}",
        "Added".green(),
        points.len(),
        page,
        input.display()
    );
    Ok(())
}

fn cmd_version() {
    println!("{} {}", "inkpage".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Handwritten note rendering tool");
    println!();
    println!("License: MIT");
}
