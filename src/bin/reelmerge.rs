use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use reelmerge::{
    CatalogSource, ClipEntry, FfmpegBackend, ItemDataSource, MediaKind, NoDataSource, ReelConfig,
    RenderJob, RenderWorker, Template, TemplateStore, Timeline,
};

#[derive(Parser, Debug)]
#[command(name = "reelmerge", version)]
struct Cli {
    /// Configuration JSON. Defaults apply when absent.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render template + project clips into one video (requires `ffmpeg`/`ffprobe`).
    Render(RenderArgs),
    /// Resolve `{TOKEN}` placeholders in a text for one item.
    Resolve(ResolveArgs),
    /// Inspect or write the template file.
    Template {
        #[command(subcommand)]
        cmd: TemplateCommand,
    },
    /// Print size and duration of a media file.
    Probe(ProbeArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Project JSON (`{ "clips": [...] }`) holding the user clips.
    #[arg(long)]
    project: PathBuf,

    /// Output video path.
    #[arg(long)]
    out: PathBuf,

    /// Item identifier used for placeholders.
    #[arg(long, default_value = "")]
    item: String,

    /// Catalog workbook JSON.
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Template JSON. A missing file means no template clips.
    #[arg(long)]
    template: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct ResolveArgs {
    #[arg(long)]
    text: String,

    #[arg(long)]
    item: String,

    #[arg(long)]
    catalog: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum TemplateCommand {
    /// Print the template as JSON.
    Show {
        #[arg(long)]
        template: Option<PathBuf>,
    },
    /// Save project files as the template's pre and post sections.
    Save {
        /// Project JSON whose clips become the prefix.
        #[arg(long)]
        pre: Option<PathBuf>,
        /// Project JSON whose clips become the suffix.
        #[arg(long)]
        post: Option<PathBuf>,
        #[arg(long)]
        template: Option<PathBuf>,
    },
}

#[derive(Parser, Debug)]
struct ProbeArgs {
    #[arg(long = "in")]
    in_path: PathBuf,
}

#[derive(serde::Deserialize)]
struct ProjectFile {
    #[serde(default)]
    clips: Vec<ClipEntry>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => ReelConfig::load(path)?,
        None => ReelConfig::default(),
    };
    reelmerge::logging::init_logging(&config.logging);

    match cli.cmd {
        Command::Render(args) => cmd_render(&config, args),
        Command::Resolve(args) => cmd_resolve(&config, args),
        Command::Template { cmd } => cmd_template(&config, cmd),
        Command::Probe(args) => cmd_probe(&config, args),
    }
}

fn read_project(path: &Path) -> anyhow::Result<Vec<ClipEntry>> {
    let f = File::open(path).with_context(|| format!("open project '{}'", path.display()))?;
    let project: ProjectFile = serde_json::from_reader(BufReader::new(f))
        .with_context(|| format!("parse project '{}'", path.display()))?;
    Ok(project.clips)
}

fn template_store(config: &ReelConfig, flag: Option<PathBuf>) -> TemplateStore {
    match flag.or_else(|| config.template_path.clone()) {
        Some(path) => TemplateStore::new(path),
        None => TemplateStore::default(),
    }
}

fn data_source(
    config: &ReelConfig,
    flag: Option<PathBuf>,
) -> anyhow::Result<Arc<dyn ItemDataSource + Send + Sync>> {
    match flag.or_else(|| config.catalog_path.clone()) {
        Some(path) => Ok(Arc::new(CatalogSource::load(&path)?)),
        None => Ok(Arc::new(NoDataSource)),
    }
}

fn cmd_render(config: &ReelConfig, args: RenderArgs) -> anyhow::Result<()> {
    let template = template_store(config, args.template).load_or_default()?;
    let mut timeline = Timeline::new();
    template.apply_to(&mut timeline);
    for clip in read_project(&args.project)? {
        timeline.push_clip(clip)?;
    }

    let source = data_source(config, args.catalog)?;
    let backend = FfmpegBackend::new(config.ffmpeg.clone(), config.encode.fps)?;

    let mut worker = RenderWorker::new();
    worker.start(
        backend,
        source,
        RenderJob {
            timeline,
            output_path: args.out,
            item_identifier: args.item,
            settings: config.encode.clone(),
        },
    )?;

    let outcome = worker
        .wait(|p| eprintln!("{p}"))
        .context("render worker exited without reporting an outcome")?;

    if let Some(report) = &outcome.report {
        for s in &report.skipped {
            eprintln!(
                "skipped clip #{} '{}': {}",
                s.index + 1,
                s.path.display(),
                s.reason
            );
        }
        eprintln!(
            "{} clip(s) rendered at {}",
            report.processed_count, report.canonical_size
        );
    }
    if !outcome.success {
        anyhow::bail!("{}", outcome.message);
    }
    println!("{}", outcome.message);
    Ok(())
}

fn cmd_resolve(config: &ReelConfig, args: ResolveArgs) -> anyhow::Result<()> {
    let source = data_source(config, args.catalog)?;
    let text = reelmerge::placeholder::resolve(source.as_ref(), &args.text, &args.item);
    println!("{text}");
    Ok(())
}

fn cmd_template(config: &ReelConfig, cmd: TemplateCommand) -> anyhow::Result<()> {
    match cmd {
        TemplateCommand::Show { template } => {
            let store = template_store(config, template);
            let template = store.load()?;
            let json = serde_json::to_string_pretty(&template).context("serialize template")?;
            println!("{json}");
        }
        TemplateCommand::Save {
            pre,
            post,
            template,
        } => {
            let pre = pre.as_deref().map(read_project).transpose()?.unwrap_or_default();
            let post = post
                .as_deref()
                .map(read_project)
                .transpose()?
                .unwrap_or_default();
            let store = template_store(config, template);
            store.save(&Template::new(pre, post))?;
            println!("template saved to {}", store.path().display());
        }
    }
    Ok(())
}

fn cmd_probe(config: &ReelConfig, args: ProbeArgs) -> anyhow::Result<()> {
    let clip = ClipEntry::new(&args.in_path);
    let info = match clip.kind() {
        MediaKind::Image => reelmerge::media::probe_image(
            &args.in_path,
            clip.still_duration().unwrap_or(reelmerge::model::DEFAULT_STILL_DURATION),
        )?,
        MediaKind::Video => reelmerge::media::probe_video(&config.ffmpeg.ffprobe, &args.in_path)?,
    };
    println!(
        "{} {:?} {} {:.3}s audio={}",
        args.in_path.display(),
        clip.kind(),
        info.size,
        info.duration,
        info.has_audio
    );
    Ok(())
}
