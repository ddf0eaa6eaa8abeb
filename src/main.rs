use clap::{Parser, Subcommand};
use folio::content::{self, ContentKind, ImageContent};
use folio::id::{ContentId, IdKind, PathResolver};
use folio::imaging::RustBackend;
use folio::render::{PostImageRule, render_markdown};
use folio::{catalog, config, output, watch};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "folio")]
#[command(about = "Responsive images for a markdown site")]
#[command(long_about = "\
Responsive images for a markdown site

Images live next to the posts that use them. Each image is scaled down to
every ladder width below its own, and markdown image references render as
<picture> elements listing every size.

Content structure:

  content/
  └── posts/
      └── 2019-cats/
          ├── index.md             # ![A cat|right](tabby.jpg)
          └── tabby.jpg            # 1200px wide → 50w, 200w, 500w, 1000w

Caption directives (separated by |):
  nolink    do not wrap the image in a link to the full-size file
  left      add class=\"left\"
  right     add class=\"right\"

Set RUST_LOG=debug for per-variant logging.
Run 'folio gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Content directory (overrides content_root from the config)
    #[arg(long, global = true)]
    source: Option<PathBuf>,

    /// Config file
    #[arg(long, default_value = "config.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print an image's metadata and the variants a build would produce
    Probe {
        /// Image path, relative to the content directory
        image: String,
        /// Print JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
    /// Build an image and all its variants into a directory
    Build {
        /// Image path, relative to the content directory
        image: String,
        /// Output directory
        #[arg(long, default_value = "dist")]
        output: PathBuf,
    },
    /// List every image in the content directory with its variants
    Catalog {
        /// Print JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
    /// Render a post's markdown to HTML on stdout
    Render {
        /// Markdown file, relative to the content directory
        post: String,
    },
    /// Print change events for a content file until interrupted
    Watch {
        /// File path, relative to the content directory
        path: String,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

/// Loaded config plus the resolver for the effective content root.
struct Context {
    config: config::SiteConfig,
    resolver: PathResolver,
}

impl Context {
    fn load(source: Option<&Path>, config_path: &Path) -> Result<Self, config::ConfigError> {
        let config = config::load_config(config_path)?;
        let content_root = source
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(&config.content_root));
        let resolver = PathResolver::new(content_root, &config.render.url_prefix);
        init_thread_pool(&config.processing);
        Ok(Self { config, resolver })
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();
    let Cli {
        source,
        config: config_path,
        command,
    } = Cli::parse();
    let load = || Context::load(source.as_deref(), &config_path);
    let backend = RustBackend::new();

    match command {
        Command::Probe { image, json } => {
            let ctx = load()?;
            let id = ContentId::new(IdKind::ImageMeta, &image);
            let built = content::build_content(
                &backend,
                &ctx.resolver,
                &id,
                ContentKind::ImageMeta,
                &ctx.config.images,
            )?;
            if let ImageContent::Meta(probe) = built {
                if json {
                    println!("{}", serde_json::to_string_pretty(&probe)?);
                } else {
                    output::print_probe_output(&probe);
                }
            }
        }
        Command::Build {
            image,
            output: out_dir,
        } => {
            let ctx = load()?;
            let id = ContentId::new(IdKind::Image, &image);
            let built = content::build_content(
                &backend,
                &ctx.resolver,
                &id,
                ContentKind::Image,
                &ctx.config.images,
            )?;
            if let ImageContent::Full(full) = built {
                let written = content::persist(&full, &id, &out_dir)?;
                output::print_build_output(&id, &full, &written, &out_dir);
            }
        }
        Command::Catalog { json } => {
            let ctx = load()?;
            let scan = catalog::scan_catalog(&backend, &ctx.resolver, &ctx.config.images)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&scan.catalog)?);
            } else {
                output::print_catalog_output(&scan);
            }
        }
        Command::Render { post } => {
            let ctx = load()?;
            let post_id = ContentId::new(IdKind::Post, &post);
            let markdown = std::fs::read_to_string(ctx.resolver.id_to_path(&post_id))?;
            let scan = catalog::scan_catalog(&backend, &ctx.resolver, &ctx.config.images)?;
            let rule = PostImageRule::new(&post_id, &scan.catalog, &ctx.resolver, &ctx.config);
            print!("{}", render_markdown(&markdown, &rule)?);
        }
        Command::Watch { path } => {
            let ctx = load()?;
            let id = ContentId::new(IdKind::File, &path);
            let interval = ctx.config.watch.poll_interval();
            info!(
                path = %ctx.resolver.id_to_path(&id).display(),
                ?interval,
                "watching for changes"
            );
            for event in watch::content_watcher(&ctx.resolver, &id, interval)? {
                println!("{}", output::format_change_event(&event));
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Log to stderr, filtered by `RUST_LOG` (default `info`).
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Capped at the number of CPU cores; config can lower it, not raise it.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
