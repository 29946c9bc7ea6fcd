//! Command-line interface
//!
//! Every command prints machine-readable output (JSON or CSS) on stdout and
//! status lines on stderr, so the output can be piped straight into the
//! page build.

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use crate::color::derive_palette;
use crate::deploy::build::{run_build, FileOutcome};
use crate::deploy::env::process_env;
use crate::deploy::preflight::run_preflight;
use crate::error::{FolioError, Result};
use crate::layout::metrics::ViewportClass;
use crate::layout::mosaic::{build_layout, LayoutSpan};
use crate::media::aspect::{measure_folder, FileMeasurer};
use crate::media::transform::{ImageUrls, Watermark};
use crate::state::data::{PhotoId, PortfolioData, PortfolioRows, ALL_CATEGORY};
use crate::state::library::{Library, LikeOutcome};
use crate::state::prefs::{ImageTone, ThemeMode};
use crate::state::session::{GallerySession, Viewport};
use crate::ui::gallery::{GalleryView, ToneState};
use crate::ui::lightbox::LightboxView;
use crate::ui::theme::ThemeVars;

#[derive(Parser, Debug)]
#[command(name = "folio")]
#[command(author, version, about = "Photo portfolio palette, mosaic layout and deploy tooling")]
pub struct Cli {
    /// Library database (defaults to the user data directory)
    #[arg(long, global = true, value_name = "PATH")]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Derive a theme palette from a background color
    Palette {
        /// Hex color, e.g. #1a1a2e or fff
        color: String,
        /// Print CSS custom properties instead of JSON
        #[arg(long)]
        css: bool,
    },

    /// Lay out images by aspect ratio
    Layout {
        /// Use the mobile packing rules
        #[arg(long)]
        mobile: bool,
        /// Measure every image under this folder instead of taking ratios
        #[arg(long, value_name = "DIR", conflicts_with = "ratios")]
        dir: Option<PathBuf>,
        /// Aspect ratios (width / height)
        #[arg(value_name = "RATIO", allow_negative_numbers = true)]
        ratios: Vec<f64>,
    },

    /// Render the gallery view model
    Gallery {
        /// JSON export of the photos and settings tables; falls back to the
        /// cached snapshot when missing or unreadable
        #[arg(value_name = "ROWS")]
        rows: Option<PathBuf>,
        /// Category filter
        #[arg(long, default_value = ALL_CATEGORY)]
        category: String,
        /// Window width in CSS pixels
        #[arg(long, default_value_t = 1280)]
        window_width: u32,
        /// Gallery grid width in CSS pixels (defaults to the window width)
        #[arg(long)]
        grid_width: Option<u32>,
        /// Folder that relative photo sources resolve against
        #[arg(long, value_name = "DIR")]
        media_root: Option<PathBuf>,
    },

    /// Like a photo (once per device)
    Like {
        id: String,
    },

    /// Count a lightbox view of a photo
    View {
        id: String,
    },

    /// Show or change the theme mode
    Theme {
        #[arg(value_enum)]
        action: Option<ThemeAction>,
    },

    /// Show or change the image tone
    Tone {
        #[arg(value_enum)]
        action: Option<ToneAction>,
    },

    /// Fill deployment placeholders into the web sources
    Build {
        /// Project root
        #[arg(long, default_value = ".")]
        root: PathBuf,
    },

    /// Check the project is ready to package
    Preflight {
        /// Project root
        #[arg(long, default_value = ".")]
        root: PathBuf,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ThemeAction {
    Toggle,
    Color,
    Light,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToneAction {
    #[value(name = "toggle-bw")]
    ToggleBw,
    #[value(name = "toggle-iso400")]
    ToggleIso400,
    Color,
    Bw,
    #[value(name = "iso400")]
    Iso400,
}

impl Cli {
    /// Open the library at `--db` or the default location
    fn library(&self) -> Result<Library> {
        let path = match &self.db {
            Some(path) => path.clone(),
            None => Library::default_path()?,
        };
        Library::open(&path)
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Run the parsed command.
pub async fn run(cli: Cli) -> Result<ExitCode> {
    match &cli.command {
        Command::Palette { color, css } => palette(color, *css),
        Command::Layout { mobile, dir, ratios } => {
            let viewport = if *mobile {
                ViewportClass::Mobile
            } else {
                ViewportClass::Desktop
            };
            match dir {
                Some(dir) => layout_dir(dir, viewport).await,
                None => {
                    print_json(&build_layout(ratios, viewport))?;
                    Ok(ExitCode::SUCCESS)
                }
            }
        }
        Command::Gallery {
            rows,
            category,
            window_width,
            grid_width,
            media_root,
        } => {
            let library = cli.library()?;
            let viewport = Viewport::new(*window_width, grid_width.unwrap_or(*window_width));
            gallery(&library, rows.as_deref(), category, viewport, media_root.as_deref()).await
        }
        Command::Like { id } => like(&cli.library()?, id),
        Command::View { id } => view(&cli.library()?, id),
        Command::Theme { action } => theme(&cli.library()?, *action),
        Command::Tone { action } => tone(&cli.library()?, *action),
        Command::Build { root } => build(root).await,
        Command::Preflight { root } => preflight(root).await,
    }
}

fn palette(color: &str, css: bool) -> Result<ExitCode> {
    let Some(palette) = derive_palette(color) else {
        eprintln!("❌ Not a valid hex color: {color:?}");
        return Ok(ExitCode::FAILURE);
    };

    if css {
        print!("{}", ThemeVars::from_palette(Some(&palette)).to_css());
    } else {
        print_json(&palette)?;
    }
    Ok(ExitCode::SUCCESS)
}

#[derive(Serialize)]
struct MeasuredSpan {
    src: String,
    ratio: f64,
    #[serde(flatten)]
    span: LayoutSpan,
}

/// Measure every image under `dir` and lay them out in scan order.
async fn measured_layout(dir: &Path, viewport: ViewportClass) -> Vec<MeasuredSpan> {
    let measured = measure_folder(dir).await;
    let ratios: Vec<f64> = measured.iter().map(|(_, ratio)| *ratio).collect();
    let spans = build_layout(&ratios, viewport);

    measured
        .into_iter()
        .zip(spans)
        .map(|((src, ratio), span)| MeasuredSpan { src, ratio, span })
        .collect()
}

async fn layout_dir(dir: &Path, viewport: ViewportClass) -> Result<ExitCode> {
    let output = measured_layout(dir, viewport).await;
    eprintln!("🔍 Measured {} images in {}", output.len(), dir.display());
    print_json(&output)?;
    Ok(ExitCode::SUCCESS)
}

/// Load the portfolio from a rows export, caching it as the snapshot.
///
/// Falls back to the last snapshot when the export can't be read.
async fn load_portfolio(library: &Library, rows: Option<&Path>) -> Result<PortfolioData> {
    if let Some(path) = rows {
        match read_rows(path).await {
            Ok(rows) => {
                let data = PortfolioData::from_rows(rows);
                library.save_snapshot(&data)?;
                tracing::info!(photos = data.photos.len(), "portfolio loaded");
                return Ok(data);
            }
            Err(e) => {
                tracing::warn!(error = %e, "could not load rows, using cached snapshot");
            }
        }
    }
    library.load_snapshot()?.ok_or(FolioError::NoSnapshot)
}

async fn read_rows(path: &Path) -> Result<PortfolioRows> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| FolioError::io(path, e))?;
    Ok(serde_json::from_str(&content)?)
}

/// URL builder watermarking with the photographer's handle, if any
fn image_urls(portfolio: &PortfolioData) -> ImageUrls {
    let owner = portfolio.photographer.instagram.trim();
    ImageUrls::new((!owner.is_empty()).then(|| Watermark::current(owner)))
}

/// Snapshot, or an empty portfolio when nothing was cached yet
fn snapshot_or_default(library: &Library) -> Result<PortfolioData> {
    Ok(library.load_snapshot()?.unwrap_or_default())
}

async fn gallery(
    library: &Library,
    rows: Option<&Path>,
    category: &str,
    viewport: Viewport,
    media_root: Option<&Path>,
) -> Result<ExitCode> {
    let portfolio = load_portfolio(library, rows).await?;
    let prefs = library.load_preferences()?;

    let urls = image_urls(&portfolio);

    let root = media_root
        .map(Path::to_path_buf)
        .or_else(|| rows.and_then(Path::parent).map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."));

    let mut session = GallerySession::new(portfolio, prefs, viewport);
    let pass = session.select_category(category);

    let spans = match pass.refinement {
        Some(request) => {
            let resolved = request.resolve(Arc::new(FileMeasurer::new(root))).await;
            session.apply_refinement(resolved).unwrap_or(pass.spans)
        }
        None => pass.spans,
    };

    let view = GalleryView::build(&session, &spans, library, &urls)?;
    print_json(&view)?;
    Ok(ExitCode::SUCCESS)
}

fn like(library: &Library, id: &str) -> Result<ExitCode> {
    let portfolio = library.load_snapshot()?.ok_or(FolioError::NoSnapshot)?;
    let id = PhotoId::from(id);
    let photo = portfolio
        .photo(&id)
        .ok_or_else(|| FolioError::UnknownPhoto(id.to_string()))?;

    match library.like_photo(photo)? {
        LikeOutcome::Liked(likes) => println!("♥ {likes}"),
        LikeOutcome::AlreadyLiked => {
            eprintln!("Already liked {id}");
            println!("♥ {}", library.current_likes(photo)?);
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn view(library: &Library, id: &str) -> Result<ExitCode> {
    let portfolio = library.load_snapshot()?.ok_or(FolioError::NoSnapshot)?;
    let prefs = library.load_preferences()?;
    let urls = image_urls(&portfolio);
    let mut session = GallerySession::new(portfolio, prefs, Viewport::new(1280, 1280));
    session.select_category(ALL_CATEGORY);

    let id = PhotoId::from(id);
    let event = session
        .open_lightbox(&id)
        .ok_or_else(|| FolioError::UnknownPhoto(id.to_string()))?;
    let views = library.record_view(&event.photo)?;
    eprintln!("👁 {views}");

    if let Some(view) = LightboxView::new(session.lightbox(), &urls, views) {
        print_json(&view)?;
    }
    Ok(ExitCode::SUCCESS)
}

fn theme(library: &Library, action: Option<ThemeAction>) -> Result<ExitCode> {
    let mut session = GallerySession::new(
        snapshot_or_default(library)?,
        library.load_preferences()?,
        Viewport::new(1280, 1280),
    );

    let state = match action {
        None => session.theme_vars(),
        Some(ThemeAction::Toggle) => session.toggle_theme(),
        Some(ThemeAction::Color) => session.set_theme_mode(ThemeMode::Color),
        Some(ThemeAction::Light) => session.set_theme_mode(ThemeMode::Light),
    };
    if action.is_some() {
        library.save_preferences(&session.preferences())?;
    }
    print_json(&state)?;
    Ok(ExitCode::SUCCESS)
}

fn tone(library: &Library, action: Option<ToneAction>) -> Result<ExitCode> {
    let mut session = GallerySession::new(
        PortfolioData::default(),
        library.load_preferences()?,
        Viewport::new(1280, 1280),
    );

    match action {
        None => {}
        Some(ToneAction::ToggleBw) => {
            session.toggle_bw();
        }
        Some(ToneAction::ToggleIso400) => {
            session.toggle_iso400();
        }
        Some(ToneAction::Color) => session.set_image_tone(ImageTone::Color),
        Some(ToneAction::Bw) => session.set_image_tone(ImageTone::Bw),
        Some(ToneAction::Iso400) => session.set_image_tone(ImageTone::Iso400),
    }
    if action.is_some() {
        library.save_preferences(&session.preferences())?;
    }
    print_json(&ToneState::from(session.preferences().tone))?;
    Ok(ExitCode::SUCCESS)
}

async fn build(root: &Path) -> Result<ExitCode> {
    let report = run_build(root, &process_env()).await?;
    for (file, outcome) in &report.files {
        match outcome {
            FileOutcome::Updated => println!("Updated: {file}"),
            FileOutcome::Skipped => println!("Skipped: {file} (no placeholders found)"),
            FileOutcome::NotFound => println!("File not found: {file}"),
        }
    }
    println!("Build complete");
    Ok(ExitCode::SUCCESS)
}

async fn preflight(root: &Path) -> Result<ExitCode> {
    let report = run_preflight(root, &process_env()).await?;
    println!("{}", report.summary());

    if !report.passed() {
        return Err(FolioError::PreflightFailed(report.failures.len()));
    }
    println!("\nPreflight passed.");
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_gallery_defaults() {
        let cli = Cli::parse_from(["folio", "gallery", "rows.json"]);
        let Command::Gallery {
            rows,
            category,
            window_width,
            grid_width,
            ..
        } = cli.command
        else {
            panic!("expected gallery");
        };
        assert_eq!(rows, Some(PathBuf::from("rows.json")));
        assert_eq!(category, "all");
        assert_eq!(window_width, 1280);
        assert_eq!(grid_width, None);
    }

    #[test]
    fn test_parse_layout_ratios() {
        let cli = Cli::parse_from(["folio", "layout", "--mobile", "1.5", "0.66"]);
        let Command::Layout { mobile, ratios, dir } = cli.command else {
            panic!("expected layout");
        };
        assert!(mobile);
        assert_eq!(ratios, vec![1.5, 0.66]);
        assert!(dir.is_none());
    }

    #[test]
    fn test_parse_tone_actions() {
        let cli = Cli::parse_from(["folio", "--db", "/tmp/x.db", "tone", "toggle-iso400"]);
        assert_eq!(cli.db, Some(PathBuf::from("/tmp/x.db")));
        assert!(matches!(
            cli.command,
            Command::Tone {
                action: Some(ToneAction::ToggleIso400)
            }
        ));
        assert!(Cli::try_parse_from(["folio", "tone", "sepia"]).is_err());
    }

    #[tokio::test]
    async fn test_layout_dir_measures_relative_folder() {
        let dir = tempfile::Builder::new().tempdir_in(".").unwrap();
        let cwd = std::env::current_dir().unwrap();
        let relative = dir
            .path()
            .strip_prefix(&cwd)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| dir.path().to_path_buf());
        image::RgbImage::new(40, 20).save(relative.join("wide.png")).unwrap();
        image::RgbImage::new(20, 40).save(relative.join("tall.png")).unwrap();

        let output = measured_layout(&relative, ViewportClass::Desktop).await;
        assert_eq!(output.len(), 2);
        assert_eq!(output[0].src, "tall.png");
        assert!((output[0].ratio - 0.5).abs() < 1e-9);
        assert!((output[1].ratio - 2.0).abs() < 1e-9);
        // 2 + 6 columns padded to 12
        assert_eq!(output[0].span.columns + output[1].span.columns, 12);
    }

    #[test]
    fn test_view_reports_neighbors() {
        let library = Library::open_in_memory().unwrap();
        let rows: PortfolioRows = serde_json::from_value(serde_json::json!({
            "photos": [{ "id": 1, "src": "a.jpg" }, { "id": 2, "src": "b.jpg" }]
        }))
        .unwrap();
        library.save_snapshot(&PortfolioData::from_rows(rows)).unwrap();

        view(&library, "2").unwrap();
        let photo = library.load_snapshot().unwrap().unwrap().photos[1].clone();
        assert_eq!(library.current_views(&photo).unwrap(), 1);
        assert!(matches!(view(&library, "9"), Err(FolioError::UnknownPhoto(_))));
    }

    #[tokio::test]
    async fn test_gallery_falls_back_to_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let library = Library::open_in_memory().unwrap();
        let rows = dir.path().join("rows.json");
        std::fs::write(
            &rows,
            r#"{"photos":[{"id":1,"src":"a.jpg"}],"settings":[]}"#,
        )
        .unwrap();

        let first = load_portfolio(&library, Some(&rows)).await.unwrap();
        assert_eq!(first.photos.len(), 1);

        std::fs::write(&rows, "{ broken").unwrap();
        let fallback = load_portfolio(&library, Some(&rows)).await.unwrap();
        assert_eq!(fallback, first);

        let empty = Library::open_in_memory().unwrap();
        assert!(matches!(
            load_portfolio(&empty, Some(&rows)).await,
            Err(FolioError::NoSnapshot)
        ));
    }

    #[test]
    fn test_theme_and_tone_persist() {
        let library = Library::open_in_memory().unwrap();
        theme(&library, Some(ThemeAction::Toggle)).unwrap();
        tone(&library, Some(ToneAction::Bw)).unwrap();

        let prefs = library.load_preferences().unwrap();
        assert_eq!(prefs.theme, ThemeMode::Light);
        assert_eq!(prefs.tone, ImageTone::Bw);
    }
}
