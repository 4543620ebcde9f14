//! Headless command line shell.
//!
//! Opens an image directory, visits every image (which also cleans invalid
//! YOLO class lines), and reports what it found.

use std::path::{Path, PathBuf};

use clap::Parser;

use crate::config::{AppConfig, ConfigError, LogLevel};
use crate::constants::{CLASS_FILE_CANDIDATES, DEFAULT_CLASSES};
use crate::format::LabelFormat;
use crate::session::{Session, SessionError};
use crate::state::CleanupStatus;

/// Image annotation toolkit: PascalVOC, YOLO and CreateML label files.
#[derive(Parser, Debug)]
#[command(name = "labelkit", version)]
pub struct Args {
    /// Directory of images to open (defaults to the last opened one)
    pub image_dir: Option<PathBuf>,

    /// Predefined classes file, one label per line
    pub class_file: Option<PathBuf>,

    /// Directory annotation files are written to (defaults to the image directory)
    pub save_dir: Option<PathBuf>,

    /// Annotation format for new files: voc, yolo or createml
    #[arg(long, value_parser = parse_format)]
    pub format: Option<LabelFormat>,

    /// Log verbosity
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,
}

fn parse_format(name: &str) -> Result<LabelFormat, String> {
    LabelFormat::from_name(name).ok_or_else(|| format!("unknown format '{}'", name))
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("No image directory given and none was opened before")]
    NoImageDir,
}

/// What a headless run found.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Summary {
    pub images: usize,
    /// Images with an annotation file.
    pub annotated: usize,
    pub shapes: usize,
    /// Objects dropped for an invalid class index.
    pub dropped: usize,
    /// Annotation files rewritten without invalid class lines.
    pub cleaned: usize,
    /// Images or annotation files that could not be read.
    pub failed: usize,
}

impl std::fmt::Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} images, {} annotated, {} shapes, {} invalid objects dropped in {} files, {} failed",
            self.images, self.annotated, self.shapes, self.dropped, self.cleaned, self.failed
        )
    }
}

/// Run the shell with `config` as the starting settings.
///
/// `config` is updated with the session's settings afterwards.
pub fn run(args: &Args, config: &mut AppConfig) -> Result<Summary, CliError> {
    let mut session = open_session(args, config)?;
    let summary = visit_all(&mut session);
    session.update_config(config);
    Ok(summary)
}

/// Open the image directory and seed the class list.
///
/// Without a class file argument or one inside the directory, the bundled
/// predefined classes are used.
fn open_session(args: &Args, config: &mut AppConfig) -> Result<Session, CliError> {
    if let Some(format) = args.format {
        config.preferences.format = format;
    }
    let image_dir = args
        .image_dir
        .clone()
        .or_else(|| config.preferences.last_open_dir.clone())
        .ok_or(CliError::NoImageDir)?;

    let mut session = Session::new(config);
    session.open_dir(&image_dir)?;

    match &args.class_file {
        Some(class_file) => {
            session.load_predefined_classes(class_file)?;
        }
        None if !has_class_file(&image_dir) => {
            let added = session.add_classes(DEFAULT_CLASSES.lines().map(str::trim));
            log::info!("Using {} bundled predefined classes", added);
        }
        None => {}
    }
    if let Some(save_dir) = &args.save_dir {
        std::fs::create_dir_all(save_dir).map_err(SessionError::from)?;
        session.set_save_dir(Some(save_dir.clone()));
    }
    Ok(session)
}

fn has_class_file(dir: &Path) -> bool {
    CLASS_FILE_CANDIDATES
        .iter()
        .any(|name| dir.join(name).is_file())
}

fn visit_all(session: &mut Session) -> Summary {
    let images = session.project().images.clone();
    let mut summary = Summary {
        images: images.len(),
        ..Summary::default()
    };

    for (i, image) in images.iter().enumerate() {
        log::debug!("Visiting {}/{}: {:?}", i + 1, images.len(), image);
        match session.load_image(image) {
            Ok(Some(report)) => {
                summary.annotated += 1;
                summary.shapes += report.shapes;
                summary.dropped += report.invalid_classes.values().sum::<usize>();
                match report.cleanup {
                    CleanupStatus::NotNeeded => {}
                    CleanupStatus::Rewritten(_) => summary.cleaned += 1,
                    CleanupStatus::Failed(_) => summary.failed += 1,
                }
            }
            Ok(None) => {}
            Err(e) => {
                log::warn!("Skipping {:?}: {}", image, e);
                summary.failed += 1;
            }
        }
    }

    log::info!("{}", summary);
    summary
}
