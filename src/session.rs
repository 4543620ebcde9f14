//! Annotation session: the opened directory, the open image and its store.
//!
//! A [`Session`] glues the project list, the annotation store, the clipboard
//! and the deferred task queue together. Front ends drive it by calling its
//! operations and draining [`Session::run_pending`] once per loop iteration.

use std::path::{Path, PathBuf};

use crate::config::AppConfig;
use crate::constants::CLASS_FILE_CANDIDATES;
use crate::format::formats::read_class_list;
use crate::format::{FormatError, ImageInfo, LabelFormat};
use crate::state::{
    AnnotationStore, Clipboard, LoadReport, PasteOutcome, ProjectState, Task, TaskQueue,
};

/// Errors raised by session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Format(#[from] FormatError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No image is loaded")]
    NoImageLoaded,

    #[error("No images found in {dir:?}")]
    NoImages { dir: PathBuf },
}

/// Annotation discovery order inside an explicit save directory.
const SAVE_DIR_FORMATS: &[LabelFormat] = &[LabelFormat::Voc, LabelFormat::Yolo, LabelFormat::CreateMl];

/// Annotation discovery order beside the image.
const IMAGE_DIR_FORMATS: &[LabelFormat] = &[LabelFormat::Voc, LabelFormat::Yolo];

/// One annotation session.
#[derive(Debug, Default)]
pub struct Session {
    project: ProjectState,
    store: AnnotationStore,
    clipboard: Clipboard,
    tasks: TaskQueue,
    save_dir: Option<PathBuf>,
    auto_save: bool,
    default_label: Option<String>,
    single_class_mode: bool,
}

impl Session {
    /// Create a session from saved settings.
    pub fn new(config: &AppConfig) -> Self {
        let prefs = &config.preferences;
        let mut store = AnnotationStore::new(prefs.format);
        store.set_class_colors(
            config
                .class_colors
                .iter()
                .map(|(label, color)| (label.clone(), *color))
                .collect(),
        );

        Self {
            store,
            save_dir: prefs.save_dir.clone(),
            auto_save: prefs.auto_save,
            default_label: prefs.default_label.clone(),
            single_class_mode: prefs.single_class_mode,
            ..Self::default()
        }
    }

    /// Write the session's persistent settings back into `config`.
    pub fn update_config(&self, config: &mut AppConfig) {
        let prefs = &mut config.preferences;
        prefs.format = self.store.format();
        prefs.auto_save = self.auto_save;
        prefs.save_dir = self.save_dir.clone();
        if !self.project.folder.as_os_str().is_empty() {
            prefs.last_open_dir = Some(self.project.folder.clone());
        }
        config.class_colors = self
            .store
            .class_colors()
            .iter()
            .map(|(label, color)| (label.clone(), *color))
            .collect();
    }

    // --- Accessors ---

    pub fn store(&self) -> &AnnotationStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut AnnotationStore {
        &mut self.store
    }

    pub fn project(&self) -> &ProjectState {
        &self.project
    }

    pub fn clipboard(&self) -> &Clipboard {
        &self.clipboard
    }

    pub fn save_dir(&self) -> Option<&Path> {
        self.save_dir.as_deref()
    }

    pub fn set_save_dir(&mut self, dir: Option<PathBuf>) {
        log::info!("Annotations will be saved to {:?}", dir);
        self.save_dir = dir;
    }

    pub fn auto_save(&self) -> bool {
        self.auto_save
    }

    pub fn set_auto_save(&mut self, enabled: bool) {
        self.auto_save = enabled;
    }

    /// Label to apply to a newly drawn shape without asking, in single-class mode.
    pub fn label_for_new_shape(&self) -> Option<&str> {
        if self.single_class_mode {
            self.default_label.as_deref()
        } else {
            None
        }
    }

    pub fn set_single_class_mode(&mut self, enabled: bool, label: Option<String>) {
        self.single_class_mode = enabled;
        if label.is_some() {
            self.default_label = label;
        }
    }

    /// Path of the open image.
    pub fn current_image(&self) -> Option<&Path> {
        self.store.image().map(|image| image.path.as_path())
    }

    fn require_image(&self) -> Result<&ImageInfo, SessionError> {
        self.store.image().ok_or(SessionError::NoImageLoaded)
    }

    // --- Opening ---

    /// Open an image directory.
    ///
    /// Loads a class list found in the directory, makes the directory the
    /// save directory, and queues loading the first image.
    pub fn open_dir(&mut self, dir: &Path) -> Result<usize, SessionError> {
        let project = ProjectState::scan(dir)?;
        if project.is_empty() {
            return Err(SessionError::NoImages {
                dir: dir.to_path_buf(),
            });
        }

        if let Some(class_file) = CLASS_FILE_CANDIDATES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
        {
            self.load_predefined_classes(&class_file)?;
        }

        self.store.reset();
        self.save_dir = Some(dir.to_path_buf());
        self.project = project;
        if let Some(first) = self.project.current_image() {
            self.tasks.push(Task::LoadImage(first.clone()));
        }

        log::info!("Opened {:?} with {} images", dir, self.project.len());
        Ok(self.project.len())
    }

    /// Load an image and the annotation file found for it.
    ///
    /// Returns the load report when an annotation file was found. If the
    /// image cannot be decoded the session is left unchanged.
    pub fn load_image(&mut self, path: &Path) -> Result<Option<LoadReport>, SessionError> {
        let bytes = std::fs::read(path)?;
        let image = ImageInfo::from_bytes(path, &bytes)?;

        if let Some(index) = self.project.index_of(path) {
            self.project.current_index = index;
        }

        let report = match self.find_annotation(path) {
            Some((annotation, format)) => {
                log::debug!("Found {} annotations at {:?}", format, annotation);
                Some(self.store.load(&annotation, format, image)?)
            }
            None => {
                self.store.open_image(image);
                None
            }
        };

        log::info!(
            "Loaded image {:?} ({}) with {} shapes",
            path,
            self.project.progress(),
            self.store.shapes().len()
        );
        Ok(report)
    }

    /// Look for an existing annotation file for `image`.
    fn find_annotation(&self, image: &Path) -> Option<(PathBuf, LabelFormat)> {
        let stem = image.file_stem()?;
        let (dir, formats) = match &self.save_dir {
            Some(dir) => (dir.as_path(), SAVE_DIR_FORMATS),
            None => (image.parent()?, IMAGE_DIR_FORMATS),
        };

        formats.iter().find_map(|format| {
            let mut name = stem.to_os_string();
            name.push(".");
            name.push(format.extension());
            let candidate = dir.join(name);
            candidate.is_file().then_some((candidate, *format))
        })
    }

    /// Where the open image's annotations are saved, without extension.
    fn annotation_base(&self, image: &ImageInfo) -> PathBuf {
        let dir = self
            .save_dir
            .clone()
            .or_else(|| image.path.parent().map(Path::to_path_buf))
            .unwrap_or_default();
        dir.join(image.stem())
    }

    // --- Navigation ---

    /// Save before leaving the image when auto-save is on. Failures are only logged.
    fn auto_save_before_leaving(&mut self) {
        if !self.auto_save || !self.store.is_dirty() || self.store.image().is_none() {
            return;
        }
        if let Err(e) = self.save() {
            log::warn!("Auto-save failed, continuing: {}", e);
        }
    }

    fn load_current(&mut self) -> Result<bool, SessionError> {
        let Some(path) = self.project.current_image().cloned() else {
            return Ok(false);
        };
        self.load_image(&path)?;
        Ok(true)
    }

    /// Move to the next image. Returns false at the end of the list.
    pub fn open_next(&mut self) -> Result<bool, SessionError> {
        if self.store.image().is_none() {
            return self.load_current();
        }
        self.auto_save_before_leaving();
        if !self.project.next() {
            return Ok(false);
        }
        self.load_current()
    }

    /// Move to the previous image. Returns false at the start of the list.
    pub fn open_prev(&mut self) -> Result<bool, SessionError> {
        self.auto_save_before_leaving();
        if !self.project.prev() {
            return Ok(false);
        }
        self.load_current()
    }

    /// Jump to the 1-based position `n`, clamped to the list.
    pub fn go_to(&mut self, n: usize) -> Result<bool, SessionError> {
        self.auto_save_before_leaving();
        if !self.project.go_to(n) && self.store.image().is_some() {
            return Ok(false);
        }
        self.load_current()
    }

    // --- Saving ---

    /// Save the open image's annotations in the active format.
    pub fn save(&mut self) -> Result<PathBuf, SessionError> {
        let base = self.annotation_base(self.require_image()?);
        let format = self.store.format();
        let written = self.store.save(&base, format)?;
        log::info!("Saved annotations to {:?}", written);
        Ok(written)
    }

    /// Flip the verified flag and save.
    pub fn toggle_verified(&mut self) -> Result<bool, SessionError> {
        self.require_image()?;
        let verified = !self.store.is_verified();
        self.store.set_verified(verified);
        self.save()?;
        Ok(verified)
    }

    /// Add the previous image's annotations to this one and save.
    ///
    /// Returns how many shapes were copied.
    pub fn copy_previous_bounding_boxes(&mut self) -> Result<usize, SessionError> {
        self.require_image()?;
        let Some(previous) = self.project.previous_image().cloned() else {
            log::info!("No previous image to copy annotations from");
            return Ok(0);
        };
        let Some((annotation, format)) = self.find_annotation(&previous) else {
            log::info!("Previous image {:?} has no annotations", previous);
            return Ok(0);
        };

        let count = self.store.merge_from(&annotation, format)?;
        self.save()?;
        Ok(count)
    }

    // --- Clipboard ---

    /// Copy the selected shapes.
    pub fn copy_selected(&mut self) -> Result<usize, SessionError> {
        let path = self.require_image()?.path.clone();
        Ok(self.clipboard.copy(self.store.selected_shapes(), &path))
    }

    /// Paste the clipboard into the open image.
    ///
    /// The returned shapes carry the ids the store assigned.
    pub fn paste(&mut self) -> Result<PasteOutcome, SessionError> {
        let image = self.require_image()?;
        let (path, bounds) = (image.path.clone(), image.bounds());

        let mut outcome = self.clipboard.paste(&path, self.store.shapes(), Some(bounds));
        for shape in &mut outcome.shapes {
            shape.id = self.store.add_shape(shape.clone());
        }
        Ok(outcome)
    }

    // --- Files ---

    /// Delete the open image from disk and rescan the directory.
    pub fn delete_current_image(&mut self) -> Result<(), SessionError> {
        let path = self.require_image()?.path.clone();
        std::fs::remove_file(&path)?;
        log::info!("Deleted image {:?}", path);

        self.store.reset();
        self.project.rescan()?;
        if let Some(next) = self.project.current_image() {
            self.tasks.push(Task::LoadImage(next.clone()));
        }
        Ok(())
    }

    /// Close the open image without navigating.
    pub fn close_file(&mut self) {
        self.store.reset();
    }

    /// Add the labels of a predefined classes file. Returns how many were new.
    pub fn load_predefined_classes(&mut self, path: &Path) -> Result<usize, SessionError> {
        let labels = read_class_list(path)?;
        let added = self.add_classes(labels.iter().map(String::as_str));
        log::info!("Loaded {} classes from {:?} ({} new)", labels.len(), path, added);
        Ok(added)
    }

    /// Add labels to the history, skipping blank and known ones. Returns how many were new.
    pub fn add_classes<'a>(&mut self, labels: impl IntoIterator<Item = &'a str>) -> usize {
        labels
            .into_iter()
            .filter(|l| self.store.add_label(l))
            .count()
    }

    pub fn save_predefined_classes(&self, path: &Path) -> Result<(), SessionError> {
        self.store.labels().save_file(path)?;
        Ok(())
    }

    /// Hook for model-assisted labeling. No model is bundled, so this only logs.
    pub fn auto_annotate(&mut self) -> Result<(), SessionError> {
        let path = self.require_image()?.path.clone();
        log::info!("Auto-annotation is not available for {:?}", path);
        Ok(())
    }

    // --- Deferred tasks ---

    pub fn queue(&mut self, task: Task) {
        self.tasks.push(task);
    }

    pub fn has_pending(&self) -> bool {
        !self.tasks.is_empty()
    }

    /// Run the tasks queued so far.
    ///
    /// Tasks queued while these run wait for the next call. Every task runs
    /// even if an earlier one fails; the first error is returned.
    pub fn run_pending(&mut self) -> Result<usize, SessionError> {
        let tasks = self.tasks.take();
        let count = tasks.len();
        let mut first_error = None;

        for task in tasks {
            log::debug!("Running {:?}", task);
            if let Err(e) = self.run_task(task) {
                log::warn!("Deferred task failed: {}", e);
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(count),
        }
    }

    fn run_task(&mut self, task: Task) -> Result<(), SessionError> {
        match task {
            Task::LoadImage(path) => self.load_image(&path).map(|_| ()),
            Task::OpenNext => self.open_next().map(|_| ()),
            Task::OpenPrev => self.open_prev().map(|_| ()),
            Task::GoTo(n) => self.go_to(n).map(|_| ()),
            Task::Save => self.save().map(|_| ()),
            Task::AutoAnnotate => self.auto_annotate(),
        }
    }
}
