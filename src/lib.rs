//! labelkit - image annotation state and label file persistence
//!
//! The core of a bounding-box labeling tool without the UI: shapes, the
//! per-image annotation store with selection, clipboard and class
//! visibility, and PascalVOC / YOLO / CreateML codecs.
//!
//! ```rust,ignore
//! use labelkit::{AppConfig, Session, Shape};
//!
//! let mut session = Session::new(&AppConfig::default());
//! session.open_dir("images".as_ref())?;
//! session.run_pending()?;
//! session.store_mut().add_shape(Shape::rectangle("cat", 10.0, 10.0, 80.0, 60.0));
//! session.save()?;
//! ```

pub mod cli;
pub mod color_utils;
pub mod config;
pub mod constants;
pub mod format;
pub mod model;
pub mod session;
pub mod state;

pub use config::{AppConfig, ConfigError, LogLevel};
pub use format::{FormatError, ImageInfo, LabelCodec, LabelFormat};
pub use model::{BoundingBox, Bounds, Point, Shape, ShapeId};
pub use session::{Session, SessionError};
pub use state::{AnnotationStore, Clipboard, ClassFilter, ClassSelection, LoadReport, Task};
