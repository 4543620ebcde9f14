//! Selection of the active annotation format.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::format::formats::{CreateMlFormat, PascalVocFormat, YoloFormat};
use crate::format::traits::LabelCodec;

/// The on-disk annotation formats, one codec per variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelFormat {
    /// Pascal VOC XML, one file per image.
    #[default]
    #[serde(alias = "pascalvoc")]
    Voc,
    /// YOLO TXT with a sibling `classes.txt`.
    Yolo,
    /// CreateML JSON array.
    #[serde(alias = "create_ml")]
    CreateMl,
}

impl LabelFormat {
    /// Get all formats in cycling order.
    pub fn all() -> &'static [LabelFormat] {
        &[LabelFormat::Voc, LabelFormat::Yolo, LabelFormat::CreateMl]
    }

    /// The codec that reads and writes this format.
    pub fn codec(&self) -> &'static dyn LabelCodec {
        match self {
            LabelFormat::Voc => &PascalVocFormat,
            LabelFormat::Yolo => &YoloFormat,
            LabelFormat::CreateMl => &CreateMlFormat,
        }
    }

    /// File extension without the dot.
    pub fn extension(&self) -> &'static str {
        self.codec().extension()
    }

    /// Next format in the VOC -> YOLO -> CreateML -> VOC cycle.
    pub fn next(&self) -> LabelFormat {
        match self {
            LabelFormat::Voc => LabelFormat::Yolo,
            LabelFormat::Yolo => LabelFormat::CreateMl,
            LabelFormat::CreateMl => LabelFormat::Voc,
        }
    }

    /// Find the format that writes files with this extension.
    pub fn from_extension(ext: &str) -> Option<LabelFormat> {
        let ext = ext.trim_start_matches('.');
        Self::all()
            .iter()
            .copied()
            .find(|f| f.extension().eq_ignore_ascii_case(ext))
    }

    /// Find the format of an annotation file by its extension.
    pub fn from_path(path: &Path) -> Option<LabelFormat> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// Parse a user-supplied format name ("voc", "pascalvoc", "yolo", "createml").
    pub fn from_name(name: &str) -> Option<LabelFormat> {
        match name.to_ascii_lowercase().as_str() {
            "voc" | "pascalvoc" | "pascal_voc" | "xml" => Some(LabelFormat::Voc),
            "yolo" | "txt" => Some(LabelFormat::Yolo),
            "createml" | "create_ml" | "json" => Some(LabelFormat::CreateMl),
            _ => None,
        }
    }
}

impl fmt::Display for LabelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.codec().display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_order() {
        assert_eq!(LabelFormat::Voc.next(), LabelFormat::Yolo);
        assert_eq!(LabelFormat::Yolo.next(), LabelFormat::CreateMl);
        assert_eq!(LabelFormat::CreateMl.next(), LabelFormat::Voc);
    }

    #[test]
    fn test_extensions() {
        assert_eq!(LabelFormat::Voc.extension(), "xml");
        assert_eq!(LabelFormat::Yolo.extension(), "txt");
        assert_eq!(LabelFormat::CreateMl.extension(), "json");
        assert_eq!(LabelFormat::from_extension(".TXT"), Some(LabelFormat::Yolo));
        assert_eq!(
            LabelFormat::from_path(Path::new("a/b.json")),
            Some(LabelFormat::CreateMl)
        );
        assert_eq!(LabelFormat::from_extension("png"), None);
    }

    #[test]
    fn test_codec_ids() {
        assert_eq!(LabelFormat::Voc.codec().id(), "voc");
        assert_eq!(LabelFormat::Yolo.codec().id(), "yolo");
        assert_eq!(LabelFormat::CreateMl.codec().id(), "createml");
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&LabelFormat::CreateMl).unwrap();
        assert_eq!(json, "\"createml\"");
        let parsed: LabelFormat = serde_json::from_str("\"pascalvoc\"").unwrap();
        assert_eq!(parsed, LabelFormat::Voc);
        assert_eq!(LabelFormat::from_name("YOLO"), Some(LabelFormat::Yolo));
    }
}
