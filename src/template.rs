//! Persistence of the template sections (pre/post clip lists).

use std::io::Write as _;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;

use crate::foundation::error::{ReelError, ReelResult};
use crate::model::clip::ClipEntry;
use crate::model::timeline::Timeline;

pub const DEFAULT_TEMPLATE_FILE: &str = "template.json";

/// The clip lists placed before and after the user's clips.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Template {
    pub pre_clips: Vec<ClipEntry>,
    pub post_clips: Vec<ClipEntry>,
}

impl Template {
    pub fn new(pre_clips: Vec<ClipEntry>, post_clips: Vec<ClipEntry>) -> Self {
        Self {
            pre_clips,
            post_clips,
        }
    }

    pub fn from_timeline(timeline: &Timeline) -> Self {
        Self::new(timeline.pre().to_vec(), timeline.post().to_vec())
    }

    /// Replace the template sections of `timeline`; the user section is untouched.
    pub fn apply_to(self, timeline: &mut Timeline) {
        timeline.replace_template(self.pre_clips, self.post_clips);
    }

    pub fn is_empty(&self) -> bool {
        self.pre_clips.is_empty() && self.post_clips.is_empty()
    }

    /// Parse the on-disk JSON document. Absent lists are treated as empty.
    pub fn from_json(text: &str) -> ReelResult<Self> {
        let doc: Value = serde_json::from_str(text)
            .map_err(|e| ReelError::template(format!("malformed template JSON: {e}")))?;
        let Value::Object(mut map) = doc else {
            return Err(ReelError::template(
                "invalid template format: expected an object",
            ));
        };
        Ok(Self {
            pre_clips: section(map.remove("pre_clips"), "pre_clips")?,
            post_clips: section(map.remove("post_clips"), "post_clips")?,
        })
    }
}

fn section(value: Option<Value>, name: &str) -> ReelResult<Vec<ClipEntry>> {
    let items = match value {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(items)) => items,
        Some(_) => {
            return Err(ReelError::template(format!(
                "invalid template format: '{name}' must be a list"
            )));
        }
    };
    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            serde_json::from_value(item)
                .map_err(|e| ReelError::template(format!("{name}[{i}] is invalid: {e}")))
        })
        .collect()
}

/// A template file on disk.
#[derive(Clone, Debug)]
pub struct TemplateStore {
    path: PathBuf,
}

impl TemplateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> ReelResult<Template> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(t) => t,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ReelError::TemplateMissing(self.path.clone()));
            }
            Err(e) => {
                return Err(ReelError::template(format!(
                    "failed to read '{}': {e}",
                    self.path.display()
                )));
            }
        };
        let template = Template::from_json(&text)?;
        tracing::info!(
            path = %self.path.display(),
            pre = template.pre_clips.len(),
            post = template.post_clips.len(),
            "template loaded"
        );
        Ok(template)
    }

    /// Like [`Self::load`], but a missing file is an empty template.
    pub fn load_or_default(&self) -> ReelResult<Template> {
        match self.load() {
            Err(ReelError::TemplateMissing(path)) => {
                tracing::info!(path = %path.display(), "no template found, starting empty");
                Ok(Template::default())
            }
            other => other,
        }
    }

    /// Write `template` atomically: a sibling temp file is written, synced and renamed over the
    /// target, so readers never observe a partial file.
    pub fn save(&self, template: &Template) -> ReelResult<()> {
        let json = serde_json::to_string_pretty(template)
            .map_err(|e| ReelError::serde(format!("failed to serialize template: {e}")))?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                ReelError::template(format!(
                    "failed to create template directory '{}': {e}",
                    parent.display()
                ))
            })?;
        }

        let tmp = sibling_temp_path(&self.path);
        let write = || -> std::io::Result<()> {
            let mut f = std::fs::File::create(&tmp)?;
            f.write_all(json.as_bytes())?;
            f.sync_all()?;
            std::fs::rename(&tmp, &self.path)
        };
        if let Err(e) = write() {
            let _ = std::fs::remove_file(&tmp);
            return Err(ReelError::template(format!(
                "failed to save template '{}': {e}",
                self.path.display()
            )));
        }

        tracing::info!(
            path = %self.path.display(),
            pre = template.pre_clips.len(),
            post = template.post_clips.len(),
            "template saved"
        );
        Ok(())
    }
}

impl Default for TemplateStore {
    fn default() -> Self {
        Self::new(DEFAULT_TEMPLATE_FILE)
    }
}

fn sibling_temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| DEFAULT_TEMPLATE_FILE.to_owned());
    path.with_file_name(format!(".{name}.tmp"))
}
