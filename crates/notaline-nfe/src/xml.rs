//! XML validation, pretty-printing, and artifact storage.

use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use quick_xml::events::Event;
use quick_xml::{Reader, Writer};

use crate::key::NotaKey;

/// Re-indent `input` with two-space indentation.
///
/// Round-trips every event through quick-xml, which also validates
/// well-formedness; element text passes through untouched. A payload with
/// no element at all (plain text, error banners) is rejected.
pub fn pretty_print(input: &str) -> Result<String> {
    let mut reader = Reader::from_str(input);
    reader.config_mut().trim_text(true);
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    let mut saw_element = false;
    loop {
        match reader.read_event().context("malformed XML")? {
            Event::Eof => break,
            event => {
                if matches!(event, Event::Start(_) | Event::Empty(_)) {
                    saw_element = true;
                }
                writer.write_event(event).context("failed to rewrite XML")?;
            }
        }
    }
    anyhow::ensure!(saw_element, "payload contains no XML element");

    let mut pretty =
        String::from_utf8(writer.into_inner()).context("payload is not valid UTF-8")?;
    pretty.push('\n');
    Ok(pretty)
}

/// Directory of downloaded invoice XMLs, one `<key>.xml` per invoice.
///
/// Artifacts are written once and never overwritten; their existence is
/// what marks an invoice as already downloaded.
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Artifact path for `key`.
    pub fn path_for(&self, key: NotaKey) -> PathBuf {
        self.dir.join(format!("{key}.xml"))
    }

    pub fn contains(&self, key: NotaKey) -> bool {
        self.path_for(key).exists()
    }

    /// Persist `pretty_xml` for `key` via tmp file + rename.
    ///
    /// An existing artifact is left untouched.
    pub fn write(&self, key: NotaKey, pretty_xml: &str) -> io::Result<()> {
        let path = self.path_for(key);
        if path.exists() {
            return Ok(());
        }
        std::fs::create_dir_all(&self.dir)?;
        let tmp = self.dir.join(format!("{key}.xml.tmp"));
        std::fs::write(&tmp, pretty_xml)?;
        std::fs::rename(&tmp, &path)
    }
}
