//! Export template catalog
//!
//! Lists installed export templates (one folder per template with a
//! `metadata.xml`) together with the templates offered remotely, so the
//! export collaborator can show what is installed and what can be updated.
//! Downloading and unpacking templates is not handled here.

use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use quick_xml::Reader;
use quick_xml::events::Event;
use serde::Serialize;
use tracing::{debug, info, warn};
use url::Url;

use super::network::{NetworkRequest, Transport};

/// Remote list of available export templates
pub const TEMPLATE_LIST_URL: &str =
    "https://raw.githubusercontent.com/mediaelch/mediaelch-meta/master/export_themes.xml";

/// Library sections a template can export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportSection {
    Movies,
    TvShows,
    Concerts,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExportTemplate {
    pub identifier: String,
    pub name: String,
    pub version: String,
    pub description: Option<String>,
    pub authors: Vec<String>,
    pub sections: Vec<ExportSection>,
    /// Download location of the template archive
    pub remote_file: Option<String>,
    /// SHA-256 of the archive, hex encoded
    pub checksum: Option<String>,
    pub installed: bool,
    /// Version offered remotely, for installed templates that are also listed remotely
    pub remote_version: Option<String>,
}

impl ExportTemplate {
    /// Installed and a different version is offered remotely
    pub fn has_update(&self) -> bool {
        self.installed
            && self
                .remote_version
                .as_deref()
                .is_some_and(|remote| remote != self.version)
    }

    fn sort_order(a: &Self, b: &Self) -> Ordering {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.identifier.cmp(&b.identifier))
    }
}

/// Which element text is currently being read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Other,
    Name,
    Identifier,
    Version,
    Description,
    Author,
    File,
    Checksum,
    Section,
}

impl Field {
    fn from_tag(tag: &str) -> Self {
        match tag {
            "name" => Self::Name,
            "identifier" => Self::Identifier,
            "version" => Self::Version,
            "description" => Self::Description,
            "author" => Self::Author,
            "file" => Self::File,
            "checksum" => Self::Checksum,
            "section" => Self::Section,
            _ => Self::Other,
        }
    }
}

fn apply_text(template: &mut ExportTemplate, field: Field, text: String) {
    let text = text.trim().to_string();
    if text.is_empty() {
        return;
    }
    match field {
        Field::Name => template.name = text,
        Field::Identifier => template.identifier = text,
        Field::Version => template.version = text,
        // Descriptions come in several languages; the first one is used
        Field::Description => {
            template.description.get_or_insert(text);
        }
        Field::Author => template.authors.push(text),
        Field::File => template.remote_file = Some(text),
        Field::Checksum => template.checksum = Some(text),
        Field::Section => match text.as_str() {
            "movies" => template.sections.push(ExportSection::Movies),
            "tvshows" => template.sections.push(ExportSection::TvShows),
            "concerts" => template.sections.push(ExportSection::Concerts),
            other => debug!(section = other, "Ignoring unknown export section"),
        },
        Field::Other => {}
    }
}

/// Parse every `<item_tag>` element of `xml` into a template
fn parse_templates(xml: &str, item_tag: &str) -> Result<(Option<String>, Vec<ExportTemplate>)> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut root = None;
    let mut templates = Vec::new();
    let mut current: Option<ExportTemplate> = None;
    let mut field = Field::Other;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let tag = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if root.is_none() {
                    root = Some(tag.clone());
                }
                if tag == item_tag {
                    current = Some(ExportTemplate::default());
                }
                field = Field::from_tag(&tag);
            }
            Ok(Event::End(ref e)) => {
                let tag = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if tag == item_tag {
                    if let Some(template) = current.take() {
                        templates.push(template);
                    }
                }
                field = Field::Other;
            }
            Ok(Event::Text(ref e)) => {
                if let Some(template) = current.as_mut() {
                    let text = e.unescape().unwrap_or_default().to_string();
                    apply_text(template, field, text);
                }
            }
            Ok(Event::CData(ref e)) => {
                if let Some(template) = current.as_mut() {
                    let text = String::from_utf8_lossy(e).to_string();
                    apply_text(template, field, text);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => bail!("Invalid export template XML: {}", e),
            _ => {}
        }
    }

    Ok((root, templates))
}

/// Parse the remote template list (`<themes><theme>…</theme></themes>`)
pub fn parse_template_list(xml: &str) -> Result<Vec<ExportTemplate>> {
    let (root, templates) = parse_templates(xml, "theme")?;
    if root.as_deref() != Some("themes") {
        bail!("Template list does not have a root <themes> element");
    }
    Ok(templates
        .into_iter()
        .filter(|t| !t.identifier.is_empty())
        .collect())
}

/// Parse a single installed template's `metadata.xml`
pub fn parse_template_metadata(xml: &str) -> Result<ExportTemplate> {
    let (_, mut templates) = parse_templates(xml, "metadata")?;
    let mut template = templates.pop().context("Template metadata is empty")?;
    template.installed = true;
    Ok(template)
}

/// Read all installed templates below `dir`. Folders without a readable
/// `metadata.xml` are skipped.
pub fn load_local_templates(dir: &Path) -> Result<Vec<ExportTemplate>> {
    if !dir.exists() {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create template directory {}", dir.display()))?;
    }

    let mut templates = Vec::new();
    for entry in fs::read_dir(dir)
        .with_context(|| format!("Failed to read template directory {}", dir.display()))?
    {
        let Ok(entry) = entry else {
            continue;
        };
        let metadata_path = entry.path().join("metadata.xml");
        if !metadata_path.is_file() {
            continue;
        }

        match fs::read_to_string(&metadata_path)
            .map_err(anyhow::Error::from)
            .and_then(|xml| parse_template_metadata(&xml))
        {
            Ok(mut template) => {
                if template.identifier.is_empty() {
                    template.identifier = entry.file_name().to_string_lossy().to_string();
                }
                templates.push(template);
            }
            Err(e) => {
                warn!(path = %metadata_path.display(), error = %e, "Skipping unreadable export template");
            }
        }
    }

    templates.sort_by(ExportTemplate::sort_order);
    Ok(templates)
}

/// Combine installed and remote templates, keyed by identifier.
///
/// Installed templates are kept and learn about the remote version and
/// archive; remote-only templates are listed as not installed.
pub fn merge_templates(
    local: Vec<ExportTemplate>,
    remote: Vec<ExportTemplate>,
) -> Vec<ExportTemplate> {
    let mut templates = local;
    for remote_template in remote {
        match templates
            .iter_mut()
            .find(|t| t.identifier == remote_template.identifier)
        {
            Some(local_template) => {
                local_template.remote_version = Some(remote_template.version);
                local_template.remote_file = remote_template.remote_file;
                local_template.checksum = remote_template.checksum.or(local_template.checksum.take());
            }
            None => templates.push(ExportTemplate {
                installed: false,
                ..remote_template
            }),
        }
    }
    templates.sort_by(ExportTemplate::sort_order);
    templates
}

/// Loads the template catalog
pub struct ExportTemplateLoader {
    transport: Arc<dyn Transport>,
    templates_dir: PathBuf,
    list_url: Url,
}

impl ExportTemplateLoader {
    pub fn new(transport: Arc<dyn Transport>, templates_dir: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self {
            transport,
            templates_dir: templates_dir.into(),
            list_url: Url::parse(TEMPLATE_LIST_URL).context("Invalid template list URL")?,
        })
    }

    pub fn with_list_url(mut self, list_url: Url) -> Self {
        self.list_url = list_url;
        self
    }

    pub async fn installed_templates(&self) -> Result<Vec<ExportTemplate>> {
        let dir = self.templates_dir.clone();
        tokio::task::spawn_blocking(move || load_local_templates(&dir))
            .await
            .context("Template scan task failed")?
    }

    /// Installed templates merged with the remote list. If the remote list
    /// cannot be loaded, only installed templates are returned.
    pub async fn remote_templates(&self) -> Result<Vec<ExportTemplate>> {
        let local = self.installed_templates().await?;

        info!(url = %self.list_url, "Loading export template list");
        let response = self
            .transport
            .get(NetworkRequest::new(self.list_url.clone()))
            .await;

        if let Some(error) = response.error {
            warn!(url = %response.url, error = %error.message, "Could not load export template list");
            return Ok(merge_templates(local, Vec::new()));
        }

        let remote = match parse_template_list(&response.body) {
            Ok(remote) => remote,
            Err(e) => {
                warn!(error = %e, "Invalid export template list");
                Vec::new()
            }
        };
        debug!(local = local.len(), remote = remote.len(), "Merging export templates");
        Ok(merge_templates(local, remote))
    }
}
