//! Loading of form templates.
//!
//! A template lives at `{plugin_root}/templates/{directory}/index.html`. Only
//! its `<body>` content is used; relative asset paths are rewritten to
//! site-relative plugin URLs and the result is cached per resolved path.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::ttl_cache::TtlCache;

/// Site-relative URL of the plugin's asset root; `../../` resolves here.
pub const DEFAULT_ASSETS_URL: &str = "{stl.siteUrl}/sitefiles/plugins/form";

/// Site-relative URL of the template directory; `../` resolves here.
pub const DEFAULT_TEMPLATES_URL: &str = "{stl.siteUrl}/sitefiles/plugins/form/templates";

/// Default lifetime of a cached fragment.
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// File name of a template's entry point.
const TEMPLATE_FILE: &str = "index.html";

#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("invalid template directory name: {0:?}")]
    InvalidDirectory(String),

    #[error("failed to read template {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("template {0} has no <body> element")]
    MissingBody(PathBuf),
}

/// Where templates live and how their relative paths are published.
#[derive(Debug, Clone)]
pub struct TemplateSettings {
    pub plugin_root: PathBuf,
    pub assets_url: String,
    pub templates_url: String,
    pub ttl: Duration,
}

impl TemplateSettings {
    pub fn new(plugin_root: impl Into<PathBuf>) -> Self {
        Self {
            plugin_root: plugin_root.into(),
            assets_url: DEFAULT_ASSETS_URL.to_string(),
            templates_url: DEFAULT_TEMPLATES_URL.to_string(),
            ttl: DEFAULT_TTL,
        }
    }
}

pub struct TemplateLoader {
    settings: TemplateSettings,
    cache: TtlCache<PathBuf, Arc<str>>,
}

impl TemplateLoader {
    pub fn new(settings: TemplateSettings) -> Self {
        Self {
            settings,
            cache: TtlCache::new(),
        }
    }

    pub fn settings(&self) -> &TemplateSettings {
        &self.settings
    }

    /// Whether the `templates` directory under the plugin root exists.
    pub async fn templates_available(&self) -> bool {
        tokio::fs::metadata(self.settings.plugin_root.join("templates"))
            .await
            .is_ok_and(|meta| meta.is_dir())
    }

    /// Path of the template's entry file. Rejects names that would escape
    /// the templates directory.
    pub fn resolve_path(&self, directory_name: &str) -> Result<PathBuf, TemplateError> {
        validate_directory_name(directory_name)?;
        Ok(self
            .settings
            .plugin_root
            .join("templates")
            .join(directory_name)
            .join(TEMPLATE_FILE))
    }

    /// The render-ready body fragment of a template.
    ///
    /// Cached by resolved path only, so any arguments resolving to the same
    /// file share one entry. Concurrent misses may each read the file; the
    /// result is identical.
    pub async fn load_fragment(
        &self,
        template_kind: &str,
        directory_name: &str,
    ) -> Result<Arc<str>, TemplateError> {
        let path = self.resolve_path(directory_name)?;
        if let Some(html) = self.cache.get(&path).await {
            return Ok(html);
        }

        let html = read_fragment(&path, &self.settings).await?;
        tracing::debug!(
            template_kind,
            path = %path.display(),
            len = html.len(),
            "Template fragment loaded"
        );
        let html: Arc<str> = Arc::from(html);
        self.cache
            .insert(path, Arc::clone(&html), self.settings.ttl)
            .await;
        Ok(html)
    }
}

async fn read_fragment(path: &Path, settings: &TemplateSettings) -> Result<String, TemplateError> {
    let document = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| TemplateError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    let body = extract_body(&document).ok_or_else(|| TemplateError::MissingBody(path.to_path_buf()))?;
    Ok(rewrite_relative_paths(
        body,
        &settings.assets_url,
        &settings.templates_url,
    ))
}

fn validate_directory_name(name: &str) -> Result<(), TemplateError> {
    let invalid = name.trim().is_empty()
        || name.contains(['/', '\\'])
        || name == "."
        || name.contains("..");
    if invalid {
        return Err(TemplateError::InvalidDirectory(name.to_string()));
    }
    Ok(())
}

/// Content of the `<body>` element, starting at the first line break after
/// `<body` so the rest of the start tag is dropped. The line break itself is
/// kept. A body on a single line starts after the start tag's `>`.
pub fn extract_body(document: &str) -> Option<&str> {
    let start = document.find("<body")? + "<body".len();
    let end = document.find("</body>")?;
    if end < start {
        return None;
    }
    let body = &document[start..end];
    let from = match body.find('\n') {
        Some(newline) => newline,
        None => body.find('>')? + 1,
    };
    Some(&body[from..])
}

/// Rewrite `../../` to `{assets_url}/`, then any remaining `../` to
/// `{templates_url}/`. The order matters: `../../` contains `../`.
pub fn rewrite_relative_paths(fragment: &str, assets_url: &str, templates_url: &str) -> String {
    fragment
        .replace("../../", &format!("{assets_url}/"))
        .replace("../", &format!("{templates_url}/"))
}
