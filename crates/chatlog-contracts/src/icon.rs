use std::sync::OnceLock;

use indexmap::IndexMap;
use serde_json::Value;

pub const DEFAULT_FILE_ICON: &str = "file/fill/file";

static BUILTIN_ICONS: OnceLock<IconTable> = OnceLock::new();

/// Lower-cased file extension to icon tag lookup.
#[derive(Debug, Clone)]
pub struct IconTable {
    icons: IndexMap<String, String>,
}

impl IconTable {
    pub fn new(icons: Option<IndexMap<String, String>>) -> Self {
        Self {
            icons: icons.unwrap_or_else(default_icons),
        }
    }

    /// Shared built-in table, constructed on first use.
    pub fn builtin() -> &'static IconTable {
        BUILTIN_ICONS.get_or_init(IconTable::default)
    }

    /// Merges a JSON object of `{ "ext": "tag" }` over the table.
    ///
    /// Malformed payloads and non-string tags are ignored.
    pub fn with_overrides(mut self, raw: &str) -> Self {
        let Ok(payload) = serde_json::from_str::<Value>(raw) else {
            return self;
        };
        let Some(table) = payload.as_object() else {
            return self;
        };
        for (extension, tag) in table {
            let Some(tag) = tag.as_str() else {
                continue;
            };
            let extension = extension.trim().trim_start_matches('.').to_lowercase();
            if extension.is_empty() {
                continue;
            }
            self.icons.insert(extension, tag.to_string());
        }
        self
    }

    pub fn get(&self, extension: &str) -> Option<&str> {
        self.icons.get(&extension.to_lowercase()).map(String::as_str)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.icons
            .iter()
            .map(|(extension, tag)| (extension.as_str(), tag.as_str()))
    }

    pub fn resolve<'a>(&'a self, filename: &str, default_tag: &'a str) -> &'a str {
        file_extension(filename)
            .and_then(|extension| self.get(extension))
            .unwrap_or(default_tag)
    }
}

impl Default for IconTable {
    fn default() -> Self {
        Self::new(None)
    }
}

/// Resolves `filename` against the built-in table.
pub fn get_file_icon<'a>(filename: &str, default_tag: Option<&'a str>) -> &'a str {
    IconTable::builtin().resolve(filename, default_tag.unwrap_or(DEFAULT_FILE_ICON))
}

fn file_extension(filename: &str) -> Option<&str> {
    let (_, extension) = filename.rsplit_once('.')?;
    if extension.is_empty() {
        return None;
    }
    Some(extension)
}

fn default_icons() -> IndexMap<String, String> {
    let mut map = IndexMap::new();
    let mut insert = |extensions: &[&str], tag: &str| {
        for extension in extensions {
            map.insert((*extension).to_string(), tag.to_string());
        }
    };

    insert(&["pdf"], "file/fill/pdf");
    insert(&["ppt"], "file/fill/ppt");
    insert(&["xlsx", "xls"], "file/fill/xlsx");
    insert(&["csv"], "file/fill/csv");
    insert(&["doc", "docs"], "file/fill/doc");
    insert(&["txt"], "file/fill/txt");
    insert(&["md"], "file/fill/markdown");
    insert(&["html", "htm"], "file/fill/html");

    map
}
