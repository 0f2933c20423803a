use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::domain::ServiceDescriptor;

#[derive(Debug, Error)]
pub(crate) enum InventoryError {
    #[error("failed to read service inventory {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON service inventory {path}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid YAML service inventory {path}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Inventory {
    List(Vec<ServiceDescriptor>),
    Wrapped { services: Vec<ServiceDescriptor> },
}

impl Inventory {
    fn into_services(self) -> Vec<ServiceDescriptor> {
        match self {
            Inventory::List(services) | Inventory::Wrapped { services } => services,
        }
    }
}

/// Loads the service list produced by the scan-to-inventory converter.
pub(crate) fn load_services(path: &Path) -> Result<Vec<ServiceDescriptor>, InventoryError> {
    let contents = fs::read_to_string(path).map_err(|source| InventoryError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_services(path, &contents)
}

fn parse_services(path: &Path, contents: &str) -> Result<Vec<ServiceDescriptor>, InventoryError> {
    let inventory: Inventory = if is_yaml(path) {
        serde_yaml::from_str(contents).map_err(|source| InventoryError::Yaml {
            path: path.to_path_buf(),
            source,
        })?
    } else {
        serde_json::from_str(contents).map_err(|source| InventoryError::Json {
            path: path.to_path_buf(),
            source,
        })?
    };
    Ok(inventory.into_services())
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yml" | "yaml")
    )
}

/// File-name safe form of a product or address: anything that is not an
/// ASCII letter or digit becomes `_`.
pub(crate) fn normalize_name(value: &str) -> String {
    value
        .chars()
        .map(|ch| if ch.is_ascii_alphanumeric() { ch } else { '_' })
        .collect()
}
