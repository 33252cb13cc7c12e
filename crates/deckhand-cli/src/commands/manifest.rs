//! Loading resource descriptors from files and directories.

use std::path::{Path, PathBuf};

use deckhand_engine::{parse_documents, ContentType, EngineError, ResourceDescriptor};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("no descriptor files given")]
    NoInput,

    #[error("{path}: unsupported file extension (expected .json, .yaml or .yml)")]
    UnsupportedExtension { path: PathBuf },

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Descriptor(#[from] EngineError),
}

/// Read every descriptor named by `paths`, in order.
///
/// Directories contribute their `.json`, `.yaml` and `.yml` files sorted
/// by name; other files in them are ignored. Files named explicitly must
/// carry one of those extensions.
pub fn load(paths: &[PathBuf]) -> Result<Vec<ResourceDescriptor>, ManifestError> {
    if paths.is_empty() {
        return Err(ManifestError::NoInput);
    }

    let mut descriptors = Vec::new();
    for path in paths {
        if path.is_dir() {
            for file in descriptor_files(path)? {
                descriptors.extend(load_file(&file)?);
            }
        } else {
            descriptors.extend(load_file(path)?);
        }
    }
    Ok(descriptors)
}

fn descriptor_files(dir: &Path) -> Result<Vec<PathBuf>, ManifestError> {
    let read_error = |source| ManifestError::Read {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(read_error)? {
        let path = entry.map_err(read_error)?.path();
        if path.is_file() && ContentType::from_path(&path).is_some() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn load_file(path: &Path) -> Result<Vec<ResourceDescriptor>, ManifestError> {
    let content_type =
        ContentType::from_path(path).ok_or_else(|| ManifestError::UnsupportedExtension {
            path: path.to_path_buf(),
        })?;

    let text = std::fs::read_to_string(path).map_err(|source| ManifestError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(parse_documents(
        &path.display().to_string(),
        &text,
        content_type,
    )?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SERVICE: &str = "apiVersion: v1\nkind: Service\nmetadata:\n  name: api\n";
    const DEPLOYMENT: &str =
        r#"{"apiVersion":"apps/v1","kind":"Deployment","metadata":{"name":"web"}}"#;

    #[test]
    fn directory_files_load_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("20-web.json"), DEPLOYMENT).unwrap();
        std::fs::write(dir.path().join("10-api.yaml"), SERVICE).unwrap();
        std::fs::write(dir.path().join("README.md"), "# notes").unwrap();

        let descriptors = load(&[dir.path().to_path_buf()]).unwrap();
        let ids: Vec<_> = descriptors.iter().map(|d| d.resource_id()).collect();
        assert_eq!(ids, vec!["api", "web"]);
        assert_eq!(descriptors[0].content_type(), ContentType::Yaml);
        assert_eq!(descriptors[1].content_type(), ContentType::Json);
    }

    #[test]
    fn multi_document_file_keeps_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.yml");
        std::fs::write(
            &path,
            format!("{SERVICE}---\napiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: settings\n"),
        )
        .unwrap();

        let descriptors = load(&[path]).unwrap();
        assert_eq!(descriptors.len(), 2);
        assert_eq!(descriptors[0].kind(), "Service");
        assert_eq!(descriptors[1].kind(), "ConfigMap");
    }

    #[test]
    fn explicit_file_needs_known_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.txt");
        std::fs::write(&path, SERVICE).unwrap();

        let err = load(&[path]).unwrap_err();
        assert!(matches!(err, ManifestError::UnsupportedExtension { .. }));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = load(&[PathBuf::from("/nonexistent/app.yaml")]).unwrap_err();
        assert!(matches!(err, ManifestError::Read { .. }));
    }

    #[test]
    fn descriptor_errors_name_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.yaml");
        std::fs::write(&path, "kind: Service\nmetadata:\n  name: api\n").unwrap();

        let err = load(&[path]).unwrap_err().to_string();
        assert!(err.contains("broken.yaml"), "{err}");
        assert!(err.contains("apiVersion"), "{err}");
    }

    #[test]
    fn no_paths_is_rejected() {
        assert!(matches!(load(&[]), Err(ManifestError::NoInput)));
    }
}
