use std::path::Path;

use waymark_core::{parse_catalog, Catalog, CatalogWarning};

/// Load the landmark catalog. Problems are logged and never fatal: an
/// unreadable file gives an empty catalog.
pub fn load_catalog(path: &Path) -> Catalog {
    let catalog = match std::fs::read_to_string(path) {
        Ok(text) => parse_catalog(&text),
        Err(e) => Catalog {
            landmarks: Vec::new(),
            warnings: vec![CatalogWarning::Malformed(e.to_string())],
        },
    };

    for warning in &catalog.warnings {
        log::warn!("{}: {}", path.display(), warning);
    }
    if catalog.is_empty() {
        log::warn!("{}: no landmarks loaded", path.display());
    } else {
        log::info!("{}: {} landmarks loaded", path.display(), catalog.len());
    }
    catalog
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_catalog_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"landmarks": [
                {{"title": "Tower", "location": {{"latitude": 52.1, "longitude": "4.3"}}}},
                {{"title": "Mill", "sound": "mill.mp3", "location": {{"lat": 52.2}}}}
            ]}}"#
        )
        .unwrap();

        let catalog = load_catalog(file.path());
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.landmarks[0].location.longitude, 4.3);
        assert_eq!(catalog.landmarks[1].audio.as_deref(), Some("mill.mp3"));
        assert!(catalog.landmarks[1].location_defaulted);
        assert_eq!(catalog.warnings.len(), 1);
    }

    #[test]
    fn test_missing_file_is_empty_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = load_catalog(&dir.path().join("missing.json"));
        assert!(catalog.is_empty());
        assert!(matches!(catalog.warnings[0], CatalogWarning::Malformed(_)));
    }

    #[test]
    fn test_malformed_file_is_empty_catalog() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"[{\"title\": ").unwrap();

        let catalog = load_catalog(file.path());
        assert!(catalog.is_empty());
        assert_eq!(catalog.warnings.len(), 1);
    }
}
