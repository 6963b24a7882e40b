//! JSON presets for morph parameters.

use std::path::Path;

use crate::core::types::MorphParams;
use crate::error::MorphError;

/// Parses a preset from a JSON string and validates it.
///
/// Missing fields fall back to [`MorphParams::default`].
pub fn preset_from_json(json: &str) -> Result<MorphParams, MorphError> {
    let params: MorphParams = serde_json::from_str(json)
        .map_err(|e| MorphError::InvalidFormat(format!("failed to parse preset: {}", e)))?;
    params.validate()?;
    Ok(params)
}

/// Serializes a preset as pretty-printed JSON.
pub fn preset_to_json(params: &MorphParams) -> Result<String, MorphError> {
    serde_json::to_string_pretty(params)
        .map_err(|e| MorphError::InvalidFormat(format!("failed to serialize preset: {}", e)))
}

/// Writes a preset to `path` as JSON.
pub fn write_preset_json(path: &Path, params: &MorphParams) -> Result<(), MorphError> {
    params.validate()?;
    let json = preset_to_json(params)?;
    std::fs::write(path, json)?;
    log::debug!("wrote morph preset to {}", path.display());
    Ok(())
}

/// Reads a preset from a JSON file.
pub fn read_preset_json(path: &Path) -> Result<MorphParams, MorphError> {
    let data = std::fs::read_to_string(path)?;
    preset_from_json(&data).map_err(|e| match e {
        MorphError::InvalidFormat(msg) => {
            MorphError::InvalidFormat(format!("{} ({})", msg, path.display()))
        }
        other => other,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{BlendLaw, Quality};

    #[test]
    fn test_partial_preset_uses_defaults() {
        let params = preset_from_json(r#"{ "blend_law": "Formant", "morph_amount": 0.8 }"#)
            .unwrap();
        assert_eq!(params.blend_law, BlendLaw::Formant);
        assert!((params.morph_amount - 0.8).abs() < 1e-6);
        assert_eq!(params.quality, Quality::Normal);
        assert_eq!(params.smoothing, 0.0);
    }

    #[test]
    fn test_out_of_range_preset_rejected() {
        let err = preset_from_json(r#"{ "preserve_formants": 3.0 }"#).unwrap_err();
        assert!(matches!(
            err,
            MorphError::InvalidParameter {
                name: "preserve_formants",
                ..
            }
        ));
    }

    #[test]
    fn test_malformed_preset_rejected() {
        assert!(matches!(
            preset_from_json("{ not json"),
            Err(MorphError::InvalidFormat(_))
        ));
        assert!(preset_from_json(r#"{ "quality": "Ultra" }"#).is_err());
    }

    #[test]
    fn test_preset_file_round_trip() {
        let dir = std::env::temp_dir().join(format!("spectral-morph-preset-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("vocal.json");

        let params = MorphParams::new(0.3)
            .with_blend_law(BlendLaw::Logarithmic)
            .with_quality(Quality::HighQuality)
            .with_preserve_formants(0.6);
        write_preset_json(&path, &params).unwrap();
        let loaded = read_preset_json(&path).unwrap();
        assert_eq!(loaded, params);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = read_preset_json(Path::new("/nonexistent/preset.json")).unwrap_err();
        assert!(matches!(err, MorphError::Io(_)));
    }
}
