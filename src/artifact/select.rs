use crate::artifact::quant::QuantMethod;
use crate::error::{Error, Result};
use crate::hub::FileEntry;

/// File suffix of downloadable model weight artifacts.
pub const ARTIFACT_SUFFIX: &str = ".gguf";

/// Exactly one way of narrowing a model's file list to a single artifact.
#[derive(Debug, Clone, Copy)]
pub enum SelectionConstraint {
    /// Pick the largest artifact whose size stays at or under the ceiling.
    MaxSizeBytes(u64),
    /// Pick the artifact carrying this quantization tag.
    Quantization(QuantMethod),
}

impl SelectionConstraint {
    /// Build a constraint from the two optional CLI flags.
    pub fn from_options(
        max_size_bytes: Option<u64>,
        quantization: Option<QuantMethod>,
    ) -> Result<Self> {
        match (max_size_bytes, quantization) {
            (Some(_), Some(_)) => Err(Error::InvalidArgument(
                "--max-size-gb and --quantization are mutually exclusive".to_string(),
            )),
            (Some(ceiling), None) => Ok(SelectionConstraint::MaxSizeBytes(ceiling)),
            (None, Some(method)) => Ok(SelectionConstraint::Quantization(method)),
            (None, None) => Err(Error::InvalidArgument(
                "either --max-size-gb or --quantization must be specified".to_string(),
            )),
        }
    }
}

/// Outcome of a selection: the chosen file plus reporting context.
#[derive(Debug, Clone)]
pub struct Selection {
    pub entry: FileEntry,
    pub method: Option<QuantMethod>,
    pub candidates: usize,
}

/// Narrow `files` to exactly one artifact.
///
/// Pure and deterministic: the same file list and constraint always produce
/// the same result. Hub ordering of `files` is significant in quantization
/// mode, where the first match wins.
pub fn select_artifact(
    model_id: &str,
    files: &[FileEntry],
    constraint: SelectionConstraint,
) -> Result<Selection> {
    if files.is_empty() {
        return Err(Error::InvalidArgument(format!(
            "no file records supplied for model {}",
            model_id
        )));
    }

    match constraint {
        SelectionConstraint::MaxSizeBytes(ceiling) => {
            let mut candidates: Vec<&FileEntry> = files
                .iter()
                .filter(|entry| entry.path.ends_with(ARTIFACT_SUFFIX) && entry.size <= ceiling)
                .collect();

            if candidates.is_empty() {
                return Err(Error::NoMatchingArtifact(format!(
                    "no {} artifact at or under {} bytes for model {}",
                    ARTIFACT_SUFFIX, ceiling, model_id
                )));
            }

            // Stable sort: among equal sizes the later hub entry wins, deterministically.
            candidates.sort_by_key(|entry| entry.size);
            let count = candidates.len();
            let entry = candidates[count - 1].clone();
            let method = QuantMethod::from_artifact_path(&entry.path);

            Ok(Selection {
                entry,
                method,
                candidates: count,
            })
        }

        SelectionConstraint::Quantization(requested) => {
            let matching: Vec<&FileEntry> = files
                .iter()
                .filter(|entry| QuantMethod::from_artifact_path(&entry.path) == Some(requested))
                .collect();

            // The hub normally holds one file per tag; if it holds several,
            // the first in hub order wins.
            match matching.first() {
                Some(entry) => Ok(Selection {
                    entry: (*entry).clone(),
                    method: Some(requested),
                    candidates: matching.len(),
                }),
                None => Err(Error::NoMatchingArtifact(format!(
                    "no artifact with quantization method {} for model {}",
                    requested, model_id
                ))),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(path: &str, size: u64) -> FileEntry {
        FileEntry {
            path: path.to_string(),
            size,
        }
    }

    fn sample_files() -> Vec<FileEntry> {
        vec![
            entry("m.Q4_0.gguf", 4_000_000_000),
            entry("m.Q8_0.gguf", 8_000_000_000),
        ]
    }

    #[test]
    fn test_size_ceiling_picks_largest_fitting() {
        let selection = select_artifact(
            "TheBloke/m",
            &sample_files(),
            SelectionConstraint::MaxSizeBytes(5_000_000_000),
        )
        .unwrap();

        assert_eq!(selection.entry.path, "m.Q4_0.gguf");
        assert_eq!(selection.method, Some(QuantMethod::Q4_0));
        assert_eq!(selection.candidates, 1);
    }

    #[test]
    fn test_size_ceiling_never_exceeds_ceiling() {
        let files = vec![
            entry("m.Q2_K.gguf", 2_000_000_000),
            entry("m.Q4_K_M.gguf", 4_000_000_000),
            entry("m.Q6_K.gguf", 6_000_000_000),
            entry("m.Q8_0.gguf", 8_000_000_000),
        ];
        let selection = select_artifact(
            "TheBloke/m",
            &files,
            SelectionConstraint::MaxSizeBytes(6_500_000_000),
        )
        .unwrap();

        assert!(selection.entry.size <= 6_500_000_000);
        assert_eq!(selection.entry.path, "m.Q6_K.gguf");
        assert_eq!(selection.candidates, 3);
    }

    #[test]
    fn test_size_ceiling_skips_non_artifact_files() {
        let files = vec![
            entry("README.md", 100),
            entry("config.json", 500),
            entry("m.Q2_K.gguf", 2_000_000_000),
        ];
        let selection = select_artifact(
            "TheBloke/m",
            &files,
            SelectionConstraint::MaxSizeBytes(3_000_000_000),
        )
        .unwrap();

        assert_eq!(selection.entry.path, "m.Q2_K.gguf");
    }

    #[test]
    fn test_size_ceiling_too_small_fails() {
        let err = select_artifact(
            "TheBloke/m",
            &sample_files(),
            SelectionConstraint::MaxSizeBytes(1_000_000_000),
        )
        .unwrap_err();

        match err {
            Error::NoMatchingArtifact(msg) => {
                assert!(msg.contains("TheBloke/m"));
                assert!(msg.contains("1000000000"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_size_ceiling_is_deterministic_among_ties() {
        let files = vec![
            entry("m.Q4_K_S.gguf", 4_000_000_000),
            entry("m.Q4_K_M.gguf", 4_000_000_000),
        ];
        let first = select_artifact(
            "TheBloke/m",
            &files,
            SelectionConstraint::MaxSizeBytes(5_000_000_000),
        )
        .unwrap();
        let second = select_artifact(
            "TheBloke/m",
            &files,
            SelectionConstraint::MaxSizeBytes(5_000_000_000),
        )
        .unwrap();

        assert_eq!(first.entry, second.entry);
    }

    #[test]
    fn test_quantization_mode_picks_exact_tag() {
        let selection = select_artifact(
            "TheBloke/m",
            &sample_files(),
            SelectionConstraint::Quantization(QuantMethod::Q8_0),
        )
        .unwrap();

        assert_eq!(selection.entry.path, "m.Q8_0.gguf");
    }

    #[test]
    fn test_quantization_mode_first_in_hub_order_wins() {
        let files = vec![
            entry("a/m.Q6_K.gguf", 6_000_000_000),
            entry("b/m.Q6_K.gguf", 6_000_000_001),
        ];
        let selection = select_artifact(
            "TheBloke/m",
            &files,
            SelectionConstraint::Quantization(QuantMethod::Q6K),
        )
        .unwrap();

        assert_eq!(selection.entry.path, "a/m.Q6_K.gguf");
        assert_eq!(selection.candidates, 2);
    }

    #[test]
    fn test_quantization_mode_missing_tag_fails() {
        let err = select_artifact(
            "TheBloke/m",
            &sample_files(),
            SelectionConstraint::Quantization(QuantMethod::Q6K),
        )
        .unwrap_err();

        match err {
            Error::NoMatchingArtifact(msg) => {
                assert!(msg.contains("TheBloke/m"));
                assert!(msg.contains("Q6_K"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_empty_file_list_is_invalid() {
        let err = select_artifact(
            "TheBloke/m",
            &[],
            SelectionConstraint::MaxSizeBytes(1_000_000_000),
        )
        .unwrap_err();

        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn test_constraint_requires_exactly_one_option() {
        assert!(matches!(
            SelectionConstraint::from_options(None, None),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            SelectionConstraint::from_options(Some(1), Some(QuantMethod::Q6K)),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            SelectionConstraint::from_options(Some(1), None),
            Ok(SelectionConstraint::MaxSizeBytes(1))
        ));
        assert!(matches!(
            SelectionConstraint::from_options(None, Some(QuantMethod::Q6K)),
            Ok(SelectionConstraint::Quantization(QuantMethod::Q6K))
        ));
    }
}
