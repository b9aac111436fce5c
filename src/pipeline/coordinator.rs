//! Input discovery and output layout.

use crate::constants::{AUDIO_EXTENSIONS, output::DEFAULT_OUTPUT_DIR};
use crate::error::Result;
use crate::events::{manifest_path, sanitize_filename};
use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::path::{Component, Path, PathBuf};
use tracing::{info, warn};

/// Result of checking whether a recording should be processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessCheck {
    /// Recording should be processed.
    Process,
    /// Skip: the manifest exists, so a previous run completed.
    SkipComplete(PathBuf),
}

/// Output root for `input`: the explicit directory, else `events/` next to it.
pub fn output_root_for(input: &Path, explicit_output_dir: Option<&Path>) -> PathBuf {
    explicit_output_dir.map_or_else(
        || {
            input
                .parent()
                .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
                .join(DEFAULT_OUTPUT_DIR)
        },
        Path::to_path_buf,
    )
}

/// Stem of the recording, used to name its clips and directory.
pub fn source_stem(input: &Path) -> String {
    // Non-UTF-8 names are kept lossily rather than rejected
    let stem = input
        .file_stem()
        .map_or(Cow::Borrowed("recording"), |s| s.to_string_lossy());
    sanitize_filename(&stem)
}

/// One input file and the key naming its outputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recording {
    /// Input file.
    pub input: PathBuf,
    /// Unique within the output root: names the recording directory, its
    /// clips, manifest and converted copy.
    pub key: String,
}

impl Recording {
    /// Recording keyed by its stem alone.
    #[must_use]
    pub fn new(input: &Path) -> Self {
        Self {
            input: input.to_path_buf(),
            key: source_stem(input),
        }
    }
}

/// Key every input so no two recordings sharing an output root share a key.
///
/// A recording keeps its bare stem unless another input under the same root
/// has the same stem (compared case-insensitively). Colliding inputs get the
/// extension appended, then their parent directory names prepended, one
/// level at a time, until they differ. Inputs must be sorted for keys to be
/// stable across runs.
pub fn plan_recordings(
    files: &[PathBuf],
    output_root: impl Fn(&Path) -> PathBuf,
) -> Vec<Recording> {
    let roots: Vec<PathBuf> = files.iter().map(|f| output_root(f)).collect();
    let folded = |i: usize, level: usize| {
        (
            roots[i].clone(),
            key_at_level(&files[i], level).to_lowercase(),
        )
    };

    // counts[level] tallies every input's key at that level, per root
    let mut counts: Vec<HashMap<(PathBuf, String), usize>> = Vec::new();
    let mut used: HashSet<(PathBuf, String)> = HashSet::new();
    let mut recordings = Vec::with_capacity(files.len());

    for (i, input) in files.iter().enumerate() {
        let max_level = input.components().count() + 1;
        let mut key = key_at_level(input, max_level);
        for level in 0..=max_level {
            if counts.len() <= level {
                let mut tally = HashMap::new();
                for j in 0..files.len() {
                    *tally.entry(folded(j, level)).or_insert(0) += 1;
                }
                counts.push(tally);
            }
            if counts[level].get(&folded(i, level)) == Some(&1) {
                key = key_at_level(input, level);
                break;
            }
        }

        // Keys from different levels can still clash
        let mut unique = key.clone();
        let mut n = 1;
        while !used.insert((roots[i].clone(), unique.to_lowercase())) {
            unique = format!("{key}_{n}");
            n += 1;
        }
        if unique != source_stem(input) {
            info!("Same-stem inputs: {} -> {unique}", input.display());
        }
        recordings.push(Recording {
            input: input.clone(),
            key: unique,
        });
    }

    recordings
}

/// `stem`, then `stem_ext`, then `parent_stem_ext`, `grandparent_parent_stem_ext`, ...
fn key_at_level(input: &Path, level: usize) -> String {
    let stem = source_stem(input);
    if level == 0 {
        return stem;
    }
    let ext = input
        .extension()
        .map(|e| sanitize_filename(&e.to_string_lossy()))
        .unwrap_or_default();
    let mut parts: Vec<String> = input
        .parent()
        .into_iter()
        .flat_map(Path::components)
        .filter_map(|c| match c {
            Component::Normal(name) => Some(sanitize_filename(&name.to_string_lossy())),
            _ => None,
        })
        .collect();
    let keep = (level - 1).min(parts.len());
    let mut key: Vec<String> = parts.split_off(parts.len() - keep);
    key.push(stem);
    if !ext.is_empty() {
        key.push(ext);
    }
    key.join("_")
}

/// Directory holding the clips and manifest of `recording`.
pub fn recording_dir_for(recording: &Recording, output_root: &Path) -> PathBuf {
    output_root.join(&recording.key)
}

/// Check if a recording should be processed.
pub fn should_process(recording: &Recording, output_root: &Path, force: bool) -> ProcessCheck {
    if force {
        return ProcessCheck::Process;
    }
    let manifest = manifest_path(&recording_dir_for(recording, output_root), &recording.key);
    if manifest.exists() {
        ProcessCheck::SkipComplete(manifest)
    } else {
        ProcessCheck::Process
    }
}

/// Collect input files from paths (files and directories).
///
/// Directories are walked recursively. Output directories (`exclude`, and
/// any directory named `events`) are not descended into, so clips from an
/// earlier run are never picked up as inputs. The result is sorted and free
/// of duplicates.
pub fn collect_input_files(paths: &[PathBuf], exclude: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_file() {
            if is_audio_file(path) {
                files.push(path.clone());
            } else {
                warn!("Skipping unsupported file: {}", path.display());
            }
        } else if path.is_dir() {
            collect_audio_files_recursive(path, exclude, &mut files)?;
        } else {
            warn!("Skipping non-existent path: {}", path.display());
        }
    }

    files.sort();
    files.dedup();
    Ok(files)
}

/// Recursively collect audio files from a directory.
fn collect_audio_files_recursive(
    dir: &Path,
    exclude: &[PathBuf],
    files: &mut Vec<PathBuf>,
) -> Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();

        if path.is_dir() {
            if is_output_dir(&path, exclude) {
                continue;
            }
            collect_audio_files_recursive(&path, exclude, files)?;
        } else if is_audio_file(&path) {
            files.push(path);
        }
    }

    Ok(())
}

fn is_output_dir(path: &Path, exclude: &[PathBuf]) -> bool {
    path.file_name()
        .is_some_and(|name| name == DEFAULT_OUTPUT_DIR)
        || exclude.iter().any(|ex| ex == path)
}

/// Check if a file is a supported audio format.
fn is_audio_file(path: &Path) -> bool {
    // Compare as OsStr to handle non-UTF-8 filenames
    path.extension().is_some_and(|ext| {
        AUDIO_EXTENSIONS
            .iter()
            .any(|known| ext.eq_ignore_ascii_case(known))
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_output_root_with_explicit() {
        let root = output_root_for(Path::new("/data/XC1.wav"), Some(Path::new("/results")));
        assert_eq!(root, PathBuf::from("/results"));
    }

    #[test]
    fn test_output_root_without_explicit() {
        let root = output_root_for(Path::new("/data/XC1.wav"), None);
        assert_eq!(root, PathBuf::from("/data/events"));
    }

    #[test]
    fn test_recording_dir_uses_stem() {
        let recording = Recording::new(Path::new("/data/XC1 Anthus.flac"));
        let dir = recording_dir_for(&recording, Path::new("/out"));
        assert_eq!(dir, PathBuf::from("/out/XC1 Anthus"));
    }

    fn keys(files: &[&str], explicit_root: Option<&Path>) -> Vec<String> {
        let files: Vec<PathBuf> = files.iter().map(PathBuf::from).collect();
        plan_recordings(&files, |input| output_root_for(input, explicit_root))
            .into_iter()
            .map(|r| r.key)
            .collect()
    }

    #[test]
    fn test_plan_keeps_unique_stems() {
        let out = Path::new("/out");
        assert_eq!(
            keys(&["/data/XC1.wav", "/data/XC2.mp3"], Some(out)),
            vec!["XC1", "XC2"]
        );
    }

    #[test]
    fn test_plan_separates_same_stem_different_extension() {
        assert_eq!(
            keys(&["/raw/XC1.mp3", "/raw/XC1.wav", "/raw/XC2.wav"], None),
            vec!["XC1_mp3", "XC1_wav", "XC2"]
        );
    }

    #[test]
    fn test_plan_separates_same_stem_in_different_dirs() {
        let out = Path::new("/out");
        assert_eq!(
            keys(&["/data/site_a/XC1.wav", "/data/site_b/XC1.wav"], Some(out)),
            vec!["site_a_XC1_wav", "site_b_XC1_wav"]
        );
    }

    #[test]
    fn test_plan_ignores_stems_under_other_roots() {
        // Default roots differ: site_a/events and site_b/events
        assert_eq!(
            keys(&["/data/site_a/XC1.wav", "/data/site_b/XC1.wav"], None),
            vec!["XC1", "XC1"]
        );
    }

    #[test]
    fn test_plan_stem_collision_is_case_insensitive() {
        let out = Path::new("/out");
        assert_eq!(
            keys(&["/a/xc1.wav", "/b/XC1.flac"], Some(out)),
            vec!["xc1_wav", "XC1_flac"]
        );
    }

    #[test]
    fn test_plan_keys_are_unique_even_when_levels_clash() {
        let out = Path::new("/out");
        let found = keys(&["/d/XC1.mp3", "/d/XC1.wav", "/d/XC1_wav.flac"], Some(out));
        assert_eq!(found, vec!["XC1_mp3", "XC1_wav", "XC1_wav_1"]);
    }

    #[test]
    fn test_is_audio_file() {
        assert!(is_audio_file(Path::new("test.wav")));
        assert!(is_audio_file(Path::new("test.FLAC")));
        assert!(is_audio_file(Path::new("test.mp3")));
        assert!(is_audio_file(Path::new("ääni_tiedostö.m4a")));
        assert!(!is_audio_file(Path::new("test.txt")));
        assert!(!is_audio_file(Path::new("clip.wav.part")));
    }

    #[test]
    fn test_should_process_respects_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let input = Recording::new(&dir.path().join("XC1.wav"));
        let root = dir.path().join("events");
        assert_eq!(should_process(&input, &root, false), ProcessCheck::Process);

        let rec_dir = recording_dir_for(&input, &root);
        std::fs::create_dir_all(&rec_dir).unwrap();
        let manifest = manifest_path(&rec_dir, "XC1");
        std::fs::write(&manifest, "file\n").unwrap();

        assert_eq!(
            should_process(&input, &root, false),
            ProcessCheck::SkipComplete(manifest)
        );
        assert_eq!(should_process(&input, &root, true), ProcessCheck::Process);
    }

    #[test]
    fn test_collect_skips_output_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("site_a")).unwrap();
        std::fs::create_dir_all(root.join("events").join("XC1")).unwrap();
        std::fs::create_dir_all(root.join("custom_out")).unwrap();
        for file in [
            "b.wav",
            "site_a/a.mp3",
            "notes.txt",
            "events/XC1/XC1_0000.wav",
            "custom_out/c.wav",
        ] {
            std::fs::write(root.join(file), b"").unwrap();
        }

        let files = collect_input_files(
            &[root.to_path_buf(), root.join("b.wav")],
            &[root.join("custom_out")],
        )
        .unwrap();
        assert_eq!(files, vec![root.join("b.wav"), root.join("site_a").join("a.mp3")]);
    }
}
