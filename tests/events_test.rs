//! Tests for event clip writing and the manifest.

#![allow(clippy::unwrap_used, clippy::float_cmp, clippy::cast_precision_loss)]

use flightcall::audio::WaveformBuffer;
use flightcall::config::EventNaming;
use flightcall::detect::CandidateSpan;
use flightcall::events::{
    Event, EventWriter, ManifestRow, WriteOutcome, manifest_path, read_manifest, write_manifest,
};
use tempfile::TempDir;

const SR: u32 = 22_050;

fn source() -> WaveformBuffer {
    let samples: Vec<f32> = (0..SR as usize * 2)
        .map(|i| 0.5 * (i as f32 * 0.05).sin())
        .collect();
    WaveformBuffer::new(samples, SR)
}

fn event(sequence: usize, start: usize, end: usize) -> Event {
    Event::from_span(
        "XC9876 - Turdus iliacus",
        sequence,
        CandidateSpan::new(start, end).unwrap(),
        &source(),
    )
}

#[test]
fn test_sequence_naming() {
    let temp_dir = TempDir::new().unwrap();
    let writer = EventWriter::new(temp_dir.path().to_path_buf(), EventNaming::Sequence, false);

    let outcome = writer.write_event(&event(3, 1000, 5000)).unwrap();
    let filename = outcome.path().file_name().unwrap().to_str().unwrap();
    assert_eq!(filename, "XC9876 - Turdus iliacus_0003.wav");
}

#[test]
fn test_offset_naming() {
    let temp_dir = TempDir::new().unwrap();
    let writer = EventWriter::new(temp_dir.path().to_path_buf(), EventNaming::Offset, false);

    let outcome = writer.write_event(&event(0, 13_230, 20_000)).unwrap();
    let filename = outcome.path().file_name().unwrap().to_str().unwrap();
    assert_eq!(filename, "XC9876 - Turdus iliacus_13230.wav");
}

#[test]
fn test_clip_is_valid_mono_pcm16() {
    let temp_dir = TempDir::new().unwrap();
    let writer = EventWriter::new(temp_dir.path().join("nested"), EventNaming::Sequence, false);

    let ev = event(0, 2000, 6410);
    let outcome = writer.write_event(&ev).unwrap();
    assert!(matches!(outcome, WriteOutcome::Written(_)));

    let reader = hound::WavReader::open(outcome.path()).unwrap();
    let spec = reader.spec();
    assert_eq!(spec.channels, 1);
    assert_eq!(spec.sample_rate, SR);
    assert_eq!(spec.bits_per_sample, 16);
    assert_eq!(spec.sample_format, hound::SampleFormat::Int);
    assert_eq!(reader.len() as usize, 4410);

    // No partial file left behind
    let leftovers: Vec<_> = std::fs::read_dir(temp_dir.path().join("nested"))
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "part"))
        .collect();
    assert!(leftovers.is_empty());
}

#[test]
fn test_existing_clip_is_not_overwritten() {
    let temp_dir = TempDir::new().unwrap();
    let writer = EventWriter::new(temp_dir.path().to_path_buf(), EventNaming::Sequence, false);

    let first = writer.write_event(&event(0, 0, 4000)).unwrap();
    std::fs::write(first.path(), b"sentinel").unwrap();

    let second = writer.write_event(&event(0, 100, 9000)).unwrap();
    assert_eq!(second, WriteOutcome::SkippedExisting(first.path().to_path_buf()));
    assert_eq!(std::fs::read(first.path()).unwrap(), b"sentinel");
}

#[test]
fn test_overwrite_replaces_clip() {
    let temp_dir = TempDir::new().unwrap();
    let writer = EventWriter::new(temp_dir.path().to_path_buf(), EventNaming::Sequence, true);

    let first = writer.write_event(&event(0, 0, 4000)).unwrap();
    std::fs::write(first.path(), b"sentinel").unwrap();

    let second = writer.write_event(&event(0, 0, 4000)).unwrap();
    assert!(matches!(second, WriteOutcome::Written(_)));
    assert!(hound::WavReader::open(second.path()).is_ok());
}

#[test]
fn test_manifest_lists_written_clips() {
    let temp_dir = TempDir::new().unwrap();
    let writer = EventWriter::new(temp_dir.path().to_path_buf(), EventNaming::Sequence, false);
    let events = vec![event(0, 0, 4410), event(1, 22_050, 30_000)];

    let rows: Vec<ManifestRow> = writer
        .write_all(&events)
        .into_iter()
        .zip(&events)
        .map(|(result, ev)| ManifestRow::new(ev, result.unwrap().path()))
        .collect();

    let path = manifest_path(temp_dir.path(), "XC9876");
    write_manifest(&path, &rows).unwrap();
    assert!(path.to_string_lossy().ends_with("XC9876.events.csv"));

    let read = read_manifest(&path).unwrap();
    assert_eq!(read.len(), 2);
    assert_eq!(read[0].file, "XC9876 - Turdus iliacus_0000.wav");
    assert_eq!(read[0].duration_ms, 200.0);
    assert_eq!(read[1].index, 1);
    assert_eq!(read[1].start_s, 1.0);
    for row in &read {
        assert!(temp_dir.path().join(&row.file).exists());
    }
}
