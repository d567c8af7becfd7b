//! Processing a clip, exporting it and loading it back

use chrono::NaiveDate;
use voxlab_audio::{DemoSample, EffectId, EffectRegistry};
use voxlab_library::{decode_audio, encode_wav, export_filename, export_wav, AudioLoader};

#[test]
fn processed_clip_survives_export() {
    let clip = DemoSample::Vowels.render().unwrap();
    let effect = EffectRegistry::global().get("robot").unwrap();
    let processed = effect.process(&clip, &effect.default_params()).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let date = NaiveDate::from_ymd_opt(2025, 1, 31).unwrap();
    let name = export_filename(EffectId::Robot.display_name(), date);
    let path = export_wav(&processed, dir.path(), &name).unwrap();
    assert_eq!(path.file_name().unwrap(), "voice_robot_2025-01-31.wav");

    // Loading at the clip's own rate skips resampling
    let loaded = AudioLoader::with_sample_rate(processed.sample_rate())
        .load(&path)
        .unwrap();
    assert_eq!(loaded.len(), processed.len());
    assert_eq!(loaded.num_channels(), processed.num_channels());
    for (a, b) in processed.channel(0).iter().zip(loaded.channel(0)) {
        let expected = a.clamp(-1.0, 1.0);
        assert!((expected - b).abs() <= 1.0 / 32767.0);
    }
}

#[test]
fn demo_clip_resamples_to_session_rate() {
    let clip = DemoSample::Melody.render().unwrap();
    let bytes = encode_wav(&clip).unwrap();
    let decoded = decode_audio(&bytes, 48_000).unwrap();

    assert_eq!(decoded.sample_rate(), 48_000);
    let expected = clip.len() as f64 * 48_000.0 / 44_100.0;
    assert!((decoded.len() as f64 - expected).abs() < 2048.0);
}
