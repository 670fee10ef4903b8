use jam::audio::Stereo;
use jam::clip::{self, ClipBank, ClipId};
use jam::engine::Engine;
use jam::state::{self, AppControl};
use jam::SAMPLE_RATE;

/// A finalized capture: constant-valued mono samples at the engine rate,
/// encoded the way the capture unit encodes them.
fn capture_fixture(seconds: f64, value: f32) -> Vec<u8> {
    let frames = (SAMPLE_RATE * seconds) as usize;
    clip::encode_wav(&vec![value; frames], 1, SAMPLE_RATE as u32).unwrap()
}

fn render(engine: &mut Engine, control: &mut AppControl, frames: usize) -> Vec<Stereo> {
    let mut out = Vec::with_capacity(frames);
    let mut buf = [Stereo::ZERO; 256];
    let mut remaining = frames;
    while remaining > 0 {
        let n = usize::min(remaining, buf.len());
        let block = &mut buf[..n];
        block.fill(Stereo::ZERO);
        engine.render(block);
        out.extend_from_slice(block);
        remaining -= n;
    }
    control.tick();
    out
}

#[test]
fn recording_twice_yields_sequential_clips() {
    let mut bank = ClipBank::new();

    let first = bank.append(capture_fixture(0.1, 0.5)).unwrap();
    assert_eq!(first.id, ClipId(0));
    assert!(!first.looped);

    let second = bank.append(capture_fixture(0.1, 0.5)).unwrap();
    assert_eq!(second.id, ClipId(1));
    assert_eq!(bank.len(), 2);
}

#[test]
fn one_shot_clip_plays_and_ends_on_schedule() {
    let (mut control, mut engine) = state::controls(true);
    let mut bank = ClipBank::new();
    bank.append(capture_fixture(0.25, 0.5)).unwrap();

    // Half playback rate doubles the natural duration
    control.params().pitch.set(0.5).unwrap();
    control.trigger_clip(bank.get(ClipId(0)).unwrap()).unwrap();

    let quarter_second = (SAMPLE_RATE * 0.25) as usize;
    let buf = render(&mut engine, &mut control, quarter_second);
    assert!(control.is_playing(ClipId(0)));
    assert!(buf.iter().any(|f| f.channel(0) != 0.0));

    // A pitch change now must not reach the sounding voice: at the frozen
    // 0.5x rate the clip still has a quarter second left.
    control.params().pitch.set(2.0).unwrap();
    render(&mut engine, &mut control, quarter_second / 2);
    assert!(control.is_playing(ClipId(0)));

    render(&mut engine, &mut control, quarter_second);
    assert!(!control.is_playing(ClipId(0)), "voice should have ended");
}

#[test]
fn volume_is_captured_at_trigger_time() {
    let (mut control, mut engine) = state::controls(true);
    let mut bank = ClipBank::new();
    bank.append(capture_fixture(4.0, 0.5)).unwrap();

    control.params().volume.set(1.0).unwrap();
    control.trigger_clip(bank.get(ClipId(0)).unwrap()).unwrap();

    // The master low-pass passes DC, so the settled level equals
    // sample * gain.
    let buf = render(&mut engine, &mut control, 4096);
    let settled = buf.last().unwrap().channel(0);
    assert!((settled - 0.5).abs() < 0.01, "expected ~0.5, got {settled}");

    // Turning the volume all the way down afterwards changes nothing for
    // the sounding voice; 0.0 is a valid boundary value.
    control.params().volume.set(0.0).unwrap();
    let buf = render(&mut engine, &mut control, 4096);
    let settled = buf.last().unwrap().channel(0);
    assert!((settled - 0.5).abs() < 0.01, "expected ~0.5, got {settled}");

    // A new trigger captures the zero volume and adds nothing.
    control.trigger_clip(bank.get(ClipId(0)).unwrap()).unwrap();
    let buf = render(&mut engine, &mut control, 4096);
    let settled = buf.last().unwrap().channel(0);
    assert!((settled - 0.5).abs() < 0.01, "expected ~0.5, got {settled}");
}

#[test]
fn looping_clip_survives_until_toggled_off() {
    let (mut control, mut engine) = state::controls(true);
    let mut bank = ClipBank::new();
    bank.append(capture_fixture(0.1, 0.5)).unwrap();
    assert_eq!(bank.toggle_loop(ClipId(0)), Some(true));

    control.trigger_clip(bank.get(ClipId(0)).unwrap()).unwrap();

    // Two seconds is twenty times the clip's natural length
    let two_seconds = (SAMPLE_RATE * 2.0) as usize;
    let buf = render(&mut engine, &mut control, two_seconds);
    assert!(control.is_playing(ClipId(0)));
    assert!(buf[buf.len() - 1].channel(0) != 0.0);

    // Toggling the loop off stops the tracked voice
    assert_eq!(bank.toggle_loop(ClipId(0)), Some(false));
    control.stop_clip(ClipId(0)).unwrap();
    render(&mut engine, &mut control, 512);
    assert!(!control.is_playing(ClipId(0)));
}

#[test]
fn retrigger_replaces_the_tracked_voice() {
    let (mut control, mut engine) = state::controls(true);
    let mut bank = ClipBank::new();
    bank.append(capture_fixture(0.5, 0.5)).unwrap();

    control.trigger_clip(bank.get(ClipId(0)).unwrap()).unwrap();
    render(&mut engine, &mut control, 1024);

    // Overlapping re-trigger: the old voice keeps sounding untracked, so
    // stopping the clip only silences the tracked (newer) one.
    control.trigger_clip(bank.get(ClipId(0)).unwrap()).unwrap();
    render(&mut engine, &mut control, 1024);
    assert!(control.is_playing(ClipId(0)));

    control.stop_clip(ClipId(0)).unwrap();
    let buf = render(&mut engine, &mut control, 1024);
    assert!(!control.is_playing(ClipId(0)));
    assert!(
        buf.iter().any(|f| f.channel(0) != 0.0),
        "untracked voice should still be sounding"
    );
}

#[test]
fn decode_failure_is_reported_not_fatal() {
    let (mut control, _engine) = state::controls(true);
    let mut bank = ClipBank::new();
    bank.append(vec![0u8; 24]).unwrap();

    let err = control.trigger_clip(bank.get(ClipId(0)).unwrap());
    assert!(matches!(err, Err(jam::error::AudioError::Decode(_))));
}
