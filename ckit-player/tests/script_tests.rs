//! Script loading and playback tests

mod helpers;

use ckit_common::Easing;
use ckit_player::script::Script;
use ckit_player::{Error, HostLoop, Playlist, PlaylistPhase, Stage};
use helpers::Completion;
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

const DEMO: &str = include_str!("../demos/intro.toml");

#[test]
fn test_demo_script_builds() {
    let script = Script::parse(DEMO).unwrap();
    let groups = script.build(&Stage::new(), Easing::Linear).unwrap();

    let labels: Vec<_> = groups.iter().map(|g| g.label().unwrap_or("")).collect();
    assert_eq!(labels, vec!["fade-in", "dialogue", "reply"]);
    assert_eq!(groups[0].nominal_duration(), Duration::from_secs(2));
    // Tied at 2.5s: the caption was declared first
    assert_eq!(groups[1].designated_index(), Some(0));
    assert_eq!(groups[2].designated_index(), Some(0));
}

#[test]
fn test_demo_plays_to_completion() {
    let stage = Stage::new();
    let host = HostLoop::new();
    let groups = Script::parse(DEMO)
        .unwrap()
        .build(&stage, Easing::Linear)
        .unwrap();
    let playlist = Playlist::with_groups(&host, groups).unwrap();
    let done = Completion::new();

    playlist.begin(done.callback(&host));
    host.run_until_idle(Duration::from_millis(250), 1000);

    assert_eq!(done.count(), 1);
    assert_eq!(done.fired_at(), Some(Duration::from_millis(7500)));
    assert_eq!(playlist.phase(), PlaylistPhase::Drained);
    assert_eq!(stage.property("screen", "alpha"), Some(1.0));
    assert_eq!(stage.property("hero", "x"), Some(40.0));
    assert_eq!(stage.overlay_count(), 0);
}

#[test]
fn test_skip_removes_caption_overlay() {
    let stage = Stage::new();
    let host = HostLoop::new();
    let script = Script::parse(
        r#"
        [[group]]
        label = "talk"
        [[group.action]]
        kind = "caption"
        target = "hero"
        text = "A very long line"
        duration = 30.0
        "#,
    )
    .unwrap();
    let playlist =
        Playlist::with_groups(&host, script.build(&stage, Easing::Linear).unwrap()).unwrap();

    playlist.begin(|| {});
    host.tick(Duration::from_secs(1));
    assert_eq!(stage.overlays("hero")[0].text, "A very long line");

    playlist.skip_current();
    host.tick(Duration::from_millis(16));
    assert_eq!(stage.overlay_count(), 0);
    assert_eq!(playlist.phase(), PlaylistPhase::Drained);
}

#[test]
fn test_negative_duration_is_rejected() {
    let script = Script::parse(
        r#"
        [[group]]
        label = "broken"
        [[group.action]]
        kind = "wait"
        duration = -1.0
        "#,
    )
    .unwrap();

    let err = script.build(&Stage::new(), Easing::Linear).unwrap_err();
    match err {
        Error::Script(message) => {
            assert!(message.contains("broken"), "{}", message);
            assert!(message.contains("non-negative"), "{}", message);
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn test_negative_cue_offset_is_rejected() {
    let script = Script::parse(
        r#"
        [[group]]
        [[group.action]]
        kind = "wait"
        duration = 1.0
        cues = [{ at = -0.5, note = "too early" }]
        "#,
    )
    .unwrap();

    assert!(matches!(
        script.build(&Stage::new(), Easing::Linear),
        Err(Error::Script(_))
    ));
}

#[test]
fn test_unknown_kind_is_a_parse_error() {
    let err = Script::parse(
        r#"
        [[group]]
        [[group.action]]
        kind = "explode"
        duration = 1.0
        "#,
    )
    .unwrap_err();
    assert!(matches!(err, Error::Script(_)));
}

#[test]
fn test_missing_field_is_a_parse_error() {
    let err = Script::parse(
        r#"
        [[group]]
        [[group.action]]
        kind = "caption"
        target = "hero"
        duration = 1.0
        "#,
    )
    .unwrap_err();
    assert!(matches!(err, Error::Script(message) if message.contains("text")));
}

fn assert_rejects_key(script: &str, key: &str) {
    match Script::parse(script) {
        Err(Error::Script(message)) => assert!(message.contains(key), "{}", message),
        other => panic!("expected '{}' to be rejected, got {:?}", key, other),
    }
}

#[test]
fn test_misspelled_group_table_is_rejected() {
    assert_rejects_key(
        r#"
        [[groups]]
        label = "intro"
        "#,
        "groups",
    );
}

#[test]
fn test_misspelled_action_table_is_rejected() {
    assert_rejects_key(
        r#"
        [[group]]
        [[group.actions]]
        kind = "wait"
        duration = 1.0
        "#,
        "actions",
    );
}

#[test]
fn test_misspelled_action_field_is_rejected() {
    assert_rejects_key(
        r#"
        [[group]]
        [[group.action]]
        kind = "wait"
        duration = 1.0
        easign = "ease_in"
        "#,
        "easign",
    );
}

#[test]
fn test_field_from_another_kind_is_rejected() {
    assert_rejects_key(
        r#"
        [[group]]
        [[group.action]]
        kind = "wait"
        duration = 1.0
        text = "waits have no text"
        "#,
        "text",
    );
}

#[test]
fn test_misspelled_cue_field_is_rejected() {
    assert_rejects_key(
        r#"
        [[group]]
        [[group.action]]
        kind = "wait"
        duration = 1.0
        cues = [{ at = 0.5, nte = "blink" }]
        "#,
        "nte",
    );
}

#[test]
fn test_load_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(DEMO.as_bytes()).unwrap();

    let script = Script::load(file.path()).unwrap();
    assert_eq!(script.groups.len(), 3);
    assert_eq!(script.action_count(), 6);
}

#[test]
fn test_load_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = Script::load(&dir.path().join("nope.toml")).unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}
