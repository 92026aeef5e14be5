//! End-to-end pipeline test: synthesis then per-frame problem generation,
//! driven by a generated two-frame GIF stimulus and the deterministic stub
//! provider.

use image::codecs::gif::GifEncoder;
use image::{Frame, Rgba, RgbaImage};
use scenesynth::config::RetrySettings;
use scenesynth::problem::generate_problem_files;
use scenesynth::store::ProblemStore;
use scenesynth::synthesis::{synthesize_problem_setup, SynthesisSettings};
use scenesynth::vlm::{ForegroundReading, StubVlmProvider};
use std::fs;
use std::fs::File;
use tempfile::tempdir;

const GRASS: u8 = 80;
const WATER: u8 = 200;

const OBJECTS_REPLY: &str = r#"{
  "unique_objects": ["key"],
  "generic_objects": ["box"],
  "background_cells": ["grass", "water"],
  "agent": []
}"#;

const ACTIONS_REPLY: &str = r#"{"action_name": ["move"], "action_count": 1}"#;

const DOMAIN_REPLY: &str = "(define (domain gridworld)
(:types agent box key - object)
(:predicates (holding ?a - agent ?o - object))
(:functions (grass) (water) (xloc ?o) (yloc ?o) (gridheight) (gridwidth))
(:action move
 :parameters (?a - agent)
 :precondition (true)
 :effect (true))
)";

const CONFIG_REPLY: &str = r#"{"grid_size": [2, 2], "observability": "full"}"#;

/// 64x64 frame of 32x32 cells: grass everywhere, water in the top-right.
fn base_frame() -> RgbaImage {
    let mut img = RgbaImage::from_pixel(64, 64, Rgba([GRASS, GRASS, GRASS, 255]));
    fill_cell(&mut img, 0, 1, WATER);
    img
}

fn fill_cell(img: &mut RgbaImage, row: u32, col: u32, value: u8) {
    for y in row * 32..(row + 1) * 32 {
        for x in col * 32..(col + 1) * 32 {
            img.put_pixel(x, y, Rgba([value, value, value, 255]));
        }
    }
}

/// 16x16 square centered in a cell, enough contrast to count as content.
fn draw_marker(img: &mut RgbaImage, row: u32, col: u32, value: u8) {
    for y in row * 32 + 8..row * 32 + 24 {
        for x in col * 32 + 8..col * 32 + 24 {
            img.put_pixel(x, y, Rgba([value, value, value, 255]));
        }
    }
}

/// Frame 0 shows a box (dark marker) in the top-left cell; frame 1 shows a
/// key (bright marker) in the bottom-right cell.
fn write_stimulus(store: &ProblemStore) {
    let mut frame0 = base_frame();
    draw_marker(&mut frame0, 0, 0, 0);
    let mut frame1 = base_frame();
    draw_marker(&mut frame1, 1, 1, 255);

    let dir = store.stimulus_dir();
    fs::create_dir_all(&dir).unwrap();
    fs::write(
        dir.join(format!("{}.txt", store.problem())),
        "A 2x2 grid world of grass and water with movable boxes and one key.",
    )
    .unwrap();

    let file = File::create(store.gif_path()).unwrap();
    let mut encoder = GifEncoder::new(file);
    encoder
        .encode_frames(vec![Frame::new(frame0), Frame::new(frame1)])
        .unwrap();
}

fn provider() -> StubVlmProvider {
    StubVlmProvider::new()
        .with_background(GRASS, "grass")
        .with_background(WATER, "water")
        .with_foreground(
            60,
            ForegroundReading {
                object_names: vec!["box".to_string()],
                fact_fragment: "(= (xloc box) $j) (= (yloc box) $i)".to_string(),
            },
        )
        .with_foreground(
            130,
            ForegroundReading {
                object_names: vec!["key".to_string()],
                fact_fragment: "(= (xloc key) $j) (= (yloc key) $i)".to_string(),
            },
        )
        .with_reply("object vocabulary", OBJECTS_REPLY)
        .with_reply("count the number of actions", ACTIONS_REPLY)
        .with_reply("Generate a PDDL domain file", DOMAIN_REPLY)
        .with_reply("configuring a grid-based scenario", CONFIG_REPLY)
}

#[tokio::test]
async fn test_full_pipeline_two_frames() {
    let dir = tempdir().unwrap();
    let store = ProblemStore::new(
        dir.path().join("stimuli"),
        dir.path().join("out"),
        "gridworld",
        "p01",
    );
    write_stimulus(&store);

    let provider = provider();
    let policy = RetrySettings::default().policy();
    let settings = SynthesisSettings::default();

    synthesize_problem_setup(&provider, &store, &settings, &policy)
        .await
        .unwrap();
    generate_problem_files(&provider, &store, &policy)
        .await
        .unwrap();

    // Synthesis artifacts landed on disk.
    let domain = store.load_domain().unwrap();
    assert!(domain.contains("(:action move"));
    let scenario = store.load_scenario().unwrap();
    assert_eq!(scenario.grid_size, (2, 2));

    // Four distinct cell contents across both frames: solid grass, solid
    // water, the box cell and the key cell. One background call each, and
    // foreground calls only for the two marked cells.
    assert_eq!(provider.background_calls(), 4);
    assert_eq!(provider.foreground_calls(), 2);
    let classes: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(store.output_dir().join("signature_classes.json")).unwrap())
            .unwrap();
    assert_eq!(classes.as_object().unwrap().len(), 4);

    let frame0 = fs::read_to_string(store.frame_path(0)).unwrap();
    let frame1 = fs::read_to_string(store.frame_path(1)).unwrap();

    // Frame 0: declaration block, background matrices, the box at (1,1) and
    // the undetected key parked off-grid.
    assert!(frame0.contains("(:objects\nbox1 - box\n)\n"));
    assert!(frame0.contains("(= (grass) (new-bit-matrix false 2 2))"));
    assert!(frame0.contains("(= (water) (new-bit-matrix false 2 2))"));
    assert!(frame0.contains("(= (gridheight) 2)"));
    assert!(frame0.contains("(= (gridwidth) 2)"));
    assert!(frame0.contains("(= (grass) (set-index grass true 1 1))"));
    assert!(frame0.contains("(= (grass) (set-index grass true 2 1))"));
    assert!(frame0.contains("(= (grass) (set-index grass true 2 2))"));
    assert!(frame0.contains("(= (water) (set-index water true 1 2))"));
    assert!(frame0.contains("(= (xloc box1) 1) (= (yloc box1) 1)"));
    assert!(frame0.contains("(= (xloc key) -1)"));
    assert!(frame0.contains("(= (yloc key) -1)"));

    // Frame 1: the frame-0 declaration is reused verbatim, the key gets its
    // real coordinates, and nothing defaults the absent generic box.
    assert!(frame1.contains("(:objects\nbox1 - box\n)\n"));
    assert!(frame1.contains("(= (xloc key) 2) (= (yloc key) 2)"));
    assert!(!frame1.contains("(= (xloc key) -1)"));
    assert!(!frame1.contains("(= (xloc box1)"));

    // The declaration text is persisted with the categories after frame 0.
    let categories = store.load_categories().unwrap();
    assert_eq!(categories.obj_str.as_deref(), Some("(:objects\nbox1 - box\n)\n"));
}

#[tokio::test]
async fn test_rerun_overwrites_frames_deterministically() {
    let dir = tempdir().unwrap();
    let store = ProblemStore::new(
        dir.path().join("stimuli"),
        dir.path().join("out"),
        "gridworld",
        "p02",
    );
    write_stimulus(&store);

    let provider = provider();
    let policy = RetrySettings::default().policy();
    let settings = SynthesisSettings::default();

    synthesize_problem_setup(&provider, &store, &settings, &policy)
        .await
        .unwrap();
    generate_problem_files(&provider, &store, &policy)
        .await
        .unwrap();
    let first_pass = fs::read_to_string(store.frame_path(0)).unwrap();

    generate_problem_files(&provider, &store, &policy)
        .await
        .unwrap();
    let second_pass = fs::read_to_string(store.frame_path(0)).unwrap();

    assert_eq!(first_pass, second_pass);
}
