// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! End-to-end scenarios: configuration -> store -> raw flash -> restore

use std::io::Write;

use faceprint::hal::FlashOp;
use faceprint::prelude::*;
use faceprint::simulated_device;

const BASE: u32 = 0xC000_0000;

fn emb(values: &[i8]) -> Embedding {
    Embedding::from_slice(values).unwrap()
}

fn small_config() -> FaceprintConfig {
    let mut config = FaceprintConfig::default();
    config.flash.region_size = 4096;
    config.flash.device_capacity = 4096;
    config
}

fn device_of(system: &FaceprintSystem<SimulatedNorFlash, ManualClock>) -> SimulatedNorFlash {
    system.persistence().adapter().device().clone()
}

#[test]
fn test_consolidated_template_survives_reset() {
    let config = small_config();
    let mut system = FaceprintSystem::simulated(&config, ManualClock::new()).unwrap();
    for i in 1..=5i8 {
        system
            .store()
            .add_sample("Alice", emb(&[i, i + 1, i + 2, i + 3]))
            .unwrap();
    }
    assert_eq!(system.store().consolidate("Alice"), emb(&[3, 4, 5, 6]));
    let report = system.persist().unwrap();
    assert!(report.verified);

    let mut restored =
        FaceprintSystem::new(&config, device_of(&system), ManualClock::new()).unwrap();
    assert_eq!(restored.boot().unwrap(), 1);
    let snapshot = restored.store().snapshot();
    let alice = snapshot.get_by_name("Alice").unwrap();
    assert_eq!(alice.samples(), &[emb(&[3, 4, 5, 6])]);
}

#[test]
fn test_query_matches_closest_identity() {
    let mut system = FaceprintSystem::simulated(&small_config(), ManualClock::new()).unwrap();
    system.store().add_sample("Alice", emb(&[3, 4, 5, 6])).unwrap();
    system.store().add_sample("Bob", emb(&[10, 10, 10, 10])).unwrap();
    system.persist().unwrap();

    match system.recognize(&emb(&[3, 4, 5, 5])) {
        MatchOutcome::Match { name, distance } => {
            assert_eq!(name, "Alice");
            assert_eq!(distance, 1.0);
        }
        other => panic!("expected a match, got {}", other),
    }
}

#[test]
fn test_blank_flash_boots_empty() {
    let mut system = FaceprintSystem::simulated(&small_config(), ManualClock::new()).unwrap();
    assert_eq!(system.boot().unwrap(), 0);
    assert!(system.store().is_empty());
    assert!(matches!(
        system.recognize(&emb(&[1, 2, 3])),
        MatchOutcome::NoMatch { .. }
    ));
}

#[test]
fn test_persisting_twice_is_byte_identical() {
    let mut system = FaceprintSystem::simulated(&small_config(), ManualClock::new()).unwrap();
    system.store().add_sample("Alice", emb(&[3, 4, 5, 6])).unwrap();
    system.store().add_sample("Bob", emb(&[-7, 0, 7, 127])).unwrap();

    system.persist().unwrap();
    let first = device_of(&system).contents().to_vec();
    system.persist().unwrap();
    let second = device_of(&system).contents().to_vec();
    assert_eq!(first, second);
}

#[test]
fn test_forty_byte_image_in_sixteen_byte_chunks() {
    let mut config = small_config();
    config.flash.chunk_size = 16;
    let mut system = FaceprintSystem::simulated(&config, ManualClock::new()).unwrap();

    // 13-byte header + name (1 + 5) + count (1) + vector (2 + 18) = 40 bytes
    system
        .store()
        .add_sample("Alice", Embedding::new(vec![1; 18]).unwrap())
        .unwrap();
    let report = system.persist().unwrap();
    assert_eq!(report.bytes_written, 40);
    assert_eq!(report.chunks, 3);

    let device = device_of(&system);
    let writes: Vec<FlashOp> = device
        .operations()
        .iter()
        .copied()
        .filter(|op| !matches!(op, FlashOp::Read { .. }))
        .collect();
    assert_eq!(
        writes,
        vec![
            FlashOp::Erase,
            FlashOp::Program { address: BASE, len: 16 },
            FlashOp::Program { address: BASE + 16, len: 16 },
            FlashOp::Program { address: BASE + 32, len: 8 },
        ]
    );
}

#[test]
fn test_registration_loop_from_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[flash]
base_address = 0xC0000000
region_size = 4096
device_capacity = 4096
word_width = 16

[enrollment]
samples_per_enrollment = 2
sample_interval_ms = 0

[matching]
max_distance = 16.0
"#
    )
    .unwrap();
    let config = load_config(Some(file.path()), None).unwrap();
    assert_eq!(config.enrollment.samples_per_enrollment, 2);

    let clock = ManualClock::new();
    let mut capture = ScriptedCapture::new();
    capture
        .detect(emb(&[0, 0, 0, 0]))
        .detect(emb(&[2, 2, 2, 2]))
        .detect(emb(&[4, 4, 4, 4]));
    let mut registration = build_registration_loop(
        &config,
        simulated_device(&config.flash).unwrap(),
        clock.clone(),
        QueuedNames::from_iter(["Bob"]),
        capture,
        PrecomputedEmbeddings,
    )
    .unwrap();

    let mut outcomes = Vec::new();
    for _ in 0..6 {
        outcomes.extend(registration.run_cycle());
        clock.advance_ms(10);
    }
    assert!(outcomes
        .iter()
        .any(|o| matches!(o, StepOutcome::Persisted { name, .. } if name == "Bob")));
    assert!(registration.machine().state().is_idle());

    let device = registration.persistence().adapter().device().clone();
    let mut restored = FaceprintSystem::new(&config, device, ManualClock::new()).unwrap();
    assert_eq!(restored.boot().unwrap(), 1);
    assert_eq!(restored.recognize(&emb(&[3, 3, 3, 3])).name(), Some("Bob"));
}

#[test]
fn test_shipped_configuration_matches_defaults() {
    let shipped = include_str!("../faceprint_configuration.toml");
    let config = faceprint::config::load_config_from_str(shipped, None).unwrap();
    assert_eq!(config, FaceprintConfig::default());
    assert!(faceprint::config::validate_config(&config).is_ok());
}
