// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Encoded images as they appear inside an erased flash region

use faceprint_serialization::{
    decode_or_empty, encoded_len, inspect_header, serialize, ChunkPlan, HeaderStatus, HEADER_LEN,
};
use faceprint_templates::{Embedding, TemplateStore};

const REGION_SIZE: usize = 4096;

fn enrolled_store(dimension: usize) -> TemplateStore {
    let mut store = TemplateStore::with_dimension(dimension);
    for (person, name) in ["Alice", "Bob", "Carol"].iter().enumerate() {
        for sample in 0..3 {
            let values = (0..dimension)
                .map(|i| ((i * 7 + person * 31 + sample) % 256) as u8 as i8)
                .collect();
            store.add_sample(name, Embedding::new(values).unwrap()).unwrap();
        }
    }
    store
}

fn region_with(image: &[u8]) -> Vec<u8> {
    let mut region = vec![0xFF; REGION_SIZE];
    region[..image.len()].copy_from_slice(image);
    region
}

#[test]
fn test_image_inside_erased_region_decodes() {
    let store = enrolled_store(128);
    let image = serialize(&store).unwrap();
    assert_eq!(image.len(), encoded_len(&store));

    let region = region_with(&image);
    match inspect_header(&region[..HEADER_LEN]) {
        HeaderStatus::Valid(header) => assert_eq!(header.total_len(), image.len()),
        other => panic!("unexpected header status {:?}", other),
    }
    assert_eq!(decode_or_empty(&region), store);
}

#[test]
fn test_reading_only_header_length_is_not_enough() {
    let image = serialize(&enrolled_store(16)).unwrap();
    assert!(decode_or_empty(&image[..HEADER_LEN]).is_empty());
}

#[test]
fn test_chunked_write_reassembles_image() {
    let image = serialize(&enrolled_store(64)).unwrap();
    let plan = ChunkPlan::new(0xC000_0000, 32, image.len()).unwrap();

    let mut region = vec![0xFF; REGION_SIZE];
    for chunk in &plan {
        let offset = (chunk.address - plan.base_address()) as usize;
        region[offset..offset + chunk.len].copy_from_slice(chunk.slice(&image));
    }
    assert_eq!(&region[..image.len()], &image[..]);
    assert_eq!(plan.chunk_count(), image.len().div_ceil(32));
}
