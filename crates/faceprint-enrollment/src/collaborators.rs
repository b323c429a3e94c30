// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Interfaces to the camera pipeline, the feature extractor and the name
//! input, plus simple in-memory implementations.

use std::collections::VecDeque;
use std::fmt::Display;

use faceprint_templates::Embedding;

/// Feature extractor (`embed(image) -> fixed-length vector`)
pub trait FeatureExtractor {
    /// Image type accepted by the model
    type Frame;
    type Error: Display;

    /// Compute the embedding of a detected face
    fn embed(&mut self, frame: &Self::Frame) -> Result<Embedding, Self::Error>;
}

/// Camera pipeline with face detection
pub trait CaptureSource {
    /// Cropped face image handed to the extractor
    type Frame;
    type Error: Display;

    /// Poll once for a detected subject
    ///
    /// # Returns
    /// `Some(frame)` when a face was detected this cycle
    fn poll_detection(&mut self) -> Result<Option<Self::Frame>, Self::Error>;
}

/// Source of enrollment requests (host console, UI, ...)
pub trait NameSource {
    /// Next requested identity name; an empty string means no request
    fn take_name(&mut self) -> Option<String>;
}

/// FIFO of enrollment requests
#[derive(Debug, Clone, Default)]
pub struct QueuedNames {
    queue: VecDeque<String>,
}

impl QueuedNames {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>) {
        self.queue.push_back(name.into());
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl NameSource for QueuedNames {
    fn take_name(&mut self) -> Option<String> {
        self.queue.pop_front()
    }
}

impl<S: Into<String>> FromIterator<S> for QueuedNames {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            queue: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Capture source replaying a fixed sequence of poll results
///
/// Once the script is exhausted every poll reports no detection.
#[derive(Debug, Clone)]
pub struct ScriptedCapture<F> {
    script: VecDeque<Result<Option<F>, String>>,
}

impl<F> ScriptedCapture<F> {
    pub fn new() -> Self {
        Self {
            script: VecDeque::new(),
        }
    }

    /// Queue a detected frame
    pub fn detect(&mut self, frame: F) -> &mut Self {
        self.script.push_back(Ok(Some(frame)));
        self
    }

    /// Queue a cycle without a subject
    pub fn nothing(&mut self) -> &mut Self {
        self.script.push_back(Ok(None));
        self
    }

    /// Queue a camera failure
    pub fn fail(&mut self, reason: impl Into<String>) -> &mut Self {
        self.script.push_back(Err(reason.into()));
        self
    }

    /// Polls left in the script
    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl<F> Default for ScriptedCapture<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F> FromIterator<F> for ScriptedCapture<F> {
    fn from_iter<I: IntoIterator<Item = F>>(iter: I) -> Self {
        Self {
            script: iter.into_iter().map(|frame| Ok(Some(frame))).collect(),
        }
    }
}

impl<F> CaptureSource for ScriptedCapture<F> {
    type Frame = F;
    type Error = String;

    fn poll_detection(&mut self) -> Result<Option<F>, String> {
        self.script.pop_front().unwrap_or(Ok(None))
    }
}

/// Extractor backed by a closure
pub struct FnExtractor<F, Fr> {
    embed: F,
    _frame: std::marker::PhantomData<fn(&Fr)>,
}

impl<F, Fr> FnExtractor<F, Fr>
where
    F: FnMut(&Fr) -> Result<Embedding, String>,
{
    pub fn new(embed: F) -> Self {
        Self {
            embed,
            _frame: std::marker::PhantomData,
        }
    }
}

impl<F, Fr> FeatureExtractor for FnExtractor<F, Fr>
where
    F: FnMut(&Fr) -> Result<Embedding, String>,
{
    type Frame = Fr;
    type Error = String;

    fn embed(&mut self, frame: &Fr) -> Result<Embedding, String> {
        (self.embed)(frame)
    }
}

/// Extractor for pipelines whose frames already are embeddings
#[derive(Debug, Clone, Copy, Default)]
pub struct PrecomputedEmbeddings;

impl FeatureExtractor for PrecomputedEmbeddings {
    type Frame = Embedding;
    type Error = std::convert::Infallible;

    fn embed(&mut self, frame: &Embedding) -> Result<Embedding, Self::Error> {
        Ok(frame.clone())
    }
}
