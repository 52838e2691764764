//! Event types and sinks for observing region generation.
//!
//! This module defines [`GenerationEvent`] and a set of sinks and adapters to emit, collect, or
//! forward events while a [`crate::region::Region`] runs its initial or staged generation passes.
use glam::DVec3;

use crate::region::{GenerationReport, SpawnRecord};
use crate::selection::{RunLimits, SelectionOutcome};
use crate::template::{ObjectType, TemplateName};

/// Describes events emitted during generation.
#[non_exhaustive]
#[derive(Debug, Clone)]
pub enum GenerationEvent {
    /// Emitted when the initial pass of a region starts.
    GenerationStarted {
        /// Region name.
        region: String,
        /// Object types that have candidates and will be selected, in order.
        object_types: Vec<ObjectType>,
    },

    /// Emitted when a staged pass starts.
    StageStarted {
        /// Region name.
        region: String,
        /// Stage being generated.
        stage: u32,
        /// Number of templates drained from the stage bucket.
        templates: usize,
    },

    /// Emitted before selection runs for an object type.
    SelectionStarted {
        /// Object type being selected.
        object_type: ObjectType,
        /// Number of candidate entries.
        candidates: usize,
    },

    /// Emitted after a template was spawned and activated.
    TemplateSpawned {
        /// The spawn record.
        record: SpawnRecord,
    },

    /// Emitted after selection finished for an object type.
    SelectionFinished {
        /// Object type that was selected.
        object_type: ObjectType,
        /// Final counters of the pass.
        limits: RunLimits,
    },

    /// Emitted when the region airspace template was synthesized.
    AirspaceSynthesized {
        /// Name of the synthesized template.
        template: TemplateName,
        /// Center of the airspace volume.
        center: DVec3,
        /// Whether `center` came from spawned assets (`false`: origin fallback).
        from_assets: bool,
    },

    /// Emitted when a pass completes.
    GenerationFinished {
        /// Summary of the pass.
        report: GenerationReport,
    },

    /// Non-fatal warning generated during generation.
    Warning {
        /// Context string (e.g. region, object type).
        context: String,
        /// Human-readable message.
        message: String,
    },
}

/// Discriminant of [`GenerationEvent`], used to filter what a sink receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenerationEventKind {
    GenerationStarted,
    StageStarted,
    SelectionStarted,
    TemplateSpawned,
    SelectionFinished,
    AirspaceSynthesized,
    GenerationFinished,
    Warning,
}

impl GenerationEvent {
    pub fn kind(&self) -> GenerationEventKind {
        match self {
            GenerationEvent::GenerationStarted { .. } => GenerationEventKind::GenerationStarted,
            GenerationEvent::StageStarted { .. } => GenerationEventKind::StageStarted,
            GenerationEvent::SelectionStarted { .. } => GenerationEventKind::SelectionStarted,
            GenerationEvent::TemplateSpawned { .. } => GenerationEventKind::TemplateSpawned,
            GenerationEvent::SelectionFinished { .. } => GenerationEventKind::SelectionFinished,
            GenerationEvent::AirspaceSynthesized { .. } => {
                GenerationEventKind::AirspaceSynthesized
            }
            GenerationEvent::GenerationFinished { .. } => GenerationEventKind::GenerationFinished,
            GenerationEvent::Warning { .. } => GenerationEventKind::Warning,
        }
    }
}

impl From<&SelectionOutcome> for GenerationEvent {
    fn from(outcome: &SelectionOutcome) -> Self {
        GenerationEvent::SelectionFinished {
            object_type: outcome.object_type.clone(),
            limits: outcome.limits,
        }
    }
}

/// A generic event sink that accepts [`GenerationEvent`]s.
pub trait EventSink {
    fn send(&mut self, event: GenerationEvent);

    /// Whether events of `kind` should be built and sent at all.
    #[inline]
    fn wants(&self, _kind: GenerationEventKind) -> bool {
        true
    }
}

/// A no-op event sink.
impl EventSink for () {
    #[inline]
    fn send(&mut self, _event: GenerationEvent) {}

    #[inline]
    fn wants(&self, _kind: GenerationEventKind) -> bool {
        false
    }
}

/// An event sink that forwards to a user-provided closure.
pub struct FnSink<F>
where
    F: FnMut(GenerationEvent),
{
    f: F,
}

impl<F> FnSink<F>
where
    F: FnMut(GenerationEvent),
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> EventSink for FnSink<F>
where
    F: FnMut(GenerationEvent),
{
    #[inline]
    fn send(&mut self, event: GenerationEvent) {
        (self.f)(event);
    }
}

/// An event sink that collects all events in a `Vec`.
#[derive(Default)]
pub struct VecSink {
    events: Vec<GenerationEvent>,
}

impl VecSink {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn into_inner(self) -> Vec<GenerationEvent> {
        self.events
    }

    pub fn as_slice(&self) -> &[GenerationEvent] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl EventSink for VecSink {
    #[inline]
    fn send(&mut self, event: GenerationEvent) {
        self.events.push(event);
    }
}

/// Fan-out sink that forwards each event to all contained sinks.
pub struct MultiSink<S: EventSink> {
    pub(crate) sinks: Vec<S>,
}

impl<S: EventSink> MultiSink<S> {
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    pub fn with_sinks(sinks: Vec<S>) -> Self {
        Self { sinks }
    }

    pub fn push(&mut self, sink: S) {
        self.sinks.push(sink);
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }
}

impl<S: EventSink> Default for MultiSink<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: EventSink> EventSink for MultiSink<S> {
    fn send(&mut self, event: GenerationEvent) {
        let Some((last, rest)) = self.sinks.split_last_mut() else {
            return;
        };
        for sink in rest {
            if sink.wants(event.kind()) {
                sink.send(event.clone());
            }
        }
        if last.wants(event.kind()) {
            last.send(event);
        }
    }

    fn wants(&self, kind: GenerationEventKind) -> bool {
        self.sinks.iter().any(|s| s.wants(kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn warning(context: &str) -> GenerationEvent {
        GenerationEvent::Warning {
            context: context.into(),
            message: "m".into(),
        }
    }

    #[test]
    fn vec_sink_collects_events() {
        let mut sink = VecSink::new();
        assert!(sink.is_empty());
        sink.send(warning("a"));
        sink.send(warning("b"));
        assert_eq!(sink.len(), 2);
        sink.clear();
        assert!(sink.is_empty());
    }

    #[test]
    fn unit_sink_wants_nothing() {
        assert!(!().wants(GenerationEventKind::Warning));
    }

    #[test]
    fn multi_sink_fans_out_events() {
        let mut multi = MultiSink::with_sinks(vec![VecSink::new(), VecSink::new()]);
        multi.send(warning("ctx"));
        assert_eq!(multi.sinks.len(), 2);
        assert_eq!(multi.sinks[0].len(), 1);
        assert_eq!(multi.sinks[1].len(), 1);
        matches!(multi.sinks[0].as_slice()[0], GenerationEvent::Warning { .. })
            .then_some(())
            .expect("event captured");
    }

    #[test]
    fn empty_multi_sink_drops_events() {
        let mut multi: MultiSink<VecSink> = MultiSink::default();
        multi.send(warning("ctx"));
        assert!(!multi.wants(GenerationEventKind::Warning));
    }

    #[test]
    fn fn_sink_invokes_callback() {
        let mut count = 0;
        let mut sink = FnSink::new(|_event| {
            count += 1;
        });
        sink.send(warning("ctx"));
        assert_eq!(count, 1);
    }

    #[test]
    fn kind_matches_variant() {
        assert_eq!(warning("x").kind(), GenerationEventKind::Warning);
    }
}
