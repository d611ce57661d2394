//! Soft-loop detection across chains of distinct bindings.
//!
//! The tracer observes every trigger firing. While a chain runs, the source
//! object of each fired trigger is marked as tracing. A firing whose action
//! target is already marked closes a cycle through several bindings (soft
//! loop); a firing of a binding that is still executing is a hard loop. The
//! first binding that closes a given cycle opens a report, and the report
//! collects each binding as the stack unwinds until the frame that started
//! the cycle returns.
//!
//! Detection does not stop recursion. Only the per-binding executing flag
//! does that.

use crate::graph::id::{BindingId, ObjectId};
use std::collections::{HashMap, HashSet};

/// What the graph tells the tracer about one firing.
#[derive(Debug, Clone)]
pub struct BindingTraceInfo {
    pub binding: BindingId,
    pub description: String,
    pub trigger_source: ObjectId,
    pub action_target: ObjectId,
    pub binding_executing: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopKind {
    /// The same binding re-entered while executing.
    Hard,
    /// A cycle through several bindings.
    Soft,
}

/// A closed loop report: the binding that closed the cycle and the bindings
/// seen while unwinding back to where it started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopReport {
    pub description: String,
    pub kind: LoopKind,
    pub path: Vec<String>,
}

#[derive(Debug, Default)]
pub struct BindingLoopTracer {
    tracing: HashMap<ObjectId, usize>,
    depth: usize,
    trace_target: Option<(ObjectId, usize)>,
    active: Option<LoopReport>,
    reported: HashSet<String>,
    loops: Vec<LoopReport>,
}

impl BindingLoopTracer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_tracing(&self, object: ObjectId) -> bool {
        self.tracing.contains_key(&object)
    }

    /// Reports closed so far, oldest first.
    pub fn loops(&self) -> &[LoopReport] {
        &self.loops
    }

    pub fn trace_trigger_fired(&mut self, info: &BindingTraceInfo) {
        self.depth += 1;

        let detected = if info.binding_executing {
            Some((LoopKind::Hard, info.trigger_source))
        } else if self.is_tracing(info.action_target) {
            Some((LoopKind::Soft, info.action_target))
        } else {
            None
        };

        // A loop already reported still claims the trace target, so the
        // bindings inside it don't open reports of their own.
        if let Some((kind, target)) = detected {
            if self.trace_target.is_none() {
                let target_depth = self.tracing.get(&target).copied().unwrap_or(self.depth);
                self.trace_target = Some((target, target_depth));
                if self.reported.insert(info.description.clone()) {
                    tracing::info!(
                        "Binding loop detected ({:?}) at binding {}",
                        kind,
                        info.description
                    );
                    self.active = Some(LoopReport {
                        description: info.description.clone(),
                        kind,
                        path: Vec::new(),
                    });
                }
            }
        }

        self.tracing.entry(info.trigger_source).or_insert(self.depth);
    }

    pub fn end_trace_trigger_fired(&mut self, info: &BindingTraceInfo) {
        if self.tracing.get(&info.trigger_source) == Some(&self.depth) {
            self.tracing.remove(&info.trigger_source);
        }

        if let Some(report) = self.active.as_mut() {
            tracing::info!("  loop path: {}", info.description);
            report.path.push(info.description.clone());
        }
        if self.trace_target == Some((info.trigger_source, self.depth)) {
            if let Some(report) = self.active.take() {
                tracing::info!(
                    "Binding loop through {} closed after {} bindings",
                    report.description,
                    report.path.len()
                );
                self.loops.push(report);
            }
            self.trace_target = None;
        }

        self.depth = self.depth.saturating_sub(1);
    }
}
