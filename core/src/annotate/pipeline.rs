use std::collections::HashMap;
use std::time::Instant;

use super::cache::{Decoration, DecorationCache};
use crate::blame::{BlameCommit, BlameLine};
use crate::config::AnnotationOptions;
use crate::error::Result;
use crate::provider::{BlameProvider, DecorationSurface};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationOutcome {
    /// Decorations were handed to the surface in one batch.
    Applied { decorations: usize },
    /// Blame was not available for the target; nothing was touched.
    NoAnnotation,
}

/// Map blame lines to decorations, in line order.
///
/// Lines whose sha is missing from `commits` are dropped without affecting
/// any other line, so the output is never longer than `lines`.
pub fn compute_annotations(
    lines: &[BlameLine],
    commits: &HashMap<String, BlameCommit>,
    now: u64,
    options: &AnnotationOptions,
) -> Result<Vec<Decoration>> {
    let mut cache = DecorationCache::new(options)?;
    let mut decorations = Vec::with_capacity(lines.len());

    for line in lines {
        let commit = commits.get(&line.sha);
        if let Some(decoration) = cache.build_or_reuse(&line.sha, commit, line.line, now) {
            decorations.push(decoration);
        }
    }

    Ok(decorations)
}

/// Blame `target`, compute its decorations and apply them to `surface`.
pub fn annotate(
    provider: &dyn BlameProvider,
    surface: &dyn DecorationSurface,
    target: &str,
    now: u64,
    options: &AnnotationOptions,
) -> Result<AnnotationOutcome> {
    let start = Instant::now();

    let Some(blame) = provider.blame(target)? else {
        tracing::info!(path = %target, "no blame available, skipping annotations");
        return Ok(AnnotationOutcome::NoAnnotation);
    };

    let decorations = compute_annotations(&blame.lines, &blame.commits, now, options)?;
    surface.set_decorations(options.kind, &decorations);

    tracing::debug!(
        path = %target,
        lines = blame.lines.len(),
        decorations = decorations.len(),
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        "computed annotations"
    );

    Ok(AnnotationOutcome::Applied {
        decorations: decorations.len(),
    })
}
