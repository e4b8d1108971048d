//! Concurrent loading of one side of the comparison
//!
//! Every source gets its own task. Each task normalizes its streams locally
//! and appends the whole batch under one lock, so batches never interleave.
//! The first failure stops the run and nothing collected so far is returned.

use crate::error::{Error, Result};
use crate::normalize::normalize;
use crate::resource::Resource;
use crate::source::{BoxedSource, Source};
use log::debug;
use rayon::prelude::*;
use std::sync::{Mutex, PoisonError};

/// Upper bound on worker threads for a single side
const MAX_WORKERS: usize = 32;

/// Load and normalize every source, merging the results
///
/// Order across sources is unspecified; order within a source is kept.
pub fn aggregate(sources: &[BoxedSource]) -> Result<Vec<Resource>> {
    if sources.is_empty() {
        return Ok(Vec::new());
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(sources.len().min(MAX_WORKERS))
        .build()
        .map_err(|e| Error::ThreadPool(e.to_string()))?;

    let collected: Mutex<Vec<Resource>> = Mutex::new(Vec::new());

    pool.install(|| {
        sources.par_iter().try_for_each(|source| {
            let batch = load_source(source.as_ref())?;
            collected
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .extend(batch);
            Ok::<(), Error>(())
        })
    })?;

    Ok(collected
        .into_inner()
        .unwrap_or_else(PoisonError::into_inner))
}

/// Load and normalize a single source
pub fn load_source(source: &dyn Source) -> Result<Vec<Resource>> {
    let mut resources = Vec::new();
    for stream in source.streams()? {
        resources.extend(normalize(&stream)?);
    }
    debug!("{}: {} resources", source.origin(), resources.len());
    Ok(resources)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::Stream;
    use std::collections::HashSet;

    /// In-memory source for tests
    #[derive(Debug)]
    struct StaticSource {
        origin: String,
        content: String,
    }

    impl StaticSource {
        fn boxed(origin: &str, content: impl Into<String>) -> BoxedSource {
            Box::new(Self {
                origin: origin.to_string(),
                content: content.into(),
            })
        }
    }

    impl Source for StaticSource {
        fn origin(&self) -> String {
            self.origin.clone()
        }

        fn streams(&self) -> Result<Vec<Stream>> {
            Ok(vec![Stream::new(
                self.origin.clone(),
                self.content.clone().into_bytes(),
            )])
        }
    }

    #[derive(Debug)]
    struct BrokenSource;

    impl Source for BrokenSource {
        fn origin(&self) -> String {
            "broken".to_string()
        }

        fn streams(&self) -> Result<Vec<Stream>> {
            Err(Error::Io {
                path: "broken".into(),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
            })
        }
    }

    fn config_maps(namespace: &str, count: usize) -> String {
        (0..count)
            .map(|i| {
                format!(
                    "apiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: cm-{i}\n  namespace: {namespace}\n"
                )
            })
            .collect::<Vec<_>>()
            .join("---\n")
    }

    #[test]
    fn test_no_sources() {
        assert!(aggregate(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_merges_two_sources_without_loss() {
        for _ in 0..20 {
            let sources = vec![
                StaticSource::boxed("one", config_maps("one", 100)),
                StaticSource::boxed("two", config_maps("two", 100)),
            ];

            let merged = aggregate(&sources).unwrap();
            assert_eq!(merged.len(), 200);

            let ids: HashSet<_> = merged.iter().map(Resource::id).collect();
            assert_eq!(ids.len(), 200);
        }
    }

    #[test]
    fn test_batches_are_contiguous() {
        let sources = vec![
            StaticSource::boxed("one", config_maps("one", 50)),
            StaticSource::boxed("two", config_maps("two", 50)),
        ];

        let merged = aggregate(&sources).unwrap();
        let first = merged[0].namespace().to_string();
        assert!(merged[..50].iter().all(|r| r.namespace() == first));
        assert!(merged[50..].iter().all(|r| r.namespace() != first));

        // Document order inside a source is kept
        let names: Vec<_> = merged[..50].iter().map(Resource::name).collect();
        let expected: Vec<_> = (0..50).map(|i| format!("cm-{i}")).collect();
        assert_eq!(names, expected);
    }

    #[test]
    fn test_duplicates_are_kept() {
        let sources = vec![
            StaticSource::boxed("one", config_maps("ns", 1)),
            StaticSource::boxed("two", config_maps("ns", 1)),
        ];
        assert_eq!(aggregate(&sources).unwrap().len(), 2);
    }

    #[test]
    fn test_one_failure_fails_the_side() {
        let sources: Vec<BoxedSource> = vec![
            StaticSource::boxed("good", config_maps("ns", 10)),
            Box::new(BrokenSource),
        ];
        assert!(matches!(aggregate(&sources), Err(Error::Io { .. })));
    }

    #[test]
    fn test_decode_failure_fails_the_side() {
        let sources = vec![
            StaticSource::boxed("good", config_maps("ns", 10)),
            StaticSource::boxed("bad.yaml", "kind: [oops\n"),
        ];
        let err = aggregate(&sources).unwrap_err();
        assert!(err.to_string().contains("bad.yaml"));
    }

    #[test]
    fn test_many_sources() {
        let sources: Vec<BoxedSource> = (0..100)
            .map(|i| StaticSource::boxed(&format!("s{i}"), config_maps(&format!("ns{i}"), 3)))
            .collect();
        assert_eq!(aggregate(&sources).unwrap().len(), 300);
    }
}
