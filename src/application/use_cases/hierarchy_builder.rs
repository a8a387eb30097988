use std::collections::HashSet;

/// Level-by-level section prefixes derived from dotted fixture paths.
///
/// Level `i` holds every distinct prefix made of the first `i + 1` segments,
/// in the order the prefixes were first seen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionHierarchy {
    levels: Vec<Vec<String>>,
}

impl SectionHierarchy {
    pub fn from_paths<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let paths: Vec<S> = paths.into_iter().collect();
        let max_depth = paths
            .iter()
            .map(|path| dot_count(path.as_ref()) + 1)
            .max()
            .unwrap_or(0);

        let mut levels = Vec::with_capacity(max_depth);
        for level in 0..max_depth {
            let mut seen = HashSet::new();
            let mut prefixes = Vec::new();

            for path in &paths {
                let path = path.as_ref();
                if dot_count(path) < level {
                    continue;
                }
                let prefix = prefix_of(path, level + 1);
                if seen.insert(prefix) {
                    prefixes.push(prefix.to_string());
                }
            }
            levels.push(prefixes);
        }

        Self { levels }
    }

    pub fn levels(&self) -> &[Vec<String>] {
        &self.levels
    }

    /// One more than the largest dot count among the input paths.
    pub fn max_depth(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

fn dot_count(path: &str) -> usize {
    path.matches('.').count()
}

/// The first `segments` dot-separated segments of `path`.
fn prefix_of(path: &str, segments: usize) -> &str {
    match path.match_indices('.').nth(segments.saturating_sub(1)) {
        Some((index, _)) => &path[..index],
        None => path,
    }
}
