use crate::entry::Entry;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct LevelCounts {
    pub dirs: usize,
    pub files: usize,
}

/// Directory and file counts per depth, over the included entries of a walk.
/// The root entry itself is not counted.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct DirectorySummary {
    levels: BTreeMap<usize, LevelCounts>,
}

impl DirectorySummary {
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = &'a Entry>) -> Self {
        let mut levels: BTreeMap<usize, LevelCounts> = BTreeMap::new();
        for entry in entries {
            if !entry.included || entry.depth == 0 {
                continue;
            }
            let counts = levels.entry(entry.depth).or_default();
            if entry.is_dir() {
                counts.dirs += 1;
            } else {
                counts.files += 1;
            }
        }
        Self { levels }
    }

    pub fn levels(&self) -> impl Iterator<Item = (usize, LevelCounts)> + '_ {
        self.levels.iter().map(|(depth, counts)| (*depth, *counts))
    }

    pub fn total(&self) -> LevelCounts {
        self.levels
            .values()
            .fold(LevelCounts::default(), |acc, c| LevelCounts {
                dirs: acc.dirs + c.dirs,
                files: acc.files + c.files,
            })
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

impl fmt::Display for DirectorySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (depth, counts) in self.levels() {
            writeln!(
                f,
                "Level {}: {} dirs, {} files",
                depth, counts.dirs, counts.files
            )?;
        }
        Ok(())
    }
}
