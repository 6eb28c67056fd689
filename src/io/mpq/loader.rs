use std::cmp::Ordering;
use std::fs;
use std::ops::DerefMut;
use std::path::Path;
use std::sync::RwLock;

use anyhow::Context;
use itertools::Itertools;
use log::{error, trace, warn};

use mpq::Archive;

use crate::io::common::loader::RawAssetLoader;

/// One or more mounted MPQ archives, resolving virtual paths against them in
/// the client's patch-priority order. Safe to share across threads; every
/// archive sits behind its own lock so concurrent loads only contend when they
/// hit the same archive.
pub struct MPQPackageGroup {
    mounted: Vec<MountedArchive>,
    #[allow(unused)]
    // Will become used once archives are re-opened per thread instead of locked.
    data_folder: String,
}

struct MountedArchive {
    name: String,
    archive: RwLock<Archive>,
}

#[derive(Ord, PartialOrd, Eq, PartialEq)]
enum MPQType {
    Patch,
    Wotlk,
    Tbc,
    Base,
    Common,
    Unknown,
}

impl MPQPackageGroup {
    /// Mounts every MPQ under `data_folder` plus the subfolder matching
    /// `locale` (e.g. `enUS`), which carries the localized archives.
    /// load-order: patch-Z>A>9>1>lichking>expansion>base>common
    /// see also https://github.com/namreeb/namigator/issues/22#issuecomment-833183096
    pub fn new(data_folder: &str, locale: &str) -> Result<Self, anyhow::Error> {
        let entries = fs::read_dir(data_folder)
            .with_context(|| format!("Failed to enumerate data folder: {}", data_folder))?
            .filter_map(|file| file.ok())
            .flat_map(|file| {
                if file.path().is_dir() {
                    if !file.file_name().eq_ignore_ascii_case(locale) {
                        return vec![];
                    }
                    return fs::read_dir(file.path())
                        .map(|dir| {
                            dir.filter_map(|file| file.ok())
                                .filter(|file| file.path().is_file()) // no further recursion
                                .collect_vec()
                        })
                        .unwrap_or_default();
                }

                vec![file]
            })
            .filter_map(|entry| {
                entry
                    .file_name()
                    .into_string()
                    .ok()
                    .map(|name| (name, entry.path()))
            })
            .filter(|(name, _)| name.to_ascii_lowercase().ends_with(".mpq"))
            .sorted_by(|a, b| MPQPackageGroup::sorting_order(&a.0, &b.0))
            .collect_vec();

        let mut mounted = Vec::with_capacity(entries.len());
        for (name, path) in entries {
            mounted.push(MountedArchive {
                archive: RwLock::new(Self::open_archive(&path)?),
                name,
            });
        }

        trace!("Mounted {} archives from {}", mounted.len(), data_folder);
        Ok(MPQPackageGroup {
            mounted,
            data_folder: data_folder.into(),
        })
    }

    fn open_archive(path: &Path) -> Result<Archive, anyhow::Error> {
        Archive::open(path).with_context(|| format!("Failed to load MPQ {}", path.display()))
    }

    /// Mounted archive names in their priority order. One tree package per entry.
    pub fn archive_names(&self) -> impl Iterator<Item = &str> {
        self.mounted.iter().map(|m| m.name.as_str())
    }

    /// `(archive name, listfile payload)` for every archive that carries one.
    /// The listfile enumerates the archive's virtual paths, backslash separated.
    pub fn enumerate_listfiles(&self) -> Vec<(String, Vec<u8>)> {
        self.mounted
            .iter()
            .filter_map(|m| {
                let mut guard = m.archive.write().expect("Archive Write Lock");
                match Self::read_file(guard.deref_mut(), "(listfile)") {
                    Ok(buf) => Some((m.name.clone(), buf)),
                    Err(err) => {
                        warn!("Archive {} has no readable (listfile): {}", m.name, err);
                        None
                    }
                }
            })
            .collect_vec()
    }

    fn read_file(archive: &mut Archive, path: &str) -> Result<Vec<u8>, std::io::Error> {
        let file = archive.open_file(path)?;
        let mut buf: Vec<u8> = vec![0; file.size() as usize];
        file.read(archive, &mut buf)?;
        Ok(buf)
    }

    // TODO: understand locales (e.g. deDE) and their order/priority.
    fn sorting_order(a: &str, b: &str) -> Ordering {
        let type_a = MPQPackageGroup::extract_mpq_type(a);
        let type_b = MPQPackageGroup::extract_mpq_type(b);

        match type_a.cmp(&type_b) {
            Ordering::Equal => {
                let version_a = MPQPackageGroup::extract_mpq_version(a);
                let version_b = MPQPackageGroup::extract_mpq_version(b);

                // patches count down (z > a > 9 > 1), common counts up
                let ord = match (version_a, version_b) {
                    (Some(_), None) => Ordering::Less,
                    (None, Some(_)) => Ordering::Greater,
                    (None, None) => Ordering::Equal,
                    (Some(a), Some(b)) => b.cmp(&a),
                };
                if type_a == MPQType::Common { ord.reverse() } else { ord }
            }
            ord => ord,
        }
    }

    fn extract_mpq_type(file_name: &str) -> MPQType {
        let lower = file_name.to_ascii_lowercase();
        if lower.starts_with("common") {
            MPQType::Common
        } else if lower.starts_with("expansion") {
            MPQType::Tbc
        } else if lower.starts_with("lichking") {
            MPQType::Wotlk
        } else if lower.starts_with("patch") {
            MPQType::Patch
        } else if lower.starts_with("base") {
            MPQType::Base
        } else {
            MPQType::Unknown
        }
    }

    /// `patch-3.MPQ` carries version `3`, plain `patch.MPQ` carries none.
    fn extract_mpq_version(file_name: &str) -> Option<u8> {
        let stem = file_name.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(file_name);
        match stem.as_bytes() {
            [.., b'-', version] => Some(*version),
            _ => None,
        }
    }
}

impl RawAssetLoader for MPQPackageGroup {
    fn load_raw_owned(&self, path: &str) -> Option<Vec<u8>> {
        let hit = self.mounted.iter().find(|m| {
            m.archive
                .read()
                .map(|archive| archive.contains_file(path))
                .unwrap_or(false)
        });

        let Some(mounted) = hit else {
            warn!("Could not locate {}!", path);
            return None;
        };

        trace!("Loading {} from {}", path, mounted.name);
        let mut guard = mounted.archive.write().expect("Archive Write Lock");
        match Self::read_file(guard.deref_mut(), path) {
            Ok(buf) => Some(buf),
            Err(err) => {
                error!("I/O error reading {} from {}: {}", path, mounted.name, err);
                None
            }
        }
    }

    fn contains(&self, path: &str) -> bool {
        self.mounted.iter().any(|m| {
            m.archive
                .read()
                .map(|archive| archive.contains_file(path))
                .unwrap_or(false)
        })
    }
}

#[cfg(test)]
mod tests {
    use std::cmp::Ordering;

    use super::MPQPackageGroup;

    #[test]
    fn patches_sort_before_base_and_count_down() {
        assert_eq!(
            MPQPackageGroup::sorting_order("patch-3.MPQ", "base.MPQ"),
            Ordering::Less
        );
        assert_eq!(
            MPQPackageGroup::sorting_order("patch-3.MPQ", "patch-2.MPQ"),
            Ordering::Less
        );
        assert_eq!(
            MPQPackageGroup::sorting_order("patch-2.MPQ", "patch.MPQ"),
            Ordering::Less
        );
    }

    #[test]
    fn common_inverts_its_version_order() {
        assert_eq!(
            MPQPackageGroup::sorting_order("common.MPQ", "common-2.MPQ"),
            Ordering::Less
        );
    }

    #[test]
    fn version_extraction() {
        assert_eq!(MPQPackageGroup::extract_mpq_version("patch-3.MPQ"), Some(b'3'));
        assert_eq!(MPQPackageGroup::extract_mpq_version("patch.MPQ"), None);
    }
}
