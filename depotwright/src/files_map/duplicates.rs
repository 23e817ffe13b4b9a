//! Detection of identical files shipped by several depots.
//!
//! Language depots often repeat files of another depot byte for byte. Such
//! files are candidates for [`SharedFile`](crate::catalog::SharedFile)
//! declarations: the client depot can then stay installable with the file
//! taken from the source depot.

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use rayon::prelude::*;
use sha2::{Digest, Sha512};

use super::map::FilesMap;
use super::types::{FileTypes, ResolvedFile};
use super::FilesMapError;

const HASH_BUFFER_SIZE: usize = 64 * 1024;

impl FilesMap {
    /// Groups of identical files sharing a relative path.
    ///
    /// Candidates of the requested kinds are grouped by size first; only
    /// same-size candidates are hashed (SHA-512). Each returned group has at
    /// least two files, in the map's candidate order.
    pub fn same_files(&self, file_types: FileTypes) -> Result<Vec<Vec<ResolvedFile>>, FilesMapError> {
        let mut result = Vec::new();
        if file_types.is_empty() {
            return Ok(result);
        }

        for candidates in self.groups() {
            if candidates.len() < 2 {
                continue;
            }

            let mut by_size: Vec<(u64, Vec<&ResolvedFile>)> = Vec::new();
            for file in candidates
                .iter()
                .filter(|file| file_types.intersects(file.kind.as_types()))
            {
                let size = file_size(&file.source_path)?;
                match by_size.iter_mut().find(|(s, _)| *s == size) {
                    Some((_, files)) => files.push(file),
                    None => by_size.push((size, vec![file])),
                }
            }

            for (_, files) in by_size.into_iter().filter(|(_, files)| files.len() > 1) {
                let hashes = files
                    .par_iter()
                    .map(|file| {
                        hash_file(&file.source_path).map_err(|source| FilesMapError::Io {
                            path: file.source_path.clone(),
                            source,
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;

                let mut groups: Vec<(Vec<u8>, Vec<ResolvedFile>)> = Vec::new();
                let mut index: HashMap<Vec<u8>, usize> = HashMap::new();
                for (file, hash) in files.into_iter().zip(hashes) {
                    match index.get(&hash) {
                        Some(&i) => groups[i].1.push(file.clone()),
                        None => {
                            index.insert(hash.clone(), groups.len());
                            groups.push((hash, vec![file.clone()]));
                        }
                    }
                }

                result.extend(
                    groups
                        .into_iter()
                        .map(|(_, files)| files)
                        .filter(|files| files.len() > 1),
                );
            }
        }

        Ok(result)
    }
}

fn file_size(path: &Path) -> Result<u64, FilesMapError> {
    std::fs::metadata(path)
        .map(|m| m.len())
        .map_err(|source| FilesMapError::Io {
            path: path.to_path_buf(),
            source,
        })
}

/// SHA-512 digest of a file's content.
pub fn hash_file(path: &Path) -> io::Result<Vec<u8>> {
    let mut file = File::open(path)?;
    let mut hasher = Sha512::new();
    let mut buffer = vec![0u8; HASH_BUFFER_SIZE];

    loop {
        let read = file.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    Ok(hasher.finalize().to_vec())
}
