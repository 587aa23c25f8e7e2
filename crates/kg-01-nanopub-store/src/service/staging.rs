//! Staging artifact for bulk loads.
//!
//! A publish writes every quad as N-Quads to one file, then hands a reader
//! over that file to the store. With `load_dir` set the file is named
//! `<load_dir>/<uuid>.nq` and left in place; otherwise it is an anonymous
//! temporary file removed when dropped.

use std::fs::File;
use std::io::{BufReader, BufWriter, Seek, SeekFrom, Write};

use shared_types::{nquads, Quad};

use super::NanopubManager;
use crate::domain::errors::NanopubResult;
use crate::domain::identity::IdentityAllocator;
use crate::ports::outbound::{BlobDepot, QuadStore, TimeSource};

/// A written staging file, rewound and ready to read.
pub(crate) struct Staged {
    pub reader: BufReader<File>,
    pub quads: usize,
}

impl<QS, BD, IA, TS> NanopubManager<QS, BD, IA, TS>
where
    QS: QuadStore,
    BD: BlobDepot,
    IA: IdentityAllocator,
    TS: TimeSource,
{
    pub(crate) fn stage<'a, I>(&self, quads: I) -> NanopubResult<Staged>
    where
        I: IntoIterator<Item = &'a Quad>,
    {
        let (file, path) = match &self.config.load_dir {
            Some(dir) => {
                std::fs::create_dir_all(dir)?;
                let path = dir.join(format!("{}.nq", uuid::Uuid::new_v4().simple()));
                (File::options().read(true).write(true).create_new(true).open(&path)?, Some(path))
            }
            None => (tempfile::tempfile()?, None),
        };

        let mut writer = BufWriter::new(file);
        let count = nquads::write_quads(&mut writer, quads)?;
        writer.flush()?;
        let mut file = writer.into_inner().map_err(|e| e.into_error())?;
        file.seek(SeekFrom::Start(0))?;

        if let Some(path) = &path {
            tracing::debug!(path = %path.display(), quads = count, "[kg-01] Staged batch");
        }
        Ok(Staged {
            reader: BufReader::new(file),
            quads: count,
        })
    }
}
