//! Binary genome file format.
//!
//! All fields are little-endian:
//!
//! | field | type |
//! |---|---|
//! | layer count | `u64` |
//! | layer sizes | `u64 × layer count` |
//! | weights | `f64`, layer-major, neuron-major, input-minor |
//! | biases | `f64`, layer-major, neuron-minor |
//!
//! Reading into a network never changes its topology; a stored topology that
//! differs from the target's is rejected.

use std::{
    fs::File,
    io::{self, BufReader, BufWriter, Read, Write},
    path::Path,
};

use crate::{NetworkModel, network::checked_parameter_count};

/// Upper bound on the stored layer count accepted as plausible.
const MAX_LAYERS: u64 = 64;
/// Width in bytes of every stored field.
const FIELD_BYTES: u64 = 8;

/// Errors raised while reading or writing a genome file.
#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum PersistError {
    #[display("genome file I/O failed: {source}")]
    Io { source: io::Error },
    #[display("stored topology {found:?} does not match network topology {expected:?}")]
    ArchitectureMismatch {
        expected: Vec<usize>,
        found: Vec<usize>,
    },
    #[display("genome file has unexpected bytes after the parameters")]
    TrailingData,
    #[display("genome file header is corrupt: {reason}")]
    CorruptHeader { reason: String },
}

impl From<io::Error> for PersistError {
    fn from(source: io::Error) -> Self {
        Self::Io { source }
    }
}

impl NetworkModel {
    /// Writes the network in the genome file format.
    pub fn write_to<W>(&self, writer: &mut W) -> Result<(), PersistError>
    where
        W: Write + ?Sized,
    {
        let sizes = self.layer_sizes();
        writer.write_all(&(sizes.len() as u64).to_le_bytes())?;
        for &size in sizes {
            writer.write_all(&(size as u64).to_le_bytes())?;
        }
        for value in self.parameters() {
            writer.write_all(&value.to_le_bytes())?;
        }
        Ok(())
    }

    /// Saves the network to `path`, replacing any existing file.
    pub fn save<P>(&self, path: P) -> Result<(), PersistError>
    where
        P: AsRef<Path>,
    {
        let mut writer = BufWriter::new(File::create(path)?);
        self.write_to(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Reads parameters from a genome stream into this network.
    ///
    /// The network is left untouched unless the whole stream is valid.
    pub fn read_into<R>(&mut self, reader: &mut R) -> Result<(), PersistError>
    where
        R: Read + ?Sized,
    {
        let Header { sizes: found, .. } = read_header(reader)?;
        if found != self.layer_sizes() {
            return Err(PersistError::ArchitectureMismatch {
                expected: self.layer_sizes().to_vec(),
                found,
            });
        }

        let mut values = Vec::with_capacity(self.parameter_count());
        for _ in 0..self.parameter_count() {
            values.push(f64::from_le_bytes(read_array(reader)?));
        }
        let mut probe = [0_u8; 1];
        if reader.read(&mut probe)? != 0 {
            return Err(PersistError::TrailingData);
        }

        self.assign_flat(&values);
        Ok(())
    }

    /// Loads parameters from the genome file at `path` into this network.
    pub fn load_into<P>(&mut self, path: P) -> Result<(), PersistError>
    where
        P: AsRef<Path>,
    {
        let mut reader = BufReader::new(File::open(path)?);
        self.read_into(&mut reader)
    }
}

/// Reads only the stored topology of the genome file at `path`.
///
/// The header is checked against the file length, so a topology returned here
/// always matches the parameters stored after it. Useful to build a matching
/// network before calling [`NetworkModel::load_into`].
pub fn read_topology<P>(path: P) -> Result<Vec<usize>, PersistError>
where
    P: AsRef<Path>,
{
    let file = File::open(path)?;
    let file_len = file.metadata()?.len();
    let header = read_header(&mut BufReader::new(file))?;

    let header_bytes = (header.sizes.len() as u64 + 1) * FIELD_BYTES;
    let stored = file_len.saturating_sub(header_bytes);
    let declared = u64::try_from(header.parameter_count)
        .ok()
        .and_then(|count| count.checked_mul(FIELD_BYTES));
    if declared != Some(stored) {
        return Err(PersistError::CorruptHeader {
            reason: format!(
                "topology {:?} needs {} parameters, file holds {stored} parameter bytes",
                header.sizes, header.parameter_count
            ),
        });
    }
    Ok(header.sizes)
}

#[derive(Debug)]
struct Header {
    sizes: Vec<usize>,
    parameter_count: usize,
}

fn read_header<R>(reader: &mut R) -> Result<Header, PersistError>
where
    R: Read + ?Sized,
{
    let count = u64::from_le_bytes(read_array(reader)?);
    if !(2..=MAX_LAYERS).contains(&count) {
        return Err(PersistError::CorruptHeader {
            reason: format!("implausible layer count {count}"),
        });
    }
    let mut sizes = Vec::new();
    for _ in 0..count {
        let size = u64::from_le_bytes(read_array(reader)?);
        let size = usize::try_from(size)
            .ok()
            .filter(|&s| s > 0)
            .ok_or_else(|| PersistError::CorruptHeader {
                reason: format!("implausible layer size {size}"),
            })?;
        sizes.push(size);
    }
    let parameter_count =
        checked_parameter_count(&sizes).ok_or_else(|| PersistError::CorruptHeader {
            reason: format!("topology {sizes:?} has too many parameters"),
        })?;
    Ok(Header {
        sizes,
        parameter_count,
    })
}

fn read_array<R, const N: usize>(reader: &mut R) -> io::Result<[u8; N]>
where
    R: Read + ?Sized,
{
    let mut buf = [0; N];
    reader.read_exact(&mut buf)?;
    Ok(buf)
}
