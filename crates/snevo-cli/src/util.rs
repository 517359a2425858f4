use std::{
    fs::File,
    io::{self, BufWriter, StdoutLock, Write as _},
    path::{Path, PathBuf},
};

use anyhow::Context;

#[derive(Debug)]
pub enum Output {
    Stdout {
        writer: StdoutLock<'static>,
    },
    File {
        writer: BufWriter<File>,
        path: PathBuf,
    },
}

impl Output {
    pub fn save_json<T>(value: &T, output_path: Option<PathBuf>) -> anyhow::Result<()>
    where
        T: serde::Serialize,
    {
        let mut output = Output::from_output_path(output_path)?;
        output.write_json(value)
    }

    pub fn from_output_path(output_path: Option<PathBuf>) -> anyhow::Result<Self> {
        match output_path {
            Some(path) => Output::open(path),
            None => Ok(Output::stdout()),
        }
    }

    pub fn stdout() -> Self {
        Output::Stdout {
            writer: io::stdout().lock(),
        }
    }

    pub fn open(path: PathBuf) -> anyhow::Result<Self> {
        let file = File::create(&path)
            .with_context(|| format!("Failed to create output file: {}", path.display()))?;
        Ok(Output::File {
            writer: BufWriter::new(file),
            path,
        })
    }

    pub fn display_path(&self) -> String {
        match self {
            Output::Stdout { .. } => "stdout".to_string(),
            Output::File { path, .. } => path.display().to_string(),
        }
    }

    pub fn write_json<T>(&mut self, value: T) -> anyhow::Result<()>
    where
        T: serde::Serialize,
    {
        serde_json::to_writer_pretty(&mut *self, &value)
            .with_context(|| format!("Failed to write JSON to {}", self.display_path()))?;
        writeln!(&mut *self).with_context(|| {
            format!(
                "Failed to write newline after JSON to {}",
                self.display_path()
            )
        })?;
        self.flush()
            .with_context(|| format!("Failed to flush output to {}", self.display_path()))?;
        Ok(())
    }
}

impl io::Write for Output {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Output::Stdout { writer } => writer.write(buf),
            Output::File { writer, .. } => writer.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Output::Stdout { writer } => writer.flush(),
            Output::File { writer, .. } => writer.flush(),
        }
    }
}

pub fn read_json_file<T, P>(file_kind: &str, path: P) -> anyhow::Result<T>
where
    T: serde::de::DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open {} file: {}", file_kind, path.display()))?;

    let reader = io::BufReader::new(file);
    let value = serde_json::from_reader(reader).with_context(|| {
        format!(
            "Failed to parse {} JSON file: {}",
            file_kind,
            path.display()
        )
    })?;

    Ok(value)
}

/// Loads a saved network, taking its topology from the file header.
///
/// The hidden activation is not stored in the file and must be supplied.
pub fn load_network<P>(
    path: P,
    hidden_activation: snevo_network::Activation,
) -> anyhow::Result<snevo_network::NetworkModel>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let layer_sizes = snevo_network::read_topology(path)
        .with_context(|| format!("Failed to read network header: {}", path.display()))?;
    let mut network = snevo_network::NetworkModel::zeros(&layer_sizes, hidden_activation)
        .with_context(|| format!("Invalid network topology in {}", path.display()))?;
    network
        .load_into(path)
        .with_context(|| format!("Failed to load network file: {}", path.display()))?;
    Ok(network)
}

#[cfg(test)]
mod tests {
    use std::{env, fs, process};

    use snevo_network::{Activation, NetworkModel};

    use super::*;

    #[test]
    fn test_load_network_rejects_oversized_header() {
        let path = env::temp_dir().join(format!("snevo-cli-oversized-{}.bin", process::id()));
        let bytes = [2_u64, 1 << 33, 1 << 33]
            .iter()
            .flat_map(|word| word.to_le_bytes())
            .collect::<Vec<_>>();
        fs::write(&path, bytes).unwrap();
        let result = load_network(&path, Activation::Relu);
        fs::remove_file(&path).unwrap();
        assert!(result.is_err());
    }

    #[test]
    fn test_load_network_round_trip() {
        let path = env::temp_dir().join(format!("snevo-cli-load-{}.bin", process::id()));
        let mut network = NetworkModel::zeros(&[6, 3, 4], Activation::Tanh).unwrap();
        let values = (0..network.parameter_count())
            .map(|i| f64::from(u32::try_from(i).unwrap()) * 0.5)
            .collect::<Vec<_>>();
        network.set_flat(&values).unwrap();
        network.save(&path).unwrap();
        let loaded = load_network(&path, Activation::Tanh).unwrap();
        fs::remove_file(&path).unwrap();
        assert_eq!(loaded, network);
    }
}
