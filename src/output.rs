use crate::simulation::{Frame, ReportSink};
use log::{debug, info};
use predator_prey_common::{AggregateSnapshot, ArchiveFormat, OutputConfig, SimulationError};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

pub const AVERAGES_HEADER: [&str; 4] = ["Timestep", "Time", "Hares", "Pumas"];

/// Writes the averages time series and, optionally, one PPM map per report.
pub struct FileSink {
    directory: PathBuf,
    averages_path: PathBuf,
    write_maps: bool,
    averages: Option<csv::Writer<File>>,
}

impl FileSink {
    pub fn new(config: &OutputConfig) -> Self {
        FileSink {
            directory: config.directory.clone(),
            averages_path: config.directory.join(&config.averages_filename),
            write_maps: config.write_maps,
            averages: None,
        }
    }

    pub fn averages_path(&self) -> &Path {
        &self.averages_path
    }

    /// Path of the map file for `step` (`map_0010.ppm` for step 10).
    pub fn map_path(&self, step: u64) -> PathBuf {
        self.directory.join(format!("map_{:04}.ppm", step))
    }

    fn append_averages(&mut self, snapshot: &AggregateSnapshot) -> Result<(), SimulationError> {
        let path = &self.averages_path;
        let writer = self
            .averages
            .as_mut()
            .ok_or_else(|| SimulationError::output_io(path, io::Error::new(io::ErrorKind::NotConnected, "averages file is not open")))?;

        writer
            .write_record(&[
                snapshot.step.to_string(),
                format_float(snapshot.time),
                format_float(snapshot.mean_hares),
                format_float(snapshot.mean_pumas),
            ])
            .map_err(|e| SimulationError::output_io(path, e.into()))?;
        // Flushed per row so the series stays readable if the run aborts later.
        writer.flush().map_err(|e| SimulationError::output_io(path, e))
    }
}

impl ReportSink for FileSink {
    fn begin(&mut self, initial: &AggregateSnapshot) -> Result<(), SimulationError> {
        std::fs::create_dir_all(&self.directory).map_err(|e| SimulationError::output_io(&self.directory, e))?;

        let mut writer =
            csv::Writer::from_path(&self.averages_path).map_err(|e| SimulationError::output_io(&self.averages_path, e.into()))?;
        writer
            .write_record(AVERAGES_HEADER)
            .map_err(|e| SimulationError::output_io(&self.averages_path, e.into()))?;
        self.averages = Some(writer);
        info!("Writing averages to {}", self.averages_path.display());

        self.append_averages(initial)
    }

    fn report(&mut self, snapshot: &AggregateSnapshot, frame: &Frame<'_>) -> Result<(), SimulationError> {
        self.append_averages(snapshot)?;

        if self.write_maps {
            let path = self.map_path(snapshot.step);
            let file = File::create(&path).map_err(|e| SimulationError::output_io(&path, e))?;
            let mut out = BufWriter::new(file);
            write_ppm(&mut out, frame, snapshot.max_hares, snapshot.max_pumas)
                .and_then(|_| out.flush())
                .map_err(|e| SimulationError::output_io(&path, e))?;
            debug!("Map written to {}", path.display());
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<(), SimulationError> {
        if let Some(mut writer) = self.averages.take() {
            writer.flush().map_err(|e| SimulationError::output_io(&self.averages_path, e))?;
        }
        Ok(())
    }
}

/// Shortest round-trip text of `value` that always reads as a float: whole
/// numbers keep their `.0` and very small or large magnitudes use exponent form.
pub fn format_float(value: f64) -> String {
    format!("{:?}", value)
}

/// Scales a density to `0..=255` against the report's maximum, truncating.
pub fn intensity(density: f64, max: f64) -> u8 {
    if max > 0.0 {
        (density / max * 255.0) as u8
    } else {
        0
    }
}

/// Writes the interior of `frame` as a plain-text (P3) PPM image.
///
/// Land pixels are `<hares> <pumas> 0`, each scaled against the given maxima;
/// water pixels are pure blue.
pub fn write_ppm<W: Write>(out: &mut W, frame: &Frame<'_>, max_hares: f64, max_pumas: f64) -> io::Result<()> {
    let landscape = frame.landscape;
    write!(out, "P3\n{} {}\n255\n", landscape.width(), landscape.height())?;
    for coord in landscape.coords() {
        let idx = landscape.index(coord);
        if landscape.storage()[idx] {
            writeln!(
                out,
                "{} {} 0",
                intensity(frame.hares[idx], max_hares),
                intensity(frame.pumas[idx], max_pumas)
            )?;
        } else {
            writeln!(out, "0 0 255")?;
        }
    }
    Ok(())
}

/// Saves all recorded snapshots in the configured archive format.
///
/// Returns the path written, or `None` when no format is configured.
pub fn save_snapshot_archive(
    snapshots: &[AggregateSnapshot],
    config: &OutputConfig,
) -> Result<Option<PathBuf>, SimulationError> {
    let format = match config.format {
        Some(format) => format,
        None => {
            info!("Skipping snapshot archive as per config (no format set).");
            return Ok(None);
        }
    };

    let filename = config
        .directory
        .join(format!("{}_snapshots.{}", config.base_filename, format.extension()));
    let file = File::create(&filename).map_err(|e| SimulationError::output_io(&filename, e))?;
    let mut writer = BufWriter::new(file);

    let result = match format {
        ArchiveFormat::Json => serde_json::to_writer(&mut writer, snapshots).map_err(io::Error::from),
        ArchiveFormat::Bincode => bincode::serialize_into(&mut writer, snapshots)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string())),
        ArchiveFormat::MessagePack => rmp_serde::encode::write(&mut writer, snapshots)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string())),
    };
    result
        .and_then(|_| writer.flush())
        .map_err(|e| SimulationError::output_io(&filename, e))?;

    info!("All {} snapshots saved to {} ({} format)", snapshots.len(), filename.display(), format);
    Ok(Some(filename))
}
