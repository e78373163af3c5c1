#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Comma-separated telemetry export and import.
//!
//! One header row is followed by one row per accepted frame. The six frame
//! columns come first, then six columns per entity in index order:
//!
//! ```text
//! Frame,T,Caos_Original,Caos_Fenix,Ruido_Vibracional,Fluxo_Qiskit,
//! q0_x,q0_y,q0_z,q0_S,q0_VR_Ganho,q0_Torque,q1_x,...
//! ```
//!
//! `Frame` is written as an integer and every other value with eight
//! fractional digits. Readers look columns up by name, so any column order
//! carrying the full set of names is accepted.

use std::{
    collections::HashMap,
    fs::File,
    io::{self, BufRead, BufReader, BufWriter, Write},
    path::Path,
};

use harpia_core::{EntityFrameRecord, FrameState, TelemetryRecord, TelemetrySink};
use thiserror::Error;
use tracing::debug;

const FRAME_COLUMNS: [&str; 6] = [
    "Frame",
    "T",
    "Caos_Original",
    "Caos_Fenix",
    "Ruido_Vibracional",
    "Fluxo_Qiskit",
];

const ENTITY_SUFFIXES: [&str; 6] = ["x", "y", "z", "S", "VR_Ganho", "Torque"];

const DELIMITER: char = ',';

/// Errors raised while writing or reading telemetry tables.
#[derive(Debug, Error)]
pub enum CsvError {
    /// The underlying reader or writer failed.
    #[error("telemetry i/o failed: {0}")]
    Io(#[from] io::Error),
    /// The input contained no header row.
    #[error("telemetry table has no header row")]
    MissingHeader,
    /// A required column is absent from the header.
    #[error("telemetry table is missing column '{column}'")]
    MissingColumn {
        /// Name of the absent column.
        column: String,
    },
    /// The header declares no entity columns.
    #[error("telemetry table declares no entities")]
    NoEntities,
    /// A data row has a different number of cells than the header.
    #[error("line {line} has {found} cells, expected {expected}")]
    RowWidth {
        /// One-based line number.
        line: usize,
        /// Cells declared by the header.
        expected: usize,
        /// Cells found on the line.
        found: usize,
    },
    /// A cell could not be parsed as a number.
    #[error("line {line}, column '{column}': '{value}' is not a valid number")]
    InvalidNumber {
        /// One-based line number.
        line: usize,
        /// Column holding the cell.
        column: String,
        /// Raw cell contents.
        value: String,
    },
    /// A record does not match the entity count of the table being written.
    #[error("record for frame {frame} has {found} entities, table expects {expected}")]
    EntityCountMismatch {
        /// Frame index of the rejected record.
        frame: usize,
        /// Entity count fixed by the header.
        expected: usize,
        /// Entity count of the record.
        found: usize,
    },
}

/// Builds the header row for `entity_count` entities.
#[must_use]
pub fn header(entity_count: usize) -> Vec<String> {
    let mut columns: Vec<String> = FRAME_COLUMNS.iter().map(|name| (*name).to_owned()).collect();
    for entity in 0..entity_count {
        columns.extend(
            ENTITY_SUFFIXES
                .iter()
                .map(|suffix| entity_column(entity, suffix)),
        );
    }
    columns
}

fn entity_column(entity: usize, suffix: &str) -> String {
    format!("q{entity}_{suffix}")
}

/// Telemetry sink writing one row per record.
#[derive(Debug)]
pub struct CsvTelemetryWriter<W: Write> {
    writer: W,
    entity_count: usize,
    rows: usize,
}

impl CsvTelemetryWriter<BufWriter<File>> {
    /// Creates or truncates `path` and writes the header row.
    pub fn create(path: impl AsRef<Path>, entity_count: usize) -> Result<Self, CsvError> {
        let file = File::create(path.as_ref())?;
        debug!(path = %path.as_ref().display(), entity_count, "opened telemetry table");
        Self::new(BufWriter::new(file), entity_count)
    }
}

impl<W: Write> CsvTelemetryWriter<W> {
    /// Wraps `writer` and immediately emits the header row.
    pub fn new(mut writer: W, entity_count: usize) -> Result<Self, CsvError> {
        writeln!(writer, "{}", header(entity_count).join(","))?;
        Ok(Self {
            writer,
            entity_count,
            rows: 0,
        })
    }

    /// Number of data rows written so far.
    #[must_use]
    pub const fn rows_written(&self) -> usize {
        self.rows
    }

    /// Flushes buffered rows and returns the inner writer.
    pub fn finish(mut self) -> Result<W, CsvError> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

impl<W: Write> TelemetrySink for CsvTelemetryWriter<W> {
    type Error = CsvError;

    fn push_record(&mut self, record: TelemetryRecord) -> Result<(), Self::Error> {
        if record.entity_count() != self.entity_count {
            return Err(CsvError::EntityCountMismatch {
                frame: record.frame.frame_index,
                expected: self.entity_count,
                found: record.entity_count(),
            });
        }

        let frame = &record.frame;
        let mut row = format!(
            "{},{:.8},{:.8},{:.8},{:.8},{:.8}",
            frame.frame_index,
            frame.time,
            frame.chaos_raw,
            frame.chaos_clamped,
            frame.ambient_noise,
            frame.oracle_flux
        );
        for entity in &record.entities {
            for value in [
                entity.x,
                entity.y,
                entity.z,
                entity.coherence,
                entity.gain,
                entity.torque,
            ] {
                row.push(DELIMITER);
                row.push_str(&format!("{value:.8}"));
            }
        }

        writeln!(self.writer, "{row}")?;
        self.rows += 1;
        Ok(())
    }
}

/// Telemetry loaded back from a table.
#[derive(Clone, Debug, PartialEq)]
pub struct TelemetryTable {
    /// Entity count inferred from the header.
    pub entity_count: usize,
    /// Records in file order.
    pub records: Vec<TelemetryRecord>,
}

/// Opens and parses the table stored at `path`.
pub fn open_telemetry(path: impl AsRef<Path>) -> Result<TelemetryTable, CsvError> {
    let file = File::open(path.as_ref())?;
    let table = read_telemetry(BufReader::new(file))?;
    debug!(
        path = %path.as_ref().display(),
        entities = table.entity_count,
        frames = table.records.len(),
        "loaded telemetry table"
    );
    Ok(table)
}

/// Parses a telemetry table from `reader`.
///
/// The entity count is the number of header columns shaped like `q<i>_x`;
/// every entity must also carry its remaining five columns.
pub fn read_telemetry<R: BufRead>(reader: R) -> Result<TelemetryTable, CsvError> {
    let mut lines = reader.lines();
    let header_line = match lines.next() {
        Some(line) => line?,
        None => return Err(CsvError::MissingHeader),
    };
    if header_line.trim().is_empty() {
        return Err(CsvError::MissingHeader);
    }

    let columns: Vec<String> = header_line
        .trim_end()
        .split(DELIMITER)
        .map(|cell| cell.trim().to_owned())
        .collect();
    let layout = ColumnLayout::resolve(&columns)?;

    let mut records = Vec::new();
    for (offset, line) in lines.enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let line_number = offset + 2;
        let cells: Vec<&str> = line.trim_end().split(DELIMITER).map(str::trim).collect();
        if cells.len() != columns.len() {
            return Err(CsvError::RowWidth {
                line: line_number,
                expected: columns.len(),
                found: cells.len(),
            });
        }
        let row = Row {
            line: line_number,
            cells: &cells,
            columns: &columns,
        };
        records.push(layout.record(&row)?);
    }

    Ok(TelemetryTable {
        entity_count: layout.entities.len(),
        records,
    })
}

/// Column positions for the frame scalars and each entity.
struct ColumnLayout {
    frame: [usize; 6],
    entities: Vec<[usize; 6]>,
}

impl ColumnLayout {
    fn resolve(columns: &[String]) -> Result<Self, CsvError> {
        let positions: HashMap<&str, usize> = columns
            .iter()
            .enumerate()
            .map(|(index, name)| (name.as_str(), index))
            .collect();
        let lookup = |name: &str| {
            positions
                .get(name)
                .copied()
                .ok_or_else(|| CsvError::MissingColumn {
                    column: name.to_owned(),
                })
        };

        let mut frame = [0; 6];
        for (slot, name) in frame.iter_mut().zip(FRAME_COLUMNS) {
            *slot = lookup(name)?;
        }

        let entity_count = columns
            .iter()
            .filter(|name| name.starts_with('q') && name.ends_with("_x"))
            .count();
        if entity_count == 0 {
            return Err(CsvError::NoEntities);
        }

        let mut entities = Vec::with_capacity(entity_count);
        for entity in 0..entity_count {
            let mut slots = [0; 6];
            for (slot, suffix) in slots.iter_mut().zip(ENTITY_SUFFIXES) {
                *slot = lookup(&entity_column(entity, suffix))?;
            }
            entities.push(slots);
        }

        Ok(Self { frame, entities })
    }

    fn record(&self, row: &Row<'_>) -> Result<TelemetryRecord, CsvError> {
        let [frame_column, time, chaos_raw, chaos_clamped, ambient, flux] = self.frame;
        let frame = FrameState {
            frame_index: row.frame_index(frame_column)?,
            time: row.float(time)?,
            chaos_raw: row.float(chaos_raw)?,
            chaos_clamped: row.float(chaos_clamped)?,
            ambient_noise: row.float(ambient)?,
            oracle_flux: row.float(flux)?,
        };

        let mut entities = Vec::with_capacity(self.entities.len());
        for [x, y, z, coherence, gain, torque] in &self.entities {
            entities.push(EntityFrameRecord {
                x: row.float(*x)?,
                y: row.float(*y)?,
                z: row.float(*z)?,
                coherence: row.float(*coherence)?,
                gain: row.float(*gain)?,
                torque: row.float(*torque)?,
            });
        }

        Ok(TelemetryRecord { frame, entities })
    }
}

struct Row<'a> {
    line: usize,
    cells: &'a [&'a str],
    columns: &'a [String],
}

impl Row<'_> {
    fn float(&self, column: usize) -> Result<f64, CsvError> {
        let value = self.cells[column];
        value.parse().map_err(|_| self.invalid(column))
    }

    fn frame_index(&self, column: usize) -> Result<usize, CsvError> {
        let value = self.cells[column];
        value.parse().map_err(|_| self.invalid(column))
    }

    fn invalid(&self, column: usize) -> CsvError {
        CsvError::InvalidNumber {
            line: self.line,
            column: self.columns[column].clone(),
            value: self.cells[column].to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(frame_index: usize, entities: usize) -> TelemetryRecord {
        TelemetryRecord {
            frame: FrameState {
                frame_index,
                time: frame_index as f64 * 0.05,
                chaos_raw: 2.0,
                chaos_clamped: 2.0,
                ambient_noise: 0.0,
                oracle_flux: -0.05,
            },
            entities: (0..entities)
                .map(|entity| EntityFrameRecord {
                    x: 23.5 + entity as f64,
                    y: -1.25,
                    z: 0.0,
                    coherence: 0.875,
                    gain: 1.1,
                    torque: -0.125,
                })
                .collect(),
        }
    }

    #[test]
    fn header_lists_frame_then_entity_columns() {
        let columns = header(2);
        assert_eq!(columns.len(), 6 + 2 * 6);
        assert_eq!(columns[0], "Frame");
        assert_eq!(columns[5], "Fluxo_Qiskit");
        assert_eq!(columns[6..12], ["q0_x", "q0_y", "q0_z", "q0_S", "q0_VR_Ganho", "q0_Torque"]);
        assert_eq!(columns[17], "q1_Torque");
    }

    #[test]
    fn rows_use_fixed_precision() {
        let mut writer = CsvTelemetryWriter::new(Vec::new(), 1).expect("header written");
        writer.push_record(record(3, 1)).expect("row written");
        assert_eq!(writer.rows_written(), 1);

        let bytes = writer.finish().expect("flushed");
        let text = String::from_utf8(bytes).expect("utf-8");
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("Frame,T,Caos_Original,Caos_Fenix,Ruido_Vibracional,Fluxo_Qiskit,q0_x,q0_y,q0_z,q0_S,q0_VR_Ganho,q0_Torque")
        );
        assert_eq!(
            lines.next(),
            Some("3,0.15000000,2.00000000,2.00000000,0.00000000,-0.05000000,23.50000000,-1.25000000,0.00000000,0.87500000,1.10000000,-0.12500000")
        );
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn mismatched_entity_count_is_rejected() {
        let mut writer = CsvTelemetryWriter::new(Vec::new(), 2).expect("header written");
        let error = writer.push_record(record(0, 3)).expect_err("width mismatch");
        assert!(matches!(
            error,
            CsvError::EntityCountMismatch {
                frame: 0,
                expected: 2,
                found: 3
            }
        ));
        assert_eq!(writer.rows_written(), 0);
    }

    #[test]
    fn reader_infers_entity_count_from_header() {
        let mut writer = CsvTelemetryWriter::new(Vec::new(), 3).expect("header written");
        writer.push_record(record(0, 3)).expect("row written");
        writer.push_record(record(1, 3)).expect("row written");
        let bytes = writer.finish().expect("flushed");

        let table = read_telemetry(bytes.as_slice()).expect("valid table");
        assert_eq!(table.entity_count, 3);
        assert_eq!(table.records, vec![record(0, 3), record(1, 3)]);
    }

    #[test]
    fn reader_accepts_reordered_columns() {
        let text = "\
q0_Torque,q0_VR_Ganho,q0_S,q0_z,q0_y,q0_x,Fluxo_Qiskit,Ruido_Vibracional,Caos_Fenix,Caos_Original,T,Frame
-0.5,1.0,0.9,0.0,2.0,1.0,0.05,0.1,2.4,3.0,0.25,5
";
        let table = read_telemetry(text.as_bytes()).expect("valid table");
        let record = &table.records[0];
        assert_eq!(record.frame.frame_index, 5);
        assert_eq!(record.frame.chaos_raw, 3.0);
        assert_eq!(record.frame.chaos_clamped, 2.4);
        assert_eq!(record.entities[0].x, 1.0);
        assert_eq!(record.entities[0].torque, -0.5);
    }

    #[test]
    fn reader_reports_structural_problems() {
        assert!(matches!(
            read_telemetry("".as_bytes()),
            Err(CsvError::MissingHeader)
        ));
        assert!(matches!(
            read_telemetry("Frame,T,Caos_Original,Caos_Fenix,Ruido_Vibracional,Fluxo_Qiskit\n".as_bytes()),
            Err(CsvError::NoEntities)
        ));
        assert!(matches!(
            read_telemetry("Frame,T,Caos_Original,Caos_Fenix,Fluxo_Qiskit,q0_x\n".as_bytes()),
            Err(CsvError::MissingColumn { column }) if column == "Ruido_Vibracional"
        ));

        let partial = format!("{},q0_x,q0_y\n", FRAME_COLUMNS.join(","));
        assert!(matches!(
            read_telemetry(partial.as_bytes()),
            Err(CsvError::MissingColumn { column }) if column == "q0_z"
        ));
    }

    #[test]
    fn reader_reports_bad_rows_with_line_numbers() {
        let head = header(1).join(",");

        let short = format!("{head}\n0,0.0,0.0\n");
        assert!(matches!(
            read_telemetry(short.as_bytes()),
            Err(CsvError::RowWidth {
                line: 2,
                expected: 12,
                found: 3
            })
        ));

        let garbled = format!("{head}\n0,0,0,0,0,0,0,0,0,0,0,0\n1,0,0,0,0,0,oops,0,0,0,0,0\n");
        assert!(matches!(
            read_telemetry(garbled.as_bytes()),
            Err(CsvError::InvalidNumber { line: 3, column, value })
                if column == "q0_x" && value == "oops"
        ));
    }

    #[test]
    fn header_only_table_has_no_records() {
        let text = format!("{}\n", header(2).join(","));
        let table = read_telemetry(text.as_bytes()).expect("valid table");
        assert_eq!(table.entity_count, 2);
        assert!(table.records.is_empty());
    }
}
