//! CSV input and output for the pdpanel CLI.

use anyhow::{Context, Result};
use clap::Args;
use pdpanel_traits::PanelFrame;
use polars::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Input and output paths shared by the panel subcommands.
#[derive(Debug, Args)]
pub(crate) struct IoArgs {
    /// Input CSV file with a header row
    pub(crate) input: PathBuf,

    /// Output CSV file (defaults to stdout)
    #[arg(short, long)]
    pub(crate) output: Option<PathBuf>,
}

/// Read a headed CSV file into a panel.
pub(crate) fn read_panel(path: &Path) -> Result<PanelFrame> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .and_then(|reader| reader.finish())
        .with_context(|| format!("failed to read {}", path.display()))?;

    debug!(path = %path.display(), rows = df.height(), columns = df.width(), "read panel");
    Ok(PanelFrame::new(df))
}

/// Write a panel as CSV to `output`, or to stdout when no path is given.
pub(crate) fn write_panel(panel: PanelFrame, output: Option<&Path>) -> Result<()> {
    let mut df = panel.into_inner();
    match output {
        Some(path) => {
            let mut file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            CsvWriter::new(&mut file)
                .finish(&mut df)
                .with_context(|| format!("failed to write {}", path.display()))?;
            debug!(path = %path.display(), rows = df.height(), "wrote panel");
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            CsvWriter::new(&mut stdout).finish(&mut df)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_round_trip_keeps_integer_columns() {
        let dir = std::env::temp_dir().join(format!("pdpanel-cli-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("panel.csv");

        let panel = PanelFrame::new(
            df! {
                "ID" => &[1i64, 1, 2],
                "ref" => &[202001i64, 202002, 202001],
                "dpd" => &[0i64, 35, 0],
            }
            .unwrap(),
        );
        write_panel(panel, Some(&path)).unwrap();

        let read = read_panel(&path).unwrap();
        assert_eq!(read.len(), 3);
        assert_eq!(read.columns(), vec!["ID", "ref", "dpd"]);
        assert_eq!(
            read.data().column("ref").unwrap().dtype(),
            &DataType::Int64
        );

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_read_missing_file() {
        let err = read_panel(Path::new("/nonexistent/panel.csv")).unwrap_err();
        assert!(err.to_string().contains("failed to read"));
    }
}
