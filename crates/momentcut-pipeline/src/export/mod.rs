//! Cut sheet exporters.
//!
//! Every exporter is a pure projection of a [`CutSheet`]: the same sheet
//! always renders to the same bytes, and an empty sheet renders to an empty
//! but well-formed document.

pub mod csv;
pub mod job;
pub mod markdown;
pub mod pdf;

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use momentcut_models::CutSheet;

use crate::error::{PipelineError, PipelineResult};

/// Document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Markdown,
    Pdf,
    /// Machine-readable cut job.
    Job,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 4] = [
        ExportFormat::Csv,
        ExportFormat::Markdown,
        ExportFormat::Pdf,
        ExportFormat::Job,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Markdown => "markdown",
            ExportFormat::Pdf => "pdf",
            ExportFormat::Job => "job",
        }
    }

    /// File name used when every format is written next to the clips.
    pub fn default_file_name(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "cut_sheet.csv",
            ExportFormat::Markdown => "cut_sheet.md",
            ExportFormat::Pdf => "cut_sheet.pdf",
            ExportFormat::Job => "cut_job.json",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "markdown" | "md" => Ok(ExportFormat::Markdown),
            "pdf" => Ok(ExportFormat::Pdf),
            "job" | "json" => Ok(ExportFormat::Job),
            other => Err(format!(
                "unknown export format '{other}', expected csv, markdown, pdf or job"
            )),
        }
    }
}

/// Where a cut job points: the source media and the clip directory.
#[derive(Debug, Clone, PartialEq)]
pub struct JobTarget {
    pub media_path: PathBuf,
    pub output_dir: PathBuf,
    pub extension: String,
}

/// Render `sheet` as `format`. Job exports need a [`JobTarget`].
pub fn export(
    sheet: &CutSheet,
    format: ExportFormat,
    target: Option<&JobTarget>,
) -> PipelineResult<Vec<u8>> {
    match format {
        ExportFormat::Csv => Ok(csv::to_csv(sheet).into_bytes()),
        ExportFormat::Markdown => Ok(markdown::to_markdown(sheet).into_bytes()),
        ExportFormat::Pdf => Ok(pdf::to_pdf(sheet)),
        ExportFormat::Job => {
            let target = target.ok_or_else(|| {
                PipelineError::config("job export needs the media path and output directory")
            })?;
            Ok(job::to_job(sheet, target).to_json()?.into_bytes())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_names_round_trip() {
        for format in ExportFormat::ALL {
            assert_eq!(format.as_str().parse::<ExportFormat>(), Ok(format));
        }
        assert_eq!("MD".parse::<ExportFormat>(), Ok(ExportFormat::Markdown));
        assert!("docx".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn test_job_export_requires_target() {
        let sheet = CutSheet::new(10.0, Vec::new()).unwrap();
        assert!(matches!(
            export(&sheet, ExportFormat::Job, None),
            Err(PipelineError::Config(_))
        ));
        assert!(export(&sheet, ExportFormat::Csv, None).is_ok());
    }
}
