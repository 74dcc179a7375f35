//! External process metrics.

use crate::error::SamplingError;
use std::process::Command;

/// One reading from a [`ProcessProbe`]: a header line naming the columns
/// and a whitespace-delimited value line.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeReading {
    pub header: String,
    pub values: String,
    pub cpu_percent: f64,
    pub rss_kib: u64,
}

impl ProbeReading {
    /// Parses a header line plus a value line whose first two columns are
    /// CPU percentage and resident set size in KiB.
    pub fn parse(header: &str, values: &str) -> Result<Self, SamplingError> {
        let mut fields = values.split_whitespace();
        let cpu_percent = fields
            .next()
            .and_then(|f| f.parse::<f64>().ok())
            .ok_or_else(|| SamplingError::Parse(values.to_owned()))?;
        let rss_kib = fields
            .next()
            .and_then(|f| f.parse::<u64>().ok())
            .ok_or_else(|| SamplingError::Parse(values.to_owned()))?;
        if header.split_whitespace().count() < 2 {
            return Err(SamplingError::Parse(header.to_owned()));
        }
        Ok(Self {
            header: header.trim().to_owned(),
            values: values.trim().to_owned(),
            cpu_percent,
            rss_kib,
        })
    }
}

pub trait ProcessProbe: Send + Sync {
    fn read(&self, pid: u32) -> Result<ProbeReading, SamplingError>;

    /// Gives the process a chance to return memory before the final reading.
    fn settle(&self) {}
}

/// Samples `ps -p <pid> -o %cpu,rss`. Unix only.
#[derive(Debug, Clone, Copy, Default)]
pub struct PsProbe;

impl ProcessProbe for PsProbe {
    fn read(&self, pid: u32) -> Result<ProbeReading, SamplingError> {
        let output = Command::new("ps")
            .args(["-p", &pid.to_string(), "-o", "%cpu,rss"])
            .output()?;
        if !output.status.success() {
            return Err(SamplingError::Status(output.status));
        }
        let text = String::from_utf8_lossy(&output.stdout);
        let mut lines = text.lines().filter(|l| !l.trim().is_empty());
        match (lines.next(), lines.next()) {
            (Some(header), Some(values)) => ProbeReading::parse(header, values),
            _ => Err(SamplingError::Parse(text.into_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ps_output() {
        let reading = ProbeReading::parse("%CPU   RSS", "  12.5 40960 ").unwrap();
        assert!((reading.cpu_percent - 12.5).abs() < f64::EPSILON);
        assert_eq!(reading.rss_kib, 40_960);
        assert_eq!(reading.values, "12.5 40960");
        assert_eq!(reading.header, "%CPU   RSS");
    }

    #[test]
    fn extra_columns_are_kept() {
        let reading = ProbeReading::parse("%CPU RSS EXTRA", "0.0 12 7").unwrap();
        assert_eq!(reading.values, "0.0 12 7");
    }

    #[test]
    fn garbage_is_a_parse_error() {
        assert!(matches!(
            ProbeReading::parse("%CPU RSS", "n/a 12"),
            Err(SamplingError::Parse(_))
        ));
        assert!(matches!(
            ProbeReading::parse("%CPU RSS", "1.0"),
            Err(SamplingError::Parse(_))
        ));
        assert!(matches!(
            ProbeReading::parse("", "1.0 2"),
            Err(SamplingError::Parse(_))
        ));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn ps_probe_reads_own_process() {
        // ps may be missing in minimal containers; only check consistency.
        if let Ok(reading) = PsProbe.read(std::process::id()) {
            assert!(reading.rss_kib > 0);
        }
    }
}
