//! Archival hand-off writing one JSON request per line

use std::io::{self, Write};
use std::sync::Mutex;

use tracing::info;

use crate::infrastructure::traits::{ArchivalService, ArchiveRequest};

/// Name of the server-side plugin the requests are meant for.
pub const COPY_PLUGIN: &str = "copy_datasets_to_userdir";

/// Writes archive requests as JSON lines, e.g. to stdout for a downstream uploader.
pub struct JsonLinesArchival<W: Write + Send> {
    out: Mutex<W>,
}

impl<W: Write + Send> JsonLinesArchival<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl JsonLinesArchival<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> ArchivalService for JsonLinesArchival<W> {
    fn copy_datasets_to_user_dir(&self, request: &ArchiveRequest) -> io::Result<()> {
        info!(
            plugin = COPY_PLUGIN,
            mode = %request.mode,
            "archive request for {} {}",
            request.type_code,
            request.identifier
        );
        let line = serde_json::to_string(request)?;
        let mut out = self
            .out
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "archival writer poisoned"))?;
        writeln!(out, "{line}")?;
        out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::traits::ArchiveMode;

    #[test]
    fn given_two_requests_when_archiving_then_writes_one_line_each() {
        let archival = JsonLinesArchival::new(Vec::new());
        let request = ArchiveRequest {
            experiment_id: "/S/P/EXP1".into(),
            type_code: "LSR_FORTESSA_TUBESET".into(),
            identifier: "/S/P/EXP1".into(),
            specimen_name: String::new(),
            mode: ArchiveMode::Normal,
        };

        archival.copy_datasets_to_user_dir(&request).unwrap();
        archival
            .copy_datasets_to_user_dir(&ArchiveRequest {
                mode: ArchiveMode::Zip,
                ..request.clone()
            })
            .unwrap();

        let written = String::from_utf8(archival.into_inner()).unwrap();
        let lines: Vec<ArchiveRequest> = written
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], request);
        assert_eq!(lines[1].mode, ArchiveMode::Zip);
    }
}
