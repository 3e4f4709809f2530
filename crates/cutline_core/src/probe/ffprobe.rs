//! [`MediaProbe`] backed by the ffprobe executable.
//!
//! Each query is one ffprobe run with JSON output:
//!
//! - duration: `-show_entries format=duration`
//! - first PTS: `-select_streams v:0|a:0 -show_entries packet=pts_time -read_intervals %+#1`
//! - audio presence: `-select_streams a -show_entries stream=codec_type`

use std::io::ErrorKind;
use std::process::Command;

use serde::Deserialize;

use super::types::{MediaProbe, ProbeError, ProbeResult};
use crate::models::{MediaAsset, StreamKind};

#[derive(Debug, Deserialize)]
struct FormatOutput {
    format: Option<FormatEntry>,
}

#[derive(Debug, Deserialize)]
struct FormatEntry {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PacketsOutput {
    #[serde(default)]
    packets: Vec<PacketEntry>,
}

#[derive(Debug, Deserialize)]
struct PacketEntry {
    pts_time: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamsOutput {
    #[serde(default)]
    streams: Vec<StreamEntry>,
}

#[derive(Debug, Deserialize)]
struct StreamEntry {
    codec_type: Option<String>,
}

/// ffprobe client.
#[derive(Debug, Clone)]
pub struct FfprobeClient {
    executable: String,
}

impl Default for FfprobeClient {
    fn default() -> Self {
        Self::new("ffprobe")
    }
}

impl FfprobeClient {
    /// Create a client for the given ffprobe executable.
    pub fn new(executable: impl Into<String>) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    pub fn executable(&self) -> &str {
        &self.executable
    }

    /// Run ffprobe with `args` followed by the asset path; return stdout.
    fn run(&self, args: &[String], asset: &MediaAsset) -> ProbeResult<String> {
        let path = asset.path();
        // Network inputs cannot be checked locally
        if !asset.to_arg().contains("://") && !path.exists() {
            return Err(ProbeError::FileNotFound(asset.to_string()));
        }

        tracing::debug!("ffprobe {} {}", args.join(" "), asset);

        let output = Command::new(&self.executable)
            .args(args)
            .arg(path)
            .output()
            .map_err(|e| {
                if e.kind() == ErrorKind::NotFound {
                    ProbeError::ToolNotFound(self.executable.clone())
                } else {
                    ProbeError::Launch {
                        tool: self.executable.clone(),
                        message: e.to_string(),
                    }
                }
            })?;

        if !output.status.success() {
            return Err(ProbeError::CommandFailed {
                tool: self.executable.clone(),
                exit_code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl MediaProbe for FfprobeClient {
    fn duration(&self, asset: &MediaAsset) -> ProbeResult<f64> {
        let json = self.run(&duration_args(), asset)?;
        parse_duration(&json)
    }

    fn first_pts(&self, asset: &MediaAsset, kind: StreamKind) -> ProbeResult<f64> {
        let json = self.run(&first_pts_args(kind), asset)?;
        parse_first_pts(&json)?.ok_or_else(|| ProbeError::MissingStream {
            kind,
            path: asset.to_string(),
        })
    }

    fn has_audio(&self, asset: &MediaAsset) -> ProbeResult<bool> {
        let json = self.run(&has_audio_args(), asset)?;
        parse_has_audio(&json)
    }
}

fn base_args() -> Vec<String> {
    vec!["-v".to_string(), "error".to_string()]
}

fn with_json(mut args: Vec<String>) -> Vec<String> {
    args.push("-of".to_string());
    args.push("json".to_string());
    args
}

/// Arguments (before the path) for the duration query.
pub fn duration_args() -> Vec<String> {
    let mut args = base_args();
    args.extend(["-show_entries".to_string(), "format=duration".to_string()]);
    with_json(args)
}

/// Arguments (before the path) for the first-PTS query.
pub fn first_pts_args(kind: StreamKind) -> Vec<String> {
    let mut args = base_args();
    args.extend([
        "-select_streams".to_string(),
        format!("{}:0", kind.specifier()),
        "-show_entries".to_string(),
        "packet=pts_time".to_string(),
        "-read_intervals".to_string(),
        "%+#1".to_string(),
    ]);
    with_json(args)
}

/// Arguments (before the path) for the audio presence query.
pub fn has_audio_args() -> Vec<String> {
    let mut args = base_args();
    args.extend([
        "-select_streams".to_string(),
        "a".to_string(),
        "-show_entries".to_string(),
        "stream=codec_type".to_string(),
    ]);
    with_json(args)
}

/// Parse the duration query output.
pub fn parse_duration(json: &str) -> ProbeResult<f64> {
    let parsed: FormatOutput =
        serde_json::from_str(json).map_err(|e| ProbeError::parse("ffprobe duration", e.to_string()))?;

    let raw = parsed
        .format
        .and_then(|f| f.duration)
        .ok_or_else(|| ProbeError::parse("ffprobe duration", "no format.duration in output"))?;

    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| ProbeError::parse("ffprobe duration", format!("'{}' is not a number", raw)))?;
    if !value.is_finite() || value < 0.0 {
        return Err(ProbeError::parse(
            "ffprobe duration",
            format!("'{}' is not a valid duration", raw),
        ));
    }
    Ok(value)
}

/// Parse the first-PTS query output.
///
/// `Ok(None)` when no packet was reported (no such stream). A packet whose
/// `pts_time` is missing or `N/A` counts as starting at zero.
pub fn parse_first_pts(json: &str) -> ProbeResult<Option<f64>> {
    let parsed: PacketsOutput =
        serde_json::from_str(json).map_err(|e| ProbeError::parse("ffprobe packets", e.to_string()))?;

    let Some(packet) = parsed.packets.into_iter().next() else {
        return Ok(None);
    };

    match packet.pts_time.as_deref().map(str::trim) {
        None | Some("N/A") => Ok(Some(0.0)),
        Some(raw) => raw
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(Some)
            .ok_or_else(|| ProbeError::parse("ffprobe packets", format!("'{}' is not a timestamp", raw))),
    }
}

/// Parse the audio presence query output.
pub fn parse_has_audio(json: &str) -> ProbeResult<bool> {
    let parsed: StreamsOutput =
        serde_json::from_str(json).map_err(|e| ProbeError::parse("ffprobe streams", e.to_string()))?;
    Ok(parsed
        .streams
        .iter()
        .any(|s| s.codec_type.as_deref() == Some("audio")))
}
