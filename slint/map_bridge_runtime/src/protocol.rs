use serde::{Deserialize, Serialize};
use std::io::{self, Read, Write};
use std::sync::mpsc::Receiver;
use tracing::warn;

pub const HOST_TO_SHELL_CAP: usize = 1_048_576;
pub const SHELL_TO_HOST_CAP: usize = 262_144;

/// Envelopes written by the host to the shell that owns the web view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "t")]
pub enum HostEnvelope {
    #[serde(rename = "ready")]
    Ready {
        sid: String,
        title: String,
        url: String,
    },
    #[serde(rename = "load")]
    Load { sid: String, url: String },
    #[serde(rename = "inject")]
    Inject {
        sid: String,
        label: String,
        script: String,
    },
    #[serde(rename = "open_external")]
    OpenExternal { sid: String, url: String },
    #[serde(rename = "close")]
    Close { sid: String },
}

/// Envelopes the shell forwards from its web view.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "t")]
pub enum ShellEnvelope {
    #[serde(rename = "load_start")]
    LoadStart { sid: String },
    #[serde(rename = "load_end")]
    LoadEnd { sid: String },
    #[serde(rename = "load_error")]
    LoadError {
        sid: String,
        #[serde(default)]
        code: Option<String>,
        message: String,
    },
    #[serde(rename = "message")]
    Message { sid: String, data: String },
    #[serde(rename = "closed")]
    Closed { sid: String },
}

impl ShellEnvelope {
    pub fn sid(&self) -> &str {
        match self {
            ShellEnvelope::LoadStart { sid }
            | ShellEnvelope::LoadEnd { sid }
            | ShellEnvelope::LoadError { sid, .. }
            | ShellEnvelope::Message { sid, .. }
            | ShellEnvelope::Closed { sid } => sid,
        }
    }
}

pub fn writer_loop(rx: Receiver<HostEnvelope>) -> io::Result<()> {
    let stdout = io::stdout();
    let mut writer = stdout.lock();

    for envelope in rx {
        let payload = encode_host_envelope(&envelope)?;
        write_frame(&mut writer, &payload, HOST_TO_SHELL_CAP)?;
        writer.flush()?;
    }

    Ok(())
}

/// Reads shell frames from stdin until EOF. Frames that decode as JSON but
/// not as a known envelope are skipped; framing errors end the loop.
pub fn reader_loop<F>(on_envelope: F) -> io::Result<()>
where
    F: FnMut(ShellEnvelope),
{
    let stdin = io::stdin();
    let mut reader = stdin.lock();
    read_envelopes(&mut reader, on_envelope)
}

fn read_envelopes<R, F>(reader: &mut R, mut on_envelope: F) -> io::Result<()>
where
    R: Read,
    F: FnMut(ShellEnvelope),
{
    loop {
        match read_frame(reader, SHELL_TO_HOST_CAP) {
            Ok(payload) => match decode_shell_envelope(&payload) {
                Ok(envelope) => on_envelope(envelope),
                Err(err) => warn!(error = %err, len = payload.len(), "skipping undecodable shell frame"),
            },
            Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => return Ok(()),
            Err(err) => return Err(err),
        }
    }
}

fn encode_host_envelope(envelope: &HostEnvelope) -> io::Result<Vec<u8>> {
    serde_json::to_vec(envelope).map_err(json_error)
}

fn decode_shell_envelope(payload: &[u8]) -> io::Result<ShellEnvelope> {
    serde_json::from_slice(payload).map_err(json_error)
}

fn read_frame(reader: &mut impl Read, max_payload: usize) -> io::Result<Vec<u8>> {
    let mut len_buf = [0_u8; 4];
    reader.read_exact(&mut len_buf)?;

    let len = u32::from_be_bytes(len_buf) as usize;
    if len > max_payload {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("frame too large: {len} > {max_payload}"),
        ));
    }

    let mut payload = vec![0_u8; len];
    reader.read_exact(&mut payload)?;
    Ok(payload)
}

fn write_frame(writer: &mut impl Write, payload: &[u8], max_payload: usize) -> io::Result<()> {
    if payload.len() > max_payload {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("frame too large: {} > {}", payload.len(), max_payload),
        ));
    }

    let len = u32::try_from(payload.len())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "payload exceeds u32"))?;

    writer.write_all(&len.to_be_bytes())?;
    writer.write_all(payload)?;
    Ok(())
}

fn json_error(err: serde_json::Error) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, err)
}
