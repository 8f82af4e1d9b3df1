use crate::{
    error::{MidiGenError, Result},
    io::progress::emit_download_progress,
};
use reqwest::{
    blocking::{Client, Response},
    StatusCode,
};
use std::{
    ffi::OsString,
    fs,
    fs::File,
    io::{Read, Write},
    path::{Path, PathBuf},
    time::Duration,
};
use tracing::{debug, info};

pub const DOWNLOAD_CHUNK_SIZE: usize = 8192;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60 * 60);

pub fn http_client(request_timeout: Duration) -> Result<Client> {
    Ok(Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .timeout(request_timeout)
        .build()?)
}

/// Anything but a plain 200 is terminal for the given operation; the body is
/// carried verbatim in the error.
pub fn ensure_ok(operation: &'static str, resp: Response) -> Result<Response> {
    let status = resp.status();
    if status != StatusCode::OK {
        let body = resp
            .text()
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        debug!(operation, status = status.as_u16(), "service returned an error");
        return Err(MidiGenError::Remote {
            operation,
            status: status.as_u16(),
            body,
        });
    }
    Ok(resp)
}

fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| OsString::from("download"));
    name.push(".part");
    dest.with_file_name(name)
}

/// Stream `url` to `dest` in fixed-size chunks. The body goes to a sibling
/// `.part` file that replaces `dest` only once complete; on failure the
/// partial file is removed.
pub fn download_to_file(client: &Client, url: &str, dest: &Path) -> Result<u64> {
    debug!(url, "downloading result");
    let resp = ensure_ok("download", client.get(url).send()?)?;

    let tmp = part_path(dest);
    // rename replaces an existing file, so `dest` is untouched until the
    // new body is fully on disk
    let result = stream_body(resp, &tmp).and_then(|written| {
        fs::rename(&tmp, dest)?;
        Ok(written)
    });

    match result {
        Ok(written) => {
            info!(path = %dest.display(), bytes = written, "download complete");
            Ok(written)
        }
        Err(e) => {
            fs::remove_file(&tmp).ok();
            Err(e)
        }
    }
}

fn stream_body(mut resp: Response, tmp: &Path) -> Result<u64> {
    let total = resp.content_length().unwrap_or(0);

    emit_download_progress(0, total);

    let mut file = File::create(tmp)?;
    let mut downloaded: u64 = 0;
    let mut buf = [0u8; DOWNLOAD_CHUNK_SIZE];
    loop {
        let n = resp.read(&mut buf)?;
        if n == 0 {
            break;
        }
        file.write_all(&buf[..n])?;
        downloaded += n as u64;
        emit_download_progress(downloaded, total);
    }
    file.flush()?;

    emit_download_progress(total.max(downloaded), total.max(downloaded));

    Ok(downloaded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn part_file_sits_next_to_destination() {
        assert_eq!(
            part_path(Path::new("/tmp/out/song.mp3")),
            PathBuf::from("/tmp/out/song.mp3.part")
        );
        assert_eq!(part_path(Path::new("song")), PathBuf::from("song.part"));
    }
}
