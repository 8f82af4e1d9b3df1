use crate::error::{MidiGenError, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};

const MIDI_EXTENSIONS: [&str; 2] = ["mid", "midi"];

/// A local MIDI file, validated and read fully into memory.
#[derive(Clone, Debug)]
pub struct MidiAsset {
    path: PathBuf,
    bytes: Vec<u8>,
}

impl MidiAsset {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        check_midi_path(path)?;
        let bytes = fs::read(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            bytes,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.mid".to_string())
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Existence is checked before the extension.
pub fn check_midi_path(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(MidiGenError::MidiNotFound(path.to_path_buf()));
    }

    let is_midi = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| MIDI_EXTENSIONS.iter().any(|m| e.eq_ignore_ascii_case(m)))
        .unwrap_or(false);

    if !is_midi {
        return Err(MidiGenError::NotMidi(path.to_path_buf()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn accepts_mixed_case_extensions() {
        let dir = tempdir().unwrap();
        for name in ["a.mid", "b.MIDI", "c.Mid"] {
            let p = dir.path().join(name);
            fs::write(&p, b"MThd").unwrap();
            let asset = MidiAsset::open(&p).unwrap();
            assert_eq!(asset.bytes(), b"MThd");
            assert_eq!(asset.file_name(), name);
        }
    }

    #[test]
    fn missing_file_wins_over_bad_extension() {
        let err = check_midi_path(Path::new("/definitely/not/here.wav")).unwrap_err();
        assert!(matches!(err, MidiGenError::MidiNotFound(_)));
    }

    #[test]
    fn rejects_other_extensions() {
        let dir = tempdir().unwrap();
        for name in ["song.mp3", "song.mid.bak", "song"] {
            let p = dir.path().join(name);
            fs::write(&p, b"x").unwrap();
            let err = check_midi_path(&p).unwrap_err();
            assert!(matches!(err, MidiGenError::NotMidi(_)), "{name}: {err}");
            assert!(err.is_invalid_input());
        }
    }
}
