//! Validation of uploaded voice recordings before they are sent for transcription.
//!
//! The declared content type of an upload cannot be trusted, so the audio
//! format is detected from the leading bytes of the file and the MIME type
//! sent to the provider is derived from that detection.

use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};

use crate::utils::validation::MAX_AUDIO_SIZE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Wav,
    WebM,
    Mp3,
    Ogg,
}

impl AudioFormat {
    pub fn mime_type(self) -> &'static str {
        match self {
            AudioFormat::Wav => "audio/wav",
            AudioFormat::WebM => "audio/webm",
            AudioFormat::Mp3 => "audio/mpeg",
            AudioFormat::Ogg => "audio/ogg",
        }
    }

    /// Detects the container from its magic bytes
    fn sniff(content: &[u8]) -> Option<Self> {
        match content {
            [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'A', b'V', b'E', ..] => Some(AudioFormat::Wav),
            [0x1A, 0x45, 0xDF, 0xA3, ..] => Some(AudioFormat::WebM),
            [b'O', b'g', b'g', b'S', ..] => Some(AudioFormat::Ogg),
            [b'I', b'D', b'3', ..] => Some(AudioFormat::Mp3),
            // Trame MPEG sans en-tête ID3
            [0xFF, second, ..] if second & 0xE0 == 0xE0 => Some(AudioFormat::Mp3),
            _ => None,
        }
    }
}

/// An audio clip whose size and format have been checked
#[derive(Debug, Clone)]
pub struct AudioInput {
    content: Vec<u8>,
    filename: String,
    format: AudioFormat,
}

impl AudioInput {
    pub fn new(content: Vec<u8>, filename: &str) -> Result<Self> {
        if content.is_empty() {
            bail!("Audio file cannot be empty");
        }
        if content.len() > MAX_AUDIO_SIZE {
            bail!("Audio file exceeds maximum allowed size of {} bytes", MAX_AUDIO_SIZE);
        }

        let filename = Self::sanitize_filename(filename).context("Failed to process filename")?;
        let format = AudioFormat::sniff(&content)
            .ok_or_else(|| anyhow!("Unsupported audio format, expected WAV, WebM, MP3 or OGG"))?;

        Ok(Self {
            content,
            filename,
            format,
        })
    }

    /// Keeps only the final path component, to prevent path traversal
    fn sanitize_filename(filename: &str) -> Result<String> {
        let trimmed = filename.trim();
        if trimmed.is_empty() {
            return Ok("recording".to_string());
        }

        Path::new(trimmed)
            .file_name()
            .and_then(|name| name.to_str())
            .map(str::to_string)
            .ok_or_else(|| anyhow!("Invalid filename"))
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn format(&self) -> AudioFormat {
        self.format
    }

    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wav() -> Vec<u8> {
        let mut bytes = b"RIFF\x24\x00\x00\x00WAVEfmt ".to_vec();
        bytes.extend_from_slice(&[0u8; 32]);
        bytes
    }

    #[test]
    fn test_formats_are_detected_from_content() {
        let cases: Vec<(Vec<u8>, AudioFormat)> = vec![
            (wav(), AudioFormat::Wav),
            (vec![0x1A, 0x45, 0xDF, 0xA3, 0x01], AudioFormat::WebM),
            (b"OggS\x00\x02".to_vec(), AudioFormat::Ogg),
            (b"ID3\x04\x00".to_vec(), AudioFormat::Mp3),
            (vec![0xFF, 0xFB, 0x90, 0x64], AudioFormat::Mp3),
        ];

        for (content, expected) in cases {
            // Le nom de fichier n'influence pas la détection
            let audio = AudioInput::new(content, "clip.txt").unwrap();
            assert_eq!(audio.format(), expected);
        }
    }

    #[test]
    fn test_rejects_non_audio_and_bad_sizes() {
        assert!(AudioInput::new(Vec::new(), "a.wav").is_err());
        assert!(AudioInput::new(b"%PDF-1.7".to_vec(), "a.wav").is_err());
        assert!(AudioInput::new(b"RIFF\x00\x00\x00\x00AVI ".to_vec(), "a.wav").is_err());

        let mut huge = wav();
        huge.resize(MAX_AUDIO_SIZE + 1, 0);
        assert!(AudioInput::new(huge, "a.wav").is_err());
    }

    #[test]
    fn test_filename_is_sanitized() {
        let audio = AudioInput::new(wav(), "../../etc/voice.wav").unwrap();
        assert_eq!(audio.filename(), "voice.wav");
        assert_eq!(audio.mime_type(), "audio/wav");

        let unnamed = AudioInput::new(wav(), "  ").unwrap();
        assert_eq!(unnamed.filename(), "recording");

        assert!(AudioInput::new(wav(), "..").is_err());
    }
}
