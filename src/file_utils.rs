use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::sentence::Sentence;

// @module: Caption file input and bilingual export

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_file()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.as_os_str().is_empty() && !path.exists() {
            fs::create_dir_all(path)
                .with_context(|| format!("Failed to create directory: {:?}", path))?;
        }
        Ok(())
    }

    /// Read a caption file as raw bytes; decoding is the pipeline's job
    pub fn read_caption_file<P: AsRef<Path>>(path: P) -> Result<Vec<u8>> {
        fs::read(&path).with_context(|| format!("Failed to read caption file: {:?}", path.as_ref()))
    }

    /// Write a string to a file, creating parent directories
    pub fn write_to_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            Self::ensure_dir(parent)?;
        }
        fs::write(&path, content).with_context(|| format!("Failed to write to file: {:?}", path.as_ref()))?;
        Ok(())
    }

    // @generates: "<stem>.<suffix>.<extension>" next to the input or in output_dir
    pub fn generate_output_path<P: AsRef<Path>>(input_file: P, output_dir: Option<&Path>, suffix: &str, extension: &str) -> PathBuf {
        let input_file = input_file.as_ref();
        let stem = input_file.file_stem().unwrap_or_default().to_string_lossy();
        let file_name = format!("{}.{}.{}", stem, suffix, extension);
        match output_dir {
            Some(dir) => dir.join(file_name),
            None => input_file.with_file_name(file_name),
        }
    }
}

/// Render sentences as one bilingual SRT document
pub fn render_bilingual_srt(sentences: &[Sentence]) -> String {
    sentences.iter().map(|s| s.to_string()).collect()
}

/// Write sentences as bilingual SRT
pub fn write_bilingual_srt<P: AsRef<Path>>(sentences: &[Sentence], path: P) -> Result<()> {
    FileManager::write_to_file(path, &render_bilingual_srt(sentences))
}

/// Write sentences, with their word timings, as pretty JSON
pub fn write_sentences_json<P: AsRef<Path>>(sentences: &[Sentence], path: P) -> Result<()> {
    let json = serde_json::to_string_pretty(sentences).context("Failed to serialize sentences")?;
    FileManager::write_to_file(path, &json)
}
