//! Disassembler driver.
//!
//! Shells out to `llvm-objdump -d` for ELF binaries. Inputs that are
//! already textual listings pass through untouched, so the analyzers can
//! be pointed at saved disassembly as well as at binaries.

use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

use crate::{Error, Result};

const OBJDUMP: &str = "llvm-objdump";

const ELF_MAGIC: [u8; 4] = [0x7F, b'E', b'L', b'F'];

/// Whether the file starts with the ELF magic.
pub fn is_elf(path: &Path) -> Result<bool> {
    let mut magic = [0u8; 4];
    let mut file = File::open(path)?;
    match file.read_exact(&mut magic) {
        Ok(()) => Ok(magic == ELF_MAGIC),
        Err(err) if err.kind() == std::io::ErrorKind::UnexpectedEof => Ok(false),
        Err(err) => Err(err.into()),
    }
}

/// Make sure a textual disassembly of `input` exists and return its path.
///
/// Binaries are disassembled into `output` (or a file in the system temp
/// directory); listings are returned as-is.
pub fn ensure_disassembly(input: &Path, output: Option<&Path>) -> Result<PathBuf> {
    if !is_elf(input)? {
        debug!(input = %input.display(), "input is already a disassembly listing");
        return Ok(input.to_path_buf());
    }

    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| std::env::temp_dir().join("vmc-disassembly.dump"));
    disassemble(input, &output)?;
    Ok(output)
}

/// Run the disassembler over `input`, writing the listing to `output`.
pub fn disassemble(input: &Path, output: &Path) -> Result<()> {
    debug!(input = %input.display(), output = %output.display(), "running {OBJDUMP}");
    let result = Command::new(OBJDUMP)
        .arg("-d")
        .arg(input)
        .output()
        .map_err(|err| Error::Disasm(format!("failed to spawn {OBJDUMP}: {err}")))?;

    if !result.status.success() {
        return Err(Error::Disasm(format!(
            "{OBJDUMP} exited with {}: {}",
            result.status,
            String::from_utf8_lossy(&result.stderr).trim()
        )));
    }

    fs::write(output, &result.stdout)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_listing_passes_through() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "0000000000011000 <main.main>:").unwrap();
        let path = ensure_disassembly(file.path(), None).unwrap();
        assert_eq!(path, file.path());
    }

    #[test]
    fn test_elf_detection() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[0x7F, b'E', b'L', b'F', 0x02, 0x02]).unwrap();
        assert!(is_elf(file.path()).unwrap());

        let mut text = tempfile::NamedTempFile::new().unwrap();
        writeln!(text, "not an elf").unwrap();
        assert!(!is_elf(text.path()).unwrap());
    }
}
