//! Line-oriented search over readers, files and directory trees

use colored::Colorize;
use retrace_core::Pattern;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Output settings shared by every input
#[derive(Debug, Clone, Copy, Default)]
pub struct Output {
    /// Prefix each printed line with its source path
    pub with_filename: bool,
    /// Highlight the matched text
    pub color: bool,
}

/// Print every line of `reader` that `pattern` matches
///
/// Returns whether any line matched. Lines that are not valid UTF-8 are
/// searched after lossy conversion.
pub fn search_reader<R: BufRead, W: Write>(
    pattern: &Pattern,
    mut reader: R,
    label: &str,
    output: Output,
    out: &mut W,
) -> io::Result<bool> {
    let mut matched = false;
    let mut buffer = Vec::new();

    loop {
        buffer.clear();
        if reader.read_until(b'\n', &mut buffer)? == 0 {
            break;
        }
        let line = String::from_utf8_lossy(&buffer);
        let line = line.strip_suffix('\n').unwrap_or(&line);
        let line = line.strip_suffix('\r').unwrap_or(line);

        let mut matcher = pattern.matcher(line);
        if !matcher.find() {
            continue;
        }
        matched = true;

        if output.with_filename {
            if output.color {
                write!(out, "{}{}", label.magenta(), ":".cyan())?;
            } else {
                write!(out, "{label}:")?;
            }
        }

        match matcher.group_range(0) {
            Some(range) if output.color => writeln!(
                out,
                "{}{}{}",
                &line[..range.start],
                line[range.clone()].red().bold(),
                &line[range.end..]
            )?,
            _ => writeln!(out, "{line}")?,
        }
    }

    Ok(matched)
}

/// Search one file
pub fn search_file<W: Write>(
    pattern: &Pattern,
    path: &Path,
    output: Output,
    out: &mut W,
) -> io::Result<bool> {
    let file = File::open(path)?;
    search_reader(
        pattern,
        BufReader::new(file),
        &path.display().to_string(),
        output,
        out,
    )
}

/// Expand `paths` into the list of files to search
///
/// Directories are walked in name order when `recursive` is set. Paths that
/// cannot be searched are returned as errors alongside the files that can.
pub fn collect_files(paths: &[PathBuf], recursive: bool) -> (Vec<PathBuf>, Vec<(PathBuf, io::Error)>) {
    let mut files = Vec::new();
    let mut errors = Vec::new();

    for path in paths {
        if path.is_dir() {
            if recursive {
                walk(path, &mut files, &mut errors);
            } else {
                errors.push((
                    path.clone(),
                    io::Error::other("is a directory (use -r to search it)"),
                ));
            }
        } else {
            files.push(path.clone());
        }
    }

    (files, errors)
}

fn walk(dir: &Path, files: &mut Vec<PathBuf>, errors: &mut Vec<(PathBuf, io::Error)>) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            errors.push((dir.to_path_buf(), err));
            return;
        }
    };

    let mut children: Vec<PathBuf> = Vec::new();
    for entry in entries {
        match entry {
            Ok(entry) => children.push(entry.path()),
            Err(err) => errors.push((dir.to_path_buf(), err)),
        }
    }
    children.sort();

    for child in children {
        if child.is_dir() {
            walk(&child, files, errors);
        } else {
            files.push(child);
        }
    }
}
