//! SO-024: Cookbook archive (tar + bzip2).
//!
//! Entries keep the cookbook path as configured, relative, so extracting
//! under the remote root mirrors the local layout. Walk order is sorted for
//! reproducible archives.

use super::error::{Error, Result};
use bzip2::write::BzEncoder;
use bzip2::Compression;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Name a cookbook directory takes inside the archive and on the host.
pub fn archive_name(cookbook: &str) -> String {
    let trimmed = cookbook.trim_start_matches("./").trim_start_matches('/');
    trimmed.trim_end_matches('/').to_string()
}

/// Write every cookbook directory under `root` into `out`.
///
/// With `skip_apple_double`, `._*` resource-fork files are left out.
pub fn write_archive<W: Write>(
    out: W,
    root: &Path,
    cookbooks: &[String],
    skip_apple_double: bool,
) -> Result<W> {
    let mut builder = tar::Builder::new(BzEncoder::new(out, Compression::default()));

    for cookbook in cookbooks {
        let source = root.join(cookbook);
        let name = PathBuf::from(archive_name(cookbook));
        // The configured directory itself may be a link; anything below it is not followed.
        let meta = std::fs::metadata(&source).map_err(|e| archive_error(&source, e))?;
        append_tree(&mut builder, &source, &name, &meta, skip_apple_double)?;
    }

    let encoder = builder.into_inner().map_err(|e| archive_error(root, e))?;
    encoder.finish().map_err(|e| archive_error(root, e))
}

fn append_tree<W: Write>(
    builder: &mut tar::Builder<W>,
    source: &Path,
    name: &Path,
    meta: &std::fs::Metadata,
    skip_apple_double: bool,
) -> Result<()> {
    if meta.file_type().is_symlink() {
        return append_symlink(builder, source, name, meta);
    }

    if !meta.is_dir() {
        return builder
            .append_path_with_name(source, name)
            .map_err(|e| archive_error(source, e));
    }

    builder
        .append_dir(name, source)
        .map_err(|e| archive_error(source, e))?;

    let mut children = std::fs::read_dir(source)
        .and_then(|entries| entries.collect::<std::io::Result<Vec<_>>>())
        .map_err(|e| archive_error(source, e))?;
    children.sort_by_key(|e| e.file_name());

    for entry in children {
        let file_name = entry.file_name();
        if skip_apple_double && file_name.to_string_lossy().starts_with("._") {
            continue;
        }
        let path = entry.path();
        let child_meta = std::fs::symlink_metadata(&path).map_err(|e| archive_error(&path, e))?;
        append_tree(
            builder,
            &path,
            &name.join(&file_name),
            &child_meta,
            skip_apple_double,
        )?;
    }
    Ok(())
}

/// Store a symlink as a link entry, the way `tar -c` does.
fn append_symlink<W: Write>(
    builder: &mut tar::Builder<W>,
    source: &Path,
    name: &Path,
    meta: &std::fs::Metadata,
) -> Result<()> {
    let target = std::fs::read_link(source).map_err(|e| archive_error(source, e))?;
    let mut header = tar::Header::new_gnu();
    header.set_metadata(meta);
    header.set_entry_type(tar::EntryType::Symlink);
    header.set_size(0);
    builder
        .append_link(&mut header, name, &target)
        .map_err(|e| archive_error(source, e))
}

fn archive_error(path: &Path, source: std::io::Error) -> Error {
    Error::Archive {
        path: path.to_path_buf(),
        source,
    }
}
