use serde::Serialize;
use std::{
    fs::{self, ReadDir},
    path::Path,
};

pub mod error {
    use std::{io, path::PathBuf};

    pub type Result<T> = std::result::Result<T, self::Error>;

    type Msg = &'static str;

    #[derive(Debug, thiserror::Error)]
    pub enum Error {
        #[error("{0} ({1}): {2}")]
        SingleIO(Msg, PathBuf, #[source] io::Error),

        #[error("{0} (from='{1}', to='{2}'): {3}")]
        FromToIO(Msg, PathBuf, PathBuf, #[source] io::Error),

        #[error("Copy destination already exists: '{0}'")]
        CopyDestExists(PathBuf),

        #[error("Cannot serialize to JSON (dest='{0}'): {1}")]
        SerializeToJson(PathBuf, #[source] serde_json::Error),
    }
}
pub use error::{Error, Result};

pub fn mkdir_all(path: impl AsRef<Path>) -> Result<()> {
    let dir = path.as_ref();
    fs::create_dir_all(dir).map_err(|e| Error::SingleIO("Cannot create dir", dir.to_owned(), e))
}

pub fn write<P, C>(filepath: P, contents: C) -> Result<()>
where
    P: AsRef<Path>,
    C: AsRef<[u8]>,
{
    fs::write(&filepath, contents)
        .map_err(|e| Error::SingleIO("Cannot write file", filepath.as_ref().to_owned(), e))
}

pub fn write_with_mkdir<P, C>(filepath: P, contents: C) -> Result<()>
where
    P: AsRef<Path>,
    C: AsRef<[u8]>,
{
    if let Some(dir) = filepath.as_ref().parent() {
        self::mkdir_all(dir)?;
    }
    self::write(filepath, contents)
}

pub fn read_to_string(filepath: impl AsRef<Path>) -> Result<String> {
    fs::read_to_string(&filepath)
        .map_err(|e| Error::SingleIO("Cannot read file", filepath.as_ref().to_owned(), e))
}

pub fn remove_file(filepath: impl AsRef<Path>) -> Result<()> {
    fs::remove_file(&filepath)
        .map_err(|e| Error::SingleIO("Cannot remove file", filepath.as_ref().to_owned(), e))
}

pub fn remove_dir_all(dir: impl AsRef<Path>) -> Result<()> {
    fs::remove_dir_all(&dir)
        .map_err(|e| Error::SingleIO("Cannot remove dir", dir.as_ref().to_owned(), e))
}

pub fn rename(from: impl AsRef<Path>, to: impl AsRef<Path>) -> Result<()> {
    log::debug!(
        "rename {} -> {}",
        from.as_ref().display(),
        to.as_ref().display()
    );
    fs::rename(&from, &to).map_err(|e| {
        Error::FromToIO(
            "Cannot rename",
            from.as_ref().to_owned(),
            to.as_ref().to_owned(),
            e,
        )
    })
}

pub fn copy_file(from: impl AsRef<Path>, to: impl AsRef<Path>) -> Result<u64> {
    fs::copy(&from, &to).map_err(|e| {
        Error::FromToIO(
            "Cannot copy file",
            from.as_ref().to_owned(),
            to.as_ref().to_owned(),
            e,
        )
    })
}

/// Deep-copies `src_dir` to `dst_dir`.
/// Unlike `cp -r`, refuses to run when `dst_dir` already exists so that an
/// earlier copy is never silently merged over.
pub fn copy_tree(src_dir: impl AsRef<Path>, dst_dir: impl AsRef<Path>) -> Result<()> {
    let dst_dir = dst_dir.as_ref();
    if dst_dir.exists() {
        return Err(Error::CopyDestExists(dst_dir.to_owned()));
    }
    copy_contents_all(src_dir, dst_dir)
}

fn copy_contents_all(src_dir: impl AsRef<Path>, dst_dir: impl AsRef<Path>) -> Result<()> {
    self::mkdir_all(&dst_dir)?;
    for entry in self::read_dir(&src_dir)? {
        let entry = entry.map_err(|e| {
            Error::FromToIO(
                "Cannot access dir entry on `copy_contents_all()`",
                src_dir.as_ref().to_owned(),
                dst_dir.as_ref().to_owned(),
                e,
            )
        })?;
        let dst = dst_dir.as_ref().join(entry.file_name());
        let ty = entry.file_type().map_err(|e| {
            Error::SingleIO(
                "Cannot get filetype on `copy_contents_all()`",
                entry.path(),
                e,
            )
        })?;
        if ty.is_dir() {
            copy_contents_all(entry.path(), dst)?;
        } else {
            self::copy_file(entry.path(), dst)?;
        }
    }
    Ok(())
}

pub fn read_dir(dir: impl AsRef<Path>) -> Result<ReadDir> {
    fs::read_dir(&dir).map_err(|e| Error::SingleIO("Cannot read dir", dir.as_ref().to_owned(), e))
}

pub fn write_json_with_mkdir<P, T>(filepath: P, data: &T) -> Result<()>
where
    P: AsRef<Path>,
    T: Serialize,
{
    let s = serde_json::to_string_pretty(data)
        .map_err(|e| Error::SerializeToJson(filepath.as_ref().to_owned(), e))?;
    write_with_mkdir(filepath, &s)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn copy_tree_copies_nested_contents() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("src");
        write_with_mkdir(src.join("a.txt"), "aaa").unwrap();
        write_with_mkdir(src.join("sub/b.txt"), "bbb").unwrap();

        let dst = tmp.path().join("dst");
        copy_tree(&src, &dst).unwrap();

        assert_eq!(read_to_string(dst.join("a.txt")).unwrap(), "aaa");
        assert_eq!(read_to_string(dst.join("sub/b.txt")).unwrap(), "bbb");
    }

    #[test]
    fn copy_tree_refuses_existing_dest() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        mkdir_all(&src).unwrap();
        mkdir_all(&dst).unwrap();

        let err = copy_tree(&src, &dst).unwrap_err();
        assert!(matches!(err, Error::CopyDestExists(_)));
    }

    #[test]
    fn rename_missing_path_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let res = rename(tmp.path().join("nope"), tmp.path().join("parked"));
        assert!(matches!(res, Err(Error::FromToIO(..))));
    }
}
