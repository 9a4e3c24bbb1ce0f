//! File inclusion: `#` path `!`.
//!
//! The path is itself eo source, evaluated to get the file name. The file's
//! content is evaluated under a copy of the includer's environment; a driver
//! that dispatches the include adopts the definitions the file made.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::data::Environment;
use crate::error::{Construct, Error, EvalResult};
use crate::reader::Cursor;

use super::{unterminated, Evaluator};

impl Evaluator {
    /// Read an include after its `#`; returns the file's output and the
    /// environment it finished with.
    pub(super) fn read_include(
        &self,
        cursor: &mut Cursor,
        env: &Environment,
    ) -> EvalResult<(Vec<u8>, Environment)> {
        let start = cursor.position() - 1;
        let (span, closed) = cursor.read_until('!');
        if !closed {
            return Err(unterminated(cursor, Construct::Include, start));
        }
        let path = self.evaluate(span, env)?;
        let path = PathBuf::from(String::from_utf8_lossy(&path).into_owned());

        let (resolved, content) = self.load(&path)?;
        tracing::debug!("including {}", resolved.display());
        let mut scope = env.clone();
        let output = self.run(&content, &mut scope)?;
        Ok((output, scope))
    }

    /// Read an include file: as given first, then from each include directory.
    ///
    /// Only a missing file moves on to the next candidate.
    fn load(&self, path: &Path) -> EvalResult<(PathBuf, String)> {
        let search = self
            .options
            .include_paths
            .iter()
            .filter(|_| path.is_relative())
            .map(|dir| dir.join(path));

        let mut first_error = None;
        for candidate in std::iter::once(path.to_path_buf()).chain(search) {
            match std::fs::read_to_string(&candidate) {
                Ok(content) => return Ok((candidate, content)),
                // A file that exists but can't be read is not skipped.
                Err(err) if err.kind() != ErrorKind::NotFound => {
                    return Err(Error::IncludeUnreadable {
                        path: candidate,
                        source: err,
                    })
                }
                Err(err) => {
                    tracing::trace!("could not read {}: {err}", candidate.display());
                    first_error.get_or_insert(err);
                }
            }
        }
        Err(Error::IncludeNotFound {
            path: path.to_path_buf(),
            source: first_error.unwrap_or_else(|| ErrorKind::NotFound.into()),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::eval::Options;

    /// An include directive for `path`.
    fn include(path: &Path) -> String {
        format!("#\"{}\"!", path.display())
    }

    #[test]
    fn include_file() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let lib = dir.path().join("lib.eo");
        fs::write(&lib, "\"from lib\" 0A")?;

        let output = crate::evaluate(&format!("\"<\" {} \">\"", include(&lib)))?;
        assert_eq!(output, b"<from lib\n>");
        Ok(())
    }

    #[test]
    fn include_is_transitive() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let inner = dir.path().join("inner.eo");
        let outer = dir.path().join("outer.eo");
        fs::write(&inner, "\"inner\"")?;
        fs::write(&outer, format!("\"outer \" {}", include(&inner)))?;

        let output = crate::evaluate(&include(&outer))?;
        assert_eq!(output, b"outer inner");
        Ok(())
    }

    #[test]
    fn included_definitions_reach_the_includer() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let lib = dir.path().join("lib.eo");
        fs::write(&lib, "@greet who { \"hello \" who }")?;

        let output = crate::evaluate(&format!("{} greet \"eo\"", include(&lib)))?;
        assert_eq!(output, b"hello eo");
        Ok(())
    }

    #[test]
    fn included_file_sees_caller_definitions() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let lib = dir.path().join("lib.eo");
        fs::write(&lib, "name")?;

        let output = crate::evaluate(&format!("@name {{ \"caller\" }} {}", include(&lib)))?;
        assert_eq!(output, b"caller");
        Ok(())
    }

    #[test]
    fn path_is_evaluated() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        fs::write(dir.path().join("lib.eo"), "\"found\"")?;

        let source = format!(
            "@dir {{ \"{}\" }} #dir \"/lib.eo\"!",
            dir.path().display()
        );
        assert_eq!(crate::evaluate(&source)?, b"found");
        Ok(())
    }

    #[test]
    fn relative_paths_use_include_dirs() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        fs::write(dir.path().join("eo_search_test.eo"), "\"searched\"")?;

        let evaluator = Evaluator::with_options(Options {
            include_paths: vec![dir.path().to_path_buf()],
            ..Options::default()
        });
        let output = evaluator.evaluate("#\"eo_search_test.eo\"!", &evaluator.environment())?;
        assert_eq!(output, b"searched");
        Ok(())
    }

    #[test]
    fn missing_file() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let missing = dir.path().join("missing.eo");

        match crate::evaluate(&include(&missing)) {
            Err(Error::IncludeNotFound { path, source }) => {
                assert_eq!(path, missing);
                assert_eq!(source.kind(), ErrorKind::NotFound);
            }
            v => panic!("unexpected result: {v:?}"),
        }
        Ok(())
    }

    #[test]
    fn missing_nested_file() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let outer = dir.path().join("outer.eo");
        let missing = dir.path().join("missing.eo");
        fs::write(&outer, include(&missing))?;

        match crate::evaluate(&include(&outer)) {
            Err(Error::IncludeNotFound { path, .. }) => assert_eq!(path, missing),
            v => panic!("unexpected result: {v:?}"),
        }
        Ok(())
    }

    #[test]
    fn undecodable_file_is_not_skipped() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let bin = dir.path().join("bin.eo");
        fs::write(&bin, b"\"\xFF")?;

        match crate::evaluate(&include(&bin)) {
            Err(Error::IncludeUnreadable { path, source }) => {
                assert_eq!(path, bin);
                assert_eq!(source.kind(), ErrorKind::InvalidData);
            }
            v => panic!("unexpected result: {v:?}"),
        }
        Ok(())
    }

    #[test]
    fn unterminated_include() {
        match crate::evaluate("\"x\" #\"lib.eo\"") {
            Err(Error::UnterminatedConstruct { construct, at }) => {
                assert_eq!(construct, Construct::Include);
                assert_eq!(at.column, 5);
            }
            v => panic!("unexpected result: {v:?}"),
        }
    }

    #[test]
    fn self_include_hits_recursion_limit() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let lib = dir.path().join("loop.eo");
        fs::write(&lib, include(&lib))?;

        let evaluator = Evaluator::with_options(Options {
            max_depth: 16,
            ..Options::default()
        });
        match evaluator.evaluate(&include(&lib), &evaluator.environment()) {
            Err(Error::RecursionLimit { limit }) => assert_eq!(limit, 16),
            v => panic!("unexpected result: {v:?}"),
        }
        Ok(())
    }
}
