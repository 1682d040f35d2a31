//! Helpers shared by the integration tests.

#![allow(dead_code)]

use pagebreak::engine::{Engine, EngineOptions};
use pagebreak::pipeline::{Pipeline, RunOptions, SetupError};
use pagebreak::summary::RunSummary;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

#[path = "../../src/test_helpers.rs"]
mod helpers;

pub use helpers::{read_file, snapshot, template_body, write_file};

/// A scratch website: a source directory and a separate output directory.
pub struct Site {
    tmp: TempDir,
}

impl Site {
    pub fn new() -> Self {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("source")).unwrap();
        Self { tmp }
    }

    /// A site pre-populated with `fixtures/site/`.
    pub fn from_fixtures() -> Self {
        let site = Self::new();
        helpers::copy_fixtures(&site.source());
        site
    }

    pub fn root(&self) -> &Path {
        self.tmp.path()
    }

    pub fn source(&self) -> PathBuf {
        self.tmp.path().join("source")
    }

    pub fn output(&self) -> PathBuf {
        self.tmp.path().join("output")
    }

    pub fn write(&self, relative: &str, content: &str) {
        write_file(&self.source(), relative, content);
    }

    pub fn write_body(&self, relative: &str, body: &str) {
        self.write(relative, &template_body(body));
    }

    /// Paginate the source into the output directory.
    pub fn run(&self) -> RunSummary {
        self.run_with(EngineOptions::default(), &self.output())
            .unwrap()
    }

    /// Paginate the source directory in place.
    pub fn run_in_place(&self) -> RunSummary {
        self.run_with(EngineOptions::default(), &self.source())
            .unwrap()
    }

    pub fn run_with(&self, options: EngineOptions, output: &Path) -> Result<RunSummary, SetupError> {
        let engine = Engine::new(options);
        Pipeline::new(RunOptions {
            source: self.source(),
            output: output.to_path_buf(),
        })
        .run(&engine)
    }

    pub fn read_output(&self, relative: &str) -> String {
        read_file(&self.output(), relative)
    }

    pub fn read_source(&self, relative: &str) -> String {
        read_file(&self.source(), relative)
    }

    pub fn output_exists(&self, relative: &str) -> bool {
        self.output().join(relative).is_file()
    }
}
