//! End-to-end tests for render + build against a scripted latexmk

#![cfg(unix)]

use cvtex_core::build::{BuildOrchestrator, CompilerConfig};
use cvtex_core::template::TemplateRenderer;
use cvtex_core::{BuildErrorKind, CvtexError, DocumentData, Pipeline};
use cvtex_testkit::{FakeBehavior, FakeCompiler, temp_dir_in_workspace};
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

const MINIMAL: &str = "\\documentclass{article}\n\\begin{document}\nHello (( first_name | latex ))\n\\end{document}\n";

struct Fixture {
    temp: TempDir,
    templates: PathBuf,
    workdirs: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let temp = temp_dir_in_workspace();
        let templates = temp.path().join("templates");
        let workdirs = temp.path().join("work");
        fs::create_dir_all(&templates).unwrap();
        fs::create_dir_all(&workdirs).unwrap();
        fs::write(templates.join("main.tex.tmpl"), MINIMAL).unwrap();
        Self {
            temp,
            templates,
            workdirs,
        }
    }

    fn root(&self) -> &Path {
        self.temp.path()
    }

    fn pipeline(&self, behavior: FakeBehavior, timeout: Option<Duration>) -> Pipeline {
        let fake = FakeCompiler::install(&self.root().join("bin"), behavior);
        let compiler = CompilerConfig {
            program: fake.program(),
            args: fake.args(),
            timeout,
            ..CompilerConfig::default()
        };
        Pipeline::new(
            TemplateRenderer::new(&self.templates, self.root()),
            BuildOrchestrator::new(compiler).with_workdir_root(&self.workdirs),
        )
    }

    fn workdir_count(&self) -> usize {
        fs::read_dir(&self.workdirs).unwrap().count()
    }
}

fn data(value: serde_json::Value) -> DocumentData {
    DocumentData::from_value(value).unwrap()
}

#[test]
fn test_minimal_build_returns_pdf_bytes() {
    // Arrange
    let fixture = Fixture::new();
    let pipeline = fixture.pipeline(FakeBehavior::Succeed, Some(Duration::from_secs(30)));

    // Act
    let result = pipeline
        .render_and_build("main.tex.tmpl", &data(json!({"first_name": "Chief"})))
        .unwrap();

    // Assert
    assert!(result.compiled_bytes.starts_with(b"%PDF"));
    assert!(result.source_text.contains("Hello Chief"));
    assert!(result.workdir.join("main.tex").is_file());
    assert!(result.workdir.starts_with(&fixture.workdirs));
}

#[test]
fn test_special_characters_are_escaped_in_field_position() {
    let fixture = Fixture::new();
    fs::write(
        fixture.templates.join("field.tex.tmpl"),
        "BEGIN(( text | latex ))END\n",
    )
    .unwrap();
    let pipeline = fixture.pipeline(FakeBehavior::Succeed, None);

    let result = pipeline
        .render_and_build(
            "field.tex.tmpl",
            &data(json!({"text": "\\undefined & 50% $5 #1 a_b {x} ~ ^"})),
        )
        .unwrap();

    let start = result.source_text.find("BEGIN").unwrap() + "BEGIN".len();
    let end = result.source_text.find("END").unwrap();
    let field = &result.source_text[start..end];
    assert_eq!(
        field,
        r"\textbackslash{}undefined \& 50\% \$5 \#1 a\_b \{x\} \textasciitilde{} \textasciicircum{}"
    );
    assert!(result.compiled_bytes.starts_with(b"%PDF"));
}

#[test]
fn test_missing_template_writes_nothing() {
    let fixture = Fixture::new();
    let pipeline = fixture.pipeline(FakeBehavior::Succeed, None);

    let err = pipeline
        .render_and_build("nope.tex.tmpl", &DocumentData::new())
        .unwrap_err();

    assert!(err.is_render_error());
    assert!(err.workdir().is_none());
    assert_eq!(fixture.workdir_count(), 0);
}

#[test]
fn test_undefined_field_reports_workdir() {
    let fixture = Fixture::new();
    let pipeline = fixture.pipeline(FakeBehavior::Succeed, None);

    let err = pipeline
        .render_and_build("main.tex.tmpl", &DocumentData::new())
        .unwrap_err();

    assert!(matches!(err, CvtexError::Render { .. }));
    assert!(err.workdir().unwrap().is_dir());
}

#[test]
fn test_failed_build_keeps_log_and_workdir() {
    let fixture = Fixture::new();
    fs::write(
        fixture.templates.join("raw.tex.tmpl"),
        "BEGIN(( text | raw ))END\n",
    )
    .unwrap();
    let pipeline = fixture.pipeline(FakeBehavior::Succeed, None);

    let err = pipeline
        .render_and_build("raw.tex.tmpl", &data(json!({"text": "\\undefined"})))
        .unwrap_err();

    let log = err.build_log().unwrap();
    assert!(log.contains("Undefined control sequence"));
    assert!(log.contains("Latexmk: fake run"));
    match &err {
        CvtexError::Build(build) => {
            assert_eq!(build.kind, BuildErrorKind::Failed { exit_code: Some(12) })
        }
        other => panic!("Expected Build error, got {other:?}"),
    }
    let workdir = err.workdir().unwrap();
    assert!(workdir.join("main.tex").is_file());
    assert!(err.to_string().contains(&*workdir.to_string_lossy()));
}

#[test]
fn test_success_without_output_is_invariant_error() {
    let fixture = Fixture::new();
    let pipeline = fixture.pipeline(FakeBehavior::NoOutput, None);

    let err = pipeline
        .render_and_build("main.tex.tmpl", &data(json!({"first_name": "A"})))
        .unwrap_err();

    match err {
        CvtexError::MissingOutput { expected, workdir } => {
            assert_eq!(expected, workdir.join("main.pdf"));
            assert!(workdir.is_dir());
        }
        other => panic!("Expected MissingOutput, got {other:?}"),
    }
}

#[test]
fn test_concurrent_builds_use_distinct_workdirs() {
    let fixture = Fixture::new();
    let pipeline = fixture.pipeline(FakeBehavior::Succeed, Some(Duration::from_secs(30)));

    let (a, b) = std::thread::scope(|s| {
        let a = s.spawn(|| {
            pipeline.render_and_build("main.tex.tmpl", &data(json!({"first_name": "Ada"})))
        });
        let b = s.spawn(|| {
            pipeline.render_and_build("main.tex.tmpl", &data(json!({"first_name": "Bob"})))
        });
        (a.join().unwrap().unwrap(), b.join().unwrap().unwrap())
    });

    assert_ne!(a.workdir, b.workdir);
    assert!(String::from_utf8_lossy(&a.compiled_bytes).contains("Hello Ada"));
    assert!(String::from_utf8_lossy(&b.compiled_bytes).contains("Hello Bob"));
    assert_eq!(fixture.workdir_count(), 2);
}

#[test]
fn test_timeout_is_distinct_build_error() {
    let fixture = Fixture::new();
    let pipeline = fixture.pipeline(FakeBehavior::Hang, Some(Duration::from_millis(300)));

    let err = pipeline
        .render_and_build("main.tex.tmpl", &data(json!({"first_name": "A"})))
        .unwrap_err();

    match &err {
        CvtexError::Build(build) => assert!(matches!(build.kind, BuildErrorKind::TimedOut { .. })),
        other => panic!("Expected timeout, got {other:?}"),
    }
    assert!(err.to_string().contains("timed out after"));
    assert!(err.workdir().unwrap().is_dir());
}

#[test]
fn test_cancellation_stops_build_and_cleans_up() {
    let fixture = Fixture::new();
    let pipeline = fixture.pipeline(FakeBehavior::Hang, None);
    let token = CancellationToken::new();

    let canceller = {
        let token = token.clone();
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(200));
            token.cancel();
        })
    };
    let err = pipeline
        .render_and_build_cancellable("main.tex.tmpl", &data(json!({"first_name": "A"})), &token)
        .unwrap_err();
    canceller.join().unwrap();

    match &err {
        CvtexError::Build(build) => assert_eq!(build.kind, BuildErrorKind::Cancelled),
        other => panic!("Expected cancellation, got {other:?}"),
    }
    assert_eq!(fixture.workdir_count(), 0);
}

#[test]
fn test_prepare_writes_source_without_compiling() {
    let fixture = Fixture::new();
    let pipeline = fixture.pipeline(FakeBehavior::Fail, None);

    let prepared = pipeline
        .prepare("main.tex.tmpl", &data(json!({"first_name": "Chief"})))
        .unwrap();

    assert_eq!(prepared.source_path, prepared.workdir.join("main.tex"));
    assert_eq!(fs::read_to_string(&prepared.source_path).unwrap(), prepared.source_text);
    assert!(!prepared.workdir.join("main.pdf").exists());
}

#[test]
fn test_caller_data_is_not_mutated() {
    let fixture = Fixture::new();
    fs::write(fixture.root().join("photo_banner.png"), b"png").unwrap();
    let pipeline = fixture.pipeline(FakeBehavior::Succeed, None);
    let original = data(json!({"first_name": "Chief", "photo_banner_path": "photo_banner.png"}));
    let before = original.clone();

    let result = pipeline.render_and_build("main.tex.tmpl", &original).unwrap();

    assert_eq!(original, before);
    assert!(result.workdir.join("photo_banner.png").is_file());
}
