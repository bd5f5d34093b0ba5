use std::path::{Path, PathBuf};
use std::sync::Arc;

use lexground_recon::engine::{run, run_span_scan, run_structured};
use lexground_recon::error::DocumentErrorKind;
use lexground_recon::index::load_terminology;
use lexground_recon::output::render_table;
use lexground_recon::{Grounder, RunConfig, TermIndex};

const HEADER: &str = "pubmed\tstart\tend\ttext\tcurie\tname\tscore\n";

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn grounder() -> Grounder {
    let entries = load_terminology(&fixtures_dir().join("vaccine_terms.tsv")).unwrap();
    Grounder::new(Arc::new(TermIndex::build(entries).unwrap()), 0.5)
}

/// Fixture config with output redirected to `out`.
fn config_into(out: &Path) -> RunConfig {
    let mut config = RunConfig::load(&fixtures_dir().join("run.toml")).unwrap();
    config.output_dir = out.to_path_buf();
    config
}

fn read(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap_or_else(|e| panic!("cannot read {}: {e}", path.display()))
}

// -------------------------------------------------------------------------
// Structured frames
// -------------------------------------------------------------------------

#[test]
fn structured_results_table() {
    let report = run_structured(
        &fixtures_dir().join("structured"),
        ".uaz.entities.json",
        "vaccine",
        &grounder(),
    )
    .unwrap();

    let expected = format!(
        "{HEADER}\
         1\t0\t3\tBCG\tvaccineontology:0000771\tBCG vaccine\t1.00\n\
         1\t20\t31\tflu vaccine\tvaccineontology:0000642\tinfluenza vaccine\t1.00\n\
         2\t0\t3\tBCG\tvaccineontology:0000771\tBCG vaccine\t1.00\n\
         123\t5\t20\tunknown antigen\t\t\t\n\
         123\t10\t26\tmeasles vaccine\tvaccineontology:0000031\tMeasles Vaccine\t1.00\n"
    );
    assert_eq!(render_table(&report.tables.results).unwrap(), expected);
}

#[test]
fn structured_ungrounded_subset() {
    let report = run_structured(
        &fixtures_dir().join("structured"),
        ".uaz.entities.json",
        "vaccine",
        &grounder(),
    )
    .unwrap();

    let ungrounded = report.tables.ungrounded.as_ref().unwrap();
    assert_eq!(
        render_table(ungrounded).unwrap(),
        format!("{HEADER}123\t5\t20\tunknown antigen\t\t\t\n")
    );
    for record in ungrounded {
        assert!(report.tables.results.contains(record));
    }
}

#[test]
fn malformed_document_is_skipped_and_reported() {
    let report = run_structured(
        &fixtures_dir().join("structured"),
        ".uaz.entities.json",
        "vaccine",
        &grounder(),
    )
    .unwrap();

    // 1, 2, 7, 10, 123; the events file does not carry the suffix.
    assert_eq!(report.summary.documents, 5);
    assert_eq!(report.summary.failed_documents, 1);
    assert_eq!(report.failures[0].document, "7");
    assert_eq!(report.failures[0].kind, DocumentErrorKind::Malformed);
    assert!(report.tables.results.iter().all(|r| r.document.as_str() != "7"));
}

#[test]
fn target_type_is_case_sensitive() {
    let report = run_structured(
        &fixtures_dir().join("structured"),
        ".uaz.entities.json",
        "Vaccine",
        &grounder(),
    )
    .unwrap();
    assert!(report.tables.results.is_empty());
    assert_eq!(report.summary.documents, 5);
}

// -------------------------------------------------------------------------
// Span scan
// -------------------------------------------------------------------------

#[test]
fn span_scan_results_table() {
    let report = run_span_scan(&fixtures_dir().join("papers"), &grounder()).unwrap();

    let expected = format!(
        "{HEADER}\
         1\t0\t3\tBCG\tvaccineontology:0000771\tBCG vaccine\t1.00\n\
         1\t8\t19\tflu vaccine\tvaccineontology:0000642\tinfluenza vaccine\t1.00\n\
         1\t42\t57\tMeasles vaccine\tvaccineontology:0000031\tMeasles Vaccine\t0.90\n\
         2\t18\t21\tBCG\tvaccineontology:0000771\tBCG vaccine\t1.00\n\
         123\t4\t19\tMEASLES-VACCINE\tvaccineontology:0000031\tMeasles Vaccine\t0.80\n"
    );
    assert_eq!(render_table(&report.tables.results).unwrap(), expected);
    assert!(report.tables.ungrounded.is_none());
    assert_eq!(report.summary.ungrounded, 0);
}

#[test]
fn span_scan_raises_threshold() {
    let entries = load_terminology(&fixtures_dir().join("vaccine_terms.tsv")).unwrap();
    let strict = Grounder::new(Arc::new(TermIndex::build(entries).unwrap()), 0.85);

    let report = run_span_scan(&fixtures_dir().join("papers"), &strict).unwrap();
    // The normalized-only match in 123 no longer clears the threshold.
    assert!(report.tables.results.iter().all(|r| r.document.as_str() != "123"));
    assert_eq!(report.tables.results.len(), 4);
}

// -------------------------------------------------------------------------
// Full run
// -------------------------------------------------------------------------

#[test]
fn full_run_writes_three_tables() {
    let out = tempfile::tempdir().unwrap();
    let config = config_into(&out.path().join("results"));

    let report = run(&config).unwrap();
    assert_eq!(report.written.len(), 3);
    assert_eq!(report.meta.terms, 6);
    assert_eq!(report.meta.concepts, 3);

    let results = read(&config.output_dir.join("structured_results.tsv"));
    let ungrounded = read(&config.output_dir.join("structured_ungrounded.tsv"));
    let scanned = read(&config.output_dir.join("span_scan_results.tsv"));

    assert!(results.starts_with(HEADER));
    assert_eq!(results.lines().count(), 6);
    assert_eq!(ungrounded.lines().count(), 2);
    assert_eq!(scanned.lines().count(), 6);

    let structured = report.structured.unwrap();
    assert_eq!(structured.summary.grounded, 4);
    assert_eq!(structured.summary.ungrounded, 1);
}

#[test]
fn repeated_runs_are_byte_identical() {
    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();
    run(&config_into(first.path())).unwrap();
    run(&config_into(second.path())).unwrap();

    for name in ["structured_results.tsv", "structured_ungrounded.tsv", "span_scan_results.tsv"] {
        assert_eq!(
            read(&first.path().join(name)),
            read(&second.path().join(name)),
            "{name} differs between runs"
        );
    }
}

#[test]
fn missing_input_dir_writes_nothing() {
    let out = tempfile::tempdir().unwrap();
    let mut config = config_into(out.path());
    config.inputs.papers_dir = Some(fixtures_dir().join("no-such-papers"));

    let err = run(&config).unwrap_err();
    assert_eq!(err.stage(), "input");
    assert!(!out.path().join("structured_results.tsv").exists());
}

#[test]
fn persisted_index_is_reused() {
    let out = tempfile::tempdir().unwrap();
    let mut config = config_into(out.path());
    config.index_path = Some(out.path().join("kb").join("vaccines.tsv"));

    run(&config).unwrap();
    let persisted = read(config.index_path.as_ref().unwrap());
    assert!(persisted.starts_with("Measles Vaccine\tvaccineontology:0000031\nmeasles vaccine\t"));
    assert!(persisted.ends_with("BCG vaccine\tvaccineontology:0000771\nBCG\tvaccineontology:0000771\n"));

    // A second run reads the persisted copy even if the source disappears.
    config.terminology = out.path().join("gone.tsv");
    let report = run(&config).unwrap();
    assert_eq!(report.meta.terms, 6);
}

#[test]
fn reloaded_index_scores_like_the_built_one() {
    let root = tempfile::tempdir().unwrap();
    let write = |rel: &str, contents: &str| {
        let path = root.path().join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    };
    // A synonym-only concept and a concept with two names: neither survives
    // the persisted form's name/synonym split unchanged.
    write(
        "terms.tsv",
        "label\tnamespace\tidentifier\tstatus\n\
         Rotarix\tvo\t1\tsynonym\n\
         Measles Vaccine\tvo\t2\tname\n\
         measles vaccine\tvo\t2\tname\n",
    );
    write("papers/1.txt", "Rotarix and measles vaccine were given.");
    write(
        "structured/1.uaz.entities.json",
        r#"{"frames": [
            {"type": "vaccine", "text": "Rotarix", "start-pos": {"offset": 0}, "end-pos": {"offset": 7}},
            {"type": "vaccine", "text": "measles vaccine", "start-pos": {"offset": 12}, "end-pos": {"offset": 27}}
        ]}"#,
    );

    let mut config = RunConfig::from_toml(
        "terminology = \"terms.tsv\"\n\
         index_path = \"kb/vaccines.tsv\"\n\
         output_dir = \"built\"\n\
         [inputs]\n\
         structured_dir = \"structured\"\n\
         papers_dir = \"papers\"\n",
    )
    .unwrap();
    config.resolve_paths(root.path());
    let built_dir = config.output_dir.clone();

    run(&config).unwrap();
    assert!(config.index_path.as_ref().unwrap().exists());

    config.output_dir = root.path().join("reloaded");
    run(&config).unwrap();

    let expected = format!(
        "{HEADER}\
         1\t0\t7\tRotarix\tvo:1\tRotarix\t1.00\n\
         1\t12\t27\tmeasles vaccine\tvo:2\tMeasles Vaccine\t1.00\n"
    );
    for name in ["structured_results.tsv", "span_scan_results.tsv"] {
        let built = read(&built_dir.join(name));
        assert_eq!(built, expected, "{name}");
        assert_eq!(read(&config.output_dir.join(name)), built, "{name} differs after reload");
    }
}
