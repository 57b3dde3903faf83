// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

use super::{
    run_input, seed_environment, CliConfig, Define, Environment, IncludeSettings,
    MemoryOutputSink, PpErrorKind, PpRunReport, Preprocessor, Severity, Value,
};
use crate::core::preprocessor::output::{render_program, OutputSettings};
use proptest::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::time::{SystemTime, UNIX_EPOCH};

fn preprocess(text: &str) -> PpRunReport {
    let mut pp = Preprocessor::new(Environment::with_constants(), IncludeSettings::default());
    pp.process_source("main.gp", None, text);
    pp.finish("main.gp")
}

fn body(report: &PpRunReport, name: &str) -> Vec<String> {
    report
        .program(name)
        .expect("program exists")
        .lines()
        .iter()
        .filter_map(|record| record.text().map(ToString::to_string))
        .collect()
}

fn messages(report: &PpRunReport) -> Vec<String> {
    report
        .diagnostics()
        .iter()
        .map(|diag| diag.message().to_string())
        .collect()
}

fn create_temp_dir(label: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("target")
        .join(format!("test-{label}-{}-{nanos}", process::id()));
    fs::create_dir_all(&dir).expect("Create temp dir");
    dir
}

fn write_file(path: &Path, contents: &str) {
    fs::write(path, contents).expect("Write test file");
}

#[test]
fn program_substitutes_macro_tokens_with_audit_comment() {
    let report = preprocess(
        "@define PART = 1000\n@define XPOS = 5\n@program PART\nG0 X@XPOS\n@endprogram\n",
    );
    assert_eq!(report.error_count(), 0, "{:?}", messages(&report));
    let program = report.program("PART").expect("program");
    assert_eq!(program.number(), 1000);
    assert!(program.is_done());
    assert_eq!(program.lines()[0].text(), Some("G0 X5"));
    assert_eq!(program.lines()[0].comment(), Some("5=XPOS"));
    assert_eq!(
        render_program(program, &OutputSettings::default()),
        "%\r\nO1000 (PART) ;\r\nG0 X5 ;\r\n%"
    );
}

#[test]
fn undefined_token_is_reported_and_left_verbatim() {
    let report =
        preprocess("@define P = 1\n@define XPOS = 5\n@program P\nG0 X@XPOS Y@NOPE\n@endprogram\n");
    assert_eq!(report.error_count(), 1);
    let diag = &report.diagnostics()[0];
    assert_eq!(diag.message(), "NOPE undefined");
    assert_eq!(diag.kind(), PpErrorKind::Macro);
    assert_eq!(diag.line(), 4);
    assert_eq!(body(&report, "P"), vec!["G0 X5 Y@NOPE"]);
}

#[test]
fn quoted_tokens_evaluate_full_expressions() {
    let report = preprocess(
        "@define P = 1\n@define FEED = 200\n@program P\nG1 F@\"FEED * 1.5\" ;fast\n@endprogram\n",
    );
    assert_eq!(report.error_count(), 0, "{:?}", messages(&report));
    let record = &report.program("P").expect("program").lines()[0];
    assert_eq!(record.text(), Some("G1 F300 ;fast"));
    assert_eq!(record.comment(), Some("300=FEED * 1.5"));
}

#[test]
fn environment_is_restored_after_program() {
    let report = preprocess(
        "@define P = 1\n@program P\n@define INNER = 7\nN@LOOP G0 X@INNER\n@endprogram\n@print INNER\n@print LOOP\n",
    );
    assert_eq!(report.error_count(), 0, "{:?}", messages(&report));
    assert_eq!(body(&report, "P"), vec!["N0 G0 X7"]);
    assert_eq!(report.prints().len(), 2);
    assert_eq!(report.prints()[0].value, None);
    assert_eq!(report.prints()[1].value, None);
}

#[test]
fn conditionals_select_branches() {
    let report = preprocess(
        "@define P = 1
@define MODE = 2
@program P
@if MODE == 1
G0 X1
@else
G0 X2
@endif
@if undefinedSymbol
G0 X3
@endif
@if 0
@if 1
G0 X4
@else
G0 X5
@endif
@endif
@endprogram
",
    );
    assert_eq!(report.error_count(), 0, "{:?}", messages(&report));
    assert_eq!(body(&report, "P"), vec!["G0 X2"]);
}

#[test]
fn stray_else_and_endif_are_errors() {
    let report = preprocess("@else\n@endif\n");
    assert_eq!(
        messages(&report),
        vec!["@else without @if", "@endif without @if"]
    );
    assert!(report
        .diagnostics()
        .iter()
        .all(|diag| diag.kind() == PpErrorKind::Conditional));
}

#[test]
fn unterminated_if_is_reported_at_its_opening_line() {
    let report = preprocess("@define P = 1\n@if P\n@print P\n");
    assert_eq!(messages(&report), vec!["unterminated @if"]);
    assert_eq!(report.diagnostics()[0].line(), 2);
    assert_eq!(report.prints()[0].value.as_deref(), Some("1"));
}

#[test]
fn unterminated_if_points_at_its_else() {
    let report = preprocess("@if 0
G0
@else
");
    assert_eq!(messages(&report), vec!["unterminated @if"]);
    let related = report.diagnostics()[0].related().expect("related origin");
    assert_eq!(related.origin.line, 3);
    assert_eq!(related.label, "@else branch");
}

#[test]
fn switch_compiles_to_jump_table_at_switch_position() {
    let report = preprocess(
        "@define P = 1
@program P
@switch TOOL
@case 1
T1
@endcase
@case 2
T2
@endcase
@defaultcase
T0
@endswitch
@endprogram
",
    );
    assert_eq!(report.error_count(), 0, "{:?}", messages(&report));
    assert_eq!(
        body(&report, "P"),
        vec![
            "IF[TOOL EQ 1] GOTO0",
            "IF[TOOL EQ 2] GOTO3",
            "GOTO6",
            "N0",
            "T1",
            "GOTO8",
            "N3",
            "T2",
            "GOTO8",
            "N6",
            "T0",
            "N8",
        ]
    );
}

#[test]
fn switch_without_default_falls_through_to_end() {
    let report = preprocess("@define P = 1\n@program P\n@switch S\n@case 4\nT4\n@endswitch\n@endprogram\n");
    assert_eq!(report.error_count(), 0, "{:?}", messages(&report));
    assert_eq!(
        body(&report, "P"),
        vec!["IF[S EQ 4] GOTO0", "GOTO2", "N0", "T4", "N2"]
    );
}

#[test]
fn nested_switch_labels_use_their_depth() {
    let report = preprocess(
        "@define P = 1
@program P
@switch OUTER
@case 1
@switch INNER
@case 7
T7
@endswitch
@endcase
@endswitch
@endprogram
",
    );
    assert_eq!(report.error_count(), 0, "{:?}", messages(&report));
    assert_eq!(
        body(&report, "P"),
        vec![
            "IF[OUTER EQ 1] GOTO0",
            "GOTO5",
            "N0",
            "IF[INNER EQ 7] GOTO1",
            "GOTO3",
            "N1",
            "T7",
            "N3",
            "GOTO5",
            "N5",
        ]
    );
}

#[test]
fn sequential_switches_warn_about_reused_labels() {
    let report = preprocess(
        "@define P = 1
@program P
@switch A1
@case 1
@endswitch
@switch B1
@case 1
@endswitch
@endprogram
",
    );
    assert_eq!(report.error_count(), 0);
    assert_eq!(
        messages(&report),
        vec![
            "duplicate switch label: __1_1",
            "duplicate switch label: __1_endswitch",
        ]
    );
}

#[test]
fn second_defaultcase_points_at_the_first() {
    let report = preprocess(
        "@define P = 1\n@program P\n@switch S\n@defaultcase\n@defaultcase\n@endswitch\n@endprogram\n",
    );
    assert_eq!(messages(&report), vec!["switch already has @defaultcase"]);
    let related = report.diagnostics()[0].related().expect("related origin");
    assert_eq!(related.origin.line, 4);
    assert_eq!(related.label, "first @defaultcase");
}

#[test]
fn case_outside_switch_and_unterminated_switch_are_errors() {
    let report = preprocess("@define P = 1\n@program P\n@case 1\n@switch S\n@case 2\n@endprogram\n");
    assert_eq!(
        messages(&report),
        vec!["@case outside switch", "unterminated @switch"]
    );
    assert_eq!(report.diagnostics()[1].line(), 4);
    assert!(report.program("P").expect("program").is_done());
}

#[test]
fn undefined_program_name_creates_no_program() {
    let report = preprocess("@program NOPE\nG0 X1\n@endprogram\n");
    assert_eq!(messages(&report), vec!["NOPE not defined"]);
    assert!(report.programs().is_empty());
}

#[test]
fn rejected_program_bindings_do_not_survive_endprogram() {
    let report = preprocess(
        "@define KEEP = 1\n@program NOPE\n@define LEAK = 9\n@eval KEEP = 5\n@endprogram\n@print LEAK\n@print KEEP\n",
    );
    assert_eq!(messages(&report), vec!["NOPE not defined"]);
    assert_eq!(report.prints()[0].value, None);
    assert_eq!(report.prints()[1].value.as_deref(), Some("1"));
}

#[test]
fn rejected_program_left_open_in_an_include_is_restored() {
    let dir = create_temp_dir("include-rejected");
    write_file(&dir.join("part.gp"), "@program NOPE\n@define LEAK = 9\n");
    write_file(&dir.join("main.gp"), "@include part.gp\n@print LEAK\n");
    let mut pp = Preprocessor::new(Environment::with_constants(), IncludeSettings::default());
    pp.process_file(&dir.join("main.gp"));
    let report = pp.finish("main.gp");
    assert_eq!(messages(&report), vec!["NOPE not defined"]);
    assert_eq!(report.prints()[0].value, None);
}

#[test]
fn program_number_must_be_a_positive_integer() {
    let report = preprocess(
        "@define ZERO = 0\n@define NAME = \"x\"\n@program ZERO\n@endprogram\n@program NAME\n@endprogram\n",
    );
    assert_eq!(
        messages(&report),
        vec!["ZERO must be a positive integer", "NAME must be integer"]
    );
    assert!(report.programs().is_empty());
}

#[test]
fn nested_program_is_rejected_with_enclosing_origin() {
    let report = preprocess(
        "@define P = 1\n@define Q = 2\n@program P\n@program Q\nG0\n@endprogram\n",
    );
    assert_eq!(messages(&report), vec!["programs cannot be nested"]);
    let related = report.diagnostics()[0].related().expect("related origin");
    assert_eq!(related.origin.line, 3);
    assert_eq!(body(&report, "P"), vec!["G0"]);
    assert!(report.program("Q").is_none());
}

#[test]
fn redefining_a_program_warns_and_replaces_it() {
    let report = preprocess(
        "@define P = 1\n@program P\nG0 X1\n@endprogram\n@program P\nG0 X2\n@endprogram\n",
    );
    assert_eq!(report.error_count(), 0);
    assert_eq!(messages(&report), vec!["overwriting program: P"]);
    assert_eq!(report.programs().len(), 1);
    assert_eq!(body(&report, "P"), vec!["G0 X2"]);
}

#[test]
fn program_lines_outside_program_are_errors() {
    let report = preprocess("G0 X1\n@endprogram\n@endcase\n");
    assert_eq!(
        messages(&report),
        vec![
            "program line outside of program",
            "@endprogram outside of program"
        ]
    );
}

#[test]
fn error_directive_aborts_the_run() {
    let report = preprocess("@error stop here\n@print 1\n");
    assert!(report.aborted());
    assert_eq!(messages(&report), vec!["@error: stop here"]);
    assert_eq!(report.diagnostics()[0].kind(), PpErrorKind::Fatal);
    assert!(report.prints().is_empty());
    assert_eq!(report.lines_processed(), 1);
}

#[test]
fn delay_emits_dwell_with_expression_comment() {
    let report = preprocess(
        "@define P = 1\n@define DWELL = 250\n@program P\n@delay DWELL * 2\n@delay NOPE\n@endprogram\n",
    );
    assert_eq!(messages(&report), vec!["@delay failed: NOPE"]);
    let program = report.program("P").expect("program");
    assert_eq!(program.lines().len(), 1);
    assert_eq!(program.lines()[0].text(), Some("G04 P500 ;"));
    assert_eq!(program.lines()[0].comment(), Some("DWELL * 2"));
    assert_eq!(
        render_program(program, &OutputSettings::default()),
        "%\r\nO1 (P) ;\r\nG04 P500 ;\r\n%"
    );
}

#[test]
fn print_records_value_or_undefined() {
    let report = preprocess("@define TOOL = 4\n@print TOOL * 2\n@print MISSING\n");
    assert_eq!(report.prints()[0].format(), "main.gp:2 print: TOOL * 2 = 8");
    assert_eq!(
        report.prints()[1].format(),
        "main.gp:3 print: MISSING = undefined"
    );
    assert_eq!(report.error_count(), 0);
}

#[test]
fn headers_collect_global_and_program_lines() {
    let report = preprocess(
        "@header
Global @\"1+1\"
@endheader
@define P = 1
@program P
@header
Local
@endheader
G0
@endprogram
@endheader
",
    );
    assert_eq!(report.error_count(), 0);
    assert_eq!(messages(&report), vec!["not in header"]);
    assert_eq!(report.diagnostics()[0].severity(), Severity::Warning);
    let program = report.program("P").expect("program");
    assert_eq!(program.header(), ["Global 2".to_string(), "Local".to_string()]);
    assert_eq!(
        render_program(program, &OutputSettings::default()),
        "%\r\nO1 (P) ;\r\n(Global 2) ;\r\n(Local) ;\r\nG0 ;\r\n%"
    );
}

#[test]
fn verbose_output_annotates_origins_and_keeps_comments() {
    let report = preprocess("@define P = 1\n@define XPOS = 5\n@program P\n// rough pass\nG0 X@XPOS\n@endprogram\n");
    let settings = OutputSettings {
        verbose: true,
        ..OutputSettings::default()
    };
    let program = report.program("P").expect("program");
    assert_eq!(
        render_program(program, &settings),
        "%\r\nO1 (P) ;\r\n(main.gp:4 rough pass) ;\r\nG0 X5 (main.gp:5 5=XPOS) ;\r\n%"
    );
    assert_eq!(
        render_program(program, &OutputSettings::default()),
        "%\r\nO1 (P) ;\r\nG0 X5 ;\r\n%"
    );
}

#[test]
fn includes_share_the_environment() {
    let dir = create_temp_dir("include-shared");
    write_file(&dir.join("lib.gp"), "@define FEED = 300\n");
    write_file(
        &dir.join("main.gp"),
        "@include \"lib.gp\"\n@define P = 1\n@program P\nG1 F@FEED\n@endprogram\n",
    );
    let mut pp = Preprocessor::new(Environment::with_constants(), IncludeSettings::default());
    pp.process_file(&dir.join("main.gp"));
    let report = pp.finish("main.gp");
    assert_eq!(report.error_count(), 0, "{:?}", messages(&report));
    assert_eq!(body(&report, "P"), vec!["G1 F300"]);
}

#[test]
fn include_search_uses_include_roots() {
    let dir = create_temp_dir("include-roots");
    let lib = dir.join("lib");
    fs::create_dir_all(&lib).expect("Create lib dir");
    write_file(&lib.join("tools.gp"), "@define TOOL = 9\n");
    write_file(&dir.join("main.gp"), "@include <tools.gp>\n@print TOOL\n");
    let include = IncludeSettings {
        paths: vec![lib],
        ..IncludeSettings::default()
    };
    let mut pp = Preprocessor::new(Environment::with_constants(), include);
    pp.process_file(&dir.join("main.gp"));
    let report = pp.finish("main.gp");
    assert_eq!(report.error_count(), 0, "{:?}", messages(&report));
    assert_eq!(report.prints()[0].value.as_deref(), Some("9"));
}

#[test]
fn recursive_include_stops_at_depth_limit() {
    let dir = create_temp_dir("include-depth");
    write_file(&dir.join("loop.gp"), "@include loop.gp\n");
    let include = IncludeSettings {
        paths: Vec::new(),
        max_depth: 3,
    };
    let mut pp = Preprocessor::new(Environment::with_constants(), include);
    pp.process_file(&dir.join("loop.gp"));
    let report = pp.finish("loop.gp");
    assert_eq!(report.error_count(), 1);
    let diag = &report.diagnostics()[0];
    assert_eq!(diag.message(), "include depth exceeded: loop.gp");
    assert_eq!(diag.kind(), PpErrorKind::Include);
    assert_eq!(diag.notes(), ["maximum include depth is 3".to_string()]);
}

#[test]
fn missing_include_is_a_read_error() {
    let report = preprocess("@include missing-file.gp\n");
    assert_eq!(report.error_count(), 1);
    assert!(report.diagnostics()[0]
        .message()
        .starts_with("file read: missing-file.gp"));
    assert_eq!(report.diagnostics()[0].line(), 1);
}

#[test]
fn blocks_left_open_in_an_include_are_closed_at_its_end() {
    let dir = create_temp_dir("include-unterminated");
    write_file(&dir.join("part.gp"), "@program P\nG0\n@if 1\n");
    write_file(
        &dir.join("main.gp"),
        "@define P = 1\n@include part.gp\n@define AFTER = 1\n@print AFTER\n",
    );
    let mut pp = Preprocessor::new(Environment::with_constants(), IncludeSettings::default());
    pp.process_file(&dir.join("main.gp"));
    let report = pp.finish("main.gp");
    assert_eq!(
        messages(&report),
        vec!["unterminated @if", "unterminated @program: P"]
    );
    assert!(report.programs().is_empty());
    assert_eq!(report.prints()[0].value.as_deref(), Some("1"));
}

#[test]
fn program_may_span_an_include() {
    let dir = create_temp_dir("include-span");
    write_file(&dir.join("body.gp"), "@define STEP = 2\nG0 X@STEP\n");
    write_file(
        &dir.join("main.gp"),
        "@define P = 1\n@program P\nG0 X1\n@include body.gp\nG0 X3\n@endprogram\n@print STEP\n",
    );
    let mut pp = Preprocessor::new(Environment::with_constants(), IncludeSettings::default());
    pp.process_file(&dir.join("main.gp"));
    let report = pp.finish("main.gp");
    assert_eq!(report.error_count(), 0, "{:?}", messages(&report));
    assert_eq!(body(&report, "P"), vec!["G0 X1", "G0 X2", "G0 X3"]);
    let program = report.program("P").expect("program");
    assert!(program.lines()[1].origin.file.ends_with("body.gp"));
    assert_eq!(program.lines()[1].origin.line, 2);
    assert_eq!(report.prints()[0].value, None);
}

#[test]
fn seed_environment_binds_configuration_and_defines() {
    let config = CliConfig {
        controller: Some("fanuc".to_string()),
        defines: vec![
            Define {
                name: "TOOL".to_string(),
                expr: Some("4".to_string()),
            },
            Define {
                name: "FLOOD".to_string(),
                expr: None,
            },
            Define {
                name: "NOTE".to_string(),
                expr: Some("rough cut".to_string()),
            },
        ],
        ..CliConfig::default()
    };
    let env = seed_environment(&config);
    assert_eq!(env.get("X"), Some(&Value::Int(24)));
    assert_eq!(env.get("control"), Some(&Value::Str("fanuc".to_string())));
    assert!(!env.contains("model"));
    assert_eq!(env.get("leader"), Some(&Value::Str("%".to_string())));
    assert_eq!(env.get("fileExtension"), Some(&Value::Str("nc".to_string())));
    assert_eq!(env.get("progNumFileName"), Some(&Value::Bool(true)));
    assert_eq!(env.get("verbose"), Some(&Value::Bool(false)));
    assert_eq!(env.get("TOOL"), Some(&Value::Int(4)));
    assert_eq!(env.get("FLOOD"), Some(&Value::Int(1)));
    assert_eq!(env.get("NOTE"), Some(&Value::Str("rough cut".to_string())));
}

fn config_for(output_dir: &str) -> CliConfig {
    CliConfig {
        output: OutputSettings {
            output_dir: PathBuf::from(output_dir),
            ..OutputSettings::default()
        },
        ..CliConfig::default()
    }
}

#[test]
fn run_input_writes_completed_programs() {
    let dir = create_temp_dir("run-writes");
    let input = dir.join("main.gp");
    write_file(
        &input,
        "@define FACE = 10\n@define BORE = 20\n@program FACE\nG0 X1\n@endprogram\n@program BORE\nG0 X2\n@endprogram\n",
    );
    let mut sink = MemoryOutputSink::new();
    let report = run_input(&input, &config_for("out"), &mut sink).expect("run");
    assert!(report.succeeded());
    assert_eq!(
        report.written(),
        [PathBuf::from("out/10.nc"), PathBuf::from("out/20.nc")]
    );
    assert_eq!(sink.dirs(), [PathBuf::from("out")]);
    assert_eq!(
        sink.file_text(Path::new("out/20.nc")).as_deref(),
        Some("%\r\nO20 (BORE) ;\r\nG0 X2 ;\r\n%")
    );
}

#[test]
fn run_input_names_files_by_program_name() {
    let dir = create_temp_dir("run-names");
    let input = dir.join("main.gp");
    write_file(&input, "@define FACE = 10\n@program FACE\nG0\n@endprogram\n");
    let mut config = config_for("out");
    config.output.name_by_number = false;
    config.output.extension = "tap".to_string();
    let mut sink = MemoryOutputSink::new();
    let report = run_input(&input, &config, &mut sink).expect("run");
    assert_eq!(report.written(), [PathBuf::from("out/FACE.tap")]);
}

#[test]
fn run_input_writes_nothing_when_errors_are_reported() {
    let dir = create_temp_dir("run-errors");
    let input = dir.join("main.gp");
    write_file(
        &input,
        "@define FACE = 10\n@program FACE\nG0 X@NOPE\n@endprogram\n",
    );
    let mut sink = MemoryOutputSink::new();
    let report = run_input(&input, &config_for("out"), &mut sink).expect("run");
    assert!(!report.succeeded());
    assert!(report.written().is_empty());
    assert!(sink.files().is_empty());
}

#[test]
fn run_input_writes_nothing_when_warnings_are_errors() {
    let dir = create_temp_dir("run-werror");
    let input = dir.join("main.gp");
    write_file(
        &input,
        "@define P = 1\n@program P\n@endprogram\n@program P\n@endprogram\n",
    );
    let mut config = config_for("out");
    config.warning_policy.treat_warnings_as_errors = true;
    let mut sink = MemoryOutputSink::new();
    let report = run_input(&input, &config, &mut sink).expect("run");
    assert_eq!(report.warning_count(), 1);
    assert!(sink.files().is_empty());
}

#[test]
fn run_input_reports_missing_input() {
    let dir = create_temp_dir("run-missing");
    let input = dir.join("absent.gp");
    let mut sink = MemoryOutputSink::new();
    let report = run_input(&input, &config_for("out"), &mut sink).expect("run");
    assert_eq!(report.error_count(), 1);
    assert_eq!(report.diagnostics()[0].kind(), PpErrorKind::Io);
    assert_eq!(report.diagnostics()[0].line(), 0);
}

#[test]
fn plain_text_round_trips_through_a_program() {
    let source = "@define P = 1\n@program P\nG21\nG90 G54\n\n  M3 S1200  \nG0 X0 Y0\n@endprogram\n";
    let report = preprocess(source);
    assert_eq!(report.error_count(), 0);
    assert_eq!(
        render_program(report.program("P").expect("program"), &OutputSettings::default()),
        "%\r\nO1 (P) ;\r\nG21 ;\r\nG90 G54 ;\r\nM3 S1200 ;\r\nG0 X0 Y0 ;\r\n%"
    );
}

proptest! {
    #[test]
    fn program_number_follows_its_binding(number in 1i64..1_000_000) {
        let source = format!("@define JOB = {number}\n@program JOB\nG0\n@endprogram\n");
        let report = preprocess(&source);
        prop_assert_eq!(report.error_count(), 0);
        let program = report.program("JOB").expect("program");
        prop_assert_eq!(program.number(), number);
        let path = OutputSettings::default().file_path(program);
        prop_assert_eq!(path, PathBuf::from(format!("{number}.nc")));
    }

    #[test]
    fn directive_free_lines_pass_through_unchanged(
        lines in prop::collection::vec("[A-Z][A-Z0-9.]{0,6}( [A-Z0-9.]{1,6}){0,3}", 1..12)
    ) {
        let source = format!("@define P = 1\n@program P\n{}\n@endprogram\n", lines.join("\n"));
        let report = preprocess(&source);
        prop_assert_eq!(report.error_count(), 0);
        prop_assert_eq!(body(&report, "P"), lines);
    }
}
