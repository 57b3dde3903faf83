// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Program file generation.

use std::io::Write;
use std::path::{Path, PathBuf};

use super::program::{LineRecord, Program};

/// Line terminator of generated program files.
pub const EOL: &str = "\r\n";

/// How generated programs are named and rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputSettings {
    pub output_dir: PathBuf,
    pub leader: String,
    pub trailer: String,
    pub extension: String,
    /// Name files by program number; otherwise by program name.
    pub name_by_number: bool,
    /// Annotate lines with their origin and keep comment-only records.
    pub verbose: bool,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::new(),
            leader: "%".to_string(),
            trailer: "%".to_string(),
            extension: "nc".to_string(),
            name_by_number: true,
            verbose: false,
        }
    }
}

impl OutputSettings {
    /// Path of the file a program is written to.
    pub fn file_path(&self, program: &Program) -> PathBuf {
        let stem = if self.name_by_number {
            program.number().to_string()
        } else {
            program.name().to_string()
        };
        self.output_dir.join(format!("{stem}.{}", self.extension))
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

/// Remove an inline `;` remainder and trailing blanks.
fn strip_inline_comment(text: &str) -> &str {
    let body = match text.find(';') {
        Some(idx) => &text[..idx],
        None => text,
    };
    body.trim_end()
}

fn annotation(record: &LineRecord) -> String {
    match record.comment().filter(|c| !c.is_empty()) {
        Some(comment) => format!("({} {comment}) ;", record.origin),
        None => format!("({}) ;", record.origin),
    }
}

/// Rendered body line for a record, or `None` when the record is dropped.
pub fn render_record(record: &LineRecord, verbose: bool) -> Option<String> {
    let text = record.text().map(strip_inline_comment).unwrap_or("");
    if text.is_empty() {
        let has_comment = record.comment().is_some_and(|c| !c.is_empty());
        return (verbose && has_comment).then(|| annotation(record));
    }
    if verbose {
        Some(format!("{text} {}", annotation(record)))
    } else {
        Some(format!("{text} ;"))
    }
}

/// Writer for program file output.
pub struct ProgramWriter<'a, W: Write> {
    out: W,
    settings: &'a OutputSettings,
}

impl<'a, W: Write> ProgramWriter<'a, W> {
    pub fn new(out: W, settings: &'a OutputSettings) -> Self {
        Self { out, settings }
    }

    pub fn write_program(&mut self, program: &Program) -> std::io::Result<()> {
        let mut lines = Vec::with_capacity(program.lines().len() + program.header().len() + 3);
        lines.push(self.settings.leader.clone());
        lines.push(format!("O{} ({}) ;", program.number(), program.name()));
        lines.extend(program.header().iter().map(|h| format!("({h}) ;")));
        lines.extend(
            program
                .lines()
                .iter()
                .filter_map(|record| render_record(record, self.settings.verbose)),
        );
        lines.push(self.settings.trailer.clone());
        self.out.write_all(lines.join(EOL).as_bytes())?;
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Render a program to a string.
pub fn render_program(program: &Program, settings: &OutputSettings) -> String {
    let mut writer = ProgramWriter::new(Vec::new(), settings);
    // Writing into a Vec cannot fail.
    let _ = writer.write_program(program);
    String::from_utf8_lossy(&writer.into_inner()).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::env::Environment;
    use crate::core::source_map::SourceOrigin;

    fn at(line: u32) -> SourceOrigin {
        SourceOrigin::new("o.gp", line)
    }

    fn sample() -> Program {
        let mut prog = Program::new(
            "FACE",
            1000,
            at(1),
            vec!["FACE MILL".into()],
            Environment::new().snapshot(),
        );
        prog.push_line(at(2), Some("G0 X5".into()), Some("5=X".into()));
        prog.push_line(at(3), None, Some(" roughing".into()));
        prog.push_line(at(4), Some("G04 P2 ;".into()), Some("2".into()));
        prog.push_line(at(5), Some(String::new()), None);
        prog
    }

    #[test]
    fn renders_banner_header_body_and_markers() {
        let text = render_program(&sample(), &OutputSettings::default());
        assert_eq!(
            text,
            "%\r\nO1000 (FACE) ;\r\n(FACE MILL) ;\r\nG0 X5 ;\r\nG04 P2 ;\r\n%"
        );
    }

    #[test]
    fn verbose_annotates_origin_and_keeps_comment_lines() {
        let settings = OutputSettings {
            verbose: true,
            ..OutputSettings::default()
        };
        let text = render_program(&sample(), &settings);
        let lines: Vec<&str> = text.split(EOL).collect();
        assert_eq!(
            lines,
            vec![
                "%",
                "O1000 (FACE) ;",
                "(FACE MILL) ;",
                "G0 X5 (o.gp:2 5=X) ;",
                "(o.gp:3  roughing) ;",
                "G04 P2 (o.gp:4 2) ;",
                "%",
            ]
        );
    }

    #[test]
    fn custom_markers_and_no_header() {
        let mut prog = Program::new("P", 7, at(1), Vec::new(), Environment::new().snapshot());
        prog.push_line(at(2), Some("M30".into()), None);
        let settings = OutputSettings {
            leader: "(BEGIN)".into(),
            trailer: "(END)".into(),
            ..OutputSettings::default()
        };
        assert_eq!(
            render_program(&prog, &settings),
            "(BEGIN)\r\nO7 (P) ;\r\nM30 ;\r\n(END)"
        );
    }

    #[test]
    fn file_path_follows_naming_mode() {
        let prog = sample();
        let mut settings = OutputSettings {
            output_dir: PathBuf::from("out"),
            ..OutputSettings::default()
        };
        assert_eq!(settings.file_path(&prog), PathBuf::from("out").join("1000.nc"));
        settings.name_by_number = false;
        settings.extension = "tap".into();
        assert_eq!(settings.file_path(&prog), PathBuf::from("out").join("FACE.tap"));
    }

    #[test]
    fn inline_semicolon_remainder_is_stripped() {
        let record = LineRecord::new(at(1), 0, Some("G1 X1 ; feed move".into()), None);
        assert_eq!(render_record(&record, false), Some("G1 X1 ;".into()));
        let bare = LineRecord::new(at(1), 0, Some("; only".into()), None);
        assert_eq!(render_record(&bare, false), None);
    }
}
