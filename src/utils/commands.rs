use std::sync::LazyLock;

use regex::Regex;
use crate::models::Grade;

pub const USAGE: &str = "\
Commands:
  part <value|->                 choose the part (- clears it)
  semester <value|->             choose the semester (- clears it)
  grade <course_code> <A-F|->    set or clear one course grade
  add                            add this semester to the calculation
  reset                          start a new calculation
  save                           save the calculation
  load <record_id>               load a saved calculation
  show                           redraw the form
  help                           this text
  quit                           leave";

// Select values may contain spaces, so they take the rest of the line.
static SELECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?i)(part|semester)\s+(.+)$").expect("static regex"));
static GRADE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?i)grade\s+(\S+)\s+([a-f]|-)$").expect("static regex"));
static LOAD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(?i)load\s+(\S+)$").expect("static regex"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Part(String),
    Semester(String),
    Grade { course_code: String, grade: Option<Grade> },
    Add,
    Reset,
    Save,
    Load(String),
    Show,
    Help,
    Quit,
}

fn select_value(raw: &str) -> String {
    let raw = raw.trim();
    if raw == "-" {
        String::new()
    } else {
        raw.to_string()
    }
}

pub fn parse_command(line: &str) -> Result<Command, String> {
    let line = line.trim();

    if let Some(caps) = SELECT.captures(line) {
        let value = select_value(&caps[2]);
        return Ok(if caps[1].eq_ignore_ascii_case("part") {
            Command::Part(value)
        } else {
            Command::Semester(value)
        });
    }

    if let Some(caps) = GRADE.captures(line) {
        let grade = match &caps[2] {
            "-" => None,
            letter => Some(letter.parse::<Grade>()?),
        };
        return Ok(Command::Grade { course_code: caps[1].to_string(), grade });
    }

    if let Some(caps) = LOAD.captures(line) {
        return Ok(Command::Load(caps[1].to_string()));
    }

    match line.to_ascii_lowercase().as_str() {
        "add" => Ok(Command::Add),
        "reset" => Ok(Command::Reset),
        "save" => Ok(Command::Save),
        "show" | "" => Ok(Command::Show),
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" => Ok(Command::Quit),
        _ => Err(format!("Unrecognized command `{}`. Type `help` for the list.", line)),
    }
}
