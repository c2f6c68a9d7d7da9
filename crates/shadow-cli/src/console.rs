//! Line-oriented operator console: the field menu, validated prompts and
//! the launch gate.
//!
//! Generic over its input and output so that sessions can be scripted in
//! tests. End of input is never an error; it ends the current prompt with
//! `None`.

use std::{
  io::{self, BufRead, Write},
  sync::LazyLock,
};

use regex::Regex;
use shadow_core::target::NewTarget;

static EMAIL_RE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^[\w.-]+@[\w.-]+\.\w+$").expect("email regex"));

/// Keyword that starts the enrichment phase.
pub const LAUNCH_KEYWORD: &str = "launch";

// ─── Fields ──────────────────────────────────────────────────────────────────

/// A target attribute the operator may supply, in menu order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
  Name,
  Surname,
  Handle,
  Email,
  Phone,
  Location,
}

impl Field {
  pub const ALL: [Field; 6] = [
    Field::Name,
    Field::Surname,
    Field::Handle,
    Field::Email,
    Field::Phone,
    Field::Location,
  ];

  /// 1-based menu number.
  pub fn number(self) -> usize {
    Self::ALL.iter().position(|f| *f == self).map_or(0, |i| i + 1)
  }

  pub fn from_number(n: usize) -> Option<Self> {
    n.checked_sub(1).and_then(|i| Self::ALL.get(i).copied())
  }

  fn label(self) -> &'static str {
    match self {
      Field::Name => "name (family name)",
      Field::Surname => "surname (given name)",
      Field::Handle => "handle",
      Field::Email => "email",
      Field::Phone => "phone",
      Field::Location => "location",
    }
  }

  fn prompt(self) -> &'static str {
    match self {
      Field::Name => "Target family name: ",
      Field::Surname => "Target given name: ",
      Field::Handle => "Target handle: ",
      Field::Email => "Target email: ",
      Field::Phone => "Target phone number: ",
      Field::Location => "Target location (city, country): ",
    }
  }

  /// Accept or reject one answer. Handle and location are free text.
  pub fn validate(self, answer: &str) -> Result<(), &'static str> {
    match self {
      Field::Name | Field::Surname => {
        if !answer.is_empty() && answer.chars().all(char::is_alphabetic) {
          Ok(())
        } else {
          Err("Names may only contain letters.")
        }
      }
      Field::Email => {
        if EMAIL_RE.is_match(answer) {
          Ok(())
        } else {
          Err("Please enter a valid email address.")
        }
      }
      Field::Phone => {
        if !answer.is_empty() && answer.chars().all(|c| c.is_ascii_digit()) {
          Ok(())
        } else {
          Err("The phone number may only contain digits.")
        }
      }
      Field::Handle | Field::Location => Ok(()),
    }
  }

  fn assign(self, target: &mut NewTarget, value: String) {
    let slot = match self {
      Field::Name => &mut target.family_name,
      Field::Surname => &mut target.given_name,
      Field::Handle => &mut target.handle,
      Field::Email => &mut target.email,
      Field::Phone => &mut target.phone,
      Field::Location => &mut target.location,
    };
    *slot = Some(value);
  }
}

/// Parse a comma-separated menu selection. Unknown and non-numeric entries
/// are ignored; repeats keep their first position.
pub fn parse_selection(line: &str) -> Vec<Field> {
  let mut picked = Vec::new();
  for field in line
    .split(',')
    .filter_map(|part| part.trim().parse::<usize>().ok())
    .filter_map(Field::from_number)
  {
    if !picked.contains(&field) {
      picked.push(field);
    }
  }
  picked
}

// ─── Console ─────────────────────────────────────────────────────────────────

pub struct Console<R, W> {
  input:  R,
  output: W,
}

impl<R: BufRead, W: Write> Console<R, W> {
  pub fn new(input: R, output: W) -> Self { Self { input, output } }

  pub fn say(&mut self, line: impl std::fmt::Display) -> io::Result<()> {
    writeln!(self.output, "{line}")
  }

  /// Print `prompt` and read one trimmed line; `None` at end of input.
  pub fn ask(&mut self, prompt: &str) -> io::Result<Option<String>> {
    write!(self.output, "{prompt}")?;
    self.output.flush()?;

    let mut line = String::new();
    if self.input.read_line(&mut line)? == 0 {
      return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
  }

  /// Prompt for `field` until the answer validates.
  pub fn ask_field(&mut self, field: Field) -> io::Result<Option<String>> {
    loop {
      let Some(answer) = self.ask(field.prompt())? else {
        return Ok(None);
      };
      match field.validate(&answer) {
        Ok(()) => return Ok(Some(answer)),
        Err(hint) => self.say(hint)?,
      }
    }
  }

  /// Show the field menu and prompt for every selected field.
  pub fn collect_target(&mut self) -> io::Result<NewTarget> {
    self.say("=== Available target data ===")?;
    for field in Field::ALL {
      self.say(format_args!("{}. {}", field.number(), field.label()))?;
    }

    let mut target = NewTarget::default();
    let Some(selection) =
      self.ask("Enter the numbers of the known fields (comma-separated, e.g. 1,4,5): ")?
    else {
      return Ok(target);
    };

    for field in parse_selection(&selection) {
      match self.ask_field(field)? {
        Some(value) => field.assign(&mut target, value),
        None => break,
      }
    }
    Ok(target)
  }

  /// Block until the operator types [`LAUNCH_KEYWORD`] (`true`) or `exit` /
  /// `quit` (`false`). End of input counts as abort.
  pub fn wait_for_launch(&mut self) -> io::Result<bool> {
    self.say(format_args!(
      "\nType '{LAUNCH_KEYWORD}' and press Enter to start the lookups."
    ))?;
    loop {
      let Some(cmd) = self.ask("> ")? else {
        self.say("End of input, lookups aborted.")?;
        return Ok(false);
      };
      match cmd.to_lowercase().as_str() {
        LAUNCH_KEYWORD => return Ok(true),
        "exit" | "quit" => {
          self.say("Lookups aborted.")?;
          return Ok(false);
        }
        _ => self.say(format_args!(
          "Unknown command. Type '{LAUNCH_KEYWORD}' to start or 'exit' to cancel."
        ))?,
      }
    }
  }

  pub fn into_output(self) -> W { self.output }
}

#[cfg(test)]
mod tests {
  use std::io::Cursor;

  use super::*;

  fn console(script: &str) -> Console<Cursor<Vec<u8>>, Vec<u8>> {
    Console::new(Cursor::new(script.as_bytes().to_vec()), Vec::new())
  }

  fn transcript(c: Console<Cursor<Vec<u8>>, Vec<u8>>) -> String {
    String::from_utf8(c.into_output()).unwrap()
  }

  #[test]
  fn selection_ignores_noise() {
    assert_eq!(parse_selection("1, 4,x,,9,4,5"), vec![
      Field::Name,
      Field::Email,
      Field::Phone
    ]);
    assert!(parse_selection("").is_empty());
    assert!(parse_selection("0").is_empty());
  }

  #[test]
  fn validation_rules() {
    assert!(Field::Name.validate("Diop").is_ok());
    assert!(Field::Surname.validate("Aïssatou").is_ok());
    assert!(Field::Name.validate("Diop2").is_err());
    assert!(Field::Name.validate("").is_err());
    assert!(Field::Email.validate("m.diop@example.sn").is_ok());
    assert!(Field::Email.validate("not-an-email").is_err());
    assert!(Field::Phone.validate("771234567").is_ok());
    assert!(Field::Phone.validate("+221771234567").is_err());
    assert!(Field::Handle.validate("anything @ all").is_ok());
  }

  #[test]
  fn collects_selected_fields_with_reprompts() {
    let mut c = console("1,2,4,5\nDiop\nMamadou\nbad\nmamadou@example.sn\n77 12\n771234567\n");
    let t = c.collect_target().unwrap();

    assert_eq!(t.family_name.as_deref(), Some("Diop"));
    assert_eq!(t.given_name.as_deref(), Some("Mamadou"));
    assert_eq!(t.email.as_deref(), Some("mamadou@example.sn"));
    assert_eq!(t.phone.as_deref(), Some("771234567"));
    assert!(t.handle.is_none());

    let out = transcript(c);
    assert!(out.contains("6. location"));
    assert!(out.contains("Please enter a valid email address."));
    assert!(out.contains("The phone number may only contain digits."));
  }

  #[test]
  fn end_of_input_stops_collection() {
    let mut c = console("1,3\nDiop\n");
    let t = c.collect_target().unwrap();
    assert_eq!(t.family_name.as_deref(), Some("Diop"));
    assert!(t.handle.is_none());
  }

  #[test]
  fn launch_gate() {
    assert!(console("go\nLAUNCH\n").wait_for_launch().unwrap());
    assert!(!console("quit\n").wait_for_launch().unwrap());
    assert!(!console("exit\nlaunch\n").wait_for_launch().unwrap());
    assert!(!console("").wait_for_launch().unwrap());

    let mut c = console("hello\nlaunch\n");
    assert!(c.wait_for_launch().unwrap());
    assert!(transcript(c).contains("Unknown command."));
  }
}
